//! FormData assembler: declared fields merged with resolved variables.
//!
//! Pure function, no I/O beyond what the resolver already did.

use crate::domain::{FormData, FormDefinitionRef, FormField, FormTarget, ResolvedVariables};

/// Declared fields come first in declaration order; a live variable wins over
/// the declared default. Variables no field declares follow in name order,
/// flagged as undeclared.
pub fn assemble(
    target: FormTarget,
    form: &FormDefinitionRef,
    resolved: &ResolvedVariables,
) -> FormData {
    let mut fields = Vec::with_capacity(form.fields.len());

    for descriptor in &form.fields {
        let live = resolved.get(&descriptor.name).filter(|v| v.is_live());
        let (value, scope_id, unset_by_runtime) = match live {
            Some(var) => (Some(var.value.clone()), var.scope_id, false),
            None => (descriptor.default_value.clone(), None, true),
        };
        fields.push(FormField {
            name: descriptor.name.clone(),
            label: descriptor.label.clone(),
            field_type: Some(descriptor.field_type.clone()),
            value,
            validators: descriptor.validators.clone(),
            declared: true,
            unset_by_runtime,
            scope_id,
        });
    }

    for (name, var) in resolved {
        if form.declares(name) {
            continue;
        }
        fields.push(FormField {
            name: name.clone(),
            label: None,
            field_type: None,
            value: Some(var.value.clone()),
            validators: Vec::new(),
            declared: false,
            unset_by_runtime: !var.is_live(),
            scope_id: var.scope_id,
        });
    }

    FormData {
        target,
        form_key: form.form_key.clone(),
        fields,
    }
}
