//! Assembled form data handed to callers and form engines.

use serde::{Deserialize, Serialize};

use super::form::{Constraint, FieldType};
use super::ids::{ProcessDefinitionId, ScopeId, TaskId};
use super::value::TypedValue;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FormTarget {
    Start {
        process_definition_id: ProcessDefinitionId,
    },
    Task {
        task_id: TaskId,
        process_definition_id: ProcessDefinitionId,
        task_definition_key: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    pub label: Option<String>,
    /// None for undeclared runtime variables.
    pub field_type: Option<FieldType>,
    pub value: Option<TypedValue>,
    pub validators: Vec<Constraint>,
    /// False for runtime variables no descriptor declares.
    pub declared: bool,
    /// True when the value is only the declared default.
    pub unset_by_runtime: bool,
    pub scope_id: Option<ScopeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormData {
    pub target: FormTarget,
    pub form_key: Option<String>,
    /// Declared fields in declaration order, then undeclared variables by name.
    pub fields: Vec<FormField>,
}

impl FormData {
    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn declared_fields(&self) -> impl Iterator<Item = &FormField> {
        self.fields.iter().filter(|f| f.declared)
    }

    pub fn undeclared_fields(&self) -> impl Iterator<Item = &FormField> {
        self.fields.iter().filter(|f| !f.declared)
    }
}
