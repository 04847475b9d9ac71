//! JsonFormEngine - FormData をそのまま JSON で返すエンジン
//!
//! UI 側で独自にフォームを組み立てるクライアント向け。

use crate::domain::{FormData, FormError};
use crate::ports::{FormEngine, RenderedForm};

pub const JSON_ENGINE_NAME: &str = "json";

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormEngine {
    pretty: bool,
}

impl JsonFormEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl FormEngine for JsonFormEngine {
    fn name(&self) -> &str {
        JSON_ENGINE_NAME
    }

    fn render(&self, form: &FormData) -> Result<RenderedForm, FormError> {
        let body = if self.pretty {
            serde_json::to_string_pretty(form)
        } else {
            serde_json::to_string(form)
        }
        .map_err(|e| FormError::InvalidState(format!("json encode: {e}")))?;
        Ok(RenderedForm {
            engine: JSON_ENGINE_NAME.to_string(),
            content_type: "application/json".to_string(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FormField, FormTarget, ProcessDefinitionId, TypedValue};
    use ulid::Ulid;

    #[test]
    fn renders_form_data_as_json() {
        let form = FormData {
            target: FormTarget::Start {
                process_definition_id: ProcessDefinitionId::from_ulid(Ulid::new()),
            },
            form_key: Some("forms/start".into()),
            fields: vec![FormField {
                name: "amount".into(),
                label: None,
                field_type: None,
                value: Some(TypedValue::long(3)),
                validators: vec![],
                declared: false,
                unset_by_runtime: false,
                scope_id: None,
            }],
        };

        let rendered = JsonFormEngine::new().render(&form).unwrap();
        assert_eq!(rendered.engine, "json");
        let back: FormData = serde_json::from_str(&rendered.body).unwrap();
        assert_eq!(back, form);
    }
}
