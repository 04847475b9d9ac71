//! Declared form metadata: definition refs, field descriptors, field types and
//! validator constraints.
//!
//! These are read-only views derived from deployed definitions. Nothing here is
//! persisted by the form layer.

use std::fmt;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::ids::ProcessDefinitionId;
use super::value::{TypedValue, ValueType};

/// Date pattern used when a `Date` field does not declare one (dd/MM/yyyy).
pub const DEFAULT_DATE_PATTERN: &str = "%d/%m/%Y";

/// The declared form of a start event or of a task definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDefinitionRef {
    pub process_definition_id: ProcessDefinitionId,
    /// None for the start form.
    pub task_definition_key: Option<String>,
    /// Opaque user reference, e.g. a deployment resource path.
    pub form_key: Option<String>,
    pub fields: Vec<FieldDescriptor>,
}

impl FormDefinitionRef {
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn declares(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}

/// Deployable part of a form (what a definition declares, without owner ids).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormDefinition {
    #[serde(default)]
    pub form_key: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl FormDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_form_key(mut self, form_key: impl Into<String>) -> Self {
        self.form_key = Some(form_key.into());
        self
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Unique within its form.
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    pub field_type: FieldType,
    #[serde(default)]
    pub default_value: Option<TypedValue>,
    #[serde(default)]
    pub validators: Vec<Constraint>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            label: None,
            field_type,
            default_value: None,
            validators: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_default(mut self, value: impl Into<TypedValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_validator(mut self, constraint: Constraint) -> Self {
        self.validators.push(constraint);
        self
    }

    pub fn is_required(&self) -> bool {
        self.validators.contains(&Constraint::Required)
    }

    pub fn is_readonly(&self) -> bool {
        self.validators.contains(&Constraint::Readonly)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    pub id: String,
    pub name: String,
}

impl EnumValue {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Type hint of a declared field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    String,
    Long,
    Double,
    Boolean,
    Date { pattern: String },
    Enum { values: Vec<EnumValue> },
    /// Engine-specific type; values pass through unchanged.
    Custom { name: String },
}

impl FieldType {
    pub fn date() -> Self {
        FieldType::Date {
            pattern: DEFAULT_DATE_PATTERN.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FieldType::String => "string",
            FieldType::Long => "long",
            FieldType::Double => "double",
            FieldType::Boolean => "boolean",
            FieldType::Date { .. } => "date",
            FieldType::Enum { .. } => "enum",
            FieldType::Custom { name } => name,
        }
    }

    /// 送信値をフィールド型に変換する。変換できなければ None。
    ///
    /// - null は常に受理
    /// - 文字列は long/double/boolean/date へパースされる
    /// - long は double フィールドで double に昇格
    pub fn coerce(&self, value: &TypedValue) -> Option<TypedValue> {
        if value.is_null() {
            return Some(TypedValue::null());
        }
        match self {
            FieldType::String => match value.value_type {
                ValueType::String => Some(value.clone()),
                _ => None,
            },
            FieldType::Long => match value.value_type {
                ValueType::Long => Some(value.clone()),
                ValueType::String => value
                    .as_str()
                    .and_then(|s| s.trim().parse::<i64>().ok())
                    .map(TypedValue::long),
                _ => None,
            },
            FieldType::Double => match value.value_type {
                ValueType::Double => Some(value.clone()),
                ValueType::Long => value.as_f64().map(TypedValue::double),
                ValueType::String => value
                    .as_str()
                    .and_then(|s| s.trim().parse::<f64>().ok())
                    .filter(|d| d.is_finite())
                    .map(TypedValue::double),
                _ => None,
            },
            FieldType::Boolean => match value.value_type {
                ValueType::Boolean => Some(value.clone()),
                ValueType::String => match value.as_str().map(str::trim) {
                    Some("true") => Some(TypedValue::boolean(true)),
                    Some("false") => Some(TypedValue::boolean(false)),
                    _ => None,
                },
                _ => None,
            },
            FieldType::Date { pattern } => match value.value_type {
                ValueType::Date => Some(value.clone()),
                ValueType::String => value
                    .as_str()
                    .and_then(|s| parse_date(s.trim(), pattern))
                    .map(TypedValue::date),
                _ => None,
            },
            FieldType::Enum { values } => match value.as_str() {
                Some(s) if value.value_type == ValueType::String && values.iter().any(|v| v.id == s) => {
                    Some(value.clone())
                }
                _ => None,
            },
            FieldType::Custom { .. } => Some(value.clone()),
        }
    }
}

fn parse_date(raw: &str, pattern: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, pattern).ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight))
}

/// Declared validator of a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "config", rename_all = "lowercase")]
pub enum Constraint {
    Required,
    Readonly,
    MinLength(usize),
    MaxLength(usize),
    Min(f64),
    Max(f64),
}

impl Constraint {
    /// `submitted` は型変換済みの送信値（キーが送られていれば null でも Some）、
    /// `existing` はスコープ上に見えている live 値。
    ///
    /// - required: キーが送られていれば送信値だけで判定し、無ければ live 値を見る
    /// - readonly: キーが送られた時点で違反（null で上書きも不可）
    /// - 長さ・範囲: null と未送信は通す
    pub fn check(&self, submitted: Option<&TypedValue>, existing: Option<&TypedValue>) -> bool {
        match self {
            Constraint::Required => match submitted {
                Some(v) => !v.is_null(),
                None => existing.is_some_and(|v| !v.is_null()),
            },
            Constraint::Readonly => submitted.is_none(),
            _ => self.check_value(submitted.filter(|v| !v.is_null())),
        }
    }

    fn check_value(&self, submitted: Option<&TypedValue>) -> bool {
        match self {
            Constraint::Required | Constraint::Readonly => true,
            Constraint::MinLength(min) => match submitted {
                None => true,
                Some(v) => v.as_str().is_some_and(|s| s.chars().count() >= *min),
            },
            Constraint::MaxLength(max) => match submitted {
                None => true,
                Some(v) => v.as_str().is_some_and(|s| s.chars().count() <= *max),
            },
            Constraint::Min(min) => match submitted {
                None => true,
                Some(v) => v.as_f64().is_some_and(|n| n >= *min),
            },
            Constraint::Max(max) => match submitted {
                None => true,
                Some(v) => v.as_f64().is_some_and(|n| n <= *max),
            },
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Required => f.write_str("required"),
            Constraint::Readonly => f.write_str("readonly"),
            Constraint::MinLength(n) => write!(f, "minlength({n})"),
            Constraint::MaxLength(n) => write!(f, "maxlength({n})"),
            Constraint::Min(n) => write!(f, "min({n})"),
            Constraint::Max(n) => write!(f, "max({n})"),
        }
    }
}
