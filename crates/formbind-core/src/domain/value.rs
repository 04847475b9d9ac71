//! Typed variable values.
//!
//! Values travel as `serde_json::Value` plus an explicit `ValueType`, so a
//! string `"42"` and a long `42` stay distinguishable after a round-trip.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Null,
    String,
    Boolean,
    Long,
    Double,
    /// RFC 3339 timestamp stored as a JSON string.
    Date,
    Json,
}

impl ValueType {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::Null => "null",
            ValueType::String => "string",
            ValueType::Boolean => "boolean",
            ValueType::Long => "long",
            ValueType::Double => "double",
            ValueType::Date => "date",
            ValueType::Json => "json",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedValue {
    pub value: serde_json::Value,
    #[serde(rename = "type")]
    pub value_type: ValueType,
}

/// name → value の写像（順序は名前順で安定）
pub type VariableMap = BTreeMap<String, TypedValue>;

impl TypedValue {
    pub fn null() -> Self {
        Self {
            value: serde_json::Value::Null,
            value_type: ValueType::Null,
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self {
            value: serde_json::Value::String(value.into()),
            value_type: ValueType::String,
        }
    }

    pub fn boolean(value: bool) -> Self {
        Self {
            value: serde_json::Value::Bool(value),
            value_type: ValueType::Boolean,
        }
    }

    pub fn long(value: i64) -> Self {
        Self {
            value: serde_json::Value::from(value),
            value_type: ValueType::Long,
        }
    }

    /// Non-finite doubles have no JSON form and collapse to null.
    pub fn double(value: f64) -> Self {
        match serde_json::Number::from_f64(value) {
            Some(n) => Self {
                value: serde_json::Value::Number(n),
                value_type: ValueType::Double,
            },
            None => Self::null(),
        }
    }

    pub fn date(value: DateTime<Utc>) -> Self {
        Self {
            value: serde_json::Value::String(value.to_rfc3339_opts(SecondsFormat::Secs, true)),
            value_type: ValueType::Date,
        }
    }

    pub fn json(value: serde_json::Value) -> Self {
        Self {
            value,
            value_type: ValueType::Json,
        }
    }

    /// Loosely-typed value: the type is inferred from the JSON shape.
    pub fn untyped(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::null(),
            serde_json::Value::Bool(b) => Self::boolean(b),
            serde_json::Value::String(s) => Self::string(s),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::long(i),
                None => Self::double(n.as_f64().unwrap_or(f64::NAN)),
            },
            other => Self::json(other),
        }
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    pub fn as_str(&self) -> Option<&str> {
        self.value.as_str()
    }

    /// Numeric view used by range constraints.
    pub fn as_f64(&self) -> Option<f64> {
        match self.value_type {
            ValueType::Long | ValueType::Double => self.value.as_f64(),
            _ => None,
        }
    }

    /// Text used by renderers for input `value` attributes.
    pub fn display_text(&self) -> String {
        match &self.value {
            serde_json::Value::Null => String::new(),
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl From<&str> for TypedValue {
    fn from(value: &str) -> Self {
        Self::string(value)
    }
}

impl From<String> for TypedValue {
    fn from(value: String) -> Self {
        Self::string(value)
    }
}

impl From<i64> for TypedValue {
    fn from(value: i64) -> Self {
        Self::long(value)
    }
}

impl From<f64> for TypedValue {
    fn from(value: f64) -> Self {
        Self::double(value)
    }
}

impl From<bool> for TypedValue {
    fn from(value: bool) -> Self {
        Self::boolean(value)
    }
}

/// 非推奨の文字列のみ API 向け: 各値を string 型でラップする
pub fn string_variables<I, K, V>(properties: I) -> VariableMap
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    properties
        .into_iter()
        .map(|(k, v)| (k.into(), TypedValue::string(v)))
        .collect()
}
