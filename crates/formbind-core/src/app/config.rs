//! FormServiceConfig - フォーム層の設定
//!
//! TOML から読み込む。すべてのキーは省略可能で、省略時は `Default` の値。
//!
//! ```toml
//! default_form_engine = "html"
//! undeclared_variables = "root"
//! apply_timeout_ms = 5000
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::FormError;

/// Where a submitted variable goes when no field declares it and no visible
/// scope already binds it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndeclaredVariablePolicy {
    /// New loosely-typed variable in the target scope.
    #[default]
    Local,
    /// New variable on the process-instance root scope.
    Root,
    /// Fail validation with constraint `undeclared`.
    Reject,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormServiceConfig {
    /// Engine used when a render call names none.
    pub default_form_engine: Option<String>,
    pub undeclared_variables: UndeclaredVariablePolicy,
    /// Upper bound on the Applying phase of a submission.
    pub apply_timeout_ms: Option<u64>,
}

impl FormServiceConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, FormError> {
        toml::from_str(raw).map_err(|e| FormError::Config(e.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FormError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| FormError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    pub fn apply_timeout(&self) -> Option<Duration> {
        self.apply_timeout_ms.map(Duration::from_millis)
    }

    pub fn with_default_form_engine(mut self, name: impl Into<String>) -> Self {
        self.default_form_engine = Some(name.into());
        self
    }

    pub fn with_undeclared_variables(mut self, policy: UndeclaredVariablePolicy) -> Self {
        self.undeclared_variables = policy;
        self
    }

    pub fn with_apply_timeout(mut self, timeout: Duration) -> Self {
        self.apply_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorKind;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = FormServiceConfig::from_toml_str("").unwrap();
        assert_eq!(config, FormServiceConfig::default());
        assert_eq!(config.undeclared_variables, UndeclaredVariablePolicy::Local);
        assert_eq!(config.apply_timeout(), None);
    }

    #[test]
    fn parses_all_keys() {
        let config = FormServiceConfig::from_toml_str(
            r#"
            default_form_engine = "html"
            undeclared_variables = "reject"
            apply_timeout_ms = 250
            "#,
        )
        .unwrap();
        assert_eq!(config.default_form_engine.as_deref(), Some("html"));
        assert_eq!(config.undeclared_variables, UndeclaredVariablePolicy::Reject);
        assert_eq!(config.apply_timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn huge_apply_timeout_saturates() {
        let config = FormServiceConfig::default().with_apply_timeout(Duration::from_secs(u64::MAX));
        assert_eq!(config.apply_timeout_ms, Some(u64::MAX));

        let config = FormServiceConfig::default().with_apply_timeout(Duration::from_millis(1500));
        assert_eq!(config.apply_timeout_ms, Some(1500));
    }

    #[test]
    fn bad_policy_is_config_error() {
        let err = FormServiceConfig::from_toml_str("undeclared_variables = \"everywhere\"").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = FormServiceConfig::from_path("/nonexistent/formbind.toml").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
