//! FormServiceBuilder - FormService の構築とワイヤリング
//!
//! # Fail-fast 設計
//! - expect_engines() で期待されるエンジン名を登録
//! - build() 時に「期待集合 ⊆ 登録済み集合」をチェック
//! - 設定の default_form_engine も登録済みでなければ BuildError

use std::sync::Arc;

use crate::app::config::FormServiceConfig;
use crate::app::registry::{FormEngineRegistry, RegistryError};
use crate::app::service::FormService;
use crate::impls::{HtmlFormEngine, JsonFormEngine};
use crate::ports::{DefinitionStore, FormEngine, RuntimeStore};

/// # 使用例
/// ```ignore
/// let service = FormServiceBuilder::new()
///     .definitions(definitions)
///     .runtime(runtime)
///     .with_builtin_engines()?
///     .expect_engines(&["html"])
///     .build()?;
/// ```
pub struct FormServiceBuilder {
    definitions: Option<Arc<dyn DefinitionStore>>,
    runtime: Option<Arc<dyn RuntimeStore>>,
    registry: FormEngineRegistry,
    config: FormServiceConfig,
    expected_engines: Option<Vec<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("missing {0} store")]
    MissingStore(&'static str),

    #[error("Missing form engines: {0:?}. These engines were expected but not registered.")]
    MissingEngines(Vec<String>),

    #[error("default form engine '{0}' is not registered")]
    UnknownDefaultEngine(String),
}

impl FormServiceBuilder {
    pub fn new() -> Self {
        Self {
            definitions: None,
            runtime: None,
            registry: FormEngineRegistry::new(),
            config: FormServiceConfig::default(),
            expected_engines: None,
        }
    }

    pub fn definitions(mut self, store: Arc<dyn DefinitionStore>) -> Self {
        self.definitions = Some(store);
        self
    }

    pub fn runtime(mut self, store: Arc<dyn RuntimeStore>) -> Self {
        self.runtime = Some(store);
        self
    }

    pub fn config(mut self, config: FormServiceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn register_engine<E: FormEngine + 'static>(mut self, engine: E) -> Result<Self, RegistryError> {
        self.registry.register(engine)?;
        Ok(self)
    }

    /// Registers `json` and `html`.
    pub fn with_builtin_engines(self) -> Result<Self, RegistryError> {
        self.register_engine(JsonFormEngine::new())?
            .register_engine(HtmlFormEngine::new())
    }

    pub fn expect_engines(mut self, names: &[&str]) -> Self {
        self.expected_engines = Some(names.iter().map(|n| n.to_string()).collect());
        self
    }

    pub fn build(self) -> Result<FormService, BuildError> {
        let definitions = self.definitions.ok_or(BuildError::MissingStore("definition"))?;
        let runtime = self.runtime.ok_or(BuildError::MissingStore("runtime"))?;

        if let Some(expected) = &self.expected_engines {
            let missing: Vec<String> = expected
                .iter()
                .filter(|name| !self.registry.contains(name))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingEngines(missing));
            }
        }

        let mut registry = self.registry;
        if let Some(default) = &self.config.default_form_engine {
            if !registry.contains(default) {
                return Err(BuildError::UnknownDefaultEngine(default.clone()));
            }
            registry.set_default(Some(default.clone()));
        }

        Ok(FormService::new(definitions, runtime, registry, self.config))
    }
}

impl Default for FormServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
