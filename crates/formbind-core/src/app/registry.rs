//! FormEngineRegistry - 描画エンジンの登録と選択
//!
//! # 学習ポイント
//! - HashMap<String, Arc<dyn FormEngine>> による型消去された trait object の管理
//! - 起動時に構築（mutable）、実行時は読み取り専用（immutable）
//! - 名前が無ければ設定済みの default を使う

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::{EntityKind, FormData, FormError};
use crate::ports::{FormEngine, RenderedForm};

/// Name reported in `NotFound` when no engine is named and no default is set.
const DEFAULT_ENGINE_LABEL: &str = "<default>";

#[derive(Default, Clone)]
pub struct FormEngineRegistry {
    engines: HashMap<String, Arc<dyn FormEngine>>,
    default_engine: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("form engine '{0}' is already registered")]
    AlreadyRegistered(String),
}

impl FormEngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<E: FormEngine + 'static>(&mut self, engine: E) -> Result<(), RegistryError> {
        self.register_arc(Arc::new(engine))
    }

    pub fn register_arc(&mut self, engine: Arc<dyn FormEngine>) -> Result<(), RegistryError> {
        let name = engine.name().to_string();
        if self.engines.contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered(name));
        }
        tracing::debug!(engine = %name, "registered form engine");
        self.engines.insert(name, engine);
        Ok(())
    }

    pub fn set_default(&mut self, name: Option<String>) {
        self.default_engine = name;
    }

    pub fn default_engine(&self) -> Option<&str> {
        self.default_engine.as_deref()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.engines.contains_key(name)
    }

    /// Sorted, so callers get a stable listing.
    pub fn registered_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.engines.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn get(&self, name: Option<&str>) -> Result<Arc<dyn FormEngine>, FormError> {
        let name = match name.or(self.default_engine.as_deref()) {
            Some(name) => name,
            None => return Err(FormError::not_found(EntityKind::FormEngine, DEFAULT_ENGINE_LABEL)),
        };
        self.engines
            .get(name)
            .cloned()
            .ok_or_else(|| FormError::not_found(EntityKind::FormEngine, name))
    }

    pub fn render(&self, form: &FormData, name: Option<&str>) -> Result<RenderedForm, FormError> {
        self.get(name)?.render(form)
    }
}
