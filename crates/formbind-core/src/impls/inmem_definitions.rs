//! InMemoryDefinitionStore - 開発用・テスト用のデプロイ済み定義ストア
//!
//! # 実装詳細
//! - HashMap<ProcessDefinitionId, DeployedDefinition> を Mutex で保護
//! - 同じ key を再デプロイすると version が 1 ずつ増える

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::domain::{EntityKind, FormDefinition, FormDefinitionRef, FormError, ProcessDefinitionId};
use crate::ports::{DefinitionStore, IdGenerator, SystemClock, UlidGenerator};

/// What a deployment declares about forms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessDefinitionSpec {
    pub key: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub start_form: FormDefinition,
    /// task definition key → form. Every user task must be listed, even with
    /// an empty form.
    #[serde(default)]
    pub task_forms: BTreeMap<String, FormDefinition>,
}

impl ProcessDefinitionSpec {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn with_start_form(mut self, form: FormDefinition) -> Self {
        self.start_form = form;
        self
    }

    pub fn with_task_form(mut self, task_definition_key: impl Into<String>, form: FormDefinition) -> Self {
        self.task_forms.insert(task_definition_key.into(), form);
        self
    }
}

#[derive(Debug, Clone)]
struct DeployedDefinition {
    version: u32,
    spec: ProcessDefinitionSpec,
}

pub struct InMemoryDefinitionStore {
    definitions: Mutex<HashMap<ProcessDefinitionId, DeployedDefinition>>,
    ids: Arc<dyn IdGenerator>,
}

impl InMemoryDefinitionStore {
    pub fn new(ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            definitions: Mutex::new(HashMap::new()),
            ids,
        }
    }

    /// Deploy a definition and return its id.
    ///
    /// Fails with `Validation { field, "type(<name>)" }` when a declared default
    /// cannot be coerced to its field type.
    pub async fn deploy(&self, spec: ProcessDefinitionSpec) -> Result<ProcessDefinitionId, FormError> {
        check_defaults(&spec.start_form)?;
        for form in spec.task_forms.values() {
            check_defaults(form)?;
        }

        let id = self.ids.generate_process_definition_id();
        let mut definitions = self.definitions.lock().await;
        let version = definitions
            .values()
            .filter(|d| d.spec.key == spec.key)
            .map(|d| d.version)
            .max()
            .unwrap_or(0)
            + 1;
        tracing::debug!(%id, key = %spec.key, version, "deployed process definition");
        definitions.insert(id, DeployedDefinition { version, spec });
        Ok(id)
    }

    /// Version of a deployed definition.
    pub async fn version(&self, id: ProcessDefinitionId) -> Option<u32> {
        self.definitions.lock().await.get(&id).map(|d| d.version)
    }
}

fn check_defaults(form: &FormDefinition) -> Result<(), FormError> {
    for field in &form.fields {
        if let Some(default) = &field.default_value
            && field.field_type.coerce(default).is_none()
        {
            return Err(FormError::validation(
                &field.name,
                format!("type({})", field.field_type.name()),
            ));
        }
    }
    Ok(())
}

impl Default for InMemoryDefinitionStore {
    fn default() -> Self {
        Self::new(Arc::new(UlidGenerator::new(SystemClock)))
    }
}

#[async_trait]
impl DefinitionStore for InMemoryDefinitionStore {
    async fn start_form(
        &self,
        process_definition_id: ProcessDefinitionId,
    ) -> Result<FormDefinitionRef, FormError> {
        let definitions = self.definitions.lock().await;
        let deployed = definitions
            .get(&process_definition_id)
            .ok_or_else(|| FormError::not_found(EntityKind::ProcessDefinition, process_definition_id))?;
        let form = &deployed.spec.start_form;
        Ok(FormDefinitionRef {
            process_definition_id,
            task_definition_key: None,
            form_key: form.form_key.clone(),
            fields: form.fields.clone(),
        })
    }

    async fn task_form(
        &self,
        process_definition_id: ProcessDefinitionId,
        task_definition_key: &str,
    ) -> Result<FormDefinitionRef, FormError> {
        let definitions = self.definitions.lock().await;
        let deployed = definitions
            .get(&process_definition_id)
            .ok_or_else(|| FormError::not_found(EntityKind::ProcessDefinition, process_definition_id))?;
        let form = deployed.spec.task_forms.get(task_definition_key).ok_or_else(|| {
            FormError::not_found(
                EntityKind::TaskDefinition,
                format!("{process_definition_id}/{task_definition_key}"),
            )
        })?;
        Ok(FormDefinitionRef {
            process_definition_id,
            task_definition_key: Some(task_definition_key.to_string()),
            form_key: form.form_key.clone(),
            fields: form.fields.clone(),
        })
    }
}
