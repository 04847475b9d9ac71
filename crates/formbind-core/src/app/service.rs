//! FormService - フォーム層の公開 API
//!
//! 呼び出し側（UI 層、CLI、他サービス）が使う面。
//! 解決・組み立て・送信・描画をそれぞれ resolver / assembler / executor /
//! registry に委譲するだけで、自身は状態を持たない。

use std::sync::Arc;

use crate::app::assembler::assemble;
use crate::app::config::FormServiceConfig;
use crate::app::executor::SubmissionExecutor;
use crate::app::registry::FormEngineRegistry;
use crate::app::resolver::{NameFilter, VariableScopeResolver};
use crate::domain::{
    string_variables, FormData, FormError, FormTarget, ProcessDefinitionId, ProcessInstanceRef,
    ResolvedVariables, SubmissionRequest, SubmissionResult, TaskId, VariableMap,
};
use crate::ports::{DefinitionStore, RenderedForm, RuntimeStore};

#[derive(Clone)]
pub struct FormService {
    definitions: Arc<dyn DefinitionStore>,
    resolver: VariableScopeResolver,
    executor: SubmissionExecutor,
    engines: Arc<FormEngineRegistry>,
    config: FormServiceConfig,
}

fn name_filter(names: Option<&[&str]>) -> Option<NameFilter> {
    names.map(|names| names.iter().map(|n| n.to_string()).collect())
}

impl FormService {
    /// Wiring goes through [`FormServiceBuilder`](crate::app::FormServiceBuilder).
    pub(crate) fn new(
        definitions: Arc<dyn DefinitionStore>,
        runtime: Arc<dyn RuntimeStore>,
        engines: FormEngineRegistry,
        config: FormServiceConfig,
    ) -> Self {
        Self {
            resolver: VariableScopeResolver::new(definitions.clone(), runtime.clone()),
            executor: SubmissionExecutor::new(definitions.clone(), runtime, config.clone()),
            definitions,
            engines: Arc::new(engines),
            config,
        }
    }

    pub fn config(&self) -> &FormServiceConfig {
        &self.config
    }

    pub fn engine_names(&self) -> Vec<String> {
        self.engines.registered_names()
    }

    // ── Queries ─────────────────────────────────────────────────────────────

    pub async fn start_form_data(&self, process_definition_id: ProcessDefinitionId) -> Result<FormData, FormError> {
        let (form, resolved) = self.resolver.resolve_start(process_definition_id, None).await?;
        Ok(assemble(
            FormTarget::Start {
                process_definition_id,
            },
            &form,
            &resolved,
        ))
    }

    pub async fn task_form_data(&self, task_id: TaskId) -> Result<FormData, FormError> {
        let (context, resolved) = self.resolver.resolve_task(task_id, None).await?;
        let target = FormTarget::Task {
            task_id,
            process_definition_id: context.task.process_definition_id,
            task_definition_key: context.task.task_definition_key.clone(),
        };
        Ok(assemble(target, &context.form, &resolved))
    }

    /// `names = None` returns everything visible.
    pub async fn start_form_variables(
        &self,
        process_definition_id: ProcessDefinitionId,
        names: Option<&[&str]>,
    ) -> Result<ResolvedVariables, FormError> {
        let filter = name_filter(names);
        let (_, resolved) = self
            .resolver
            .resolve_start(process_definition_id, filter.as_ref())
            .await?;
        Ok(resolved)
    }

    pub async fn task_form_variables(
        &self,
        task_id: TaskId,
        names: Option<&[&str]>,
    ) -> Result<ResolvedVariables, FormError> {
        let filter = name_filter(names);
        let (_, resolved) = self.resolver.resolve_task(task_id, filter.as_ref()).await?;
        Ok(resolved)
    }

    pub async fn start_form_key(&self, process_definition_id: ProcessDefinitionId) -> Result<Option<String>, FormError> {
        Ok(self.definitions.start_form(process_definition_id).await?.form_key)
    }

    pub async fn task_form_key(
        &self,
        process_definition_id: ProcessDefinitionId,
        task_definition_key: &str,
    ) -> Result<Option<String>, FormError> {
        Ok(self
            .definitions
            .task_form(process_definition_id, task_definition_key)
            .await?
            .form_key)
    }

    // ── Rendering ───────────────────────────────────────────────────────────

    /// `engine = None` uses the configured default engine.
    pub async fn rendered_start_form(
        &self,
        process_definition_id: ProcessDefinitionId,
        engine: Option<&str>,
    ) -> Result<RenderedForm, FormError> {
        // 未登録のエンジン名なら解決より先に失敗させる
        let engine = self.engines.get(engine)?;
        let data = self.start_form_data(process_definition_id).await?;
        engine.render(&data)
    }

    pub async fn rendered_task_form(&self, task_id: TaskId, engine: Option<&str>) -> Result<RenderedForm, FormError> {
        let engine = self.engines.get(engine)?;
        let data = self.task_form_data(task_id).await?;
        engine.render(&data)
    }

    // ── Submission ──────────────────────────────────────────────────────────

    pub async fn submit(&self, request: SubmissionRequest) -> Result<SubmissionResult, FormError> {
        self.executor.submit(request).await
    }

    pub async fn submit_start_form(
        &self,
        process_definition_id: ProcessDefinitionId,
        variables: VariableMap,
    ) -> Result<ProcessInstanceRef, FormError> {
        self.start(SubmissionRequest::start(process_definition_id, variables))
            .await
    }

    pub async fn submit_start_form_with_business_key(
        &self,
        process_definition_id: ProcessDefinitionId,
        business_key: impl Into<String>,
        variables: VariableMap,
    ) -> Result<ProcessInstanceRef, FormError> {
        self.start(
            SubmissionRequest::start(process_definition_id, variables).with_business_key(business_key),
        )
        .await
    }

    pub async fn submit_task_form(&self, task_id: TaskId, variables: VariableMap) -> Result<(), FormError> {
        match self.submit(SubmissionRequest::complete(task_id, variables)).await? {
            SubmissionResult::Completed => Ok(()),
            SubmissionResult::Started(instance) => Err(FormError::InvalidState(format!(
                "task submission started process instance {}",
                instance.id
            ))),
        }
    }

    async fn start(&self, request: SubmissionRequest) -> Result<ProcessInstanceRef, FormError> {
        match self.submit(request).await? {
            SubmissionResult::Started(instance) => Ok(instance),
            SubmissionResult::Completed => Err(FormError::InvalidState(
                "start submission completed a task".to_string(),
            )),
        }
    }

    // ── String-only variants ────────────────────────────────────────────────

    #[deprecated(note = "Use `submit_start_form` with typed values instead.")]
    pub async fn submit_start_form_data<I, K, V>(
        &self,
        process_definition_id: ProcessDefinitionId,
        properties: I,
    ) -> Result<ProcessInstanceRef, FormError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.submit_start_form(process_definition_id, string_variables(properties))
            .await
    }

    #[deprecated(note = "Use `submit_start_form_with_business_key` with typed values instead.")]
    pub async fn submit_start_form_data_with_business_key<I, K, V>(
        &self,
        process_definition_id: ProcessDefinitionId,
        business_key: impl Into<String>,
        properties: I,
    ) -> Result<ProcessInstanceRef, FormError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.submit_start_form_with_business_key(
            process_definition_id,
            business_key,
            string_variables(properties),
        )
        .await
    }

    #[deprecated(note = "Use `submit_task_form` with typed values instead.")]
    pub async fn submit_task_form_data<I, K, V>(&self, task_id: TaskId, properties: I) -> Result<(), FormError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.submit_task_form(task_id, string_variables(properties)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::FormServiceBuilder;
    use crate::domain::{Constraint, EntityKind, FieldDescriptor, FieldType, FormDefinition, TypedValue};
    use crate::impls::{InMemoryDefinitionStore, InMemoryRuntimeStore, ProcessDefinitionSpec};

    async fn fixture() -> (FormService, ProcessDefinitionId) {
        let definitions = Arc::new(InMemoryDefinitionStore::default());
        let pd = definitions
            .deploy(
                ProcessDefinitionSpec::new("expense").with_start_form(
                    FormDefinition::new()
                        .with_form_key("forms/expense-start")
                        .with_field(
                            FieldDescriptor::new("amount", FieldType::Long)
                                .with_validator(Constraint::Required),
                        )
                        .with_field(FieldDescriptor::new("currency", FieldType::String).with_default("EUR")),
                ),
            )
            .await
            .unwrap();
        let service = FormServiceBuilder::new()
            .definitions(definitions)
            .runtime(Arc::new(InMemoryRuntimeStore::default()))
            .with_builtin_engines()
            .unwrap()
            .build()
            .unwrap();
        (service, pd)
    }

    #[tokio::test]
    async fn start_form_queries() {
        let (service, pd) = fixture().await;

        let data = service.start_form_data(pd).await.unwrap();
        assert_eq!(data.fields.len(), 2);
        assert_eq!(data.field("currency").unwrap().value, Some(TypedValue::string("EUR")));

        let key = service.start_form_key(pd).await.unwrap();
        assert_eq!(key.as_deref(), Some("forms/expense-start"));

        let vars = service.start_form_variables(pd, Some(&["amount"][..])).await.unwrap();
        assert!(vars.is_empty());
    }

    #[tokio::test]
    async fn submit_start_form_creates_instance() {
        let (service, pd) = fixture().await;

        let instance = service
            .submit_start_form_with_business_key(
                pd,
                "order-1",
                VariableMap::from([("amount".to_string(), TypedValue::long(10))]),
            )
            .await
            .unwrap();
        assert_eq!(instance.process_definition_id, pd);
        assert_eq!(instance.business_key.as_deref(), Some("order-1"));
    }

    #[tokio::test]
    async fn render_without_default_engine_is_not_found() {
        let (service, pd) = fixture().await;

        let err = service.rendered_start_form(pd, None).await.unwrap_err();
        assert!(matches!(err, FormError::NotFound { entity: EntityKind::FormEngine, .. }));

        let rendered = service.rendered_start_form(pd, Some("json")).await.unwrap();
        assert_eq!(rendered.content_type, "application/json");
    }
}
