//! SubmissionExecutor - 送信の検証と適用
//!
//! # フロー
//! 1. Validating: 宣言を読み直し、送信値を型変換して validator を順に適用
//!    （ここでは一切書き込まない）
//! 2. Applying: unit of work を RuntimeStore に渡す
//!    （変数の書き込み + インスタンス生成 / タスク完了が一体）
//! 3. Committed: ストアの commit 通知を受け取ったときだけ
//!
//! 検証で落ちたら Rejected、適用で落ちたら Failed。どちらも副作用は残らない。

use std::sync::Arc;

use crate::app::config::{FormServiceConfig, UndeclaredVariablePolicy};
use crate::app::resolver::{collect, TaskContext, VariableScopeResolver};
use crate::domain::{
    CompleteTaskCommand, FormDefinitionRef, FormError, ObservedRevision, ProcessDefinitionId,
    ResolvedVariables, ScopeId, StartProcessCommand, SubmissionRequest, SubmissionResult,
    SubmissionState, SubmissionTarget, TaskId, VariableMap, VariableWrite,
};
use crate::ports::{DefinitionStore, RuntimeStore};

const UNDECLARED: &str = "undeclared";

/// Unit of work prepared by the Validating phase.
#[derive(Debug, Clone, PartialEq)]
enum ApplyPlan {
    Start(StartProcessCommand),
    Complete(CompleteTaskCommand),
}

#[derive(Clone)]
pub struct SubmissionExecutor {
    resolver: VariableScopeResolver,
    definitions: Arc<dyn DefinitionStore>,
    runtime: Arc<dyn RuntimeStore>,
    config: FormServiceConfig,
}

impl SubmissionExecutor {
    pub fn new(
        definitions: Arc<dyn DefinitionStore>,
        runtime: Arc<dyn RuntimeStore>,
        config: FormServiceConfig,
    ) -> Self {
        Self {
            resolver: VariableScopeResolver::new(definitions.clone(), runtime.clone()),
            definitions,
            runtime,
            config,
        }
    }

    pub async fn submit(&self, request: SubmissionRequest) -> Result<SubmissionResult, FormError> {
        let mut state = SubmissionState::Validating;

        let plan = match self.validate(request).await {
            Ok(plan) => plan,
            Err(err) => {
                state = state.transition(SubmissionState::Rejected)?;
                tracing::warn!(?state, error = %err, "submission rejected");
                return Err(err);
            }
        };

        state = state.transition(SubmissionState::Applying)?;
        match self.apply(plan).await {
            Ok(result) => {
                state = state.transition(SubmissionState::Committed)?;
                match &result {
                    SubmissionResult::Started(instance) => tracing::info!(
                        ?state,
                        process_instance_id = %instance.id,
                        business_key = ?instance.business_key,
                        "start form submitted"
                    ),
                    SubmissionResult::Completed => {
                        tracing::info!(?state, "task form submitted")
                    }
                }
                Ok(result)
            }
            Err(err) => {
                state = state.transition(SubmissionState::Failed)?;
                tracing::warn!(?state, error = %err, "submission failed, nothing applied");
                Err(err)
            }
        }
    }

    async fn validate(&self, request: SubmissionRequest) -> Result<ApplyPlan, FormError> {
        match request.target {
            SubmissionTarget::StartProcess {
                process_definition_id,
                business_key,
            } => {
                self.validate_start(process_definition_id, business_key, request.variables)
                    .await
            }
            SubmissionTarget::CompleteTask { task_id } => {
                self.validate_task(task_id, request.variables).await
            }
        }
    }

    async fn validate_start(
        &self,
        process_definition_id: ProcessDefinitionId,
        business_key: Option<String>,
        submitted: VariableMap,
    ) -> Result<ApplyPlan, FormError> {
        let form = self.definitions.start_form(process_definition_id).await?;
        // No instance yet, so nothing is visible beyond the submission itself.
        let variables = validate_fields(
            &form,
            &submitted,
            &ResolvedVariables::new(),
            self.config.undeclared_variables,
        )?;
        Ok(ApplyPlan::Start(StartProcessCommand {
            process_definition_id,
            business_key,
            variables,
        }))
    }

    async fn validate_task(&self, task_id: TaskId, submitted: VariableMap) -> Result<ApplyPlan, FormError> {
        let context = self.resolver.task_context(task_id).await?;
        let visible = collect(&context.chain, &context.form, None);
        let variables = validate_fields(
            &context.form,
            &submitted,
            &visible,
            self.config.undeclared_variables,
        )?;

        let mut writes = Vec::with_capacity(variables.len());
        for (name, value) in variables {
            let scope_id = target_scope(&context, &visible, &name, self.config.undeclared_variables)?;
            writes.push(VariableWrite {
                scope_id,
                name,
                value,
            });
        }

        let expected_scopes = observed_revisions(&context, &writes);

        tracing::debug!(
            %task_id,
            writes = writes.len(),
            scopes = expected_scopes.len(),
            "task submission validated"
        );
        Ok(ApplyPlan::Complete(CompleteTaskCommand {
            task_id,
            expected_task_revision: context.task.revision,
            expected_scopes,
            writes,
        }))
    }

    /// `Committed` only after the store's own commit signal; a timeout drops
    /// the pending unit of work.
    async fn apply(&self, plan: ApplyPlan) -> Result<SubmissionResult, FormError> {
        let work = async {
            match plan {
                ApplyPlan::Start(command) => self
                    .runtime
                    .start_process_instance(command)
                    .await
                    .map(SubmissionResult::Started),
                ApplyPlan::Complete(command) => self
                    .runtime
                    .complete_task(command)
                    .await
                    .map(|()| SubmissionResult::Completed),
            }
        };
        match self.config.apply_timeout() {
            Some(timeout) => tokio::time::timeout(timeout, work).await.map_err(|_| {
                FormError::Timeout {
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                }
            })?,
            None => work.await,
        }
    }
}

/// 宣言順にフィールドを検証し、書き込む値の一覧を返す
///
/// - 送信値はフィールド型へ変換（失敗は `type(<name>)`）
/// - validator は宣言順、最初の違反で終了
/// - 送信されず live 値も無いフィールドは default を採用
/// - 宣言外の名前は policy に従う
fn validate_fields(
    form: &FormDefinitionRef,
    submitted: &VariableMap,
    visible: &ResolvedVariables,
    policy: UndeclaredVariablePolicy,
) -> Result<VariableMap, FormError> {
    let mut values = VariableMap::new();

    for field in &form.fields {
        let coerced = match submitted.get(&field.name) {
            Some(raw) => Some(field.field_type.coerce(raw).ok_or_else(|| {
                FormError::validation(&field.name, format!("type({})", field.field_type.name()))
            })?),
            None => None,
        };
        let existing = visible
            .get(&field.name)
            .filter(|v| v.is_live())
            .map(|v| &v.value);

        for constraint in &field.validators {
            if !constraint.check(coerced.as_ref(), existing) {
                return Err(FormError::validation(&field.name, constraint));
            }
        }

        match coerced {
            Some(value) => {
                values.insert(field.name.clone(), value);
            }
            None if existing.is_none() => {
                if let Some(default) = &field.default_value {
                    match field.field_type.coerce(default) {
                        Some(value) => {
                            values.insert(field.name.clone(), value);
                        }
                        None => tracing::warn!(
                            field = %field.name,
                            field_type = field.field_type.name(),
                            "declared default does not match field type, not bound"
                        ),
                    }
                }
            }
            None => {}
        }
    }

    for (name, value) in submitted {
        if form.declares(name) {
            continue;
        }
        let already_visible = visible.get(name).is_some_and(|v| v.is_live());
        if policy == UndeclaredVariablePolicy::Reject && !already_visible {
            return Err(FormError::validation(name.as_str(), UNDECLARED));
        }
        values.insert(name.clone(), value.clone());
    }

    Ok(values)
}

/// タスクのスコープから最も外側の書き込み先までの revision をすべて記録する
///
/// 書き込まないスコープも含める: 途中のスコープに同名の変数が束縛されると
/// 書き込み先の選択（shadowing）が変わるため。
fn observed_revisions(context: &TaskContext, writes: &[VariableWrite]) -> Vec<ObservedRevision> {
    let outermost = writes
        .iter()
        .filter_map(|w| context.chain.iter().position(|s| s.id == w.scope_id))
        .max();
    match outermost {
        Some(depth) => context.chain[..=depth]
            .iter()
            .map(|scope| ObservedRevision {
                scope_id: scope.id,
                revision: scope.revision,
            })
            .collect(),
        None => Vec::new(),
    }
}

/// 書き込み先: 同名の live 変数を持つ最も近いスコープ、無ければ policy
fn target_scope(
    context: &TaskContext,
    visible: &ResolvedVariables,
    name: &str,
    policy: UndeclaredVariablePolicy,
) -> Result<ScopeId, FormError> {
    if let Some(scope_id) = visible
        .get(name)
        .filter(|v| v.is_live())
        .and_then(|v| v.scope_id)
    {
        return Ok(scope_id);
    }
    let declared = context.form.declares(name);
    match policy {
        UndeclaredVariablePolicy::Root if !declared => context
            .root()
            .map(|root| root.id)
            .ok_or_else(|| FormError::InvalidState(format!("task {} has no root scope", context.task.id))),
        _ => Ok(context.task.scope_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Constraint, FieldDescriptor, FieldType, ProcessInstanceId, ScopeKind, ScopeNode, ScopeState, TaskRecord,
        TaskState, TypedValue, VariableInstance,
    };
    use rstest::rstest;
    use ulid::Ulid;

    fn form() -> FormDefinitionRef {
        FormDefinitionRef {
            process_definition_id: ProcessDefinitionId::from_ulid(Ulid::new()),
            task_definition_key: None,
            form_key: None,
            fields: vec![
                FieldDescriptor::new("amount", FieldType::Long)
                    .with_validator(Constraint::Required)
                    .with_validator(Constraint::Min(1.0)),
                FieldDescriptor::new("currency", FieldType::String).with_default("EUR"),
                FieldDescriptor::new("approved_by", FieldType::String)
                    .with_validator(Constraint::Readonly),
            ],
        }
    }

    fn vars(pairs: &[(&str, TypedValue)]) -> VariableMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn coerces_and_applies_defaults() {
        let values = validate_fields(
            &form(),
            &vars(&[("amount", TypedValue::string("12"))]),
            &ResolvedVariables::new(),
            UndeclaredVariablePolicy::Local,
        )
        .unwrap();

        assert_eq!(values["amount"], TypedValue::long(12));
        assert_eq!(values["currency"], TypedValue::string("EUR"));
        assert!(!values.contains_key("approved_by"));
    }

    #[rstest]
    #[case::missing_required(vec![], "amount", "required")]
    #[case::below_min(vec![("amount", TypedValue::long(0))], "amount", "min(1)")]
    #[case::bad_type(vec![("amount", TypedValue::string("lots"))], "amount", "type(long)")]
    #[case::readonly(
        vec![("amount", TypedValue::long(3)), ("approved_by", TypedValue::string("me"))],
        "approved_by",
        "readonly"
    )]
    #[case::readonly_null(
        vec![("amount", TypedValue::long(3)), ("approved_by", TypedValue::null())],
        "approved_by",
        "readonly"
    )]
    #[case::required_null(vec![("amount", TypedValue::null())], "amount", "required")]
    fn first_violation_rejects(
        #[case] submitted: Vec<(&str, TypedValue)>,
        #[case] field: &str,
        #[case] constraint: &str,
    ) {
        let err = validate_fields(
            &form(),
            &vars(&submitted),
            &ResolvedVariables::new(),
            UndeclaredVariablePolicy::Local,
        )
        .unwrap_err();
        assert_eq!(
            err,
            FormError::Validation {
                field: field.to_string(),
                constraint: constraint.to_string(),
            }
        );
    }

    #[test]
    fn required_is_satisfied_by_visible_live_value() {
        let visible = ResolvedVariables::from([(
            "amount".to_string(),
            VariableInstance::live("amount", TypedValue::long(5), ScopeId::from_ulid(Ulid::new())),
        )]);

        let values = validate_fields(&form(), &VariableMap::new(), &visible, UndeclaredVariablePolicy::Local)
            .unwrap();
        // live 値は書き直さない
        assert!(!values.contains_key("amount"));
        assert_eq!(values["currency"], TypedValue::string("EUR"));
    }

    #[test]
    fn undeclared_names_follow_policy() {
        let submitted = vars(&[
            ("amount", TypedValue::long(3)),
            ("note", TypedValue::string("hi")),
        ]);

        let values = validate_fields(
            &form(),
            &submitted,
            &ResolvedVariables::new(),
            UndeclaredVariablePolicy::Local,
        )
        .unwrap();
        assert_eq!(values["note"], TypedValue::string("hi"));

        let err = validate_fields(
            &form(),
            &submitted,
            &ResolvedVariables::new(),
            UndeclaredVariablePolicy::Reject,
        )
        .unwrap_err();
        assert_eq!(err, FormError::validation("note", "undeclared"));

        // 既にスコープにある名前は reject されない
        let visible = ResolvedVariables::from([(
            "note".to_string(),
            VariableInstance::live("note", TypedValue::string("old"), ScopeId::from_ulid(Ulid::new())),
        )]);
        let values = validate_fields(&form(), &submitted, &visible, UndeclaredVariablePolicy::Reject)
            .unwrap();
        assert_eq!(values["note"], TypedValue::string("hi"));
    }

    #[test]
    fn required_null_is_not_satisfied_by_live_value() {
        let visible = ResolvedVariables::from([(
            "amount".to_string(),
            VariableInstance::live("amount", TypedValue::long(5), ScopeId::from_ulid(Ulid::new())),
        )]);

        let err = validate_fields(
            &form(),
            &vars(&[("amount", TypedValue::null())]),
            &visible,
            UndeclaredVariablePolicy::Local,
        )
        .unwrap_err();
        assert_eq!(err, FormError::validation("amount", "required"));
    }

    #[test]
    fn mistyped_default_is_not_bound() {
        let mut form = form();
        form.fields
            .push(FieldDescriptor::new("due", FieldType::Long).with_default("someday"));

        let values = validate_fields(
            &form,
            &vars(&[("amount", TypedValue::long(3))]),
            &ResolvedVariables::new(),
            UndeclaredVariablePolicy::Local,
        )
        .unwrap();
        assert!(!values.contains_key("due"));
        assert_eq!(values["currency"], TypedValue::string("EUR"));
    }

    fn scope(parent: Option<ScopeId>, revision: u64) -> ScopeNode {
        ScopeNode {
            id: ScopeId::from_ulid(Ulid::new()),
            parent,
            process_instance_id: ProcessInstanceId::from_ulid(Ulid::new()),
            kind: if parent.is_none() { ScopeKind::ProcessInstance } else { ScopeKind::SubProcess },
            state: ScopeState::Active,
            variables: VariableMap::new(),
            revision,
        }
    }

    /// task → sub → mid → root の chain
    fn context() -> TaskContext {
        let root = scope(None, 4);
        let mid = scope(Some(root.id), 3);
        let sub = scope(Some(mid.id), 2);
        let task = TaskRecord {
            id: TaskId::from_ulid(Ulid::new()),
            task_definition_key: "review".to_string(),
            process_definition_id: ProcessDefinitionId::from_ulid(Ulid::new()),
            process_instance_id: root.process_instance_id,
            scope_id: sub.id,
            state: TaskState::Open,
            revision: 1,
            created_at: chrono::Utc::now(),
        };
        TaskContext {
            task,
            form: form(),
            chain: vec![sub, mid, root],
        }
    }

    fn write(scope_id: ScopeId) -> VariableWrite {
        VariableWrite {
            scope_id,
            name: "x".to_string(),
            value: TypedValue::long(1),
        }
    }

    #[test]
    fn observed_revisions_cover_every_scope_up_to_outermost_write() {
        let ctx = context();
        let ids: Vec<_> = ctx.chain.iter().map(|s| s.id).collect();

        // root にだけ書いても、間の sub と mid が観測される
        let observed = observed_revisions(&ctx, &[write(ids[2])]);
        assert_eq!(
            observed,
            vec![
                ObservedRevision { scope_id: ids[0], revision: 2 },
                ObservedRevision { scope_id: ids[1], revision: 3 },
                ObservedRevision { scope_id: ids[2], revision: 4 },
            ]
        );

        let observed = observed_revisions(&ctx, &[write(ids[0])]);
        assert_eq!(observed, vec![ObservedRevision { scope_id: ids[0], revision: 2 }]);

        assert!(observed_revisions(&ctx, &[]).is_empty());
    }
}
