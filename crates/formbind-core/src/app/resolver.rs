//! VariableScopeResolver - 変数スコープの解決
//!
//! タスクのスコープから親へ向かって ScopeNode をたどり、見えている変数を集める。
//! 同じ名前が複数のスコープにあれば最も内側が勝つ（shadowing）。
//!
//! # 設計原則
//! - ツリーは ID で参照し、生きたオブジェクトグラフは保持しない
//! - 呼び出しごとに RuntimeStore から読み直す（キャッシュしない）
//! - 途中で不整合（削除中のスコープ、切れた親リンク）を見つけたら
//!   部分的な結果を返さずに InvalidState

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use crate::domain::{
    FormDefinitionRef, FormError, ProcessDefinitionId, ResolvedVariables, ScopeNode, ScopeState,
    TaskId, TaskRecord, TaskState, VariableInstance,
};
use crate::ports::{DefinitionStore, RuntimeStore};

/// Set of variable names a caller is interested in.
pub type NameFilter = BTreeSet<String>;

fn wanted(filter: Option<&NameFilter>, name: &str) -> bool {
    filter.is_none_or(|names| names.contains(name))
}

/// Everything a task-form operation reads, captured once per call.
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub task: TaskRecord,
    pub form: FormDefinitionRef,
    /// Innermost scope first, process-instance root last.
    pub chain: Vec<ScopeNode>,
}

impl TaskContext {
    pub fn root(&self) -> Option<&ScopeNode> {
        self.chain.last()
    }
}

#[derive(Clone)]
pub struct VariableScopeResolver {
    definitions: Arc<dyn DefinitionStore>,
    runtime: Arc<dyn RuntimeStore>,
}

impl VariableScopeResolver {
    pub fn new(definitions: Arc<dyn DefinitionStore>, runtime: Arc<dyn RuntimeStore>) -> Self {
        Self {
            definitions,
            runtime,
        }
    }

    /// 開始フォーム: インスタンスはまだ無いので、宣言済みの default だけが見える
    pub async fn resolve_start(
        &self,
        process_definition_id: ProcessDefinitionId,
        filter: Option<&NameFilter>,
    ) -> Result<(FormDefinitionRef, ResolvedVariables), FormError> {
        let form = self.definitions.start_form(process_definition_id).await?;
        let resolved = collect(&[], &form, filter);
        tracing::debug!(
            %process_definition_id,
            resolved = resolved.len(),
            "resolved start form variables"
        );
        Ok((form, resolved))
    }

    pub async fn resolve_task(
        &self,
        task_id: TaskId,
        filter: Option<&NameFilter>,
    ) -> Result<(TaskContext, ResolvedVariables), FormError> {
        let context = self.task_context(task_id).await?;
        let resolved = collect(&context.chain, &context.form, filter);
        tracing::debug!(
            %task_id,
            depth = context.chain.len(),
            resolved = resolved.len(),
            "resolved task form variables"
        );
        Ok((context, resolved))
    }

    /// Load the task, its declared form and its scope chain.
    pub async fn task_context(&self, task_id: TaskId) -> Result<TaskContext, FormError> {
        let task = self.runtime.task(task_id).await?;
        if task.state != TaskState::Open {
            return Err(FormError::InvalidState(format!("task {task_id} already completed")));
        }
        let form = self
            .definitions
            .task_form(task.process_definition_id, &task.task_definition_key)
            .await?;
        let chain = self.scope_chain(&task).await?;
        Ok(TaskContext { task, form, chain })
    }

    /// Parent-pointer walk from the task's scope to the root.
    async fn scope_chain(&self, task: &TaskRecord) -> Result<Vec<ScopeNode>, FormError> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut next = Some(task.scope_id);

        while let Some(scope_id) = next {
            if !visited.insert(scope_id) {
                return Err(FormError::InvalidState(format!(
                    "scope cycle at {scope_id} above task {}",
                    task.id
                )));
            }
            let scope = match self.runtime.scope(scope_id).await {
                Ok(scope) => scope,
                Err(FormError::NotFound { .. }) => {
                    return Err(FormError::InvalidState(format!(
                        "scope {scope_id} of task {} was removed",
                        task.id
                    )));
                }
                Err(other) => return Err(other),
            };
            if scope.state != ScopeState::Active {
                return Err(FormError::InvalidState(format!(
                    "scope {scope_id} is {:?}",
                    scope.state
                )));
            }
            if scope.process_instance_id != task.process_instance_id {
                return Err(FormError::InvalidState(format!(
                    "scope {scope_id} belongs to {}, not to {}",
                    scope.process_instance_id, task.process_instance_id
                )));
            }
            tracing::trace!(%scope_id, vars = scope.variables.len(), "visited scope");
            next = scope.parent;
            chain.push(scope);
        }
        Ok(chain)
    }
}

/// 純粋関数: chain（内側が先頭）と宣言済み default から解決結果を作る
///
/// - live 値は最も内側のスコープのものを採用
/// - live 値が無く default が宣言されていれば Default として追加
/// - filter 外の名前、値も default も無い名前は結果に含めない
pub fn collect(
    chain: &[ScopeNode],
    form: &FormDefinitionRef,
    filter: Option<&NameFilter>,
) -> ResolvedVariables {
    let mut resolved = ResolvedVariables::new();
    for scope in chain {
        for (name, value) in &scope.variables {
            if wanted(filter, name) && !resolved.contains_key(name) {
                resolved.insert(
                    name.clone(),
                    VariableInstance::live(name.clone(), value.clone(), scope.id),
                );
            }
        }
    }
    for field in &form.fields {
        if !wanted(filter, &field.name) || resolved.contains_key(&field.name) {
            continue;
        }
        if let Some(default) = &field.default_value {
            resolved.insert(
                field.name.clone(),
                VariableInstance::default_only(field.name.clone(), default.clone()),
            );
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        FieldDescriptor, FieldType, ProcessInstanceId, ScopeId, ScopeKind, TypedValue, VariableMap,
        VariableOrigin,
    };
    use ulid::Ulid;

    fn scope(id: ScopeId, parent: Option<ScopeId>, vars: &[(&str, i64)]) -> ScopeNode {
        ScopeNode {
            id,
            parent,
            process_instance_id: ProcessInstanceId::from_ulid(Ulid::nil()),
            kind: if parent.is_some() { ScopeKind::SubProcess } else { ScopeKind::ProcessInstance },
            state: ScopeState::Active,
            variables: vars
                .iter()
                .map(|(k, v)| (k.to_string(), TypedValue::long(*v)))
                .collect::<VariableMap>(),
            revision: 1,
        }
    }

    fn form(fields: Vec<FieldDescriptor>) -> FormDefinitionRef {
        FormDefinitionRef {
            process_definition_id: ProcessDefinitionId::from_ulid(Ulid::nil()),
            task_definition_key: None,
            form_key: None,
            fields,
        }
    }

    #[test]
    fn innermost_scope_wins() {
        let root_id = ScopeId::from_ulid(Ulid::new());
        let child_id = ScopeId::from_ulid(Ulid::new());
        let root = scope(root_id, None, &[("x", 1), ("y", 10)]);
        let child = scope(child_id, Some(root_id), &[("x", 2)]);

        let resolved = collect(&[child, root.clone()], &form(vec![]), None);
        assert_eq!(resolved["x"].value, TypedValue::long(2));
        assert_eq!(resolved["x"].scope_id, Some(child_id));
        assert_eq!(resolved["y"].scope_id, Some(root_id));

        let root_only = collect(&[root], &form(vec![]), None);
        assert_eq!(root_only["x"].value, TypedValue::long(1));
    }

    #[test]
    fn defaults_fill_only_missing_names() {
        let root = scope(ScopeId::from_ulid(Ulid::new()), None, &[("x", 1)]);
        let fields = vec![
            FieldDescriptor::new("x", FieldType::Long).with_default(99_i64),
            FieldDescriptor::new("z", FieldType::Long).with_default(7_i64),
            FieldDescriptor::new("w", FieldType::Long),
        ];

        let resolved = collect(&[root], &form(fields), None);
        assert_eq!(resolved["x"].origin, VariableOrigin::Live);
        assert_eq!(resolved["z"].origin, VariableOrigin::Default);
        assert_eq!(resolved["z"].scope_id, None);
        assert!(!resolved.contains_key("w"));
    }

    #[test]
    fn filter_limits_names() {
        let root = scope(ScopeId::from_ulid(Ulid::new()), None, &[("a", 1), ("b", 2)]);
        let filter = NameFilter::from(["a".to_string(), "missing".to_string()]);

        let resolved = collect(&[root], &form(vec![]), Some(&filter));
        assert_eq!(resolved.keys().collect::<Vec<_>>(), vec!["a"]);
    }
}
