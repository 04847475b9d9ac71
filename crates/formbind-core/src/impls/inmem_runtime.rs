//! InMemoryRuntimeStore - 開発用・テスト用の実行ツリー
//!
//! # 実装詳細
//! - scopes / tasks / instances を 1 つの Mutex で保護（single source of truth）
//! - unit of work は「検証 → ステージング → hook → 反映」の順で、
//!   hook が拒否した場合はステージしたコピーを捨てるだけでロールバックになる
//! - 楽観ロック: TaskRecord / ScopeNode の revision をコマンドの期待値と比較

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    CompleteTaskCommand, EntityKind, FormError, ProcessDefinitionId, ProcessInstanceId,
    ProcessInstanceRef, ScopeId, ScopeKind, ScopeNode, ScopeState, StartProcessCommand, TaskId,
    TaskRecord, TaskState, TypedValue, VariableMap, VariableWrite,
};
use crate::ports::{Clock, IdGenerator, RuntimeStore, SystemClock, UlidGenerator};

/// Engine transition about to be committed.
#[derive(Debug)]
pub enum Transition<'a> {
    Start {
        instance: &'a ProcessInstanceRef,
        variables: &'a VariableMap,
    },
    CompleteTask {
        task: &'a TaskRecord,
        writes: &'a [VariableWrite],
    },
}

/// Engine listener that may veto a transition. A veto rolls back the whole
/// unit of work, variable writes included.
pub trait TransitionHook: Send + Sync {
    fn before_commit(&self, transition: &Transition<'_>) -> Result<(), String>;
}

#[derive(Default)]
struct RuntimeState {
    instances: HashMap<ProcessInstanceId, ProcessInstanceRef>,
    scopes: HashMap<ScopeId, ScopeNode>,
    tasks: HashMap<TaskId, TaskRecord>,
}

impl RuntimeState {
    fn scope_mut(&mut self, scope_id: ScopeId) -> Result<&mut ScopeNode, FormError> {
        self.scopes
            .get_mut(&scope_id)
            .ok_or_else(|| FormError::not_found(EntityKind::Scope, scope_id))
    }

    fn active_scope(&self, scope_id: ScopeId) -> Result<&ScopeNode, FormError> {
        let scope = self
            .scopes
            .get(&scope_id)
            .ok_or_else(|| FormError::not_found(EntityKind::Scope, scope_id))?;
        if scope.state != ScopeState::Active {
            return Err(FormError::InvalidState(format!(
                "scope {scope_id} is {:?}",
                scope.state
            )));
        }
        Ok(scope)
    }

    /// business key は同じ定義のアクティブなインスタンス間で一意
    fn business_key_in_use(&self, process_definition_id: ProcessDefinitionId, key: &str) -> bool {
        self.instances.values().any(|instance| {
            instance.process_definition_id == process_definition_id
                && instance.business_key.as_deref() == Some(key)
                && self
                    .scopes
                    .get(&instance.root_scope_id)
                    .is_some_and(|root| root.state == ScopeState::Active)
        })
    }
}

pub struct InMemoryRuntimeStore {
    state: Arc<Mutex<RuntimeState>>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    hooks: Vec<Arc<dyn TransitionHook>>,
    /// Simulated latency before a unit of work reaches the lock.
    commit_delay: Option<Duration>,
}

impl InMemoryRuntimeStore {
    pub fn new(ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(RuntimeState::default())),
            ids,
            clock,
            hooks: Vec::new(),
            commit_delay: None,
        }
    }

    pub fn with_hook(mut self, hook: Arc<dyn TransitionHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn with_commit_delay(mut self, delay: Duration) -> Self {
        self.commit_delay = Some(delay);
        self
    }

    fn run_hooks(&self, transition: &Transition<'_>) -> Result<(), FormError> {
        for hook in &self.hooks {
            hook.before_commit(transition).map_err(FormError::Transition)?;
        }
        Ok(())
    }

    async fn simulate_latency(&self) {
        if let Some(delay) = self.commit_delay {
            tokio::time::sleep(delay).await;
        }
    }

    // ────────────────────────────────────────────────────────────────────────
    // Engine-side operations (the runtime advancing the execution tree)
    // ────────────────────────────────────────────────────────────────────────

    /// Create a child scope (sub-process or concurrent path) under `parent`.
    pub async fn spawn_scope(
        &self,
        parent: ScopeId,
        kind: ScopeKind,
        variables: VariableMap,
    ) -> Result<ScopeId, FormError> {
        let mut state = self.state.lock().await;
        let process_instance_id = state.active_scope(parent)?.process_instance_id;
        let id = self.ids.generate_scope_id();
        state.scopes.insert(
            id,
            ScopeNode {
                id,
                parent: Some(parent),
                process_instance_id,
                kind,
                state: ScopeState::Active,
                variables,
                revision: 1,
            },
        );
        Ok(id)
    }

    /// Create an open task living in `scope_id`.
    pub async fn create_task(
        &self,
        scope_id: ScopeId,
        task_definition_key: impl Into<String>,
    ) -> Result<TaskId, FormError> {
        let mut state = self.state.lock().await;
        let process_instance_id = state.active_scope(scope_id)?.process_instance_id;
        let process_definition_id = state
            .instances
            .get(&process_instance_id)
            .map(|i| i.process_definition_id)
            .ok_or_else(|| FormError::not_found(EntityKind::ProcessInstance, process_instance_id))?;
        let id = self.ids.generate_task_id();
        state.tasks.insert(
            id,
            TaskRecord {
                id,
                task_definition_key: task_definition_key.into(),
                process_definition_id,
                process_instance_id,
                scope_id,
                state: TaskState::Open,
                revision: 1,
                created_at: self.clock.now(),
            },
        );
        Ok(id)
    }

    /// Bind a variable directly on a scope, bumping its revision.
    pub async fn set_variable(
        &self,
        scope_id: ScopeId,
        name: impl Into<String>,
        value: TypedValue,
    ) -> Result<(), FormError> {
        let mut state = self.state.lock().await;
        let scope = state.scope_mut(scope_id)?;
        scope.variables.insert(name.into(), value);
        scope.revision += 1;
        Ok(())
    }

    /// First phase of a teardown: every scope of the instance becomes `Removing`.
    pub async fn mark_removing(&self, instance_id: ProcessInstanceId) -> Result<(), FormError> {
        let mut state = self.state.lock().await;
        if !state.instances.contains_key(&instance_id) {
            return Err(FormError::not_found(EntityKind::ProcessInstance, instance_id));
        }
        for scope in state
            .scopes
            .values_mut()
            .filter(|s| s.process_instance_id == instance_id)
        {
            scope.state = ScopeState::Removing;
            scope.revision += 1;
        }
        Ok(())
    }

    /// Remove the instance with all its scopes and tasks.
    pub async fn delete_process_instance(&self, instance_id: ProcessInstanceId) -> Result<(), FormError> {
        let mut state = self.state.lock().await;
        state
            .instances
            .remove(&instance_id)
            .ok_or_else(|| FormError::not_found(EntityKind::ProcessInstance, instance_id))?;
        state.scopes.retain(|_, s| s.process_instance_id != instance_id);
        state.tasks.retain(|_, t| t.process_instance_id != instance_id);
        tracing::debug!(%instance_id, "deleted process instance");
        Ok(())
    }

    pub async fn process_instance(&self, instance_id: ProcessInstanceId) -> Option<ProcessInstanceRef> {
        self.state.lock().await.instances.get(&instance_id).cloned()
    }

    pub async fn process_instances_of(
        &self,
        process_definition_id: ProcessDefinitionId,
    ) -> Vec<ProcessInstanceRef> {
        let state = self.state.lock().await;
        let mut instances: Vec<_> = state
            .instances
            .values()
            .filter(|i| i.process_definition_id == process_definition_id)
            .cloned()
            .collect();
        instances.sort_by_key(|i| i.id);
        instances
    }

    pub async fn open_tasks(&self, instance_id: ProcessInstanceId) -> Vec<TaskRecord> {
        let state = self.state.lock().await;
        let mut tasks: Vec<_> = state
            .tasks
            .values()
            .filter(|t| t.process_instance_id == instance_id && t.state == TaskState::Open)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.id);
        tasks
    }
}

impl Default for InMemoryRuntimeStore {
    fn default() -> Self {
        Self::new(Arc::new(UlidGenerator::new(SystemClock)), Arc::new(SystemClock))
    }
}

#[async_trait]
impl RuntimeStore for InMemoryRuntimeStore {
    async fn task(&self, task_id: TaskId) -> Result<TaskRecord, FormError> {
        let state = self.state.lock().await;
        state
            .tasks
            .get(&task_id)
            .cloned()
            .ok_or_else(|| FormError::not_found(EntityKind::Task, task_id))
    }

    async fn scope(&self, scope_id: ScopeId) -> Result<ScopeNode, FormError> {
        let state = self.state.lock().await;
        state
            .scopes
            .get(&scope_id)
            .cloned()
            .ok_or_else(|| FormError::not_found(EntityKind::Scope, scope_id))
    }

    async fn start_process_instance(
        &self,
        command: StartProcessCommand,
    ) -> Result<ProcessInstanceRef, FormError> {
        self.simulate_latency().await;
        let mut state = self.state.lock().await;

        if let Some(key) = command.business_key.as_deref()
            && state.business_key_in_use(command.process_definition_id, key)
        {
            return Err(FormError::Conflict {
                process_definition_id: command.process_definition_id.to_string(),
                business_key: key.to_string(),
            });
        }

        // Stage
        let instance = ProcessInstanceRef {
            id: self.ids.generate_process_instance_id(),
            process_definition_id: command.process_definition_id,
            business_key: command.business_key,
            root_scope_id: self.ids.generate_scope_id(),
        };
        let root = ScopeNode {
            id: instance.root_scope_id,
            parent: None,
            process_instance_id: instance.id,
            kind: ScopeKind::ProcessInstance,
            state: ScopeState::Active,
            variables: command.variables,
            revision: 1,
        };

        self.run_hooks(&Transition::Start {
            instance: &instance,
            variables: &root.variables,
        })?;

        // Commit
        state.scopes.insert(root.id, root);
        state.instances.insert(instance.id, instance.clone());
        Ok(instance)
    }

    async fn complete_task(&self, command: CompleteTaskCommand) -> Result<(), FormError> {
        self.simulate_latency().await;
        let mut state = self.state.lock().await;

        let task = state
            .tasks
            .get(&command.task_id)
            .ok_or_else(|| FormError::not_found(EntityKind::Task, command.task_id))?;
        if task.state != TaskState::Open {
            return Err(FormError::InvalidState(format!(
                "task {} already completed",
                command.task_id
            )));
        }
        if task.revision != command.expected_task_revision {
            return Err(FormError::Concurrency {
                entity: EntityKind::Task,
                id: command.task_id.to_string(),
                expected: command.expected_task_revision,
                actual: task.revision,
            });
        }
        let mut staged_task = task.clone();

        for observed in &command.expected_scopes {
            let scope = state.active_scope(observed.scope_id).map_err(|e| match e {
                FormError::NotFound { .. } => {
                    FormError::InvalidState(format!("scope {} was removed", observed.scope_id))
                }
                other => other,
            })?;
            if scope.revision != observed.revision {
                return Err(FormError::Concurrency {
                    entity: EntityKind::Scope,
                    id: observed.scope_id.to_string(),
                    expected: observed.revision,
                    actual: scope.revision,
                });
            }
        }

        // Stage: copies of every written scope
        let mut staged: HashMap<ScopeId, ScopeNode> = HashMap::new();
        for write in &command.writes {
            if !staged.contains_key(&write.scope_id) {
                let scope = state.active_scope(write.scope_id)?.clone();
                staged.insert(write.scope_id, scope);
            }
            if let Some(scope) = staged.get_mut(&write.scope_id) {
                scope.variables.insert(write.name.clone(), write.value.clone());
            }
        }
        staged_task.state = TaskState::Completed;
        staged_task.revision += 1;

        self.run_hooks(&Transition::CompleteTask {
            task: &staged_task,
            writes: &command.writes,
        })?;

        // Commit
        for (scope_id, mut scope) in staged {
            scope.revision += 1;
            state.scopes.insert(scope_id, scope);
        }
        state.tasks.insert(staged_task.id, staged_task);
        Ok(())
    }
}
