//! Runtime snapshots read from the execution tree.
//!
//! The runtime owns and mutates these. The form layer only ever holds
//! snapshots for the duration of one call and links them by id, never by
//! reference.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ProcessDefinitionId, ProcessInstanceId, ScopeId, TaskId};
use super::value::VariableMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    ProcessInstance,
    SubProcess,
    /// Concurrent path (parallel branch, multi-instance body).
    Concurrent,
}

/// ScopeState はスコープのライフサイクル
///
/// - Active -> Removing -> (削除)
/// - Active -> Ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeState {
    Active,
    /// Being torn down concurrently; reads must not trust it.
    Removing,
    Ended,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeNode {
    pub id: ScopeId,
    /// None only for the process-instance root.
    pub parent: Option<ScopeId>,
    pub process_instance_id: ProcessInstanceId,
    pub kind: ScopeKind,
    pub state: ScopeState,
    pub variables: VariableMap,
    /// Optimistic-locking counter, bumped on every committed write.
    pub revision: u64,
}

impl ScopeNode {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Open,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub task_definition_key: String,
    pub process_definition_id: ProcessDefinitionId,
    pub process_instance_id: ProcessInstanceId,
    /// Scope the task lives in; task-form writes land here or above.
    pub scope_id: ScopeId,
    pub state: TaskState,
    pub revision: u64,
    pub created_at: DateTime<Utc>,
}

/// Reference to a process instance, returned by a committed start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInstanceRef {
    pub id: ProcessInstanceId,
    pub process_definition_id: ProcessDefinitionId,
    pub business_key: Option<String>,
    pub root_scope_id: ScopeId,
}
