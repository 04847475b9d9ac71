//! Submission requests, results and the unit-of-work commands sent to the
//! runtime store.

use serde::{Deserialize, Serialize};

use super::ids::{ProcessDefinitionId, ScopeId, TaskId};
use super::scope::ProcessInstanceRef;
use super::value::{TypedValue, VariableMap};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubmissionTarget {
    StartProcess {
        process_definition_id: ProcessDefinitionId,
        /// Unique among active instances of the same definition.
        business_key: Option<String>,
    },
    CompleteTask {
        task_id: TaskId,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub target: SubmissionTarget,
    pub variables: VariableMap,
}

impl SubmissionRequest {
    pub fn start(process_definition_id: ProcessDefinitionId, variables: VariableMap) -> Self {
        Self {
            target: SubmissionTarget::StartProcess {
                process_definition_id,
                business_key: None,
            },
            variables,
        }
    }

    pub fn complete(task_id: TaskId, variables: VariableMap) -> Self {
        Self {
            target: SubmissionTarget::CompleteTask { task_id },
            variables,
        }
    }

    /// Only meaningful for `StartProcess`; ignored on task completion.
    pub fn with_business_key(mut self, key: impl Into<String>) -> Self {
        if let SubmissionTarget::StartProcess { business_key, .. } = &mut self.target {
            *business_key = Some(key.into());
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubmissionResult {
    Started(ProcessInstanceRef),
    Completed,
}

/// One variable write inside a task-completion unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableWrite {
    pub scope_id: ScopeId,
    pub name: String,
    pub value: TypedValue,
}

/// Scope revision observed while validating; the store rejects the unit of
/// work if it moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedRevision {
    pub scope_id: ScopeId,
    pub revision: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartProcessCommand {
    pub process_definition_id: ProcessDefinitionId,
    pub business_key: Option<String>,
    /// Initial variables of the new root scope.
    pub variables: VariableMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteTaskCommand {
    pub task_id: TaskId,
    pub expected_task_revision: u64,
    pub expected_scopes: Vec<ObservedRevision>,
    pub writes: Vec<VariableWrite>,
}
