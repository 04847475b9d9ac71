//! RuntimeStore port - 実行ツリー（ScopeNode / Task）の正本
//!
//! # 設計原則
//! - 変数の書き込みと遷移（インスタンス生成 / タスク完了）は同一の unit of work
//! - 楽観ロック: コマンドは読んだ revision を持ち込み、ズレていれば Concurrency
//! - 読み取りは毎回最新のスナップショットを返す（キャッシュしない）

use async_trait::async_trait;

use crate::domain::{
    CompleteTaskCommand, FormError, ProcessInstanceRef, ScopeId, ScopeNode, StartProcessCommand,
    TaskId, TaskRecord,
};

#[async_trait]
pub trait RuntimeStore: Send + Sync {
    /// Snapshot of a task. Unknown id is `NotFound`.
    async fn task(&self, task_id: TaskId) -> Result<TaskRecord, FormError>;

    /// Snapshot of a scope node. Unknown id is `NotFound`.
    async fn scope(&self, scope_id: ScopeId) -> Result<ScopeNode, FormError>;

    /// Create the root scope, bind the variables and run the start transition,
    /// all or nothing. A duplicate business key is `Conflict`.
    async fn start_process_instance(
        &self,
        command: StartProcessCommand,
    ) -> Result<ProcessInstanceRef, FormError>;

    /// Apply the writes and complete the task, all or nothing.
    ///
    /// - task missing: `NotFound`
    /// - task already completed or a written scope not active: `InvalidState`
    /// - task or scope revision moved: `Concurrency`
    async fn complete_task(&self, command: CompleteTaskCommand) -> Result<(), FormError>;
}
