//! IdGenerator port - ID 生成の抽象化
//!
//! テスト容易性のために trait として抽象化しています。
//!
//! # 実装
//! - **UlidGenerator**: Clock ベースの ULID 生成（本番用）

use crate::domain::ids::{Id, IdMarker, ProcessInstanceId, ScopeId, TaskId};
use crate::domain::ProcessDefinitionId;
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator は runtime / deployment が払い出す ID を生成
///
/// # Thread Safety
/// - `Send + Sync` を要求（ストアの Mutex の内外どちらからでも使える）
pub trait IdGenerator: Send + Sync {
    fn generate_process_definition_id(&self) -> ProcessDefinitionId;

    fn generate_process_instance_id(&self) -> ProcessInstanceId;

    fn generate_scope_id(&self) -> ScopeId;

    fn generate_task_id(&self) -> TaskId;
}

/// UlidGenerator は Clock の現在時刻を timestamp 部に使う
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next<T: IdMarker>(&self) -> Id<T> {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        Id::from(Ulid::from_parts(timestamp_ms, rand::random()))
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_process_definition_id(&self) -> ProcessDefinitionId {
        self.next()
    }

    fn generate_process_instance_id(&self) -> ProcessInstanceId {
        self.next()
    }

    fn generate_scope_id(&self) -> ScopeId {
        self.next()
    }

    fn generate_task_id(&self) -> TaskId {
        self.next()
    }
}
