//! Domain identifiers (strongly-typed IDs).
//!
//! # ULID ベースの ID + Phantom type
//! すべての ID は `Id<T>` を共有し、`T` はコンパイル時だけ使うマーカー型です。
//! ProcessDefinitionId と TaskId を取り違えるとコンパイルエラーになります。
//!
//! ## ULID の特性
//! - **時刻でソート可能**: 生成順に並ぶ
//! - **分散生成可能**: ノード間の調整が不要
//! - **UUID互換**: 128-bit

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
///
/// Display で使うプレフィックス（"procdef-", "task-" など）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    /// ULID から Id を作成
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    /// 内部の ULID を取得
    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }

    /// Display 形式（`task-01H...`）またはプレフィックスなしの ULID 文字列から復元
    pub fn parse(value: &str) -> Option<Self> {
        let raw = value.strip_prefix(T::prefix()).unwrap_or(value);
        Ulid::from_string(raw).ok().map(Self::from_ulid)
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

// ========================================
// マーカー型の定義
// ========================================

/// Deployed process definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProcessDefinition {}

impl IdMarker for ProcessDefinition {
    fn prefix() -> &'static str {
        "procdef-"
    }
}

/// Running process instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProcessInstance {}

impl IdMarker for ProcessInstance {
    fn prefix() -> &'static str {
        "procinst-"
    }
}

/// Node of the execution tree that holds variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {}

impl IdMarker for Scope {
    fn prefix() -> &'static str {
        "scope-"
    }
}

/// Human task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Task {}

impl IdMarker for Task {
    fn prefix() -> &'static str {
        "task-"
    }
}

// ========================================
// Type Alias
// ========================================

pub type ProcessDefinitionId = Id<ProcessDefinition>;

pub type ProcessInstanceId = Id<ProcessInstance>;

/// Identifier of a ScopeNode (process instance root, sub-process, concurrent path).
pub type ScopeId = Id<Scope>;

pub type TaskId = Id<Task>;
