//! Errors - エラー型と分類
//!
//! すべての公開操作は `FormError` を返します。呼び出し側は `kind()` で分類し、
//! `Validation` なら field / constraint を使ってフォームを再描画できます。

use thiserror::Error;

/// ErrorKind はエラーの分類
///
/// - NotFound: 対象 ID が存在しない（リトライ無意味）
/// - Validation: 送信値が宣言済み validator に違反
/// - Conflict: business key の重複
/// - Concurrency: 同じスコープへの同時送信で負けた
/// - InvalidState: スコープが不整合（削除中、完了済みタスクなど）
/// - Transition: エンジンの遷移が失敗し、書き込みはロールバック済み
/// - Timeout: Applying 中に commit 通知が届かなかった
/// - Config: 設定の読み込み失敗
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    Concurrency,
    InvalidState,
    Transition,
    Timeout,
    Config,
}

/// Entity named in a `NotFound` error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    ProcessDefinition,
    TaskDefinition,
    ProcessInstance,
    Scope,
    Task,
    FormEngine,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EntityKind::ProcessDefinition => "process definition",
            EntityKind::TaskDefinition => "task definition",
            EntityKind::ProcessInstance => "process instance",
            EntityKind::Scope => "scope",
            EntityKind::Task => "task",
            EntityKind::FormEngine => "form engine",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: EntityKind, id: String },

    #[error("field '{field}' violates constraint {constraint}")]
    Validation { field: String, constraint: String },

    #[error("business key '{business_key}' already used by an active instance of {process_definition_id}")]
    Conflict {
        process_definition_id: String,
        business_key: String,
    },

    #[error("concurrent modification of {entity} {id} (expected revision {expected}, found {actual})")]
    Concurrency {
        entity: EntityKind,
        id: String,
        expected: u64,
        actual: u64,
    },

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("transition failed, writes rolled back: {0}")]
    Transition(String),

    #[error("submission did not commit within {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("config: {0}")]
    Config(String),
}

impl FormError {
    pub fn not_found(entity: EntityKind, id: impl ToString) -> Self {
        FormError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn validation(field: impl Into<String>, constraint: impl ToString) -> Self {
        FormError::Validation {
            field: field.into(),
            constraint: constraint.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FormError::NotFound { .. } => ErrorKind::NotFound,
            FormError::Validation { .. } => ErrorKind::Validation,
            FormError::Conflict { .. } => ErrorKind::Conflict,
            FormError::Concurrency { .. } => ErrorKind::Concurrency,
            FormError::InvalidState(_) => ErrorKind::InvalidState,
            FormError::Transition(_) => ErrorKind::Transition,
            FormError::Timeout { .. } => ErrorKind::Timeout,
            FormError::Config(_) => ErrorKind::Config,
        }
    }
}
