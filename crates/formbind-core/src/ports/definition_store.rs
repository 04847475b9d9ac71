//! DefinitionStore port - デプロイ済み定義からフォーム宣言を読む
//!
//! 永続化スキーマはこのクレートの外側。ここでは参照だけを定義します。

use async_trait::async_trait;

use crate::domain::{FormDefinitionRef, FormError, ProcessDefinitionId};

/// DefinitionStore はフォーム宣言の読み取り口
///
/// # エラー
/// - 未知の process definition / task definition key は `FormError::NotFound`
#[async_trait]
pub trait DefinitionStore: Send + Sync {
    /// Start form of a process definition.
    async fn start_form(
        &self,
        process_definition_id: ProcessDefinitionId,
    ) -> Result<FormDefinitionRef, FormError>;

    /// Form of a task definition inside a process definition.
    async fn task_form(
        &self,
        process_definition_id: ProcessDefinitionId,
        task_definition_key: &str,
    ) -> Result<FormDefinitionRef, FormError>;
}
