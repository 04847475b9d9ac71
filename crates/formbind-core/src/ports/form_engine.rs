//! FormEngine port - フォーム描画エンジン
//!
//! 描画技術は差し替え可能。名前で登録され、起動後は読み取り専用です。

use serde::{Deserialize, Serialize};

use crate::domain::{FormData, FormError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedForm {
    /// Name of the engine that produced it.
    pub engine: String,
    pub content_type: String,
    pub body: String,
}

/// FormEngine は FormData を UI 成果物に変換する
///
/// # Object Safety
/// - `Arc<dyn FormEngine>` としてレジストリに格納される
pub trait FormEngine: Send + Sync {
    fn name(&self) -> &str;

    fn render(&self, form: &FormData) -> Result<RenderedForm, FormError>;
}
