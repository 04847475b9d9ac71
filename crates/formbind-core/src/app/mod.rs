//! App - アプリケーション層
//!
//! ports を組み合わせてフォーム層のロジックを実装します。
//!
//! # 主要コンポーネント
//! - **VariableScopeResolver**: スコープチェーンをたどって変数を解決
//! - **assemble**: 宣言済みフィールドと解決結果を FormData にまとめる
//! - **SubmissionExecutor**: 検証 → 適用の送信トランザクション
//! - **FormEngineRegistry**: 名前で引く描画エンジン
//! - **FormServiceBuilder / FormService**: ワイヤリングと公開 API

pub mod assembler;
pub mod builder;
pub mod config;
pub mod executor;
pub mod registry;
pub mod resolver;
pub mod service;

pub use self::assembler::assemble;
pub use self::builder::{BuildError, FormServiceBuilder};
pub use self::config::{FormServiceConfig, UndeclaredVariablePolicy};
pub use self::executor::SubmissionExecutor;
pub use self::registry::{FormEngineRegistry, RegistryError};
pub use self::resolver::{NameFilter, TaskContext, VariableScopeResolver};
pub use self::service::FormService;
