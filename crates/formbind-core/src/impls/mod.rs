//! Impls - ports の実装（開発用・テスト用）
//!
//! # 含まれる実装
//! - **InMemoryDefinitionStore**: デプロイ済み定義
//! - **InMemoryRuntimeStore**: 実行ツリー（scope / task / instance）
//! - **JsonFormEngine**, **HtmlFormEngine**: 組み込みの描画エンジン
//!
//! 本番用のストア実装は別クレートに置く想定です。

pub mod html_engine;
pub mod inmem_definitions;
pub mod inmem_runtime;
pub mod json_engine;

pub use self::html_engine::{HtmlFormEngine, HTML_ENGINE_NAME};
pub use self::inmem_definitions::{InMemoryDefinitionStore, ProcessDefinitionSpec};
pub use self::inmem_runtime::{InMemoryRuntimeStore, Transition, TransitionHook};
pub use self::json_engine::{JsonFormEngine, JSON_ENGINE_NAME};
