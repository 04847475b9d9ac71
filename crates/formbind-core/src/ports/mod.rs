//! Ports - 抽象化レイヤー
//!
//! フォーム層が依存する外部コラボレーター（定義ストア、実行時ストア、
//! 描画エンジン）へのインターフェースです。実装の詳細は impls か別クレートに置きます。

pub mod clock;
pub mod definition_store;
pub mod form_engine;
pub mod id_generator;
pub mod runtime_store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::definition_store::DefinitionStore;
pub use self::form_engine::{FormEngine, RenderedForm};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::runtime_store::RuntimeStore;
