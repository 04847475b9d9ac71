//! formbind-core
//!
//! Form-binding layer of a process engine: resolves the variables visible to a
//! start or task form, merges them with the declared fields, renders the
//! result through pluggable engines and applies submissions atomically.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, value, form, scope, form_data, submission, state, errors）
//! - **ports**: 抽象化レイヤー（DefinitionStore, RuntimeStore, FormEngine, Clock, IdGenerator）
//! - **app**: アプリケーションロジック（resolver, assembler, executor, registry, builder, service）
//! - **impls**: 実装（インメモリのストアと json / html エンジン）

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;

pub use app::{FormService, FormServiceBuilder, FormServiceConfig};
pub use domain::FormError;
