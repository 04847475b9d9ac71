//! Resolved variables.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ids::ScopeId;
use super::value::TypedValue;

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableOrigin {
    /// Bound in a live scope of the execution tree.
    Live,
    /// Only a declared field default; no live value yet.
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableInstance {
    pub name: String,
    pub value: TypedValue,
    /// Scope the binding was found in. None for defaults.
    pub scope_id: Option<ScopeId>,
    pub origin: VariableOrigin,
}

impl VariableInstance {
    pub fn live(name: impl Into<String>, value: TypedValue, scope_id: ScopeId) -> Self {
        Self {
            name: name.into(),
            value,
            scope_id: Some(scope_id),
            origin: VariableOrigin::Live,
        }
    }

    pub fn default_only(name: impl Into<String>, value: TypedValue) -> Self {
        Self {
            name: name.into(),
            value,
            scope_id: None,
            origin: VariableOrigin::Default,
        }
    }

    pub fn is_live(&self) -> bool {
        self.origin == VariableOrigin::Live
    }
}

/// name → VariableInstance。名前ごとに高々 1 件（最も内側のスコープが勝つ）
pub type ResolvedVariables = BTreeMap<String, VariableInstance>;
