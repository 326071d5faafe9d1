// Copyright (c) Asymptotic
// SPDX-License-Identifier: Apache-2.0

//! Variable scopes
//!
//! Each code block owns one [`Scope`]; chaining to the enclosing block goes
//! through the block tree (see [`crate::BlockTree::lookup`]), which walks
//! outward until the name is found or the chain is exhausted.

use flow_model::DataType;
use std::collections::BTreeMap;
use thiserror::Error;

/// A variable was referenced but never declared in any enclosing scope.
/// Fatal for the procedure: either the model is malformed or a step kind is
/// not implemented by the supplied emitters.
#[derive(Debug, Error)]
#[error("variable {name} is not declared in any enclosing scope")]
pub struct ScopeError {
    pub name: String,
}

/// Lexical environment of one code block: variable name to declared type.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    bindings: BTreeMap<String, DataType>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert into this scope. Re-declaring within the same scope overwrites;
    /// shadowing an outer scope is legal and intentional (type-dispatch
    /// branches re-declare the dispatch variable with a narrowed type).
    pub fn declare(&mut self, name: impl Into<String>, data_type: DataType) {
        self.bindings.insert(name.into(), data_type);
    }

    /// Lookup in this scope only; chain walking lives on the block tree.
    pub fn get(&self, name: &str) -> Option<&DataType> {
        self.bindings.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
