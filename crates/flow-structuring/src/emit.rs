// Copyright (c) Asymptotic
// SPDX-License-Identifier: Apache-2.0

//! Collaborator contracts
//!
//! The engine's only boundary: an expression translator for the model's
//! embedded mini-language, and a statement emitter per action kind. Both are
//! supplied by the caller; their failures propagate unchanged inside
//! [`crate::StructureError`].

use crate::block::{BlockId, BlockTree};
use crate::scope::ScopeError;
use anyhow::bail;
use flow_model::{ActionStep, DataType, Declaration};
use std::collections::BTreeMap;

/// Translates expressions embedded in the model (conditions, arguments,
/// return values) into target-language expression text. Pure string to
/// string; the substitution rules are not the engine's concern.
pub trait ExpressionTranslator {
    fn translate(&self, expression: &str) -> anyhow::Result<String>;
}

/// Passes expressions through untouched. Useful for tests and for models
/// whose expressions are already in the target language.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityTranslator;

impl ExpressionTranslator for IdentityTranslator {
    fn translate(&self, expression: &str) -> anyhow::Result<String> {
        Ok(expression.to_string())
    }
}

/// Read-only view of the scope chain at the point a step is emitted, so
/// emitters can recover declared types (e.g. the element type of a list
/// being operated on).
pub struct ScopeView<'a> {
    tree: &'a BlockTree,
    block: BlockId,
}

impl<'a> ScopeView<'a> {
    pub(crate) fn new(tree: &'a BlockTree, block: BlockId) -> Self {
        Self { tree, block }
    }

    /// Shadow-aware lookup through the enclosing scopes.
    pub fn lookup(&self, name: &str) -> Result<&'a DataType, ScopeError> {
        self.tree.lookup(self.block, name)
    }
}

/// Result of emitting one action step: zero or more ordered statement lines
/// plus an optional output variable to hoist.
#[derive(Debug, Default)]
pub struct EmittedStep {
    pub lines: Vec<String>,
    pub declares: Option<Declaration>,
}

impl EmittedStep {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn line(line: impl Into<String>) -> Self {
        Self {
            lines: vec![line.into()],
            declares: None,
        }
    }

    pub fn lines(lines: Vec<String>) -> Self {
        Self {
            lines,
            declares: None,
        }
    }

    pub fn declaring(mut self, declaration: Declaration) -> Self {
        self.declares = Some(declaration);
        self
    }
}

/// Produces the statement lines for one action step.
pub trait StepEmitter {
    fn emit(&self, step: &ActionStep, scope: ScopeView<'_>) -> anyhow::Result<EmittedStep>;
}

/// Dispatches to a per-kind emitter by action kind name; unknown kinds fail,
/// which surfaces unimplemented step kinds instead of dropping them.
#[derive(Default)]
pub struct EmitterRegistry {
    emitters: BTreeMap<String, Box<dyn StepEmitter + Sync>>,
}

impl EmitterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        mut self,
        kind: impl Into<String>,
        emitter: Box<dyn StepEmitter + Sync>,
    ) -> Self {
        self.emitters.insert(kind.into(), emitter);
        self
    }
}

impl StepEmitter for EmitterRegistry {
    fn emit(&self, step: &ActionStep, scope: ScopeView<'_>) -> anyhow::Result<EmittedStep> {
        match self.emitters.get(&step.kind) {
            Some(emitter) => emitter.emit(step, scope),
            None => bail!("no handling implemented for action kind {}", step.kind),
        }
    }
}
