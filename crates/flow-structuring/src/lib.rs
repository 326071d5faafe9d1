// Copyright (c) Asymptotic
// SPDX-License-Identifier: Apache-2.0

//! Flow structuring engine
//!
//! Walks a validated flow graph from its start node and produces a tree of
//! nested code blocks a renderer can print as indented statements. Owns the
//! variable scope chain, the code block tree IR, merge extraction, and the
//! branch handlers; statement text for individual action kinds and the
//! expression mini-language are supplied by collaborators (see [`emit`]).

mod block;
mod branches;
pub mod emit;
mod engine;
mod errors;
mod merge;
mod procedure;
mod scope;

pub use block::{BlockId, BlockItem, BlockTree, CodeBlock, ConditionalArm};
pub use emit::{
    EmittedStep, EmitterRegistry, ExpressionTranslator, IdentityTranslator, ScopeView, StepEmitter,
};
pub use engine::structure_procedure;
pub use errors::StructureError;
pub use merge::MergeRegistry;
pub use procedure::{merge_routine_name, Routine, StructuredProcedure};
pub use scope::{Scope, ScopeError};
