// Copyright (c) Asymptotic
// SPDX-License-Identifier: Apache-2.0

//! Flow graph model
//!
//! Typed representation of one procedure's flow graph: nodes (steps), edges
//! (control transitions with case labels and error flags), declared
//! parameters, and the declared return type. Construction validates the
//! structural invariants the structuring engine relies on; the graph is
//! immutable afterwards.

mod edge;
mod errors;
mod graph;
mod node;
mod types;

pub use edge::{CaseLabel, Edge};
pub use errors::GraphError;
pub use graph::{FlowGraph, FlowGraphBuilder};
pub use node::{ActionStep, LoopStep, Node, NodeId, NodeKind, SplitStep, TypeSwitchStep};
pub use types::{DataType, Declaration, Parameter};
