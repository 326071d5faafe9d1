// Copyright (c) Asymptotic
// SPDX-License-Identifier: Apache-2.0

//! Node kinds and their step payloads

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Stable identifier of a node within one flow graph.
///
/// Ordered so that per-node maps iterate deterministically; also the seed for
/// deterministic extracted-routine naming.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// One step of a procedure. Immutable once the graph is constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Modeler annotations attached to this step, emitted as comment lines.
    #[serde(default)]
    pub annotations: Vec<String>,
}

/// Step kind with its kind-specific payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NodeKind {
    /// Entry point; exactly one per graph.
    Start,
    /// A simple step whose statement text comes from a per-kind emitter.
    Action(ActionStep),
    /// Single-entry loop over a collection.
    Loop(LoopStep),
    /// Exclusive merge: a reconvergence point of two or more paths.
    Merge,
    /// Boolean or multi-case split; the structuring strategy is chosen from
    /// the labels on the outgoing edges.
    Split(SplitStep),
    /// Split keyed by the runtime type of a variable.
    TypeSwitch(TypeSwitchStep),
    /// Terminal: return from the procedure.
    End {
        return_expression: Option<String>,
    },
    /// Terminal: break out of the innermost loop.
    Break,
    /// Terminal: continue with the next loop iteration.
    Continue,
    /// Terminal: re-raise the active error.
    Raise,
}

impl NodeKind {
    /// Branch kinds are the only ones allowed more than one non-error
    /// outgoing edge.
    pub fn is_branch(&self) -> bool {
        matches!(self, NodeKind::Split(_) | NodeKind::TypeSwitch(_))
    }

    /// Terminal kinds end their path; the walk appends a statement and stops.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            NodeKind::End { .. } | NodeKind::Break | NodeKind::Continue | NodeKind::Raise
        )
    }
}

/// Payload of an action step.
///
/// The structuring engine treats the contents as opaque: a statement emitter
/// interprets `kind` and the argument expressions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionStep {
    /// Action kind name, e.g. "create_object" or "commit".
    pub kind: String,
    /// Kind-specific expressions in the model's expression mini-language.
    pub arguments: BTreeMap<String, String>,
}

impl ActionStep {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            arguments: BTreeMap::new(),
        }
    }

    pub fn with_argument(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.insert(name.into(), value.into());
        self
    }
}

/// Payload of a loop step. The body is a single-entry sub-region of the same
/// graph, reachable only through `body_entry`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopStep {
    /// Name of the collection variable iterated over.
    pub collection: String,
    /// Name of the iteration variable visible inside the body.
    pub variable: String,
    /// Entry node of the loop body.
    pub body_entry: NodeId,
}

/// Payload of a boolean or multi-case split.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitStep {
    /// Condition (boolean split) or dispatch expression (multi-case split)
    /// in the model's expression mini-language.
    pub expression: String,
}

impl SplitStep {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
        }
    }
}

/// Payload of a type-dispatch split.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeSwitchStep {
    /// Name of the variable whose runtime type selects the branch.
    pub variable: String,
}

impl TypeSwitchStep {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }
}
