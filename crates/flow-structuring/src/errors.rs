// Copyright (c) Asymptotic
// SPDX-License-Identifier: Apache-2.0

//! Structuring errors

use crate::scope::ScopeError;
use flow_model::{GraphError, NodeId};
use thiserror::Error;

/// Failures while structuring one procedure. All are fatal for that
/// procedure only; batch callers catch per procedure and continue with the
/// rest. Nothing is retried: the input is deterministic.
#[derive(Debug, Error)]
pub enum StructureError {
    /// A node was revisited outside a loop construct: the graph contains a
    /// back-edge not modeled as a Loop. Never tolerated.
    #[error("unsupported cycle: node {node} revisited outside a loop construct")]
    UnsupportedCycle { node: NodeId },

    /// The routine extracted for this merge loops back into pending merges
    /// on every path without reaching a terminating statement.
    #[error("unresolved merge {node}: extracted routine never terminates")]
    UnresolvedMerge { node: NodeId },

    /// An edge or payload referenced a node the graph does not contain.
    #[error("node {node} referenced during structuring does not exist")]
    MissingNode { node: NodeId },

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Scope(#[from] ScopeError),

    /// Statement emitter failure, forwarded unchanged.
    #[error("emitter failed at node {node}")]
    Emitter {
        node: NodeId,
        #[source]
        source: anyhow::Error,
    },

    /// Expression translator failure, forwarded unchanged.
    #[error("expression translation failed at node {node}")]
    Translator {
        node: NodeId,
        #[source]
        source: anyhow::Error,
    },
}
