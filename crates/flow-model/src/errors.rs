// Copyright (c) Asymptotic
// SPDX-License-Identifier: Apache-2.0

//! Graph construction errors

use crate::node::NodeId;
use thiserror::Error;

/// Structural validation failures of a flow graph. Always fatal for the
/// procedure: the structuring engine never sees an invalid graph.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("no start node in procedure")]
    NoStartNode,

    #[error("{count} start nodes in procedure")]
    MultipleStartNodes { count: usize },

    #[error("node {node} has {count} non-error outgoing edges but is not a branch")]
    AmbiguousOutgoing { node: NodeId, count: usize },

    #[error("node {node} has {count} error outgoing edges")]
    AmbiguousErrorPath { node: NodeId, count: usize },

    #[error("edge {origin} -> {destination} references an unknown node")]
    DanglingEdge { origin: NodeId, destination: NodeId },

    #[error("duplicate node id {node}")]
    DuplicateNode { node: NodeId },

    #[error("edge {origin} -> {destination} leaving a branch carries no case label")]
    UnlabeledCase { origin: NodeId, destination: NodeId },
}
