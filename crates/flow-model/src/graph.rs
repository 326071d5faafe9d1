// Copyright (c) Asymptotic
// SPDX-License-Identifier: Apache-2.0

//! Flow graph construction and adjacency queries

use crate::edge::Edge;
use crate::errors::GraphError;
use crate::node::{Node, NodeId, NodeKind};
use crate::types::{DataType, Parameter};
use itertools::Itertools;
use log::warn;
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::Dfs;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The flow graph of one procedure: nodes, edges, declared parameters, and
/// the declared return type. Immutable once built; construct through
/// [`FlowGraphBuilder`].
#[derive(Debug, Clone)]
pub struct FlowGraph {
    name: String,
    parameters: Vec<Parameter>,
    return_type: DataType,
    nodes: BTreeMap<NodeId, Node>,
    edges: Vec<Edge>,
    start: NodeId,
    /// Outgoing edge indices per node, in edge insertion order.
    outgoing: BTreeMap<NodeId, Vec<usize>>,
    /// Total incoming edge count per node, error edges included.
    incoming: BTreeMap<NodeId, usize>,
}

impl FlowGraph {
    pub fn builder(name: impl Into<String>) -> FlowGraphBuilder {
        FlowGraphBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn return_type(&self) -> &DataType {
        &self.return_type
    }

    /// The unique start node.
    pub fn start(&self) -> &NodeId {
        &self.start
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Ordered non-error outgoing edges of a node.
    pub fn successors(&self, id: &NodeId) -> Vec<&Edge> {
        self.outgoing
            .get(id)
            .into_iter()
            .flatten()
            .map(|&index| &self.edges[index])
            .filter(|edge| !edge.is_error)
            .collect()
    }

    /// The error-handler edge of a node, if any.
    pub fn error_successor(&self, id: &NodeId) -> Option<&Edge> {
        self.outgoing
            .get(id)
            .into_iter()
            .flatten()
            .map(|&index| &self.edges[index])
            .find(|edge| edge.is_error)
    }

    /// Total number of incoming edges, error edges included.
    pub fn incoming_count(&self, id: &NodeId) -> usize {
        self.incoming.get(id).copied().unwrap_or(0)
    }

    /// Nodes not reachable from the start node. Dead steps are tolerated
    /// (the builder warns about them); the structuring engine simply never
    /// visits them.
    pub fn unreachable_nodes(&self) -> BTreeSet<&NodeId> {
        let mut reachability: DiGraphMap<&str, ()> = DiGraphMap::new();
        for id in self.nodes.keys() {
            reachability.add_node(id.as_str());
        }
        for edge in &self.edges {
            reachability.add_edge(edge.origin.as_str(), edge.destination.as_str(), ());
        }
        // Loop bodies hang off the loop node's payload, not an edge.
        for node in self.nodes.values() {
            if let NodeKind::Loop(step) = &node.kind {
                reachability.add_edge(node.id.as_str(), step.body_entry.as_str(), ());
            }
        }

        let mut seen = BTreeSet::new();
        let mut dfs = Dfs::new(&reachability, self.start.as_str());
        while let Some(id) = dfs.next(&reachability) {
            seen.insert(id);
        }
        self.nodes
            .keys()
            .filter(|id| !seen.contains(id.as_str()))
            .collect()
    }
}

/// Incremental construction of a [`FlowGraph`]. `finish` validates the
/// structural invariants and builds the adjacency caches.
///
/// Serializable, so graph fixtures can be captured as JSON and rebuilt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowGraphBuilder {
    name: String,
    parameters: Vec<Parameter>,
    return_type: DataType,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl FlowGraphBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            return_type: DataType::Void,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn parameter(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.parameters.push(Parameter::new(name, data_type));
        self
    }

    pub fn returns(mut self, return_type: DataType) -> Self {
        self.return_type = return_type;
        self
    }

    pub fn node(mut self, id: impl Into<NodeId>, kind: NodeKind) -> Self {
        self.nodes.push(Node {
            id: id.into(),
            kind,
            annotations: Vec::new(),
        });
        self
    }

    /// Attach a modeler annotation to an already-added node.
    pub fn annotate(mut self, id: impl Into<NodeId>, annotation: impl Into<String>) -> Self {
        let id = id.into();
        if let Some(node) = self.nodes.iter_mut().find(|node| node.id == id) {
            node.annotations.push(annotation.into());
        }
        self
    }

    pub fn edge(mut self, edge: Edge) -> Self {
        self.edges.push(edge);
        self
    }

    /// Plain transition between two nodes.
    pub fn flow(self, origin: impl Into<NodeId>, destination: impl Into<NodeId>) -> Self {
        self.edge(Edge::new(origin, destination))
    }

    /// Labeled transition leaving a split.
    pub fn case_flow(
        self,
        origin: impl Into<NodeId>,
        destination: impl Into<NodeId>,
        case: crate::CaseLabel,
    ) -> Self {
        self.edge(Edge::new(origin, destination).with_case(case))
    }

    /// Error-handler transition.
    pub fn error_flow(self, origin: impl Into<NodeId>, destination: impl Into<NodeId>) -> Self {
        self.edge(Edge::new(origin, destination).error())
    }

    pub fn finish(self) -> Result<FlowGraph, GraphError> {
        let mut nodes = BTreeMap::new();
        for node in self.nodes {
            if nodes.insert(node.id.clone(), node.clone()).is_some() {
                return Err(GraphError::DuplicateNode { node: node.id });
            }
        }

        let starts: Vec<&NodeId> = nodes
            .values()
            .filter(|node| matches!(node.kind, NodeKind::Start))
            .map(|node| &node.id)
            .collect();
        let start = match starts.as_slice() {
            [] => return Err(GraphError::NoStartNode),
            [start] => (*start).clone(),
            many => {
                return Err(GraphError::MultipleStartNodes {
                    count: many.len(),
                })
            }
        };

        for edge in &self.edges {
            if !nodes.contains_key(&edge.origin) || !nodes.contains_key(&edge.destination) {
                return Err(GraphError::DanglingEdge {
                    origin: edge.origin.clone(),
                    destination: edge.destination.clone(),
                });
            }
        }
        for node in nodes.values() {
            if let NodeKind::Loop(step) = &node.kind {
                if !nodes.contains_key(&step.body_entry) {
                    return Err(GraphError::DanglingEdge {
                        origin: node.id.clone(),
                        destination: step.body_entry.clone(),
                    });
                }
            }
        }

        let normal_out = self
            .edges
            .iter()
            .filter(|edge| !edge.is_error)
            .map(|edge| edge.origin.clone())
            .counts();
        for (id, count) in normal_out.iter().sorted() {
            let node = &nodes[id];
            if *count > 1 && !node.kind.is_branch() {
                return Err(GraphError::AmbiguousOutgoing {
                    node: id.clone(),
                    count: *count,
                });
            }
        }

        let error_out = self
            .edges
            .iter()
            .filter(|edge| edge.is_error)
            .map(|edge| edge.origin.clone())
            .counts();
        for (id, count) in error_out.iter().sorted() {
            if *count > 1 {
                return Err(GraphError::AmbiguousErrorPath {
                    node: id.clone(),
                    count: *count,
                });
            }
        }

        for edge in &self.edges {
            if !edge.is_error && nodes[&edge.origin].kind.is_branch() && edge.case.is_none() {
                return Err(GraphError::UnlabeledCase {
                    origin: edge.origin.clone(),
                    destination: edge.destination.clone(),
                });
            }
        }

        let mut outgoing: BTreeMap<NodeId, Vec<usize>> = BTreeMap::new();
        let mut incoming: BTreeMap<NodeId, usize> = BTreeMap::new();
        for (index, edge) in self.edges.iter().enumerate() {
            outgoing.entry(edge.origin.clone()).or_default().push(index);
            *incoming.entry(edge.destination.clone()).or_default() += 1;
        }

        let graph = FlowGraph {
            name: self.name,
            parameters: self.parameters,
            return_type: self.return_type,
            nodes,
            edges: self.edges,
            start,
            outgoing,
            incoming,
        };
        for dead in graph.unreachable_nodes() {
            warn!(
                "procedure {}: node {dead} is not reachable from the start node",
                graph.name
            );
        }
        Ok(graph)
    }
}
