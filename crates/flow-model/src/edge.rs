// Copyright (c) Asymptotic
// SPDX-License-Identifier: Apache-2.0

//! Control-flow edges

use crate::node::NodeId;
use serde::{Deserialize, Serialize};

/// A directed control transition between two nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub origin: NodeId,
    pub destination: NodeId,
    /// Which branch of a split this edge represents.
    pub case: Option<CaseLabel>,
    /// Error-handler transition rather than a normal successor.
    pub is_error: bool,
}

impl Edge {
    pub fn new(origin: impl Into<NodeId>, destination: impl Into<NodeId>) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            case: None,
            is_error: false,
        }
    }

    pub fn with_case(mut self, case: CaseLabel) -> Self {
        self.case = Some(case);
        self
    }

    /// Mark this edge as the error path of its origin node.
    pub fn error(mut self) -> Self {
        self.is_error = true;
        self
    }
}

/// Label tagging which branch of a split an edge represents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseLabel {
    /// Case value of a boolean or enumeration split ("true", "false",
    /// enumeration literals).
    Value(String),
    /// Narrowed type of a type-dispatch branch.
    Type(String),
    /// The null branch of a type dispatch.
    Null,
}

impl CaseLabel {
    pub fn value(value: impl Into<String>) -> Self {
        CaseLabel::Value(value.into())
    }

    pub fn of_type(type_name: impl Into<String>) -> Self {
        CaseLabel::Type(type_name.into())
    }

    /// The label's case value, if it is a value label.
    pub fn as_value(&self) -> Option<&str> {
        match self {
            CaseLabel::Value(value) => Some(value),
            _ => None,
        }
    }
}
