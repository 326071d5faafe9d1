// Copyright (c) Asymptotic
// SPDX-License-Identifier: Apache-2.0

//! Structured procedure output

use crate::block::{BlockId, BlockTree};
use flow_model::{DataType, Declaration, NodeId, Parameter};
use once_cell::sync::Lazy;
use regex::Regex;

/// One generated routine: the primary procedure body or an extracted merge
/// continuation.
#[derive(Debug)]
pub struct Routine {
    pub name: String,
    pub body: BlockId,
}

/// The structuring engine's output: the block tree plus everything a
/// renderer needs to print the procedure.
#[derive(Debug)]
pub struct StructuredProcedure {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub return_type: DataType,
    /// Hoisted output variables, shared by all routines of the procedure.
    pub members: Vec<Declaration>,
    /// Primary routine first, then extracted routines in reverse discovery
    /// order (last registered, first materialized).
    pub routines: Vec<Routine>,
    pub blocks: BlockTree,
}

impl StructuredProcedure {
    pub fn primary(&self) -> &Routine {
        &self.routines[0]
    }

    pub fn extracted(&self) -> &[Routine] {
        &self.routines[1..]
    }
}

static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new("[^A-Za-z0-9]+").unwrap());

/// Deterministic name of the routine extracted for a merge node, derived
/// from the merge node's identity.
pub fn merge_routine_name(merge: &NodeId) -> String {
    format!(
        "continueMerge{}",
        NON_ALNUM.replace_all(merge.as_str(), "").to_uppercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_routine_names_are_deterministic() {
        let id = NodeId::from("f6a2-33/merge.1");
        assert_eq!(merge_routine_name(&id), "continueMergeF6A233MERGE1");
        assert_eq!(merge_routine_name(&id), merge_routine_name(&id));
    }
}
