// Copyright (c) Asymptotic
// SPDX-License-Identifier: Apache-2.0

//! Merge registry
//!
//! Tracks merge nodes discovered during the walk and guarantees at most one
//! extracted routine per merge node. Pending merges drain in reverse
//! discovery order (last registered, first materialized).

use flow_model::NodeId;
use std::collections::BTreeSet;

#[derive(Debug, Default)]
pub struct MergeRegistry {
    /// First-registration order; drained from the back.
    pending: Vec<NodeId>,
    registered: BTreeSet<NodeId>,
    materialized: BTreeSet<NodeId>,
}

impl MergeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a merge reached by a branch. Re-registration from further
    /// branches is a no-op; the first registration fixes the drain position.
    pub fn register(&mut self, merge: &NodeId) {
        if self.registered.insert(merge.clone()) {
            self.pending.push(merge.clone());
        }
    }

    /// Forget a merge retracted by the rejoining-branches optimization.
    pub fn unregister(&mut self, merge: &NodeId) {
        self.registered.remove(merge);
    }

    /// Next merge to materialize, in reverse discovery order, skipping
    /// unregistered and already-materialized entries. Marks the returned
    /// merge materialized.
    pub fn next_pending(&mut self) -> Option<NodeId> {
        while let Some(merge) = self.pending.pop() {
            if self.registered.contains(&merge) && self.materialized.insert(merge.clone()) {
                return Some(merge);
            }
        }
        None
    }

    pub fn is_materialized(&self, merge: &NodeId) -> bool {
        self.materialized.contains(merge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_in_reverse_discovery_order() {
        let mut registry = MergeRegistry::new();
        registry.register(&NodeId::from("m1"));
        registry.register(&NodeId::from("m2"));
        registry.register(&NodeId::from("m1"));
        assert_eq!(registry.next_pending(), Some(NodeId::from("m2")));
        assert_eq!(registry.next_pending(), Some(NodeId::from("m1")));
        assert_eq!(registry.next_pending(), None);
    }

    #[test]
    fn unregistered_merges_are_skipped() {
        let mut registry = MergeRegistry::new();
        registry.register(&NodeId::from("m1"));
        registry.register(&NodeId::from("m2"));
        registry.unregister(&NodeId::from("m2"));
        assert_eq!(registry.next_pending(), Some(NodeId::from("m1")));
        assert_eq!(registry.next_pending(), None);
    }

    #[test]
    fn merges_materialize_at_most_once() {
        let mut registry = MergeRegistry::new();
        registry.register(&NodeId::from("m"));
        assert_eq!(registry.next_pending(), Some(NodeId::from("m")));
        registry.register(&NodeId::from("m"));
        assert!(registry.is_materialized(&NodeId::from("m")));
    }
}
