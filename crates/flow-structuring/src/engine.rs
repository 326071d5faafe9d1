// Copyright (c) Asymptotic
// SPDX-License-Identifier: Apache-2.0

//! Structuring engine
//!
//! Single recursive walk from the start node, dispatching on node kind and
//! appending into the current code block. Splits are delegated to the branch
//! handlers in [`crate::branches`]; merges with more than one incoming edge
//! become extracted routines, drained from the merge registry after the
//! primary walk completes.

use crate::block::{BlockId, BlockItem, BlockTree};
use crate::branches;
use crate::emit::{EmittedStep, ExpressionTranslator, ScopeView, StepEmitter};
use crate::errors::StructureError;
use crate::merge::MergeRegistry;
use crate::procedure::{merge_routine_name, Routine, StructuredProcedure};
use flow_model::{DataType, Declaration, FlowGraph, Node, NodeId, NodeKind};
use log::debug;
use std::collections::{BTreeMap, BTreeSet};

/// Structure one procedure's flow graph into a code block tree.
///
/// The walk consults the scope chain and branch handlers, materializes the
/// routines for every registered merge until the registry drains, and then
/// verifies that each extracted routine can terminate. All traversal state
/// is per procedure, so independent procedures structure safely in parallel.
pub fn structure_procedure(
    graph: &FlowGraph,
    emitter: &dyn StepEmitter,
    translator: &dyn ExpressionTranslator,
) -> Result<StructuredProcedure, StructureError> {
    Structurer::new(graph, emitter, translator).run()
}

/// Mutable traversal state for one procedure.
pub(crate) struct Structurer<'a> {
    pub(crate) graph: &'a FlowGraph,
    emitter: &'a dyn StepEmitter,
    translator: &'a dyn ExpressionTranslator,
    pub(crate) blocks: BlockTree,
    pub(crate) merges: MergeRegistry,
    /// Nodes whose continuation has been walked. Merge nodes with more than
    /// one incoming edge are encountered without being walked through, so
    /// they are not marked here.
    visited: BTreeSet<NodeId>,
    /// Output variables hoisted to the procedure level.
    members: Vec<Declaration>,
    /// Extracted routine bodies, for the termination fix-point.
    routine_bodies: Vec<(NodeId, BlockId)>,
}

impl<'a> Structurer<'a> {
    fn new(
        graph: &'a FlowGraph,
        emitter: &'a dyn StepEmitter,
        translator: &'a dyn ExpressionTranslator,
    ) -> Self {
        Self {
            graph,
            emitter,
            translator,
            blocks: BlockTree::new(),
            merges: MergeRegistry::new(),
            visited: BTreeSet::new(),
            members: Vec::new(),
            routine_bodies: Vec::new(),
        }
    }

    fn run(mut self) -> Result<StructuredProcedure, StructureError> {
        let return_type = self.graph.return_type().clone();
        let root = self.blocks.root(Some(return_type.clone()));
        for parameter in self.graph.parameters() {
            self.blocks
                .declare(root, parameter.name.clone(), parameter.data_type.clone());
        }
        let start = self.graph.start().clone();
        self.walk(&start, root)?;

        let mut routines = vec![Routine {
            name: "execute".to_string(),
            body: root,
        }];
        // Materializing one routine can register further merges; keep
        // draining until none are pending.
        while let Some(merge) = self.merges.next_pending() {
            debug!(
                "procedure {}: materializing routine for merge {merge}",
                self.graph.name()
            );
            let body = self.materialize(&merge)?;
            self.routine_bodies.push((merge.clone(), body));
            routines.push(Routine {
                name: merge_routine_name(&merge),
                body,
            });
        }
        self.check_merge_resolution()?;

        Ok(StructuredProcedure {
            name: self.graph.name().to_string(),
            parameters: self.graph.parameters().to_vec(),
            return_type,
            members: self.members,
            routines,
            blocks: self.blocks,
        })
    }

    /// Structure the continuation of a merge node as a fresh routine body.
    fn materialize(&mut self, merge: &NodeId) -> Result<BlockId, StructureError> {
        let body = self.blocks.root(Some(self.graph.return_type().clone()));
        for parameter in self.graph.parameters() {
            self.blocks
                .declare(body, parameter.name.clone(), parameter.data_type.clone());
        }
        for member in &self.members {
            self.blocks
                .declare(body, member.name.clone(), member.data_type.clone());
        }
        if let Some(next) = self.successor(merge) {
            self.walk(&next, body)?;
        }
        Ok(body)
    }

    /// Walk one node, appending into `block` and continuing along its
    /// successors until the path terminates or reaches a routine boundary.
    pub(crate) fn walk(&mut self, node_id: &NodeId, block: BlockId) -> Result<(), StructureError> {
        let node = self.node(node_id)?;
        if !node.annotations.is_empty() {
            let lines = node
                .annotations
                .iter()
                .flat_map(|annotation| annotation.lines())
                .map(|line| format!("// {line}"))
                .collect();
            self.blocks.append(block, BlockItem::Comment(lines));
        }
        match &node.kind {
            NodeKind::Start => {
                self.mark_visited(node_id)?;
                if let Some(next) = self.successor(node_id) {
                    self.walk(&next, block)?;
                }
            }
            NodeKind::Action(step) => {
                self.mark_visited(node_id)?;
                let emitted = self
                    .emitter
                    .emit(step, ScopeView::new(&self.blocks, block))
                    .map_err(|source| StructureError::Emitter {
                        node: node_id.clone(),
                        source,
                    })?;
                self.apply_emitted(node_id, block, emitted)?;
                if let Some(next) = self.successor(node_id) {
                    self.walk(&next, block)?;
                }
            }
            NodeKind::Loop(step) => {
                self.mark_visited(node_id)?;
                // Fresh child scope, and no return type: loop bodies have no
                // value position to return into.
                let body = self.blocks.child_with_return(block, None);
                let element = self
                    .blocks
                    .lookup(block, &step.collection)
                    .map(|collection| {
                        collection
                            .element_type()
                            .cloned()
                            .unwrap_or_else(|| DataType::object("Object"))
                    })?;
                self.blocks.declare(body, step.variable.clone(), element);
                self.walk(&step.body_entry, body)?;
                let item = BlockItem::Loop {
                    collection: step.collection.clone(),
                    variable: step.variable.clone(),
                    body,
                };
                self.append_guarded(node_id, block, item)?;
                if let Some(next) = self.successor(node_id) {
                    self.walk(&next, block)?;
                }
            }
            NodeKind::Merge => {
                if self.graph.incoming_count(node_id) <= 1 {
                    // Joining a single flow is a no-op pass-through; nothing
                    // is emitted and the walk continues past it.
                    self.mark_visited(node_id)?;
                    if let Some(next) = self.successor(node_id) {
                        self.walk(&next, block)?;
                    }
                } else {
                    let with_result = self
                        .blocks
                        .block(block)
                        .return_type()
                        .is_some_and(|return_type| !return_type.is_void());
                    self.blocks.append(
                        block,
                        BlockItem::MergeCall {
                            merge: node_id.clone(),
                            with_result,
                        },
                    );
                    self.merges.register(node_id);
                    // The routine boundary is the logical return point; this
                    // path is done.
                }
            }
            NodeKind::Split(step) => branches::handle_split(self, node_id, step, block)?,
            NodeKind::TypeSwitch(step) => branches::handle_type_switch(self, node_id, step, block)?,
            NodeKind::End { return_expression } => {
                self.mark_visited(node_id)?;
                let value = match return_expression {
                    Some(expression) => Some(self.translate(node_id, expression)?),
                    None => None,
                };
                self.blocks.append(block, BlockItem::Return { value });
            }
            NodeKind::Break => {
                self.mark_visited(node_id)?;
                self.blocks.append(block, BlockItem::Break);
            }
            NodeKind::Continue => {
                self.mark_visited(node_id)?;
                self.blocks.append(block, BlockItem::Continue);
            }
            NodeKind::Raise => {
                self.mark_visited(node_id)?;
                self.blocks.append(block, BlockItem::Raise);
            }
        }
        Ok(())
    }

    fn node(&self, node_id: &NodeId) -> Result<&'a Node, StructureError> {
        self.graph
            .node(node_id)
            .ok_or_else(|| StructureError::MissingNode {
                node: node_id.clone(),
            })
    }

    /// The single non-error successor of a non-branch node.
    pub(crate) fn successor(&self, node_id: &NodeId) -> Option<NodeId> {
        self.graph
            .successors(node_id)
            .first()
            .map(|edge| edge.destination.clone())
    }

    /// First-encounter marking; a revisit is an unstructured back-edge.
    pub(crate) fn mark_visited(&mut self, node_id: &NodeId) -> Result<(), StructureError> {
        if !self.visited.insert(node_id.clone()) {
            return Err(StructureError::UnsupportedCycle {
                node: node_id.clone(),
            });
        }
        Ok(())
    }

    pub(crate) fn translate(
        &self,
        node_id: &NodeId,
        expression: &str,
    ) -> Result<String, StructureError> {
        self.translator
            .translate(expression)
            .map_err(|source| StructureError::Translator {
                node: node_id.clone(),
                source,
            })
    }

    /// Hoist the emitted declaration, then append the statement, wrapped in
    /// an error guard when the node carries an error edge.
    fn apply_emitted(
        &mut self,
        node_id: &NodeId,
        block: BlockId,
        emitted: EmittedStep,
    ) -> Result<(), StructureError> {
        if let Some(declaration) = emitted.declares {
            if !declaration.data_type.is_void() {
                self.blocks
                    .declare(block, declaration.name.clone(), declaration.data_type.clone());
                self.hoist(declaration);
            }
        }
        if emitted.lines.is_empty() && self.graph.error_successor(node_id).is_none() {
            return Ok(());
        }
        self.append_guarded(node_id, block, BlockItem::Statement(emitted.lines))
    }

    /// Declared output variables escape their structuring block whenever a
    /// merge continuation is extracted, so they are hoisted unconditionally
    /// to the procedure level.
    fn hoist(&mut self, declaration: Declaration) {
        if !self
            .members
            .iter()
            .any(|member| member.name == declaration.name)
        {
            self.members.push(declaration);
        }
    }

    /// Append an item, wrapping it in a try/catch whose handler is the
    /// structured error continuation when the node has an error edge.
    fn append_guarded(
        &mut self,
        node_id: &NodeId,
        block: BlockId,
        item: BlockItem,
    ) -> Result<(), StructureError> {
        match self
            .graph
            .error_successor(node_id)
            .map(|edge| edge.destination.clone())
        {
            Some(handler_entry) => {
                let handler = self.blocks.child(block);
                self.walk(&handler_entry, handler)?;
                self.blocks.append(
                    block,
                    BlockItem::Guarded {
                        inner: Box::new(item),
                        handler,
                    },
                );
            }
            None => self.blocks.append(block, item),
        }
        Ok(())
    }

    /// Fix-point over the extracted routines: a routine is resolved once
    /// some path through its body terminates without entering an unresolved
    /// merge. Routines left unresolved form a cycle of merge continuations
    /// calling each other, which could never terminate at runtime.
    fn check_merge_resolution(&self) -> Result<(), StructureError> {
        let mut resolved: BTreeMap<NodeId, bool> = self
            .routine_bodies
            .iter()
            .map(|(merge, _)| (merge.clone(), false))
            .collect();
        loop {
            let mut progressed = Vec::new();
            for (merge, body) in &self.routine_bodies {
                if resolved[merge] {
                    continue;
                }
                let lookup = |m: &NodeId| resolved.get(m).copied().unwrap_or(true);
                if self.blocks.resolves(*body, &lookup) {
                    progressed.push(merge.clone());
                }
            }
            if progressed.is_empty() {
                break;
            }
            for merge in progressed {
                resolved.insert(merge, true);
            }
        }
        match self
            .routine_bodies
            .iter()
            .find(|(merge, _)| !resolved[merge])
        {
            Some((merge, _)) => Err(StructureError::UnresolvedMerge {
                node: merge.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockItem;
    use crate::emit::{EmittedStep, ExpressionTranslator, ScopeView, StepEmitter};
    use flow_model::{
        ActionStep, CaseLabel, DataType, Declaration, FlowGraphBuilder, LoopStep, NodeKind,
        SplitStep, TypeSwitchStep,
    };

    /// Emits `<kind>();` per action; an `output`/`type` argument pair turns
    /// into a hoisted declaration, and `noop` emits nothing at all.
    struct KindEmitter;

    impl StepEmitter for KindEmitter {
        fn emit(&self, step: &ActionStep, _scope: ScopeView<'_>) -> anyhow::Result<EmittedStep> {
            if step.kind == "noop" {
                return Ok(EmittedStep::none());
            }
            let mut emitted = EmittedStep::line(format!("{}();", step.kind));
            if let Some(output) = step.arguments.get("output") {
                let data_type = match step.arguments.get("type").map(String::as_str) {
                    Some("Long") => DataType::Integer,
                    Some("String") => DataType::Text,
                    Some(other) => DataType::object(other),
                    None => DataType::object("Object"),
                };
                emitted = emitted.declaring(Declaration::new(output, data_type));
            }
            Ok(emitted)
        }
    }

    /// Strips the `$` variable sigil of the model expression language.
    struct DollarTranslator;

    impl ExpressionTranslator for DollarTranslator {
        fn translate(&self, expression: &str) -> anyhow::Result<String> {
            Ok(expression.replace('$', ""))
        }
    }

    fn structure(graph: &FlowGraph) -> Result<StructuredProcedure, StructureError> {
        structure_procedure(graph, &KindEmitter, &DollarTranslator)
    }

    fn action(kind: &str) -> NodeKind {
        NodeKind::Action(ActionStep::new(kind))
    }

    fn end() -> NodeKind {
        NodeKind::End {
            return_expression: None,
        }
    }

    fn builder() -> FlowGraphBuilder {
        FlowGraph::builder("demo").node("start", NodeKind::Start)
    }

    fn statement_text(item: &BlockItem) -> &str {
        match item {
            BlockItem::Statement(lines) => &lines[0],
            other => panic!("expected statement, got {other:?}"),
        }
    }

    #[test]
    fn linear_chain_structures_in_order() {
        let graph = builder()
            .node("a", action("a"))
            .node("b", action("b"))
            .node("c", action("c"))
            .node("end", end())
            .flow("start", "a")
            .flow("a", "b")
            .flow("b", "c")
            .flow("c", "end")
            .finish()
            .unwrap();
        let procedure = structure(&graph).unwrap();

        assert_eq!(procedure.routines.len(), 1);
        assert!(procedure.members.is_empty());
        let items = procedure.blocks.block(procedure.primary().body).items();
        assert_eq!(items.len(), 4);
        assert_eq!(statement_text(&items[0]), "a();");
        assert_eq!(statement_text(&items[1]), "b();");
        assert_eq!(statement_text(&items[2]), "c();");
        assert!(matches!(items[3], BlockItem::Return { value: None }));
    }

    #[test]
    fn single_incoming_merge_is_elided() {
        // True branch passes through a one-incoming merge; false branch
        // returns on its own. No call statement may appear for the merge.
        let graph = builder()
            .node("split", NodeKind::Split(SplitStep::new("$flag")))
            .node("t", action("t"))
            .node("m", NodeKind::Merge)
            .node("c", action("c"))
            .node("end_t", end())
            .node("f", action("f"))
            .node("end_f", end())
            .flow("start", "split")
            .case_flow("split", "t", CaseLabel::value("true"))
            .case_flow("split", "f", CaseLabel::value("false"))
            .flow("t", "m")
            .flow("m", "c")
            .flow("c", "end_t")
            .flow("f", "end_f")
            .finish()
            .unwrap();
        let procedure = structure(&graph).unwrap();

        assert_eq!(procedure.routines.len(), 1);
        let items = procedure.blocks.block(procedure.primary().body).items();
        let BlockItem::Conditional { arms, default_arm } = &items[0] else {
            panic!("expected conditional");
        };
        let then_items = procedure.blocks.block(arms[0].body).items();
        assert_eq!(then_items.len(), 3);
        assert_eq!(statement_text(&then_items[0]), "t();");
        assert_eq!(statement_text(&then_items[1]), "c();");
        assert!(matches!(then_items[2], BlockItem::Return { .. }));
        let else_items = procedure.blocks.block(default_arm.unwrap()).items();
        assert_eq!(statement_text(&else_items[0]), "f();");
        assert!(matches!(else_items[1], BlockItem::Return { .. }));
    }

    fn rejoining_graph() -> FlowGraph {
        builder()
            .node("a", action("a"))
            .node("split", NodeKind::Split(SplitStep::new("$flag")))
            .node("t", action("t"))
            .node("f", action("f"))
            .node("m", NodeKind::Merge)
            .node("c", action("c"))
            .node("end", end())
            .flow("start", "a")
            .flow("a", "split")
            .case_flow("split", "t", CaseLabel::value("true"))
            .case_flow("split", "f", CaseLabel::value("false"))
            .flow("t", "m")
            .flow("f", "m")
            .flow("m", "c")
            .flow("c", "end")
            .finish()
            .unwrap()
    }

    #[test]
    fn rejoining_branches_continue_inline() {
        let procedure = structure(&rejoining_graph()).unwrap();

        // No extracted routine: the continuation appears once, after the
        // split, in the pre-split block.
        assert_eq!(procedure.routines.len(), 1);
        let items = procedure.blocks.block(procedure.primary().body).items();
        assert_eq!(items.len(), 4);
        assert_eq!(statement_text(&items[0]), "a();");
        let BlockItem::Conditional { arms, default_arm } = &items[1] else {
            panic!("expected conditional");
        };
        assert_eq!(arms[0].condition, "flag");
        assert!(default_arm.is_some());
        // The speculative merge calls were retracted from both branches.
        let then_items = procedure.blocks.block(arms[0].body).items();
        assert_eq!(then_items.len(), 1);
        assert_eq!(statement_text(&then_items[0]), "t();");
        assert_eq!(statement_text(&items[2]), "c();");
        assert!(matches!(items[3], BlockItem::Return { .. }));
    }

    #[test]
    fn partial_convergence_extracts_one_routine() {
        // Three cases; one returns early, two reconverge. The merge has two
        // incoming edges, not three, so extraction happens.
        let graph = builder()
            .returns(DataType::Integer)
            .node("split", NodeKind::Split(SplitStep::new("$color")))
            .node("r", action("r"))
            .node("end_r", NodeKind::End { return_expression: Some("$1".to_string()) })
            .node("g", action("g"))
            .node("b", action("b"))
            .node("m", NodeKind::Merge)
            .node("after", action("after"))
            .node("end", NodeKind::End { return_expression: Some("$2".to_string()) })
            .flow("start", "split")
            .case_flow("split", "r", CaseLabel::value("red"))
            .case_flow("split", "g", CaseLabel::value("green"))
            .case_flow("split", "b", CaseLabel::value("blue"))
            .flow("r", "end_r")
            .flow("g", "m")
            .flow("b", "m")
            .flow("m", "after")
            .flow("after", "end")
            .finish()
            .unwrap();
        let procedure = structure(&graph).unwrap();

        assert_eq!(procedure.routines.len(), 2);
        assert_eq!(procedure.extracted()[0].name, "continueMergeM");

        let items = procedure.blocks.block(procedure.primary().body).items();
        let BlockItem::Conditional { arms, .. } = &items[0] else {
            panic!("expected conditional");
        };
        assert_eq!(arms.len(), 3);
        // Every branch reaching the merge contains exactly one call to the
        // extracted routine; the early-returning branch contains none.
        let calls_in = |body| {
            procedure
                .blocks
                .block(body)
                .items()
                .iter()
                .filter(|item| matches!(item, BlockItem::MergeCall { .. }))
                .count()
        };
        assert_eq!(calls_in(arms[0].body), 0);
        assert_eq!(calls_in(arms[1].body), 1);
        assert_eq!(calls_in(arms[2].body), 1);
        assert!(matches!(
            procedure.blocks.last_item(arms[1].body),
            Some(BlockItem::MergeCall { with_result: true, .. })
        ));

        let routine_items = procedure.blocks.block(procedure.extracted()[0].body).items();
        assert_eq!(statement_text(&routine_items[0]), "after();");
        assert!(matches!(
            routine_items[1],
            BlockItem::Return { value: Some(_) }
        ));
    }

    #[test]
    fn multi_case_labels_disjoin_per_destination() {
        let graph = builder()
            .node("split", NodeKind::Split(SplitStep::new("$color")))
            .node("x", action("x"))
            .node("y", action("y"))
            .node("end_x", end())
            .node("end_y", end())
            .flow("start", "split")
            .case_flow("split", "x", CaseLabel::value("red"))
            .case_flow("split", "x", CaseLabel::value("crimson"))
            .case_flow("split", "y", CaseLabel::value("blue"))
            .flow("x", "end_x")
            .flow("y", "end_y")
            .finish()
            .unwrap();
        let procedure = structure(&graph).unwrap();

        let items = procedure.blocks.block(procedure.primary().body).items();
        let BlockItem::Conditional { arms, .. } = &items[0] else {
            panic!("expected conditional");
        };
        assert_eq!(arms.len(), 2);
        assert_eq!(arms[0].condition, "color == red || color == crimson");
        assert_eq!(arms[1].condition, "color == blue");
    }

    #[test]
    fn loop_body_structures_nested() {
        let graph = builder()
            .parameter("items", DataType::list(DataType::object("Zoo.Animal")))
            .node(
                "loop",
                NodeKind::Loop(LoopStep {
                    collection: "items".to_string(),
                    variable: "item".to_string(),
                    body_entry: "l1".into(),
                }),
            )
            .node("l1", action("l1"))
            .node("l2", action("l2"))
            .node("end", end())
            .flow("start", "loop")
            .flow("loop", "end")
            .flow("l1", "l2")
            .finish()
            .unwrap();
        let procedure = structure(&graph).unwrap();

        assert_eq!(procedure.routines.len(), 1);
        let items = procedure.blocks.block(procedure.primary().body).items();
        assert_eq!(items.len(), 2);
        let BlockItem::Loop { body, variable, .. } = &items[0] else {
            panic!("expected loop");
        };
        assert_eq!(variable, "item");
        let body_items = procedure.blocks.block(*body).items();
        assert_eq!(body_items.len(), 2);
        assert_eq!(statement_text(&body_items[0]), "l1();");
        assert_eq!(statement_text(&body_items[1]), "l2();");
        // The iteration variable carries the collection's element type.
        assert_eq!(
            procedure.blocks.lookup(*body, "item").unwrap(),
            &DataType::object("Zoo.Animal")
        );
        // Loop bodies have no return type.
        assert_eq!(procedure.blocks.block(*body).return_type(), None);
    }

    #[test]
    fn type_dispatch_narrows_per_branch() {
        let graph = builder()
            .parameter("animal", DataType::object("Zoo.Animal"))
            .node("ts", NodeKind::TypeSwitch(TypeSwitchStep::new("animal")))
            .node("d", action("d"))
            .node("n", action("n"))
            .node("skip", action("noop"))
            .node("end_d", end())
            .node("end_n", end())
            .flow("start", "ts")
            .case_flow("ts", "d", CaseLabel::of_type("Zoo.Dog"))
            .case_flow("ts", "skip", CaseLabel::of_type("Zoo.Cat"))
            .case_flow("ts", "n", CaseLabel::Null)
            .flow("d", "end_d")
            .flow("n", "end_n")
            .finish()
            .unwrap();
        let procedure = structure(&graph).unwrap();

        let items = procedure.blocks.block(procedure.primary().body).items();
        let BlockItem::Conditional { arms, default_arm } = &items[0] else {
            panic!("expected conditional");
        };
        // The empty Cat branch is skipped; Dog remains, null renders as else.
        assert_eq!(arms.len(), 1);
        assert_eq!(arms[0].condition, "animal instanceof Zoo.Dog");
        // Inside the branch the dispatch variable is narrowed; outside it
        // keeps its declared type.
        assert_eq!(
            procedure.blocks.lookup(arms[0].body, "animal").unwrap(),
            &DataType::object("Zoo.Dog")
        );
        let default = default_arm.unwrap();
        assert_eq!(
            procedure.blocks.lookup(default, "animal").unwrap(),
            &DataType::object("Zoo.Animal")
        );
    }

    #[test]
    fn unstructured_back_edge_is_rejected() {
        let graph = builder()
            .node("a", action("a"))
            .node("b", action("b"))
            .flow("start", "a")
            .flow("a", "b")
            .flow("b", "a")
            .finish()
            .unwrap();
        let result = structure(&graph);
        assert!(matches!(
            result,
            Err(StructureError::UnsupportedCycle { .. })
        ));
    }

    #[test]
    fn mutually_recursive_merges_are_unresolved() {
        // Two merges whose continuations call each other and nothing else:
        // no path ever reaches a terminating statement.
        let graph = builder()
            .node("split", NodeKind::Split(SplitStep::new("$x")))
            .node("a1", action("a1"))
            .node("a2", action("a2"))
            .node("a3", action("a3"))
            .node("ma", NodeKind::Merge)
            .node("mb", NodeKind::Merge)
            .node("a4", action("a4"))
            .node("a5", action("a5"))
            .flow("start", "split")
            .case_flow("split", "a1", CaseLabel::value("one"))
            .case_flow("split", "a2", CaseLabel::value("two"))
            .case_flow("split", "a3", CaseLabel::value("three"))
            .flow("a1", "ma")
            .flow("a2", "ma")
            .flow("a3", "mb")
            .flow("ma", "a4")
            .flow("a4", "mb")
            .flow("mb", "a5")
            .flow("a5", "ma")
            .finish()
            .unwrap();
        let result = structure(&graph);
        assert!(matches!(result, Err(StructureError::UnresolvedMerge { .. })));
    }

    #[test]
    fn declared_outputs_are_hoisted_once() {
        let graph = builder()
            .node(
                "a",
                NodeKind::Action(
                    ActionStep::new("create")
                        .with_argument("output", "order")
                        .with_argument("type", "Shop.domain.Order"),
                ),
            )
            .node(
                "b",
                NodeKind::Action(
                    ActionStep::new("change")
                        .with_argument("output", "order")
                        .with_argument("type", "Shop.domain.Order"),
                ),
            )
            .node("end", end())
            .flow("start", "a")
            .flow("a", "b")
            .flow("b", "end")
            .finish()
            .unwrap();
        let procedure = structure(&graph).unwrap();

        assert_eq!(procedure.members.len(), 1);
        assert_eq!(procedure.members[0].name, "order");
        assert_eq!(
            procedure
                .blocks
                .lookup(procedure.primary().body, "order")
                .unwrap(),
            &DataType::object("Shop.domain.Order")
        );
    }

    #[test]
    fn error_edge_wraps_statement_in_guard() {
        let graph = builder()
            .node("a", action("commit"))
            .node("h", NodeKind::Raise)
            .node("end", end())
            .flow("start", "a")
            .flow("a", "end")
            .error_flow("a", "h")
            .finish()
            .unwrap();
        let procedure = structure(&graph).unwrap();

        let items = procedure.blocks.block(procedure.primary().body).items();
        let BlockItem::Guarded { inner, handler } = &items[0] else {
            panic!("expected guarded statement");
        };
        assert_eq!(statement_text(inner), "commit();");
        let handler_items = procedure.blocks.block(*handler).items();
        assert!(matches!(handler_items[0], BlockItem::Raise));
        assert!(matches!(items[1], BlockItem::Return { .. }));
    }

    #[test]
    fn structuring_is_deterministic() {
        let graph = rejoining_graph();
        let first = structure(&graph).unwrap();
        let second = structure(&graph).unwrap();
        assert_eq!(
            format!("{:?}", first.blocks),
            format!("{:?}", second.blocks)
        );
        assert_eq!(first.routines.len(), second.routines.len());
    }
}
