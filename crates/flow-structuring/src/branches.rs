// Copyright (c) Asymptotic
// SPDX-License-Identifier: Apache-2.0

//! Branch handlers
//!
//! Structuring strategies for boolean splits, multi-case splits, and
//! type-dispatch splits. Each structures its branch destinations into
//! sibling code blocks, appends one conditional item, and then checks for
//! rejoining branches: when every branch reconverges on the same merge with
//! full incoming coverage, the speculative merge calls are retracted and the
//! continuation is structured inline in the pre-split block.

use crate::block::{BlockId, BlockItem, ConditionalArm};
use crate::engine::Structurer;
use crate::errors::StructureError;
use flow_model::{CaseLabel, DataType, Edge, NodeId, SplitStep, TypeSwitchStep};
use itertools::Itertools;
use log::debug;

/// Structure a boolean or multi-case split. The strategy is chosen from the
/// edge labels: exactly two edges labeled strictly true/false make an
/// if/else, anything else a case chain.
pub(crate) fn handle_split(
    s: &mut Structurer<'_>,
    node_id: &NodeId,
    step: &SplitStep,
    block: BlockId,
) -> Result<(), StructureError> {
    s.mark_visited(node_id)?;
    let edges: Vec<Edge> = s
        .graph
        .successors(node_id)
        .into_iter()
        .cloned()
        .collect();
    match boolean_destinations(&edges) {
        Some((true_dest, false_dest)) => {
            handle_boolean(s, node_id, step, block, true_dest, false_dest)
        }
        None => handle_multi_case(s, node_id, step, block, &edges),
    }
}

/// The true/false destinations, when the split is a plain if/else.
fn boolean_destinations(edges: &[Edge]) -> Option<(NodeId, NodeId)> {
    if edges.len() != 2 {
        return None;
    }
    let mut true_dest = None;
    let mut false_dest = None;
    for edge in edges {
        let value = edge.case.as_ref().and_then(CaseLabel::as_value);
        match value {
            Some("true") => true_dest = Some(edge.destination.clone()),
            Some("false") => false_dest = Some(edge.destination.clone()),
            _ => return None,
        }
    }
    Some((true_dest?, false_dest?))
}

fn handle_boolean(
    s: &mut Structurer<'_>,
    node_id: &NodeId,
    step: &SplitStep,
    block: BlockId,
    true_dest: NodeId,
    false_dest: NodeId,
) -> Result<(), StructureError> {
    let condition = s.translate(node_id, &step.expression)?;
    let then_block = s.blocks.child(block);
    s.walk(&true_dest, then_block)?;
    let else_block = s.blocks.child(block);
    s.walk(&false_dest, else_block)?;

    // An empty false branch renders as an if without else.
    let default_arm = (!s.blocks.block(else_block).is_empty()).then_some(else_block);
    s.blocks.append(
        block,
        BlockItem::Conditional {
            arms: vec![ConditionalArm {
                condition,
                body: then_block,
            }],
            default_arm,
        },
    );
    rejoin_or_stop(s, block, &[then_block, else_block])
}

fn case_text(label: &CaseLabel) -> String {
    match label {
        CaseLabel::Value(value) => value.clone(),
        CaseLabel::Type(type_name) => type_name.clone(),
        CaseLabel::Null => "null".to_string(),
    }
}

fn handle_multi_case(
    s: &mut Structurer<'_>,
    node_id: &NodeId,
    step: &SplitStep,
    block: BlockId,
    edges: &[Edge],
) -> Result<(), StructureError> {
    let dispatch = s.translate(node_id, &step.expression)?;

    // Several case labels may target the same node; group them so each
    // distinct destination is structured once and labeled with the
    // disjunction of its cases.
    let mut grouped: Vec<(NodeId, Vec<String>)> = Vec::new();
    for edge in edges {
        let label = edge.case.as_ref().map(case_text).unwrap_or_default();
        match grouped
            .iter_mut()
            .find(|(destination, _)| destination == &edge.destination)
        {
            Some((_, labels)) => labels.push(label),
            None => grouped.push((edge.destination.clone(), vec![label])),
        }
    }

    let mut arms = Vec::new();
    let mut branch_blocks = Vec::new();
    for (destination, labels) in grouped {
        let body = s.blocks.child(block);
        s.walk(&destination, body)?;
        let condition = labels
            .iter()
            .map(|label| format!("{dispatch} == {label}"))
            .join(" || ");
        arms.push(ConditionalArm { condition, body });
        branch_blocks.push(body);
    }
    s.blocks.append(
        block,
        BlockItem::Conditional {
            arms,
            default_arm: None,
        },
    );
    rejoin_or_stop(s, block, &branch_blocks)
}

/// Structure a type-dispatch split. Each typed branch gets a child scope in
/// which the dispatch variable is narrowed to the branch's labeled type; the
/// null branch renders last as the bare else; empty branches are skipped.
pub(crate) fn handle_type_switch(
    s: &mut Structurer<'_>,
    node_id: &NodeId,
    step: &TypeSwitchStep,
    block: BlockId,
) -> Result<(), StructureError> {
    s.mark_visited(node_id)?;
    let edges: Vec<Edge> = s
        .graph
        .successors(node_id)
        .into_iter()
        .cloned()
        .collect();

    let mut typed = Vec::new();
    let mut null_block = None;
    let mut branch_blocks = Vec::new();
    for edge in &edges {
        match &edge.case {
            Some(CaseLabel::Type(type_name)) | Some(CaseLabel::Value(type_name)) => {
                let body = s.blocks.child(block);
                // Narrowed view of the dispatch variable, for this branch only.
                s.blocks
                    .declare(body, step.variable.clone(), DataType::object(type_name.clone()));
                s.walk(&edge.destination, body)?;
                typed.push((type_name.clone(), body));
                branch_blocks.push(body);
            }
            Some(CaseLabel::Null) | None => {
                let body = s.blocks.child(block);
                s.walk(&edge.destination, body)?;
                null_block = Some(body);
                branch_blocks.push(body);
            }
        }
    }

    let mut arms: Vec<ConditionalArm> = typed
        .into_iter()
        .filter(|(_, body)| !s.blocks.block(*body).is_empty())
        .map(|(type_name, body)| ConditionalArm {
            condition: format!("{} instanceof {}", step.variable, type_name),
            body,
        })
        .collect();
    let mut default_arm = null_block.filter(|body| !s.blocks.block(*body).is_empty());
    if arms.is_empty() {
        // A lone null branch still needs a condition of its own.
        if let Some(body) = default_arm.take() {
            arms.push(ConditionalArm {
                condition: format!("{} == null", step.variable),
                body,
            });
        }
    }
    if !arms.is_empty() {
        s.blocks.append(block, BlockItem::Conditional { arms, default_arm });
    }
    rejoin_or_stop(s, block, &branch_blocks)
}

/// Rejoining-branches optimization: when every inspected branch block ends
/// with a call to the same merge node, and that node's total incoming edge
/// count equals the number of inspected branches, no other path joins there.
/// The speculative calls are retracted, the merge is unregistered, and its
/// continuation is structured inline in the pre-split block.
fn rejoin_or_stop(
    s: &mut Structurer<'_>,
    block: BlockId,
    branch_blocks: &[BlockId],
) -> Result<(), StructureError> {
    let Some(merge) = common_trailing_merge(s, branch_blocks) else {
        return Ok(());
    };
    if s.graph.incoming_count(&merge) != branch_blocks.len() {
        return Ok(());
    }
    for &branch in branch_blocks {
        s.blocks.remove_last(branch);
    }
    s.merges.unregister(&merge);
    debug!("rejoining branches at merge {merge}; continuing inline");
    if let Some(next) = s.successor(&merge) {
        s.walk(&next, block)?;
    }
    Ok(())
}

/// The merge node every branch block's trailing item calls, if they all
/// agree on one.
fn common_trailing_merge(s: &Structurer<'_>, branch_blocks: &[BlockId]) -> Option<NodeId> {
    let mut common: Option<NodeId> = None;
    for &branch in branch_blocks {
        match s.blocks.last_item(branch) {
            Some(BlockItem::MergeCall { merge, .. }) => match &common {
                None => common = Some(merge.clone()),
                Some(first) if first == merge => {}
                Some(_) => return None,
            },
            _ => return None,
        }
    }
    common
}
