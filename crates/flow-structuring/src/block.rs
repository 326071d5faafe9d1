// Copyright (c) Asymptotic
// SPDX-License-Identifier: Apache-2.0

//! Code block tree
//!
//! The structuring engine's output IR: ordered containers of statements and
//! nested blocks, each owning a scope and an optional return type. Blocks are
//! stored in an arena ([`BlockTree`]) and addressed by [`BlockId`], which
//! keeps the parent chain walkable without reference cycles. The tree is
//! write-once after structuring completes and read-only input to renderers.

use crate::scope::{Scope, ScopeError};
use flow_model::{DataType, NodeId};

/// Index of a code block in its [`BlockTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BlockId(usize);

/// Arena owning every code block of one structured procedure.
#[derive(Debug, Default)]
pub struct BlockTree {
    blocks: Vec<CodeBlock>,
}

impl BlockTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a root block with no parent (a routine body).
    pub fn root(&mut self, return_type: Option<DataType>) -> BlockId {
        self.push(None, return_type)
    }

    /// Create a child block inheriting the parent's return type.
    pub fn child(&mut self, parent: BlockId) -> BlockId {
        let return_type = self.block(parent).return_type.clone();
        self.push(Some(parent), return_type)
    }

    /// Create a child block with an explicit return type. Loop bodies pass
    /// `None`: inside a loop there is no value position to return into.
    pub fn child_with_return(&mut self, parent: BlockId, return_type: Option<DataType>) -> BlockId {
        self.push(Some(parent), return_type)
    }

    fn push(&mut self, parent: Option<BlockId>, return_type: Option<DataType>) -> BlockId {
        let id = BlockId(self.blocks.len());
        self.blocks.push(CodeBlock {
            parent,
            return_type,
            scope: Scope::new(),
            items: Vec::new(),
        });
        id
    }

    pub fn block(&self, id: BlockId) -> &CodeBlock {
        &self.blocks[id.0]
    }

    pub fn append(&mut self, id: BlockId, item: BlockItem) {
        self.blocks[id.0].items.push(item);
    }

    pub fn last_item(&self, id: BlockId) -> Option<&BlockItem> {
        self.blocks[id.0].items.last()
    }

    /// Retract the most recently appended item. Exists for the rejoining
    /// branches optimization, which speculatively appends a merge call at the
    /// end of every branch and takes it back when all branches reconverge.
    pub fn remove_last(&mut self, id: BlockId) -> Option<BlockItem> {
        self.blocks[id.0].items.pop()
    }

    /// Declare a variable in the block's own scope.
    pub fn declare(&mut self, id: BlockId, name: impl Into<String>, data_type: DataType) {
        self.blocks[id.0].scope.declare(name, data_type);
    }

    /// Shadow-aware lookup: walks the scope chain outward until the name is
    /// found or the chain is exhausted.
    pub fn lookup(&self, id: BlockId, name: &str) -> Result<&DataType, ScopeError> {
        let mut cursor = Some(id);
        while let Some(block_id) = cursor {
            let block = self.block(block_id);
            if let Some(data_type) = block.scope.get(name) {
                return Ok(data_type);
            }
            cursor = block.parent;
        }
        Err(ScopeError {
            name: name.to_string(),
        })
    }

    /// Whether some execution path through the block avoids looping back
    /// into an unresolved merge: it reaches a terminal statement, a call to
    /// a merge routine `resolved` vouches for, or falls off the end of the
    /// block. Used by the engine's merge termination fix-point.
    pub fn resolves(&self, id: BlockId, resolved: &dyn Fn(&NodeId) -> bool) -> bool {
        for item in &self.block(id).items {
            match item {
                BlockItem::Return { .. }
                | BlockItem::Break
                | BlockItem::Continue
                | BlockItem::Raise => return true,
                BlockItem::MergeCall { merge, .. } => return resolved(merge),
                BlockItem::Conditional { arms, default_arm } => {
                    if arms.iter().any(|arm| self.resolves(arm.body, resolved)) {
                        return true;
                    }
                    match default_arm {
                        // All covered paths dead-end in unresolved merges.
                        Some(default) => return self.resolves(*default, resolved),
                        // No else: the fall-through path continues below.
                        None => continue,
                    }
                }
                BlockItem::Statement(_)
                | BlockItem::Comment(_)
                | BlockItem::Guarded { .. }
                | BlockItem::Loop { .. } => {}
            }
        }
        true
    }
}

/// Ordered sequence of statements and nested blocks; owns a scope and an
/// optional return type (needed to decide whether a merge call is a value or
/// void position).
#[derive(Debug)]
pub struct CodeBlock {
    parent: Option<BlockId>,
    return_type: Option<DataType>,
    scope: Scope,
    items: Vec<BlockItem>,
}

impl CodeBlock {
    pub fn parent(&self) -> Option<BlockId> {
        self.parent
    }

    pub fn return_type(&self) -> Option<&DataType> {
        self.return_type.as_ref()
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn items(&self) -> &[BlockItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// One item of a code block.
#[derive(Debug)]
pub enum BlockItem {
    /// Ordered statement lines produced by a step emitter.
    Statement(Vec<String>),
    /// Modeler annotation lines, rendered as comments.
    Comment(Vec<String>),
    /// An item guarded by an error handler; rendered as try/catch.
    Guarded {
        inner: Box<BlockItem>,
        handler: BlockId,
    },
    /// For-each loop over a collection.
    Loop {
        collection: String,
        variable: String,
        body: BlockId,
    },
    /// if / else-if / else chain.
    Conditional {
        arms: Vec<ConditionalArm>,
        default_arm: Option<BlockId>,
    },
    /// Call to the routine extracted for a merge node.
    MergeCall { merge: NodeId, with_result: bool },
    Return { value: Option<String> },
    Break,
    Continue,
    Raise,
}

/// One conditional arm: rendered condition text plus its block.
#[derive(Debug)]
pub struct ConditionalArm {
    pub condition: String,
    pub body: BlockId,
}
