#![forbid(unsafe_code)]

//! Arena block store.
//!
//! # Design
//!
//! All records live in one `BTreeMap<BlockId, Block>`; each parent (a scope
//! root or a container block) owns an ordered `Vec<BlockId>` of its live
//! children. Parent/child relationships are resolved by query, so a move is
//! a detach plus an attach and costs O(children) of the two lists involved.
//!
//! Every mutation validates its inputs before touching state, so a failed
//! call leaves the store exactly as it was. A successful call bumps
//! [`BlockStore::revision`] and notifies subscribers with a [`BlockChange`].
//!
//! # Invariants
//!
//! 1. A live block's parent exists, is a container type, and shares its scope.
//! 2. No block is its own ancestor.
//! 3. Every live block appears exactly once, in its parent's sibling list.
//! 4. Archived blocks appear in no sibling list; their subtrees are retained
//!    but unreachable (archiving does not cascade).
//! 5. Empty sibling lists are dropped, so equal trees have equal maps.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use pagekit_core::BlockCatalog;
use tracing::{debug, trace};

use crate::block::{Block, BlockId, NewBlock, Parent, Placement, ScopeId};
use crate::collab::{ChangeCallbackRc, ChangeCallbackWeak, Subscription};
use crate::error::{BlockStoreError, InvalidParentReason, InvariantViolation};
use crate::operation::{BlockChange, BlockOperation, ChangeOrigin, MoveOutcome};

#[derive(Debug, Clone, Copy)]
enum AttributeMap {
    Property,
    Style,
}

/// The mutable, ordered, parented tree of blocks for one document.
pub struct BlockStore {
    pub(crate) catalog: BlockCatalog,
    pub(crate) blocks: BTreeMap<BlockId, Block>,
    pub(crate) siblings: BTreeMap<Parent, Vec<BlockId>>,
    pub(crate) next_id: BlockId,
    pub(crate) revision: u64,
    subscribers: Vec<ChangeCallbackWeak>,
}

impl fmt::Debug for BlockStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockStore")
            .field("blocks", &self.blocks.len())
            .field("next_id", &self.next_id)
            .field("revision", &self.revision)
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}

impl BlockStore {
    /// Empty store over the given vocabulary.
    #[must_use]
    pub fn new(catalog: BlockCatalog) -> Self {
        Self::from_parts(catalog, BTreeMap::new(), BTreeMap::new(), BlockId::MIN, 0)
    }

    pub(crate) fn from_parts(
        catalog: BlockCatalog,
        blocks: BTreeMap<BlockId, Block>,
        siblings: BTreeMap<Parent, Vec<BlockId>>,
        next_id: BlockId,
        revision: u64,
    ) -> Self {
        Self {
            catalog,
            blocks,
            siblings,
            next_id,
            revision,
            subscribers: Vec::new(),
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &BlockCatalog {
        &self.catalog
    }

    /// Increments by exactly 1 on each committed mutation.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Id the next inserted block will receive.
    #[must_use]
    pub const fn next_id(&self) -> BlockId {
        self.next_id
    }

    /// Number of records, archived ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Raw record lookup, archived blocks included.
    #[must_use]
    pub fn record(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(&id)
    }

    /// A non-archived block.
    #[must_use]
    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(&id).filter(|block| !block.archived)
    }

    /// Whether `id` exists, is not archived, and has no archived ancestor.
    #[must_use]
    pub fn is_live(&self, id: BlockId) -> bool {
        let mut cursor = Some(id);
        let mut steps = 0usize;
        while let Some(current) = cursor {
            let Some(block) = self.blocks.get(&current) else {
                return false;
            };
            if block.archived {
                return false;
            }
            steps += 1;
            if steps > self.blocks.len() {
                return false;
            }
            cursor = block.parent;
        }
        true
    }

    /// Ordered ids of the live children of `parent`.
    ///
    /// Empty for leaves, missing blocks, and blocks that are archived or
    /// unreachable.
    #[must_use]
    pub fn child_ids(&self, parent: Parent) -> &[BlockId] {
        if let Parent::Block(id) = parent
            && !self.is_live(id)
        {
            return &[];
        }
        self.siblings.get(&parent).map_or(&[], Vec::as_slice)
    }

    /// Ordered live children of `parent`.
    #[must_use]
    pub fn children(&self, parent: Parent) -> Vec<&Block> {
        self.child_ids(parent)
            .iter()
            .filter_map(|id| self.blocks.get(id))
            .collect()
    }

    /// Ordered root-level blocks of `scope`.
    #[must_use]
    pub fn roots(&self, scope: ScopeId) -> Vec<&Block> {
        self.children(Parent::Root(scope))
    }

    #[must_use]
    pub fn child_count(&self, parent: Parent) -> usize {
        self.child_ids(parent).len()
    }

    /// Current slot of a non-archived block.
    #[must_use]
    pub fn placement(&self, id: BlockId) -> Option<Placement> {
        let block = self.block(id)?;
        let parent = block.parent_ref();
        let index = self
            .siblings
            .get(&parent)?
            .iter()
            .position(|sibling| *sibling == id)?;
        Some(Placement::new(parent, index))
    }

    /// Whether `node` is `ancestor` or lies somewhere below it.
    #[must_use]
    pub fn is_self_or_descendant(&self, node: BlockId, ancestor: BlockId) -> bool {
        let mut cursor = Some(node);
        let mut steps = 0usize;
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.blocks.len() {
                return false;
            }
            cursor = self.blocks.get(&current).and_then(|block| block.parent);
        }
        false
    }

    /// Check that `parent` can receive a block living in `scope`.
    pub fn check_target(&self, parent: Parent, scope: ScopeId) -> Result<(), BlockStoreError> {
        let actual = self.target_scope(parent)?;
        if actual != scope {
            return Err(BlockStoreError::InvalidParent {
                parent,
                reason: InvalidParentReason::ForeignScope {
                    expected: scope,
                    actual,
                },
            });
        }
        Ok(())
    }

    /// Scope of a valid insertion parent.
    fn target_scope(&self, parent: Parent) -> Result<ScopeId, BlockStoreError> {
        let invalid = |reason| BlockStoreError::InvalidParent { parent, reason };
        let id = match parent {
            Parent::Root(scope) => return Ok(scope),
            Parent::Block(id) => id,
        };
        let Some(block) = self.blocks.get(&id) else {
            return Err(invalid(InvalidParentReason::Missing));
        };
        if block.archived {
            return Err(invalid(InvalidParentReason::Archived));
        }
        if !self.catalog.is_container(&block.block_type) {
            return Err(invalid(InvalidParentReason::Leaf));
        }
        if !self.is_live(id) {
            return Err(invalid(InvalidParentReason::Unreachable));
        }
        Ok(block.scope)
    }

    // ------------------------------------------------------------------
    // Subscribers
    // ------------------------------------------------------------------

    /// Register a change callback. Keep the returned guard alive to stay
    /// subscribed.
    pub fn subscribe(
        &mut self,
        callback: impl Fn(&BlockChange, &BlockStore) + 'static,
    ) -> Subscription {
        let strong: ChangeCallbackRc = Rc::new(callback);
        self.subscribers.push(Rc::downgrade(&strong));
        Subscription::new(strong)
    }

    /// Registered subscribers, including dead ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn notify(&mut self, change: &BlockChange) {
        self.subscribers.retain(|weak| weak.strong_count() > 0);
        let callbacks: Vec<ChangeCallbackRc> =
            self.subscribers.iter().filter_map(Weak::upgrade).collect();
        for callback in callbacks {
            callback(change, self);
        }
    }

    fn commit(
        &mut self,
        operation: BlockOperation,
        inverse: BlockOperation,
        origin: ChangeOrigin,
    ) -> BlockChange {
        self.revision += 1;
        let change = BlockChange {
            revision: self.revision,
            operation,
            inverse,
            origin,
            state_hash: self.state_hash(),
        };
        debug!(
            revision = change.revision,
            kind = ?change.operation.kind(),
            block = %change.operation.subject(),
            origin = ?origin,
            "block tree mutation committed"
        );
        self.notify(&change);
        change
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Create a block at `index` (clamped to `[0, child_count]`) under `parent`.
    pub fn insert_block(
        &mut self,
        block: NewBlock,
        parent: Parent,
        index: usize,
    ) -> Result<&Block, BlockStoreError> {
        let id = self.insert_new(block, parent, index, ChangeOrigin::User)?;
        self.blocks
            .get(&id)
            .ok_or(BlockStoreError::BlockNotFound { block: id })
    }

    /// Move a live block to gap `index` of `parent`.
    ///
    /// `index` counts the target's current children, the moving block
    /// included, so within one parent both "just before me" and "just after
    /// me" leave the block where it is and report [`MoveOutcome::Unchanged`].
    pub fn move_block(
        &mut self,
        id: BlockId,
        parent: Parent,
        index: usize,
    ) -> Result<MoveOutcome, BlockStoreError> {
        self.move_with(id, parent, index, ChangeOrigin::User)
            .map(|(outcome, _)| outcome)
    }

    /// Soft-delete a block. Its subtree is kept but becomes unreachable.
    /// Archiving an archived block does nothing.
    pub fn archive_block(&mut self, id: BlockId) -> Result<(), BlockStoreError> {
        self.archive_with(id, ChangeOrigin::User).map(|_| ())
    }

    /// Bring an archived block back at `index` under `parent`.
    pub fn restore_block(
        &mut self,
        id: BlockId,
        parent: Parent,
        index: usize,
    ) -> Result<(), BlockStoreError> {
        self.restore_with(id, parent, index, ChangeOrigin::User)
            .map(|_| ())
    }

    /// Set a property, or remove it with `None`. Returns `false` when the
    /// block already had that value.
    pub fn set_property(
        &mut self,
        id: BlockId,
        key: &str,
        value: Option<&str>,
    ) -> Result<bool, BlockStoreError> {
        self.set_attribute(id, AttributeMap::Property, key, value, ChangeOrigin::User)
            .map(|change| change.is_some())
    }

    /// Style counterpart of [`Self::set_property`].
    pub fn set_style(
        &mut self,
        id: BlockId,
        key: &str,
        value: Option<&str>,
    ) -> Result<bool, BlockStoreError> {
        self.set_attribute(id, AttributeMap::Style, key, value, ChangeOrigin::User)
            .map(|change| change.is_some())
    }

    /// Apply an operation record, typically an inverse handed back by the
    /// history collaborator. Returns `None` when the operation was a no-op.
    pub fn apply_operation(
        &mut self,
        operation: BlockOperation,
        origin: ChangeOrigin,
    ) -> Result<Option<BlockChange>, BlockStoreError> {
        match operation {
            BlockOperation::Insert {
                block,
                parent,
                index,
            } => self.insert_record(block, parent, index, origin).map(Some),
            BlockOperation::Move {
                block,
                parent,
                index,
            } => self
                .move_with(block, parent, index, origin)
                .map(|(_, change)| change),
            BlockOperation::Archive { block } => self.archive_with(block, origin),
            BlockOperation::Restore {
                block,
                parent,
                index,
            } => self.restore_with(block, parent, index, origin),
            BlockOperation::SetProperty { block, key, value } => self.set_attribute(
                block,
                AttributeMap::Property,
                &key,
                value.as_deref(),
                origin,
            ),
            BlockOperation::SetStyle { block, key, value } => self.set_attribute(
                block,
                AttributeMap::Style,
                &key,
                value.as_deref(),
                origin,
            ),
        }
    }

    fn allocate_id(&mut self) -> Result<BlockId, BlockStoreError> {
        let id = self.next_id;
        self.next_id = id.checked_next()?;
        Ok(id)
    }

    fn attach(&mut self, id: BlockId, parent: Parent, index: usize) -> usize {
        let list = self.siblings.entry(parent).or_default();
        let index = index.min(list.len());
        list.insert(index, id);
        index
    }

    fn detach(&mut self, id: BlockId, parent: Parent) -> Option<usize> {
        let list = self.siblings.get_mut(&parent)?;
        let index = list.iter().position(|sibling| *sibling == id)?;
        list.remove(index);
        if list.is_empty() {
            self.siblings.remove(&parent);
        }
        Some(index)
    }

    fn insert_new(
        &mut self,
        block: NewBlock,
        parent: Parent,
        index: usize,
        origin: ChangeOrigin,
    ) -> Result<BlockId, BlockStoreError> {
        let scope = self.target_scope(parent)?;
        if !self.catalog.contains(&block.block_type) {
            return Err(BlockStoreError::UnknownBlockType {
                block_type: block.block_type,
            });
        }
        let id = self.allocate_id()?;
        let record = block.into_block(id, scope, parent);
        self.blocks.insert(id, record.clone());
        let index = self.attach(id, parent, index);
        self.commit(
            BlockOperation::Insert {
                block: record,
                parent,
                index,
            },
            BlockOperation::Archive { block: id },
            origin,
        );
        Ok(id)
    }

    fn insert_record(
        &mut self,
        mut block: Block,
        parent: Parent,
        index: usize,
        origin: ChangeOrigin,
    ) -> Result<BlockChange, BlockStoreError> {
        let id = block.id;
        if self.blocks.contains_key(&id) {
            return Err(BlockStoreError::DuplicateBlockId { block: id });
        }
        if !self.catalog.contains(&block.block_type) {
            return Err(BlockStoreError::UnknownBlockType {
                block_type: block.block_type,
            });
        }
        self.check_target(parent, block.scope)?;
        if id >= self.next_id {
            self.next_id = id.checked_next()?;
        }
        block.parent = parent.block_id();
        block.archived = false;
        self.blocks.insert(id, block.clone());
        let index = self.attach(id, parent, index);
        Ok(self.commit(
            BlockOperation::Insert {
                block,
                parent,
                index,
            },
            BlockOperation::Archive { block: id },
            origin,
        ))
    }

    fn move_with(
        &mut self,
        id: BlockId,
        parent: Parent,
        index: usize,
        origin: ChangeOrigin,
    ) -> Result<(MoveOutcome, Option<BlockChange>), BlockStoreError> {
        let Some(block) = self.block(id) else {
            return Err(BlockStoreError::BlockNotFound { block: id });
        };
        let scope = block.scope;
        if let Parent::Block(target) = parent
            && self.is_self_or_descendant(target, id)
        {
            return Err(BlockStoreError::Cycle {
                block: id,
                parent: target,
            });
        }
        if !self.is_live(id) {
            return Err(BlockStoreError::BlockNotFound { block: id });
        }
        self.check_target(parent, scope)?;
        let from = self
            .placement(id)
            .ok_or(InvariantViolation::MissingFromSiblings { block: id })?;

        let count = self.siblings.get(&parent).map_or(0, Vec::len);
        let gap = index.min(count);
        let final_index = if parent == from.parent && gap > from.index {
            gap - 1
        } else {
            gap
        };
        if parent == from.parent && final_index == from.index {
            trace!(block = %id, parent = %parent, index, "move to current slot ignored");
            return Ok((MoveOutcome::Unchanged, None));
        }

        self.detach(id, from.parent);
        let to = Placement::new(parent, self.attach(id, parent, final_index));
        if let Some(record) = self.blocks.get_mut(&id) {
            record.parent = parent.block_id();
        }
        let change = self.commit(
            BlockOperation::Move {
                block: id,
                parent: to.parent,
                index: gap_index(from, to),
            },
            BlockOperation::Move {
                block: id,
                parent: from.parent,
                index: gap_index(to, from),
            },
            origin,
        );
        Ok((MoveOutcome::Moved { from, to }, Some(change)))
    }

    fn archive_with(
        &mut self,
        id: BlockId,
        origin: ChangeOrigin,
    ) -> Result<Option<BlockChange>, BlockStoreError> {
        let Some(block) = self.blocks.get(&id) else {
            return Err(BlockStoreError::BlockNotFound { block: id });
        };
        if block.archived {
            return Ok(None);
        }
        let parent = block.parent_ref();
        let index = self
            .detach(id, parent)
            .ok_or(InvariantViolation::MissingFromSiblings { block: id })?;
        if let Some(record) = self.blocks.get_mut(&id) {
            record.archived = true;
        }
        Ok(Some(self.commit(
            BlockOperation::Archive { block: id },
            BlockOperation::Restore {
                block: id,
                parent,
                index,
            },
            origin,
        )))
    }

    fn restore_with(
        &mut self,
        id: BlockId,
        parent: Parent,
        index: usize,
        origin: ChangeOrigin,
    ) -> Result<Option<BlockChange>, BlockStoreError> {
        let Some(block) = self.blocks.get(&id) else {
            return Err(BlockStoreError::BlockNotFound { block: id });
        };
        if !block.archived {
            return Ok(None);
        }
        let scope = block.scope;
        if let Parent::Block(target) = parent
            && self.is_self_or_descendant(target, id)
        {
            return Err(BlockStoreError::Cycle {
                block: id,
                parent: target,
            });
        }
        self.check_target(parent, scope)?;
        let index = self.attach(id, parent, index);
        if let Some(record) = self.blocks.get_mut(&id) {
            record.archived = false;
            record.parent = parent.block_id();
        }
        Ok(Some(self.commit(
            BlockOperation::Restore {
                block: id,
                parent,
                index,
            },
            BlockOperation::Archive { block: id },
            origin,
        )))
    }

    fn set_attribute(
        &mut self,
        id: BlockId,
        map: AttributeMap,
        key: &str,
        value: Option<&str>,
        origin: ChangeOrigin,
    ) -> Result<Option<BlockChange>, BlockStoreError> {
        let Some(block) = self.blocks.get_mut(&id) else {
            return Err(BlockStoreError::BlockNotFound { block: id });
        };
        if block.archived {
            return Err(BlockStoreError::BlockArchived { block: id });
        }
        let attributes = match map {
            AttributeMap::Property => &mut block.properties,
            AttributeMap::Style => &mut block.styles,
        };
        if attributes.get(key).map(String::as_str) == value {
            return Ok(None);
        }
        let (key, value) = (key.to_owned(), value.map(str::to_owned));
        let previous = match value.clone() {
            Some(value) => attributes.insert(key.clone(), value),
            None => attributes.remove(&key),
        };
        let (operation, inverse) = match map {
            AttributeMap::Property => (
                BlockOperation::SetProperty {
                    block: id,
                    key: key.clone(),
                    value,
                },
                BlockOperation::SetProperty {
                    block: id,
                    key,
                    value: previous,
                },
            ),
            AttributeMap::Style => (
                BlockOperation::SetStyle {
                    block: id,
                    key: key.clone(),
                    value,
                },
                BlockOperation::SetStyle {
                    block: id,
                    key,
                    value: previous,
                },
            ),
        };
        Ok(Some(self.commit(operation, inverse, origin)))
    }
}

/// Gap index that moves a block sitting at `current` to final slot `target`.
fn gap_index(current: Placement, target: Placement) -> usize {
    if current.parent == target.parent && target.index > current.index {
        target.index + 1
    } else {
        target.index
    }
}
