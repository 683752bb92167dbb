#![forbid(unsafe_code)]

//! Commits a resolved drop against the block store.

use std::fmt;

use pagekit_tree::{
    BlockId, BlockStore, BlockStoreError, InvalidParentReason, MoveOutcome, NewBlock, Parent,
    Placement,
};
use tracing::{debug, warn};

use crate::payload::{DragPayload, PayloadKind};
use crate::resolver::InsertionPoint;

/// Why a drop did not change the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropError {
    /// The resolved parent cannot hold the dropped block.
    InvalidParent {
        parent: Parent,
        reason: InvalidParentReason,
    },
    /// A move into the dragged block's own subtree.
    Cycle { block: BlockId, parent: BlockId },
    /// Released with no insertion point.
    NoTarget,
    /// Any other store rejection.
    Store(BlockStoreError),
}

impl fmt::Display for DropError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParent { parent, reason } => {
                write!(f, "cannot drop into {parent}: it {reason}")
            }
            Self::Cycle { block, parent } => {
                write!(f, "cannot drop block {block} into its own subtree at {parent}")
            }
            Self::NoTarget => write!(f, "drop released without an insertion point"),
            Self::Store(err) => write!(f, "drop rejected: {err}"),
        }
    }
}

impl std::error::Error for DropError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BlockStoreError> for DropError {
    fn from(err: BlockStoreError) -> Self {
        match err {
            BlockStoreError::InvalidParent { parent, reason } => {
                Self::InvalidParent { parent, reason }
            }
            BlockStoreError::Cycle { block, parent } => Self::Cycle { block, parent },
            other => Self::Store(other),
        }
    }
}

/// What a drop did to the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// A palette drop created `block`.
    Inserted { block: BlockId, at: Placement },
    /// An existing block was moved.
    Moved {
        block: BlockId,
        from: Placement,
        to: Placement,
    },
    /// The block was dropped onto its own slot; nothing was emitted.
    Unchanged { block: BlockId },
    Failed(DropError),
}

impl DropOutcome {
    /// Whether the tree now differs from before the drop.
    #[must_use]
    pub const fn is_mutation(&self) -> bool {
        matches!(self, Self::Inserted { .. } | Self::Moved { .. })
    }

    #[must_use]
    pub const fn error(&self) -> Option<&DropError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Translates a payload and insertion point into one store mutation.
///
/// Failures are reported, never raised: the store is unchanged whenever the
/// outcome is [`DropOutcome::Failed`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MutationExecutor;

impl MutationExecutor {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    pub fn execute(
        &self,
        store: &mut BlockStore,
        payload: &DragPayload,
        target: Option<InsertionPoint>,
    ) -> DropOutcome {
        let outcome = match target {
            None => DropOutcome::Failed(DropError::NoTarget),
            Some(target) => match self.apply(store, payload, target) {
                Ok(outcome) => outcome,
                Err(err) => DropOutcome::Failed(err.into()),
            },
        };
        match &outcome {
            DropOutcome::Failed(err) => {
                warn!(label = %payload.label, ?target, error = %err, "drop failed");
            }
            outcome => debug!(?outcome, "drop committed"),
        }
        outcome
    }

    fn apply(
        &self,
        store: &mut BlockStore,
        payload: &DragPayload,
        target: InsertionPoint,
    ) -> Result<DropOutcome, BlockStoreError> {
        match &payload.kind {
            PayloadKind::Move { block_id } => {
                let block = *block_id;
                Ok(
                    match store.move_block(block, target.parent, target.index)? {
                        MoveOutcome::Moved { from, to } => DropOutcome::Moved { block, from, to },
                        MoveOutcome::Unchanged => DropOutcome::Unchanged { block },
                    },
                )
            }
            PayloadKind::New {
                block_type,
                component_id,
            } => {
                let mut new = match component_id {
                    Some(component) => {
                        let instance_type = store
                            .catalog()
                            .instance_type()
                            .unwrap_or(block_type.as_str());
                        NewBlock::instance(instance_type, component.clone())
                    }
                    None => NewBlock::new(block_type.clone()),
                };
                if !payload.label.is_empty() && payload.label != new.block_type {
                    new = new.with_name(payload.label.clone());
                }
                let block = store.insert_block(new, target.parent, target.index)?.id;
                let at = store
                    .placement(block)
                    .ok_or(BlockStoreError::BlockNotFound { block })?;
                Ok(DropOutcome::Inserted { block, at })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagekit_core::BlockCatalog;
    use pagekit_tree::ScopeId;
    use pretty_assertions::assert_eq;

    const ROOT: Parent = Parent::Root(ScopeId::new(1));

    fn store_with_ab() -> (BlockStore, BlockId, BlockId) {
        let mut store = BlockStore::new(BlockCatalog::standard());
        let a = store
            .insert_block(NewBlock::new("section").with_name("A"), ROOT, 0)
            .expect("insert A")
            .id;
        let b = store
            .insert_block(NewBlock::new("section").with_name("B"), ROOT, 1)
            .expect("insert B")
            .id;
        (store, a, b)
    }

    #[test]
    fn palette_drop_inserts_between_siblings() {
        let (mut store, a, b) = store_with_ab();
        let outcome = MutationExecutor::new().execute(
            &mut store,
            &DragPayload::new_block("button"),
            Some(InsertionPoint::new(ROOT, 1)),
        );
        let DropOutcome::Inserted { block, at } = outcome else {
            unreachable!("expected insert, got {outcome:?}");
        };
        assert_eq!(at, Placement::new(ROOT, 1));
        assert_eq!(store.child_ids(ROOT), &[a, block, b]);
        let button = store.block(block).expect("inserted");
        assert_eq!(button.block_type, "button");
        assert_eq!(button.name, None);
    }

    #[test]
    fn component_drop_creates_named_instance() {
        let (mut store, a, _) = store_with_ab();
        let payload = DragPayload::component("card", "cmp-7", "Pricing");
        let outcome = MutationExecutor::new().execute(
            &mut store,
            &payload,
            Some(InsertionPoint::new(Parent::Block(a), 0)),
        );
        let DropOutcome::Inserted { block, .. } = outcome else {
            unreachable!("expected insert, got {outcome:?}");
        };
        let instance = store.block(block).expect("inserted");
        assert_eq!(instance.block_type, "component-instance");
        assert_eq!(instance.component_id.as_deref(), Some("cmp-7"));
        assert_eq!(instance.display_name(), "Pricing");
    }

    #[test]
    fn move_drop_and_self_slot() {
        let (mut store, a, b) = store_with_ab();
        let executor = MutationExecutor::new();
        let payload = DragPayload::move_block(b, "B");
        let outcome = executor.execute(&mut store, &payload, Some(InsertionPoint::new(ROOT, 0)));
        assert_eq!(
            outcome,
            DropOutcome::Moved {
                block: b,
                from: Placement::new(ROOT, 1),
                to: Placement::new(ROOT, 0),
            }
        );
        assert_eq!(store.child_ids(ROOT), &[b, a]);

        let revision = store.revision();
        let outcome = executor.execute(&mut store, &payload, Some(InsertionPoint::new(ROOT, 1)));
        assert_eq!(outcome, DropOutcome::Unchanged { block: b });
        assert_eq!(store.revision(), revision);
    }

    #[test]
    fn rejected_drops_leave_the_tree_alone() {
        let (mut store, a, _) = store_with_ab();
        let text = store
            .insert_block(NewBlock::new("text"), Parent::Block(a), 0)
            .expect("insert text")
            .id;
        let executor = MutationExecutor::new();
        let hash = store.state_hash();

        let outcome = executor.execute(&mut store, &DragPayload::new_block("image"), None);
        assert_eq!(outcome.error(), Some(&DropError::NoTarget));

        let outcome = executor.execute(
            &mut store,
            &DragPayload::new_block("image"),
            Some(InsertionPoint::new(Parent::Block(text), 0)),
        );
        assert_eq!(
            outcome.error(),
            Some(&DropError::InvalidParent {
                parent: Parent::Block(text),
                reason: InvalidParentReason::Leaf,
            })
        );

        let outcome = executor.execute(
            &mut store,
            &DragPayload::move_block(a, "A"),
            Some(InsertionPoint::new(Parent::Block(a), 0)),
        );
        assert_eq!(outcome.error(), Some(&DropError::Cycle { block: a, parent: a }));

        let outcome = executor.execute(
            &mut store,
            &DragPayload::new_block("marquee"),
            Some(InsertionPoint::new(ROOT, 0)),
        );
        assert!(matches!(
            outcome.error(),
            Some(DropError::Store(BlockStoreError::UnknownBlockType { .. }))
        ));
        assert!(!outcome.is_mutation());
        assert_eq!(store.state_hash(), hash);
    }
}
