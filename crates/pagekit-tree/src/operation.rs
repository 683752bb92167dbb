#![forbid(unsafe_code)]

//! Invertible block operations and change records.
//!
//! Every successful mutation is reported as a forward [`BlockOperation`]
//! paired with the operation that undoes it:
//!
//! | forward        | inverse                         |
//! |----------------|---------------------------------|
//! | `Insert`       | `Archive`                       |
//! | `Move`         | `Move` back to the old slot     |
//! | `Archive`      | `Restore` at the old slot       |
//! | `Restore`      | `Archive`                       |
//! | `SetProperty`  | `SetProperty` with prior value  |
//! | `SetStyle`     | `SetStyle` with prior value     |

use serde::{Deserialize, Serialize};

use crate::block::{Block, BlockId, Parent, Placement};

/// A single mutation of the block tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BlockOperation {
    /// Insert a fully formed record. `index` is clamped to the sibling count.
    Insert {
        block: Block,
        parent: Parent,
        index: usize,
    },
    /// Move a live block. `index` is a gap index among the target's current
    /// children, the moving block included.
    Move {
        block: BlockId,
        parent: Parent,
        index: usize,
    },
    Archive {
        block: BlockId,
    },
    Restore {
        block: BlockId,
        parent: Parent,
        index: usize,
    },
    /// `value: None` removes the key.
    SetProperty {
        block: BlockId,
        key: String,
        value: Option<String>,
    },
    /// `value: None` removes the key.
    SetStyle {
        block: BlockId,
        key: String,
        value: Option<String>,
    },
}

/// Discriminant of a [`BlockOperation`], for logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockOperationKind {
    Insert,
    Move,
    Archive,
    Restore,
    SetProperty,
    SetStyle,
}

impl BlockOperation {
    #[must_use]
    pub const fn kind(&self) -> BlockOperationKind {
        match self {
            Self::Insert { .. } => BlockOperationKind::Insert,
            Self::Move { .. } => BlockOperationKind::Move,
            Self::Archive { .. } => BlockOperationKind::Archive,
            Self::Restore { .. } => BlockOperationKind::Restore,
            Self::SetProperty { .. } => BlockOperationKind::SetProperty,
            Self::SetStyle { .. } => BlockOperationKind::SetStyle,
        }
    }

    /// The block the operation acts on.
    #[must_use]
    pub const fn subject(&self) -> BlockId {
        match self {
            Self::Insert { block, .. } => block.id,
            Self::Move { block, .. }
            | Self::Archive { block }
            | Self::Restore { block, .. }
            | Self::SetProperty { block, .. }
            | Self::SetStyle { block, .. } => *block,
        }
    }
}

/// Who asked for a mutation.
///
/// History collaborators use this to tell fresh user edits (which clear the
/// redo stack) from the replay of an undo or redo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOrigin {
    #[default]
    User,
    Undo,
    Redo,
}

/// Notification payload for a committed mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockChange {
    /// Store revision after the mutation.
    pub revision: u64,
    pub operation: BlockOperation,
    pub inverse: BlockOperation,
    pub origin: ChangeOrigin,
    /// [`crate::BlockStore::state_hash`] after the mutation.
    pub state_hash: u64,
}

/// Result of [`crate::BlockStore::move_block`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved { from: Placement, to: Placement },
    /// The block already sits at the requested slot; nothing was emitted.
    Unchanged,
}

impl MoveOutcome {
    #[must_use]
    pub const fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }
}
