#![forbid(unsafe_code)]

//! Block store errors.

use std::fmt;

use crate::block::{BlockId, Parent, ScopeId};

/// Why a block or scope root cannot receive children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidParentReason {
    /// No block with that id exists.
    Missing,
    /// The block type is a leaf.
    Leaf,
    /// The block is archived.
    Archived,
    /// An ancestor of the block is archived.
    Unreachable,
    /// The parent lives in a different scope than the block being placed.
    ForeignScope { expected: ScopeId, actual: ScopeId },
}

impl fmt::Display for InvalidParentReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "does not exist"),
            Self::Leaf => write!(f, "is a leaf type"),
            Self::Archived => write!(f, "is archived"),
            Self::Unreachable => write!(f, "has an archived ancestor"),
            Self::ForeignScope { expected, actual } => {
                write!(f, "belongs to {actual}, expected {expected}")
            }
        }
    }
}

/// Structural problems found while validating a tree or loading a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    UnsupportedSchemaVersion { version: u16 },
    DuplicateBlockId { block: BlockId },
    IdNotBelowAllocator { block: BlockId, next_id: BlockId },
    UnknownBlockType { block: BlockId, block_type: String },
    DanglingParent { block: BlockId, parent: BlockId },
    ScopeMismatch { block: BlockId, parent: BlockId },
    LeafParent { block: BlockId, parent: BlockId },
    CycleDetected { block: BlockId },
    DanglingSiblingList { parent: Parent },
    DuplicateSiblingList { parent: Parent },
    UnknownSiblingEntry { parent: Parent, block: BlockId },
    ArchivedInSiblings { parent: Parent, block: BlockId },
    SiblingParentMismatch { parent: Parent, block: BlockId },
    DuplicateSibling { block: BlockId },
    MissingFromSiblings { block: BlockId },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedSchemaVersion { version } => {
                write!(f, "unsupported block tree schema version {version}")
            }
            Self::DuplicateBlockId { block } => write!(f, "duplicate block id {block}"),
            Self::IdNotBelowAllocator { block, next_id } => {
                write!(f, "block {block} is not below allocator cursor {next_id}")
            }
            Self::UnknownBlockType { block, block_type } => {
                write!(f, "block {block} has unknown type {block_type:?}")
            }
            Self::DanglingParent { block, parent } => {
                write!(f, "block {block} references missing parent {parent}")
            }
            Self::ScopeMismatch { block, parent } => {
                write!(f, "block {block} and parent {parent} belong to different scopes")
            }
            Self::LeafParent { block, parent } => {
                write!(f, "block {block} is parented under leaf {parent}")
            }
            Self::CycleDetected { block } => write!(f, "block {block} is its own ancestor"),
            Self::DanglingSiblingList { parent } => {
                write!(f, "sibling list owned by missing {parent}")
            }
            Self::DuplicateSiblingList { parent } => {
                write!(f, "more than one sibling list for {parent}")
            }
            Self::UnknownSiblingEntry { parent, block } => {
                write!(f, "sibling list of {parent} lists missing block {block}")
            }
            Self::ArchivedInSiblings { parent, block } => {
                write!(f, "sibling list of {parent} lists archived block {block}")
            }
            Self::SiblingParentMismatch { parent, block } => {
                write!(f, "sibling list of {parent} lists block {block} owned elsewhere")
            }
            Self::DuplicateSibling { block } => {
                write!(f, "block {block} appears in more than one sibling slot")
            }
            Self::MissingFromSiblings { block } => {
                write!(f, "live block {block} is absent from its sibling list")
            }
        }
    }
}

impl std::error::Error for InvariantViolation {}

/// Errors from block store queries and mutations.
///
/// A failed mutation never leaves partial state behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockStoreError {
    ZeroBlockId,
    MalformedBlockId(String),
    IdOverflow { current: BlockId },
    /// The block does not exist or is archived.
    BlockNotFound { block: BlockId },
    /// The block is archived and cannot be edited.
    BlockArchived { block: BlockId },
    /// The requested parent cannot hold the block.
    InvalidParent {
        parent: Parent,
        reason: InvalidParentReason,
    },
    /// The requested parent is the block itself or one of its descendants.
    Cycle { block: BlockId, parent: BlockId },
    UnknownBlockType { block_type: String },
    DuplicateBlockId { block: BlockId },
    Corrupt(InvariantViolation),
}

impl fmt::Display for BlockStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroBlockId => write!(f, "block id must be non-zero"),
            Self::MalformedBlockId(raw) => write!(f, "malformed block id {raw:?}"),
            Self::IdOverflow { current } => {
                write!(f, "block id overflow after {current}")
            }
            Self::BlockNotFound { block } => write!(f, "block {block} not found"),
            Self::BlockArchived { block } => write!(f, "block {block} is archived"),
            Self::InvalidParent { parent, reason } => {
                write!(f, "invalid parent: {parent} {reason}")
            }
            Self::Cycle { block, parent } => write!(
                f,
                "cannot move block {block} under {parent}: target is the block or its descendant"
            ),
            Self::UnknownBlockType { block_type } => {
                write!(f, "unknown block type {block_type:?}")
            }
            Self::DuplicateBlockId { block } => write!(f, "block {block} already exists"),
            Self::Corrupt(violation) => write!(f, "corrupt block tree: {violation}"),
        }
    }
}

impl std::error::Error for BlockStoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Corrupt(violation) => Some(violation),
            _ => None,
        }
    }
}

impl From<InvariantViolation> for BlockStoreError {
    fn from(value: InvariantViolation) -> Self {
        Self::Corrupt(value)
    }
}
