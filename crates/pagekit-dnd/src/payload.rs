#![forbid(unsafe_code)]

//! What is being dragged, and through which channel.

use std::fmt;

use pagekit_tree::BlockId;
use serde::{Deserialize, Serialize};

/// The thing a drag session carries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PayloadKind {
    /// Create a block from the palette, or an instance of a reusable component.
    New {
        block_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        component_id: Option<String>,
    },
    /// Rearrange an existing block.
    Move { block_id: BlockId },
}

/// Channel-neutral drag payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DragPayload {
    #[serde(flatten)]
    pub kind: PayloadKind,
    /// Display name for drag affordances.
    pub label: String,
}

impl DragPayload {
    /// A palette drag of `block_type`, labelled with the type name.
    #[must_use]
    pub fn new_block(block_type: impl Into<String>) -> Self {
        let block_type = block_type.into();
        Self {
            label: block_type.clone(),
            kind: PayloadKind::New {
                block_type,
                component_id: None,
            },
        }
    }

    /// A palette drag of a reusable component, rendered as `block_type`.
    #[must_use]
    pub fn component(
        block_type: impl Into<String>,
        component_id: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            kind: PayloadKind::New {
                block_type: block_type.into(),
                component_id: Some(component_id.into()),
            },
            label: label.into(),
        }
    }

    /// A rearrangement of an existing block.
    #[must_use]
    pub fn move_block(block_id: BlockId, label: impl Into<String>) -> Self {
        Self {
            kind: PayloadKind::Move { block_id },
            label: label.into(),
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// The dragged block, for move payloads.
    #[must_use]
    pub const fn moved_block(&self) -> Option<BlockId> {
        match self.kind {
            PayloadKind::Move { block_id } => Some(block_id),
            PayloadKind::New { .. } => None,
        }
    }
}

/// Input mechanism that produced a drag session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragChannel {
    /// Browser drag-and-drop events with a data transfer.
    Native,
    /// In-memory pointer tracking started on pointer-down.
    Synthetic,
}

impl fmt::Display for DragChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => write!(f, "native"),
            Self::Synthetic => write!(f, "synthetic"),
        }
    }
}

/// Identifies one drag session; issued when the session arms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(u64);

impl SessionToken {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "drag#{}", self.0)
    }
}
