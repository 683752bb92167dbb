#![forbid(unsafe_code)]

//! Converges native and synthetic drag sources on one [`DragPayload`].
//!
//! Anything unrecognizable normalizes to `None`: the drag is ignored, which
//! is not an error.

use std::str::FromStr;

use pagekit_core::is_valid_type_name;
use pagekit_dnd::DragPayload;
use pagekit_tree::{BlockId, BlockStore};

use crate::data_transfer::{DataTransfer, MIME_COMPONENT, MIME_LABEL, MIME_MOVE, MIME_NEW, MIME_TEXT};

/// Raw description of a drag source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragInput<'a> {
    /// A browser drag event's data transfer.
    Transfer(&'a DataTransfer),
    /// A palette item picked up with the pointer.
    Palette {
        block_type: &'a str,
        component_id: Option<&'a str>,
        label: Option<&'a str>,
    },
    /// An existing canvas block picked up with the pointer.
    Canvas { block_id: BlockId },
}

/// Validates drag sources against the live document and its vocabulary.
#[derive(Debug, Clone, Copy)]
pub struct DragPayloadNormalizer<'a> {
    store: &'a BlockStore,
}

impl<'a> DragPayloadNormalizer<'a> {
    #[must_use]
    pub const fn new(store: &'a BlockStore) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn normalize(&self, input: DragInput<'_>) -> Option<DragPayload> {
        match input {
            DragInput::Transfer(transfer) => self.from_transfer(transfer),
            DragInput::Palette {
                block_type,
                component_id,
                label,
            } => self.palette(block_type, component_id, label),
            DragInput::Canvas { block_id } => self.canvas(block_id, None),
        }
    }

    fn from_transfer(&self, transfer: &DataTransfer) -> Option<DragPayload> {
        let label = transfer.get_data(MIME_LABEL);
        if let Some(raw) = transfer.get_data(MIME_MOVE) {
            let block_id = BlockId::from_str(raw).ok()?;
            return self.canvas(block_id, label);
        }
        if let Some(block_type) = transfer.get_data(MIME_NEW) {
            return self.palette(block_type.trim(), transfer.get_data(MIME_COMPONENT), label);
        }
        let fallback = transfer.get_data(MIME_TEXT)?.trim();
        self.palette(fallback, None, label)
    }

    fn palette(
        &self,
        block_type: &str,
        component_id: Option<&str>,
        label: Option<&str>,
    ) -> Option<DragPayload> {
        if !is_valid_type_name(block_type) || !self.store.catalog().contains(block_type) {
            return None;
        }
        let payload = match component_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(component) => DragPayload::component(block_type, component, block_type),
            None => DragPayload::new_block(block_type),
        };
        Some(match label {
            Some(label) => payload.with_label(label),
            None => payload,
        })
    }

    fn canvas(&self, block_id: BlockId, label: Option<&str>) -> Option<DragPayload> {
        if !self.store.is_live(block_id) {
            return None;
        }
        let block = self.store.block(block_id)?;
        let label = label.unwrap_or_else(|| block.display_name());
        Some(DragPayload::move_block(block_id, label))
    }
}
