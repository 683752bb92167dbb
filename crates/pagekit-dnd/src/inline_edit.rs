#![forbid(unsafe_code)]

//! Double-activation inline text editing.
//!
//! Two activations of the same text-bearing leaf within the configured window
//! open an edit session on it. Entering edit mode mutates nothing; only
//! [`InlineEditBridge::commit`] writes the draft back as the block's `text`
//! property, and only when it differs.

use std::time::Duration;

use pagekit_tree::{BlockId, BlockStore, TEXT_PROPERTY};
use tracing::debug;

use crate::config::DragConfig;

/// Result of one activation (click/tap) on a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditActivation {
    /// First activation recorded; a second one may start editing.
    Pending { block: BlockId },
    /// Double activation: edit mode entered.
    Started { block: BlockId },
    /// The block is not a live text-bearing leaf.
    NotEditable { block: BlockId },
    /// Another edit session is open.
    Busy { editing: BlockId },
}

/// Result of [`InlineEditBridge::commit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The draft was written to the block.
    Updated { block: BlockId },
    /// The draft matched the current text.
    Unchanged { block: BlockId },
    /// No session was open, or the block can no longer be edited.
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct EditSession {
    block: BlockId,
    draft: String,
}

/// Turns double activations into `text` property edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineEditBridge {
    window: Duration,
    last_activation: Option<(BlockId, Duration)>,
    session: Option<EditSession>,
}

impl Default for InlineEditBridge {
    fn default() -> Self {
        Self::new(&DragConfig::default())
    }
}

impl InlineEditBridge {
    #[must_use]
    pub fn new(config: &DragConfig) -> Self {
        Self {
            window: config.validated().double_activation,
            last_activation: None,
            session: None,
        }
    }

    #[must_use]
    pub fn is_editing(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub fn editing_block(&self) -> Option<BlockId> {
        self.session.as_ref().map(|session| session.block)
    }

    #[must_use]
    pub fn draft(&self) -> Option<&str> {
        self.session.as_ref().map(|session| session.draft.as_str())
    }

    /// Record an activation of `block` at host time `at`.
    pub fn activate(&mut self, store: &BlockStore, block: BlockId, at: Duration) -> EditActivation {
        if let Some(editing) = self.editing_block() {
            return EditActivation::Busy { editing };
        }
        let editable = store.is_live(block)
            && store.block(block).is_some_and(|record| {
                let catalog = store.catalog();
                catalog.is_text_bearing(&record.block_type)
                    && !catalog.is_container(&record.block_type)
            });
        if !editable {
            self.last_activation = None;
            return EditActivation::NotEditable { block };
        }

        let double = self.last_activation.is_some_and(|(previous, when)| {
            previous == block && at >= when && at - when <= self.window
        });
        if !double {
            self.last_activation = Some((block, at));
            return EditActivation::Pending { block };
        }

        self.last_activation = None;
        let draft = store
            .block(block)
            .and_then(|record| record.text())
            .unwrap_or_default()
            .to_owned();
        debug!(block = %block, "inline edit started");
        self.session = Some(EditSession { block, draft });
        EditActivation::Started { block }
    }

    /// Replace the draft text. Returns `false` when no session is open.
    pub fn set_draft(&mut self, text: impl Into<String>) -> bool {
        match self.session.as_mut() {
            Some(session) => {
                session.draft = text.into();
                true
            }
            None => false,
        }
    }

    /// Close the session, writing the draft if it changed.
    pub fn commit(&mut self, store: &mut BlockStore) -> EditOutcome {
        let Some(EditSession { block, draft }) = self.session.take() else {
            return EditOutcome::Discarded;
        };
        if !store.is_live(block) {
            debug!(block = %block, "inline edit target no longer live");
            return EditOutcome::Discarded;
        }
        match store.set_property(block, TEXT_PROPERTY, Some(draft.as_str())) {
            Ok(true) => EditOutcome::Updated { block },
            Ok(false) => EditOutcome::Unchanged { block },
            Err(err) => {
                debug!(block = %block, error = %err, "inline edit discarded");
                EditOutcome::Discarded
            }
        }
    }

    /// Leave edit mode without writing. Returns `false` when no session was open.
    pub fn cancel(&mut self) -> bool {
        self.session.take().is_some()
    }
}
