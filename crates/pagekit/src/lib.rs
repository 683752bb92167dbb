#![forbid(unsafe_code)]

//! PageKit public facade crate.
//!
//! Re-exports the common types from the internal crates, wraps them in an
//! [`Editor`] that owns one document, and offers a prelude for day-to-day
//! use.
//!
//! # Example
//! ```
//! use pagekit::prelude::*;
//!
//! let page = ScopeId::new(1);
//! let mut editor = Editor::new(
//!     BlockCatalog::standard(),
//!     CanvasLayout::new(page, Rect::new(0.0, 0.0, 800.0, 600.0)),
//! );
//! let hero = editor
//!     .insert_block(NewBlock::new("section"), Parent::Root(page), 0)
//!     .unwrap();
//! let outcome = editor
//!     .drop_at(
//!         &DragPayload::new_block("heading"),
//!         InsertionPoint::new(Parent::Block(hero), 0),
//!     )
//!     .unwrap();
//! assert!(outcome.is_mutation());
//! assert_eq!(editor.store().child_count(Parent::Block(hero)), 1);
//! ```

pub mod editor;
pub mod error;

pub use editor::{Editor, ReplayOutcome};
pub use error::{Error, Result};

// --- Core re-exports -------------------------------------------------------

pub use pagekit_core::{BlockCatalog, BlockTraits, CatalogError, Point, Rect};

// --- Tree re-exports -------------------------------------------------------

pub use pagekit_tree::{
    Block, BlockChange, BlockId, BlockOperation, BlockStore, BlockStoreError, BlockTreeSnapshot,
    ChangeOrigin, History, InvariantViolation, MoveOutcome, NewBlock, Parent, Persistence,
    Placement, ScopeId, Subscription,
};

// --- Drag/drop re-exports --------------------------------------------------

pub use pagekit_dnd::{
    CanvasLayout, DragCancelReason, DragChannel, DragConfig, DragPayload, DragPhase, DropError,
    DropOutcome, DropReport, EditActivation, EditOutcome, InsertionPoint,
};

// --- Web re-exports --------------------------------------------------------

pub use pagekit_web::{
    CaptureCommand, ControllerDispatch, ControllerOutcome, DataTransfer, DragInput,
    NativeDragEvent, PointerButton, PointerSessionConfig,
};

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        BlockCatalog, BlockId, BlockStore, CanvasLayout, DataTransfer, DragInput, DragPayload,
        DropOutcome, Editor, Error, History, InsertionPoint, NativeDragEvent, NewBlock, Parent,
        Persistence, Point, PointerButton, Rect, Result, ScopeId,
    };

    pub use crate::{core, dnd, tree, web};
}

pub use pagekit_core as core;
pub use pagekit_dnd as dnd;
pub use pagekit_tree as tree;
pub use pagekit_web as web;
