#![forbid(unsafe_code)]

//! Drag/drop engine for the PageKit block tree.
//!
//! # Role in PageKit
//! `pagekit-dnd` decides where a dragged item lands and commits it. It is
//! host-agnostic: input adapters (see `pagekit-web`) feed it channel-neutral
//! [`DragPayload`]s and canvas coordinates, and it talks to the
//! [`pagekit_tree::BlockStore`] only when a drop is released.
//!
//! # Pieces
//! - [`CanvasLayout`]: measured block boxes in paint order.
//! - [`InsertionResolver`]: pointer sample to [`InsertionPoint`].
//! - [`DragSessionMachine`]: `Idle -> Armed -> Tracking -> Committing`.
//! - [`MutationExecutor`]: payload plus target to one store mutation.
//! - [`DragEngine`]: the three above behind `start/sample/release/cancel`.
//! - [`InlineEditBridge`]: double activation to `text` property edits.
//!
//! # Example
//! ```
//! use pagekit_core::{BlockCatalog, Point, Rect};
//! use pagekit_dnd::{CanvasLayout, DragChannel, DragEngine, DragPayload};
//! use pagekit_tree::{BlockStore, Parent, ScopeId};
//!
//! let page = ScopeId::new(1);
//! let mut store = BlockStore::new(BlockCatalog::standard());
//! let layout = CanvasLayout::new(page, Rect::new(0.0, 0.0, 800.0, 600.0));
//! let mut engine = DragEngine::default();
//!
//! let (token, _) = engine.start(
//!     DragChannel::Native,
//!     DragPayload::new_block("section"),
//!     Point::new(10.0, 10.0),
//! );
//! let report = engine.release(&mut store, &layout, token.unwrap(), Some(Point::new(40.0, 40.0)));
//! assert!(report.committed());
//! assert_eq!(store.child_count(Parent::Root(page)), 1);
//! ```

pub mod config;
pub mod engine;
pub mod executor;
pub mod inline_edit;
pub mod layout;
pub mod payload;
pub mod resolver;
pub mod session;

pub use config::DragConfig;
pub use engine::{DragEngine, DropReport};
pub use executor::{DropError, DropOutcome, MutationExecutor};
pub use inline_edit::{EditActivation, EditOutcome, InlineEditBridge};
pub use layout::{CanvasLayout, DropRegion, RegionEntry};
pub use payload::{DragChannel, DragPayload, PayloadKind, SessionToken};
pub use resolver::{InsertionPoint, InsertionResolver, Resolution, ResolveReason};
pub use session::{
    DragCancelReason, DragEffect, DragNoopReason, DragPhase, DragSessionMachine, DragTransition,
};
