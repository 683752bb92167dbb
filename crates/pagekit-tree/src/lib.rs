#![forbid(unsafe_code)]

//! Block tree model for the PageKit editor.
//!
//! # Role in PageKit
//! `pagekit-tree` owns the document: an arena of [`Block`] records with one
//! ordered sibling list per parent. Every mutation is validated up front,
//! applied atomically, reported as an invertible [`BlockOperation`], and
//! broadcast to subscribers (renderers, the [`Persistence`] sink, the
//! [`History`] stack).
//!
//! # Example
//! ```
//! use pagekit_core::BlockCatalog;
//! use pagekit_tree::{BlockStore, NewBlock, Parent, ScopeId};
//!
//! let page = ScopeId::new(1);
//! let mut store = BlockStore::new(BlockCatalog::standard());
//! let hero = store
//!     .insert_block(NewBlock::new("section"), Parent::Root(page), 0)
//!     .unwrap()
//!     .id;
//! store
//!     .insert_block(NewBlock::new("heading"), Parent::Block(hero), 0)
//!     .unwrap();
//! assert_eq!(store.child_count(Parent::Block(hero)), 1);
//! ```

pub mod block;
pub mod collab;
pub mod error;
pub mod operation;
pub mod snapshot;
pub mod store;

pub use block::{Block, BlockId, NewBlock, Parent, Placement, ScopeId, TEXT_PROPERTY};
pub use collab::{History, Persistence, Subscription};
pub use error::{BlockStoreError, InvalidParentReason, InvariantViolation};
pub use operation::{BlockChange, BlockOperation, BlockOperationKind, ChangeOrigin, MoveOutcome};
pub use snapshot::{BLOCK_TREE_SCHEMA_VERSION, BlockTreeSnapshot, SiblingList};
pub use store::BlockStore;
