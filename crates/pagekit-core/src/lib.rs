#![forbid(unsafe_code)]

//! Core primitives shared by the PageKit editor engine.
//!
//! # Role in PageKit
//! `pagekit-core` owns the small, dependency-light vocabulary every other
//! crate speaks: canvas geometry in CSS pixels and the block-type catalog
//! that tells containers apart from leaves.
//!
//! # How it fits in the system
//! The block store (`pagekit-tree`) validates parents against the
//! [`catalog::BlockCatalog`]; the drag/drop engine (`pagekit-dnd`) hit-tests
//! [`geometry::Rect`] regions; the web adapter (`pagekit-web`) validates
//! plain-text drag payloads with [`catalog::is_valid_type_name`].

pub mod catalog;
pub mod geometry;

pub use catalog::{BlockCatalog, BlockTraits, CatalogError, is_valid_type_name};
pub use geometry::{Point, Rect};
