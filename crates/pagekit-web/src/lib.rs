#![forbid(unsafe_code)]

//! `pagekit-web` connects browser drag input to the PageKit drag engine.
//!
//! Design goals:
//! - **Host-driven**: the embedding JS pushes DOM events in; Rust answers with
//!   engine outcomes and pointer-capture commands to perform.
//! - **Two channels, one engine**: native HTML drag-and-drop and a synthetic
//!   pointer drag (for webviews that drop native payloads) produce identical
//!   trees for identical gestures.
//! - **One owner per session**: the channel that arms a session owns it.
//!
//! This crate does not bind to `wasm-bindgen`; hosts wrap
//! [`DragDropController`] with whatever JS API they expose.

pub mod controller;
pub mod data_transfer;
pub mod intent;
pub mod native;
pub mod normalizer;
pub mod pointer_session;

pub use controller::{
    ControllerDispatch, ControllerIgnoredReason, ControllerOutcome, DragDropController,
};
pub use data_transfer::DataTransfer;
pub use intent::DragIntent;
pub use native::{NativeDragAdapter, NativeDragEvent, NativeIgnoredReason};
pub use normalizer::{DragInput, DragPayloadNormalizer};
pub use pointer_session::{
    CaptureCommand, PointerButton, PointerDragSession, PointerIgnoredReason, PointerSessionConfig,
};
