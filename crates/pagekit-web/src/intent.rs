#![forbid(unsafe_code)]

//! Channel-neutral engine requests produced by the input adapters.

use pagekit_core::Point;
use pagekit_dnd::{DragCancelReason, DragPayload};

/// What an adapter asks the drag engine to do for one browser event.
#[derive(Debug, Clone, PartialEq)]
pub enum DragIntent {
    /// Arm a session carrying `payload`.
    Start { payload: DragPayload, origin: Point },
    /// Resolve the insertion point under `point`.
    Sample { point: Point },
    /// Commit the session, resolving `point` first when given.
    Release { point: Option<Point> },
    Cancel { reason: DragCancelReason },
    /// Arm, resolve and commit at once; the payload was only readable at drop.
    DropNow { payload: DragPayload, point: Point },
}
