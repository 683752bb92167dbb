#![forbid(unsafe_code)]

//! Native HTML drag-and-drop channel.
//!
//! Browser drag events carry their payload in a [`DataTransfer`], readable
//! only on `dragstart` and `drop`. The adapter normalizes it once at start,
//! turns `dragenter`/`dragover`/`dragleave` into samples, and ends the drag
//! on `drop` (commit) or a `dragend` with no preceding drop (cancel).
//!
//! Some webviews expose the transfer only at drop time. A `drop` that arrives
//! while no native drag is tracked therefore carries its own payload and
//! becomes a one-step [`DragIntent::DropNow`].

use pagekit_core::Point;
use pagekit_dnd::DragCancelReason;
use pagekit_tree::BlockStore;
use serde::{Deserialize, Serialize};

use crate::data_transfer::DataTransfer;
use crate::intent::DragIntent;
use crate::normalizer::{DragInput, DragPayloadNormalizer};

/// One browser drag event as seen by the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NativeDragEvent<'a> {
    DragStart {
        transfer: &'a DataTransfer,
        position: Point,
    },
    DragEnter {
        position: Point,
    },
    DragOver {
        position: Point,
    },
    DragLeave {
        position: Point,
    },
    Drop {
        transfer: &'a DataTransfer,
        position: Point,
    },
    DragEnd,
}

/// Why a native drag event was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NativeIgnoredReason {
    /// The data transfer carried nothing recognizable.
    NoPayload,
    /// A native drag is already being tracked.
    DragInProgress,
    NoActiveDrag,
}

/// Native drag channel.
#[derive(Debug, Clone, Default)]
pub struct NativeDragAdapter {
    tracking: bool,
}

impl NativeDragAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a native drag started on this page is in flight.
    #[must_use]
    pub const fn is_tracking(&self) -> bool {
        self.tracking
    }

    /// Translate one event. `store` validates payload markers.
    pub fn handle(
        &mut self,
        store: &BlockStore,
        event: NativeDragEvent<'_>,
    ) -> Result<DragIntent, NativeIgnoredReason> {
        let intent = match event {
            NativeDragEvent::DragStart { transfer, position } => {
                if self.tracking {
                    return ignored(NativeIgnoredReason::DragInProgress);
                }
                let Some(payload) =
                    DragPayloadNormalizer::new(store).normalize(DragInput::Transfer(transfer))
                else {
                    return ignored(NativeIgnoredReason::NoPayload);
                };
                self.tracking = true;
                DragIntent::Start {
                    payload,
                    origin: position,
                }
            }
            NativeDragEvent::DragEnter { position }
            | NativeDragEvent::DragOver { position }
            | NativeDragEvent::DragLeave { position } => {
                if !self.tracking {
                    return ignored(NativeIgnoredReason::NoActiveDrag);
                }
                DragIntent::Sample { point: position }
            }
            NativeDragEvent::Drop { transfer, position } if !self.tracking => {
                match DragPayloadNormalizer::new(store).normalize(DragInput::Transfer(transfer)) {
                    Some(payload) => DragIntent::DropNow {
                        payload,
                        point: position,
                    },
                    None => return ignored(NativeIgnoredReason::NoPayload),
                }
            }
            NativeDragEvent::Drop { position, .. } => {
                self.tracking = false;
                DragIntent::Release {
                    point: Some(position),
                }
            }
            NativeDragEvent::DragEnd => {
                if !self.tracking {
                    return ignored(NativeIgnoredReason::NoActiveDrag);
                }
                self.tracking = false;
                DragIntent::Cancel {
                    reason: DragCancelReason::DragEnded,
                }
            }
        };
        Ok(intent)
    }

    /// Stop tracking without emitting an intent.
    pub fn reset(&mut self) {
        self.tracking = false;
    }
}

fn ignored(reason: NativeIgnoredReason) -> Result<DragIntent, NativeIgnoredReason> {
    #[cfg(feature = "tracing")]
    tracing::trace!(?reason, "native drag event ignored");
    Err(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagekit_core::BlockCatalog;
    use pagekit_dnd::DragPayload;
    use pagekit_tree::{BlockId, NewBlock, Parent, ScopeId};
    use pretty_assertions::assert_eq;

    fn store() -> (BlockStore, BlockId) {
        let mut store = BlockStore::new(BlockCatalog::standard());
        let id = store
            .insert_block(NewBlock::new("image"), Parent::Root(ScopeId::new(1)), 0)
            .expect("insert")
            .id;
        (store, id)
    }

    fn at(y: f64) -> Point {
        Point::new(10.0, y)
    }

    #[test]
    fn start_over_drop_lifecycle() {
        let (store, id) = store();
        let transfer = DataTransfer::from_payload(&DragPayload::move_block(id, "image"));
        let mut adapter = NativeDragAdapter::new();

        let start = adapter.handle(
            &store,
            NativeDragEvent::DragStart {
                transfer: &transfer,
                position: at(1.0),
            },
        );
        assert_eq!(
            start,
            Ok(DragIntent::Start {
                payload: DragPayload::move_block(id, "image"),
                origin: at(1.0),
            })
        );
        let over = adapter.handle(&store, NativeDragEvent::DragOver { position: at(5.0) });
        assert_eq!(over, Ok(DragIntent::Sample { point: at(5.0) }));

        let drop = adapter.handle(
            &store,
            NativeDragEvent::Drop {
                transfer: &DataTransfer::new(),
                position: at(6.0),
            },
        );
        assert_eq!(drop, Ok(DragIntent::Release { point: Some(at(6.0)) }));

        let end = adapter.handle(&store, NativeDragEvent::DragEnd);
        assert_eq!(end, Err(NativeIgnoredReason::NoActiveDrag));
    }

    #[test]
    fn dragend_without_drop_cancels() {
        let (store, _) = store();
        let transfer: DataTransfer = [("text/plain", "button")].into_iter().collect();
        let mut adapter = NativeDragAdapter::new();
        let start = adapter.handle(
            &store,
            NativeDragEvent::DragStart {
                transfer: &transfer,
                position: at(0.0),
            },
        );
        assert!(start.is_ok());
        let end = adapter.handle(&store, NativeDragEvent::DragEnd);
        assert_eq!(
            end,
            Ok(DragIntent::Cancel {
                reason: DragCancelReason::DragEnded
            })
        );
        assert!(!adapter.is_tracking());
    }

    #[test]
    fn unrecognized_transfers_are_ignored() {
        let (store, _) = store();
        let files: DataTransfer = [("Files", "photo.png")].into_iter().collect();
        let mut adapter = NativeDragAdapter::new();
        let start = adapter.handle(
            &store,
            NativeDragEvent::DragStart {
                transfer: &files,
                position: at(0.0),
            },
        );
        assert_eq!(start, Err(NativeIgnoredReason::NoPayload));
        let over = adapter.handle(&store, NativeDragEvent::DragOver { position: at(3.0) });
        assert_eq!(over, Err(NativeIgnoredReason::NoActiveDrag));
        let drop = adapter.handle(
            &store,
            NativeDragEvent::Drop {
                transfer: &files,
                position: at(3.0),
            },
        );
        assert_eq!(drop, Err(NativeIgnoredReason::NoPayload));
    }

    #[test]
    fn drop_only_transfer_becomes_drop_now() {
        let (store, _) = store();
        let transfer: DataTransfer = [("application/x-pagekit-new", "divider")]
            .into_iter()
            .collect();
        let mut adapter = NativeDragAdapter::new();
        let drop = adapter.handle(
            &store,
            NativeDragEvent::Drop {
                transfer: &transfer,
                position: at(40.0),
            },
        );
        assert_eq!(
            drop,
            Ok(DragIntent::DropNow {
                payload: DragPayload::new_block("divider"),
                point: at(40.0),
            })
        );
        assert!(!adapter.is_tracking());
    }
}
