#![forbid(unsafe_code)]

//! Channel arbitration between native and synthetic drags.
//!
//! Both channels feed one [`DragEngine`]. The channel that arms a session
//! owns it until the session ends; intents from the other channel are
//! ignored meanwhile, and a rejected start is rolled back in its adapter so
//! the adapter does not keep tracking a drag the engine never accepted.

use pagekit_core::Point;
use pagekit_dnd::{
    CanvasLayout, DragCancelReason, DragChannel, DragConfig, DragEngine, DragPhase,
    DragTransition, DropReport, InsertionPoint, SessionToken,
};
use pagekit_tree::BlockStore;

use crate::intent::DragIntent;
use crate::native::{NativeDragAdapter, NativeDragEvent, NativeIgnoredReason};
use crate::normalizer::{DragInput, DragPayloadNormalizer};
use crate::pointer_session::{
    CaptureCommand, PointerButton, PointerDispatch, PointerDragSession, PointerIgnoredReason,
    PointerSessionConfig,
};

/// Why the controller did not reach the engine, or the engine refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerIgnoredReason {
    /// The drag source normalized to nothing.
    NoPayload,
    /// The other channel owns the active session.
    ChannelBusy { owner: DragChannel },
    NoSession,
    Native(NativeIgnoredReason),
    Pointer(PointerIgnoredReason),
}

/// What one browser event did.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerOutcome {
    Transition(DragTransition),
    Dropped(DropReport),
    /// Pointer capture bookkeeping only.
    CaptureUpdated,
    Ignored(ControllerIgnoredReason),
}

/// Result of one browser event.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerDispatch {
    pub channel: DragChannel,
    /// Pointer capture command the host must perform.
    pub capture_command: Option<CaptureCommand>,
    pub outcome: ControllerOutcome,
}

impl ControllerDispatch {
    #[must_use]
    pub fn report(&self) -> Option<&DropReport> {
        match &self.outcome {
            ControllerOutcome::Dropped(report) => Some(report),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_ignored(&self) -> bool {
        matches!(self.outcome, ControllerOutcome::Ignored(_))
    }
}

/// Drag entry point for a web canvas host.
#[derive(Debug, Clone, Default)]
pub struct DragDropController {
    engine: DragEngine,
    native: NativeDragAdapter,
    pointer: PointerDragSession,
}

impl DragDropController {
    #[must_use]
    pub fn new(config: DragConfig, pointer: PointerSessionConfig) -> Self {
        Self {
            engine: DragEngine::new(config),
            native: NativeDragAdapter::new(),
            pointer: PointerDragSession::new(pointer),
        }
    }

    #[must_use]
    pub const fn engine(&self) -> &DragEngine {
        &self.engine
    }

    #[must_use]
    pub const fn phase(&self) -> DragPhase {
        self.engine.phase()
    }

    /// Channel owning the active session.
    #[must_use]
    pub fn active_channel(&self) -> Option<DragChannel> {
        self.engine.channel()
    }

    /// Drop feedback to render.
    #[must_use]
    pub fn target(&self) -> Option<InsertionPoint> {
        self.engine.target()
    }

    // ------------------------------------------------------------------
    // Native channel
    // ------------------------------------------------------------------

    pub fn native_event(
        &mut self,
        store: &mut BlockStore,
        layout: &CanvasLayout,
        event: NativeDragEvent<'_>,
    ) -> ControllerDispatch {
        let outcome = match self.native.handle(store, event) {
            Ok(intent) => {
                let starting = matches!(intent, DragIntent::Start { .. });
                let outcome = self.apply(DragChannel::Native, intent, store, layout);
                if starting && matches!(outcome, ControllerOutcome::Ignored(_)) {
                    self.native.reset();
                }
                outcome
            }
            Err(reason) => ControllerOutcome::Ignored(ControllerIgnoredReason::Native(reason)),
        };
        ControllerDispatch {
            channel: DragChannel::Native,
            capture_command: None,
            outcome,
        }
    }

    // ------------------------------------------------------------------
    // Synthetic channel
    // ------------------------------------------------------------------

    /// Pointer-down on a draggable palette item or canvas block.
    pub fn pointer_down(
        &mut self,
        store: &mut BlockStore,
        layout: &CanvasLayout,
        source: DragInput<'_>,
        pointer_id: u32,
        button: PointerButton,
        position: Point,
    ) -> ControllerDispatch {
        let Some(payload) = DragPayloadNormalizer::new(store).normalize(source) else {
            return Self::synthetic(None, ControllerIgnoredReason::NoPayload);
        };
        let dispatch = self
            .pointer
            .pointer_down(payload, pointer_id, button, position);
        self.pointer_dispatch(store, layout, dispatch)
    }

    pub fn capture_acquired(&mut self, pointer_id: u32) -> ControllerDispatch {
        match self.pointer.capture_acquired(pointer_id).ignored {
            Some(reason) => Self::synthetic(None, ControllerIgnoredReason::Pointer(reason)),
            None => ControllerDispatch {
                channel: DragChannel::Synthetic,
                capture_command: None,
                outcome: ControllerOutcome::CaptureUpdated,
            },
        }
    }

    pub fn pointer_move(
        &mut self,
        store: &mut BlockStore,
        layout: &CanvasLayout,
        pointer_id: u32,
        position: Point,
    ) -> ControllerDispatch {
        let dispatch = self.pointer.pointer_move(pointer_id, position);
        self.pointer_dispatch(store, layout, dispatch)
    }

    pub fn pointer_up(
        &mut self,
        store: &mut BlockStore,
        layout: &CanvasLayout,
        pointer_id: u32,
        button: PointerButton,
        position: Point,
    ) -> ControllerDispatch {
        let dispatch = self.pointer.pointer_up(pointer_id, button, position);
        self.pointer_dispatch(store, layout, dispatch)
    }

    pub fn pointer_cancel(
        &mut self,
        store: &mut BlockStore,
        layout: &CanvasLayout,
        pointer_id: Option<u32>,
    ) -> ControllerDispatch {
        let dispatch = self.pointer.pointer_cancel(pointer_id);
        self.pointer_dispatch(store, layout, dispatch)
    }

    pub fn pointer_leave(
        &mut self,
        store: &mut BlockStore,
        layout: &CanvasLayout,
        pointer_id: u32,
    ) -> ControllerDispatch {
        let dispatch = self.pointer.pointer_leave(pointer_id);
        self.pointer_dispatch(store, layout, dispatch)
    }

    pub fn blur(&mut self, store: &mut BlockStore, layout: &CanvasLayout) -> ControllerDispatch {
        let dispatch = self.pointer.blur();
        self.pointer_dispatch(store, layout, dispatch)
    }

    pub fn visibility_hidden(
        &mut self,
        store: &mut BlockStore,
        layout: &CanvasLayout,
    ) -> ControllerDispatch {
        let dispatch = self.pointer.visibility_hidden();
        self.pointer_dispatch(store, layout, dispatch)
    }

    pub fn lost_pointer_capture(
        &mut self,
        store: &mut BlockStore,
        layout: &CanvasLayout,
        pointer_id: u32,
    ) -> ControllerDispatch {
        let dispatch = self.pointer.lost_pointer_capture(pointer_id);
        self.pointer_dispatch(store, layout, dispatch)
    }

    /// Escape key. Native drags are cancelled by the browser itself.
    pub fn escape(&mut self, store: &mut BlockStore, layout: &CanvasLayout) -> ControllerDispatch {
        let dispatch = self.pointer.escape();
        self.pointer_dispatch(store, layout, dispatch)
    }

    /// Tear down whatever session is active on either channel.
    pub fn cancel_all(&mut self, reason: DragCancelReason) -> Option<ControllerDispatch> {
        let capture_command = self.pointer.abandon();
        self.native.reset();
        let channel = self.engine.channel()?;
        let transition = self.engine.force_cancel(reason)?;
        Some(ControllerDispatch {
            channel,
            capture_command,
            outcome: ControllerOutcome::Transition(transition),
        })
    }

    fn pointer_dispatch(
        &mut self,
        store: &mut BlockStore,
        layout: &CanvasLayout,
        dispatch: PointerDispatch,
    ) -> ControllerDispatch {
        let Some(intent) = dispatch.intent else {
            let reason = dispatch
                .ignored
                .map_or(ControllerIgnoredReason::NoSession, ControllerIgnoredReason::Pointer);
            return Self::synthetic(dispatch.capture_command, reason);
        };
        let starting = matches!(intent, DragIntent::Start { .. });
        let outcome = self.apply(DragChannel::Synthetic, intent, store, layout);
        let capture_command = if starting && matches!(outcome, ControllerOutcome::Ignored(_)) {
            self.pointer.abandon();
            None
        } else {
            dispatch.capture_command
        };
        ControllerDispatch {
            channel: DragChannel::Synthetic,
            capture_command,
            outcome,
        }
    }

    fn synthetic(
        capture_command: Option<CaptureCommand>,
        reason: ControllerIgnoredReason,
    ) -> ControllerDispatch {
        ControllerDispatch {
            channel: DragChannel::Synthetic,
            capture_command,
            outcome: ControllerOutcome::Ignored(reason),
        }
    }

    fn owned_token(&self, channel: DragChannel) -> Result<SessionToken, ControllerIgnoredReason> {
        match (self.engine.channel(), self.engine.token()) {
            (Some(owner), _) if owner != channel => {
                Err(ControllerIgnoredReason::ChannelBusy { owner })
            }
            (Some(_), Some(token)) => Ok(token),
            _ => Err(ControllerIgnoredReason::NoSession),
        }
    }

    fn apply(
        &mut self,
        channel: DragChannel,
        intent: DragIntent,
        store: &mut BlockStore,
        layout: &CanvasLayout,
    ) -> ControllerOutcome {
        let outcome = match intent {
            DragIntent::Start { payload, origin } => match self.engine.channel() {
                Some(owner) => {
                    ControllerOutcome::Ignored(ControllerIgnoredReason::ChannelBusy { owner })
                }
                None => ControllerOutcome::Transition(self.engine.start(channel, payload, origin).1),
            },
            DragIntent::Sample { point } => match self.owned_token(channel) {
                Ok(token) => {
                    ControllerOutcome::Transition(self.engine.sample(store, layout, token, point))
                }
                Err(reason) => ControllerOutcome::Ignored(reason),
            },
            DragIntent::Release { point } => match self.owned_token(channel) {
                Ok(token) => {
                    ControllerOutcome::Dropped(self.engine.release(store, layout, token, point))
                }
                Err(reason) => ControllerOutcome::Ignored(reason),
            },
            DragIntent::Cancel { reason } => match self.owned_token(channel) {
                Ok(token) => ControllerOutcome::Transition(self.engine.cancel(token, reason)),
                Err(reason) => ControllerOutcome::Ignored(reason),
            },
            DragIntent::DropNow { payload, point } => {
                match self.engine.drop_now(store, layout, channel, payload, point) {
                    Some(report) => ControllerOutcome::Dropped(report),
                    None => ControllerOutcome::Ignored(ControllerIgnoredReason::ChannelBusy {
                        owner: self.engine.channel().unwrap_or(channel),
                    }),
                }
            }
        };
        #[cfg(feature = "tracing")]
        if let ControllerOutcome::Ignored(reason) = &outcome {
            tracing::debug!(%channel, ?reason, "drag intent not applied");
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagekit_core::{BlockCatalog, Rect};
    use pagekit_dnd::{DragEffect, DragPayload, DropOutcome};
    use pagekit_tree::{BlockId, NewBlock, Parent, ScopeId};
    use pretty_assertions::assert_eq;

    use crate::data_transfer::DataTransfer;

    const PAGE: ScopeId = ScopeId::new(1);
    const ROOT: Parent = Parent::Root(PAGE);

    fn page() -> (BlockStore, CanvasLayout, BlockId, BlockId) {
        let mut store = BlockStore::new(BlockCatalog::standard());
        let a = store
            .insert_block(NewBlock::new("text").with_name("A"), ROOT, 0)
            .expect("insert")
            .id;
        let b = store
            .insert_block(NewBlock::new("text").with_name("B"), ROOT, 1)
            .expect("insert")
            .id;
        let mut layout = CanvasLayout::new(PAGE, Rect::new(0.0, 0.0, 400.0, 400.0));
        layout.register_block(a, Rect::new(0.0, 0.0, 400.0, 50.0));
        layout.register_block(b, Rect::new(0.0, 50.0, 400.0, 50.0));
        (store, layout, a, b)
    }

    fn pos(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn synthetic_drag_commits_and_releases_capture() {
        let (mut store, layout, a, b) = page();
        let mut controller = DragDropController::default();
        let down = controller.pointer_down(
            &mut store,
            &layout,
            DragInput::Canvas { block_id: a },
            3,
            PointerButton::Primary,
            pos(10.0, 10.0),
        );
        assert_eq!(down.capture_command, Some(CaptureCommand::Acquire { pointer_id: 3 }));
        assert_eq!(controller.active_channel(), Some(DragChannel::Synthetic));
        controller.capture_acquired(3);

        let small = controller.pointer_move(&mut store, &layout, 3, pos(11.0, 11.0));
        assert!(matches!(
            small.outcome,
            ControllerOutcome::Transition(DragTransition {
                effect: DragEffect::Noop { .. },
                ..
            })
        ));
        controller.pointer_move(&mut store, &layout, 3, pos(10.0, 90.0));
        assert_eq!(controller.target(), Some(InsertionPoint::new(ROOT, 2)));

        let up = controller.pointer_up(&mut store, &layout, 3, PointerButton::Primary, pos(10.0, 90.0));
        assert_eq!(up.capture_command, Some(CaptureCommand::Release { pointer_id: 3 }));
        assert!(up.report().is_some_and(DropReport::committed));
        assert_eq!(store.child_ids(ROOT), &[b, a]);
        assert_eq!(controller.phase(), DragPhase::Idle);
    }

    #[test]
    fn native_events_are_ignored_while_pointer_owns_the_session() {
        let (mut store, layout, a, b) = page();
        let mut controller = DragDropController::default();
        controller.pointer_down(
            &mut store,
            &layout,
            DragInput::Canvas { block_id: a },
            1,
            PointerButton::Primary,
            pos(10.0, 10.0),
        );

        let transfer = DataTransfer::from_payload(&DragPayload::move_block(b, "B"));
        let start = controller.native_event(
            &mut store,
            &layout,
            NativeDragEvent::DragStart {
                transfer: &transfer,
                position: pos(10.0, 60.0),
            },
        );
        assert_eq!(
            start.outcome,
            ControllerOutcome::Ignored(ControllerIgnoredReason::ChannelBusy {
                owner: DragChannel::Synthetic
            })
        );
        let drop = controller.native_event(
            &mut store,
            &layout,
            NativeDragEvent::Drop {
                transfer: &transfer,
                position: pos(10.0, 5.0),
            },
        );
        assert!(drop.is_ignored());
        assert_eq!(store.child_ids(ROOT), &[a, b]);
        assert_eq!(controller.active_channel(), Some(DragChannel::Synthetic));
    }

    #[test]
    fn pointer_down_during_native_drag_requests_no_capture() {
        let (mut store, layout, a, b) = page();
        let mut controller = DragDropController::default();
        let transfer = DataTransfer::from_payload(&DragPayload::move_block(b, "B"));
        controller.native_event(
            &mut store,
            &layout,
            NativeDragEvent::DragStart {
                transfer: &transfer,
                position: pos(10.0, 60.0),
            },
        );
        let down = controller.pointer_down(
            &mut store,
            &layout,
            DragInput::Canvas { block_id: a },
            4,
            PointerButton::Primary,
            pos(10.0, 10.0),
        );
        assert_eq!(down.capture_command, None);
        assert!(down.is_ignored());
        let again = controller.pointer_move(&mut store, &layout, 4, pos(10.0, 80.0));
        assert_eq!(
            again.outcome,
            ControllerOutcome::Ignored(ControllerIgnoredReason::Pointer(
                PointerIgnoredReason::NoActivePointer
            ))
        );
    }

    #[test]
    fn escape_and_blur_cancel_synthetic_drags() {
        let (mut store, layout, a, _) = page();
        let mut controller = DragDropController::default();
        let hash = store.state_hash();
        controller.pointer_down(
            &mut store,
            &layout,
            DragInput::Canvas { block_id: a },
            1,
            PointerButton::Primary,
            pos(10.0, 10.0),
        );
        controller.pointer_move(&mut store, &layout, 1, pos(10.0, 90.0));
        let escape = controller.escape(&mut store, &layout);
        assert!(matches!(
            escape.outcome,
            ControllerOutcome::Transition(DragTransition {
                effect: DragEffect::Cancelled {
                    reason: DragCancelReason::EscapeKey,
                    ..
                },
                ..
            })
        ));
        let blur = controller.blur(&mut store, &layout);
        assert!(blur.is_ignored());
        assert_eq!(store.state_hash(), hash);
    }

    #[test]
    fn drop_only_native_transfer_commits() {
        let (mut store, layout, a, b) = page();
        let mut controller = DragDropController::default();
        let transfer: DataTransfer = [("text/plain", "divider")].into_iter().collect();
        let drop = controller.native_event(
            &mut store,
            &layout,
            NativeDragEvent::Drop {
                transfer: &transfer,
                position: pos(10.0, 30.0),
            },
        );
        let Some(DropOutcome::Inserted { block, .. }) =
            drop.report().and_then(|report| report.outcome.clone())
        else {
            unreachable!("expected insert, got {drop:?}");
        };
        assert_eq!(store.child_ids(ROOT), &[a, block, b]);
    }

    #[test]
    fn cancel_all_tears_down_both_channels() {
        let (mut store, layout, a, _) = page();
        let mut controller = DragDropController::default();
        assert!(controller.cancel_all(DragCancelReason::Programmatic).is_none());
        controller.pointer_down(
            &mut store,
            &layout,
            DragInput::Canvas { block_id: a },
            1,
            PointerButton::Primary,
            pos(10.0, 10.0),
        );
        controller.capture_acquired(1);
        let cancelled = controller
            .cancel_all(DragCancelReason::Programmatic)
            .expect("session active");
        assert_eq!(cancelled.capture_command, Some(CaptureCommand::Release { pointer_id: 1 }));
        assert_eq!(controller.phase(), DragPhase::Idle);
    }
}
