#![forbid(unsafe_code)]

//! Drag session lifecycle state machine.
//!
//! ```text
//! Idle ──arm──▶ Armed ──sample──▶ Tracking ──release──▶ Committing ──finish──▶ Idle
//!                 │                  │    ▲  sample
//!                 └──cancel──────────┴────┴──────────────▶ Idle (cancelled)
//! ```
//!
//! Exactly one session exists at a time. Arming while a session is active
//! is a [`DragNoopReason::SessionActive`] no-op, and every event names the
//! [`SessionToken`] it belongs to so stale events from a finished session
//! cannot leak into the next one.
//!
//! The machine never touches the block store. Resolution is delegated to the
//! caller through the `sample` closure, which only runs when the session is
//! actually tracking (past the drag threshold for synthetic drags).

use pagekit_core::Point;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::{DEFAULT_DRAG_THRESHOLD_PX, DragConfig};
use crate::payload::{DragChannel, DragPayload, SessionToken};
use crate::resolver::{InsertionPoint, Resolution, ResolveReason};

/// Coarse lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragPhase {
    #[default]
    Idle,
    Armed,
    Tracking,
    Committing,
}

/// Why a session ended without a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragCancelReason {
    EscapeKey,
    PointerCancel,
    Blur,
    VisibilityHidden,
    LostPointerCapture,
    PointerLeave,
    /// The native drag ended without a drop event.
    DragEnded,
    /// Released with no valid insertion point.
    NoTarget,
    Programmatic,
}

/// Why an event had no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragNoopReason {
    /// Another session is already active.
    SessionActive,
    NoActiveSession,
    /// The event names a session that is no longer current.
    StaleToken,
    /// Synthetic pointer has not travelled past the drag threshold yet.
    BelowThreshold,
    /// The session is committing and accepts no more input.
    Committing,
}

/// Transition effect emitted by one lifecycle step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum DragEffect {
    Armed {
        token: SessionToken,
        channel: DragChannel,
        origin: Point,
    },
    TrackingStarted {
        token: SessionToken,
        target: Option<InsertionPoint>,
        reason: ResolveReason,
    },
    TargetChanged {
        token: SessionToken,
        target: Option<InsertionPoint>,
        reason: ResolveReason,
    },
    TargetRetained {
        token: SessionToken,
        reason: ResolveReason,
    },
    CommitStarted {
        token: SessionToken,
        target: InsertionPoint,
    },
    Committed {
        token: SessionToken,
        target: InsertionPoint,
    },
    CommitFailed {
        token: SessionToken,
        target: InsertionPoint,
    },
    Cancelled {
        token: SessionToken,
        reason: DragCancelReason,
    },
    Noop {
        reason: DragNoopReason,
    },
}

impl DragEffect {
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        matches!(self, Self::Noop { .. })
    }
}

/// One state-machine transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragTransition {
    pub from: DragPhase,
    pub to: DragPhase,
    pub effect: DragEffect,
}

#[derive(Debug, Clone, PartialEq)]
struct ActiveDrag {
    token: SessionToken,
    channel: DragChannel,
    payload: DragPayload,
    origin: Point,
    target: Option<InsertionPoint>,
}

/// Deterministic drag lifecycle machine.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSessionMachine {
    phase: DragPhase,
    active: Option<ActiveDrag>,
    drag_threshold: f64,
    token_counter: u64,
}

impl Default for DragSessionMachine {
    fn default() -> Self {
        Self {
            phase: DragPhase::Idle,
            active: None,
            drag_threshold: DEFAULT_DRAG_THRESHOLD_PX,
            token_counter: 0,
        }
    }
}

impl DragSessionMachine {
    #[must_use]
    pub fn new(config: &DragConfig) -> Self {
        Self {
            drag_threshold: config.validated().drag_threshold,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn phase(&self) -> DragPhase {
        self.phase
    }

    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self.phase, DragPhase::Idle)
    }

    /// Token of the active session.
    #[must_use]
    pub fn token(&self) -> Option<SessionToken> {
        self.active.as_ref().map(|drag| drag.token)
    }

    /// Channel that owns the active session.
    #[must_use]
    pub fn channel(&self) -> Option<DragChannel> {
        self.active.as_ref().map(|drag| drag.channel)
    }

    #[must_use]
    pub fn payload(&self) -> Option<&DragPayload> {
        self.active.as_ref().map(|drag| &drag.payload)
    }

    /// Currently shown insertion point.
    #[must_use]
    pub fn target(&self) -> Option<InsertionPoint> {
        self.active.as_ref().and_then(|drag| drag.target)
    }

    /// Start a session. Ignored while another session is active.
    pub fn arm(
        &mut self,
        channel: DragChannel,
        payload: DragPayload,
        origin: Point,
    ) -> DragTransition {
        if !self.is_idle() {
            return self.noop(DragNoopReason::SessionActive);
        }
        self.token_counter = self.token_counter.saturating_add(1);
        let token = SessionToken::new(self.token_counter);
        self.active = Some(ActiveDrag {
            token,
            channel,
            payload,
            origin,
            target: None,
        });
        self.transition(
            DragPhase::Armed,
            DragEffect::Armed {
                token,
                channel,
                origin,
            },
        )
    }

    /// Feed one pointer sample.
    ///
    /// `resolve` receives the payload and the current target and runs only
    /// when the sample is tracked.
    pub fn sample(
        &mut self,
        token: SessionToken,
        point: Point,
        resolve: impl FnOnce(&DragPayload, Option<InsertionPoint>) -> Resolution,
    ) -> DragTransition {
        if let Err(reason) = self.check_input(token) {
            return self.noop(reason);
        }
        let starting = self.phase == DragPhase::Armed;
        let below_threshold = self.active.as_ref().is_some_and(|drag| {
            drag.channel == DragChannel::Synthetic
                && drag.origin.distance(point) < self.drag_threshold
        });
        if starting && below_threshold {
            return self.noop(DragNoopReason::BelowThreshold);
        }
        let Some(drag) = self.active.as_mut() else {
            return self.noop(DragNoopReason::NoActiveSession);
        };

        let resolution = resolve(&drag.payload, drag.target);
        drag.target = resolution.target;
        let effect = if starting {
            DragEffect::TrackingStarted {
                token,
                target: resolution.target,
                reason: resolution.reason,
            }
        } else if resolution.changed {
            DragEffect::TargetChanged {
                token,
                target: resolution.target,
                reason: resolution.reason,
            }
        } else {
            DragEffect::TargetRetained {
                token,
                reason: resolution.reason,
            }
        };
        self.transition(DragPhase::Tracking, effect)
    }

    /// Pointer released / drop received.
    ///
    /// With a target the session enters [`DragPhase::Committing`] and the
    /// caller must report the result through [`Self::finish_commit`].
    /// Without one it is cancelled with [`DragCancelReason::NoTarget`].
    pub fn release(&mut self, token: SessionToken) -> DragTransition {
        if let Err(reason) = self.check_input(token) {
            return self.noop(reason);
        }
        match self.target() {
            Some(target) => self.transition(
                DragPhase::Committing,
                DragEffect::CommitStarted { token, target },
            ),
            None => self.end(token, DragCancelReason::NoTarget),
        }
    }

    /// Close a committing session.
    pub fn finish_commit(&mut self, token: SessionToken, committed: bool) -> DragTransition {
        if self.phase != DragPhase::Committing {
            return self.noop(DragNoopReason::NoActiveSession);
        }
        if self.token() != Some(token) {
            return self.noop(DragNoopReason::StaleToken);
        }
        let Some(target) = self.target() else {
            return self.end(token, DragCancelReason::NoTarget);
        };
        self.active = None;
        let effect = if committed {
            DragEffect::Committed { token, target }
        } else {
            DragEffect::CommitFailed { token, target }
        };
        self.transition(DragPhase::Idle, effect)
    }

    /// Cancel the named session.
    pub fn cancel(&mut self, token: SessionToken, reason: DragCancelReason) -> DragTransition {
        if let Err(noop) = self.check_input(token) {
            return self.noop(noop);
        }
        self.end(token, reason)
    }

    /// Cancel whatever session is active, regardless of token.
    pub fn force_cancel(&mut self, reason: DragCancelReason) -> Option<DragTransition> {
        let token = self.token()?;
        Some(self.end(token, reason))
    }

    fn check_input(&self, token: SessionToken) -> Result<(), DragNoopReason> {
        match self.phase {
            DragPhase::Idle => Err(DragNoopReason::NoActiveSession),
            DragPhase::Committing => Err(DragNoopReason::Committing),
            DragPhase::Armed | DragPhase::Tracking if self.token() != Some(token) => {
                Err(DragNoopReason::StaleToken)
            }
            DragPhase::Armed | DragPhase::Tracking => Ok(()),
        }
    }

    fn end(&mut self, token: SessionToken, reason: DragCancelReason) -> DragTransition {
        self.active = None;
        self.transition(DragPhase::Idle, DragEffect::Cancelled { token, reason })
    }

    fn noop(&mut self, reason: DragNoopReason) -> DragTransition {
        trace!(?reason, phase = ?self.phase, "drag event ignored");
        self.transition(self.phase, DragEffect::Noop { reason })
    }

    fn transition(&mut self, to: DragPhase, effect: DragEffect) -> DragTransition {
        let from = self.phase;
        self.phase = to;
        if !effect.is_noop() {
            debug!(?from, ?to, ?effect, "drag session transition");
        }
        DragTransition {
            from,
            to,
            effect,
        }
    }
}
