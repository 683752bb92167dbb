#![forbid(unsafe_code)]

//! Host-agnostic drag engine.
//!
//! [`DragEngine`] ties the session machine, the resolver and the executor
//! together. Input adapters translate their events into the four calls
//! below and never talk to the store directly:
//!
//! | call | machine step |
//! |------|--------------|
//! | [`DragEngine::start`] | `Idle -> Armed` |
//! | [`DragEngine::sample`] | `Armed/Tracking -> Tracking` (resolves) |
//! | [`DragEngine::release`] | `Tracking -> Committing -> Idle` (executes) |
//! | [`DragEngine::cancel`] | `* -> Idle` |

use pagekit_core::Point;
use pagekit_tree::BlockStore;

use crate::config::DragConfig;
use crate::executor::{DropError, DropOutcome, MutationExecutor};
use crate::layout::CanvasLayout;
use crate::payload::{DragChannel, DragPayload, SessionToken};
use crate::resolver::{InsertionPoint, InsertionResolver};
use crate::session::{
    DragCancelReason, DragEffect, DragPhase, DragSessionMachine, DragTransition,
};

/// Everything that happened while releasing a drag.
#[derive(Debug, Clone, PartialEq)]
pub struct DropReport {
    pub token: SessionToken,
    /// Machine transitions in order, including the final sample if one was
    /// supplied.
    pub transitions: Vec<DragTransition>,
    /// `None` when the release was ignored (stale token, no session) or
    /// ended a session that never started tracking.
    pub outcome: Option<DropOutcome>,
}

impl DropReport {
    /// Whether the drop reached the store without error.
    #[must_use]
    pub fn committed(&self) -> bool {
        self.outcome
            .as_ref()
            .is_some_and(|outcome| outcome.error().is_none())
    }

    #[must_use]
    pub fn error(&self) -> Option<&DropError> {
        self.outcome.as_ref().and_then(DropOutcome::error)
    }
}

/// One drag session at a time over one block store.
#[derive(Debug, Clone, Default)]
pub struct DragEngine {
    machine: DragSessionMachine,
    resolver: InsertionResolver,
    executor: MutationExecutor,
}

impl DragEngine {
    #[must_use]
    pub fn new(config: DragConfig) -> Self {
        let config = config.validated();
        Self {
            machine: DragSessionMachine::new(&config),
            resolver: InsertionResolver::new(config),
            executor: MutationExecutor::new(),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &DragConfig {
        self.resolver.config()
    }

    #[must_use]
    pub const fn phase(&self) -> DragPhase {
        self.machine.phase()
    }

    #[must_use]
    pub fn token(&self) -> Option<SessionToken> {
        self.machine.token()
    }

    #[must_use]
    pub fn channel(&self) -> Option<DragChannel> {
        self.machine.channel()
    }

    #[must_use]
    pub fn payload(&self) -> Option<&DragPayload> {
        self.machine.payload()
    }

    /// Insertion point currently shown as drop feedback.
    #[must_use]
    pub fn target(&self) -> Option<InsertionPoint> {
        self.machine.target()
    }

    /// Arm a session for `payload`. Returns the new token, or `None` when
    /// another session is still active.
    pub fn start(
        &mut self,
        channel: DragChannel,
        payload: DragPayload,
        origin: Point,
    ) -> (Option<SessionToken>, DragTransition) {
        let transition = self.machine.arm(channel, payload, origin);
        let token = match transition.effect {
            DragEffect::Armed { token, .. } => Some(token),
            _ => None,
        };
        (token, transition)
    }

    /// Resolve the insertion point under `point`.
    pub fn sample(
        &mut self,
        store: &BlockStore,
        layout: &CanvasLayout,
        token: SessionToken,
        point: Point,
    ) -> DragTransition {
        let resolver = &self.resolver;
        self.machine.sample(token, point, |payload, previous| {
            resolver.resolve(store, layout, point, payload, previous)
        })
    }

    /// End the session and commit its target.
    ///
    /// `point`, when given, is resolved first so the drop lands where the
    /// pointer was released. A session with no target is cancelled: the
    /// report carries [`DropError::NoTarget`] if the drag was tracking, and no
    /// outcome if it never left [`DragPhase::Armed`] (a plain click).
    pub fn release(
        &mut self,
        store: &mut BlockStore,
        layout: &CanvasLayout,
        token: SessionToken,
        point: Option<Point>,
    ) -> DropReport {
        let mut transitions = Vec::with_capacity(3);
        if let Some(point) = point {
            transitions.push(self.sample(store, layout, token, point));
        }

        let was_tracking = self.machine.phase() == DragPhase::Tracking;
        let released = self.machine.release(token);
        let outcome = match released.effect {
            DragEffect::CommitStarted { target, .. } => {
                transitions.push(released);
                let outcome = match self.machine.payload() {
                    Some(payload) => self.executor.execute(store, payload, Some(target)),
                    None => DropOutcome::Failed(DropError::NoTarget),
                };
                transitions.push(self.machine.finish_commit(token, outcome.error().is_none()));
                Some(outcome)
            }
            DragEffect::Cancelled { .. } => {
                transitions.push(released);
                was_tracking.then_some(DropOutcome::Failed(DropError::NoTarget))
            }
            _ => {
                transitions.push(released);
                None
            }
        };

        DropReport {
            token,
            transitions,
            outcome,
        }
    }

    /// Arm, resolve and commit in one step.
    ///
    /// Used when the payload only becomes readable at drop time. Returns
    /// `None` if another session is active.
    pub fn drop_now(
        &mut self,
        store: &mut BlockStore,
        layout: &CanvasLayout,
        channel: DragChannel,
        payload: DragPayload,
        point: Point,
    ) -> Option<DropReport> {
        let (token, armed) = self.start(channel, payload, point);
        let token = token?;
        let mut report = self.release(store, layout, token, Some(point));
        report.transitions.insert(0, armed);
        Some(report)
    }

    pub fn cancel(&mut self, token: SessionToken, reason: DragCancelReason) -> DragTransition {
        self.machine.cancel(token, reason)
    }

    /// Cancel the active session, whichever channel owns it.
    pub fn force_cancel(&mut self, reason: DragCancelReason) -> Option<DragTransition> {
        self.machine.force_cancel(reason)
    }
}
