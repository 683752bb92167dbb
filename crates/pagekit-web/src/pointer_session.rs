#![forbid(unsafe_code)]

//! Synthetic pointer drag channel.
//!
//! Some embedding webviews never deliver native drag payloads, so the editor
//! tracks drags itself from pointer events. [`PointerDragSession`] turns the
//! browser pointer lifecycle into [`DragIntent`]s while enforcing:
//! - one active pointer at a time,
//! - explicit capture acquire/release commands for the JS host, and
//! - cancellation on every interruption path (pointer-cancel, blur,
//!   visibility change, lost capture, leave without capture, Escape).

use pagekit_core::Point;
use pagekit_dnd::{DragCancelReason, DragPayload};
use serde::{Deserialize, Serialize};

use crate::intent::DragIntent;

/// Mouse button or pen/touch contact reported with a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerButton {
    #[default]
    Primary,
    Secondary,
    Middle,
}

/// Adapter configuration for synthetic drag handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerSessionConfig {
    /// Button required to begin a drag.
    pub activation_button: PointerButton,
    /// If true, pointer leave cancels the drag when capture was requested but
    /// never acknowledged.
    pub cancel_on_leave_without_capture: bool,
}

impl Default for PointerSessionConfig {
    fn default() -> Self {
        Self {
            activation_button: PointerButton::Primary,
            cancel_on_leave_without_capture: true,
        }
    }
}

impl PointerSessionConfig {
    #[must_use]
    pub fn with_activation_button(mut self, button: PointerButton) -> Self {
        self.activation_button = button;
        self
    }

    #[must_use]
    pub fn with_cancel_on_leave_without_capture(mut self, cancel: bool) -> Self {
        self.cancel_on_leave_without_capture = cancel;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptureState {
    Requested,
    Acquired,
}

impl CaptureState {
    const fn is_acquired(self) -> bool {
        matches!(self, Self::Acquired)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActivePointer {
    pointer_id: u32,
    button: PointerButton,
    capture_state: CaptureState,
}

/// Host command for `setPointerCapture()` / `releasePointerCapture()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum CaptureCommand {
    Acquire { pointer_id: u32 },
    Release { pointer_id: u32 },
}

/// Why an incoming pointer signal was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerIgnoredReason {
    InvalidPointerId,
    ButtonNotAllowed,
    ButtonMismatch,
    ActivePointerAlreadyInProgress,
    NoActivePointer,
    PointerMismatch,
    LeaveWhileCaptured,
}

/// Result of one pointer lifecycle dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerDispatch {
    pub intent: Option<DragIntent>,
    pub capture_command: Option<CaptureCommand>,
    /// Set when the signal was dropped without touching the session.
    pub ignored: Option<PointerIgnoredReason>,
}

impl PointerDispatch {
    fn ignored(reason: PointerIgnoredReason) -> Self {
        #[cfg(feature = "tracing")]
        tracing::trace!(?reason, "pointer event ignored");
        Self {
            intent: None,
            capture_command: None,
            ignored: Some(reason),
        }
    }

    const fn forward(intent: DragIntent, capture_command: Option<CaptureCommand>) -> Self {
        Self {
            intent: Some(intent),
            capture_command,
            ignored: None,
        }
    }
}

/// One synthetic drag channel.
///
/// The session only tracks the pointer; the engine decides what the drag
/// means. A caller that cannot honor a `Start` intent (another channel owns
/// the engine) must call [`PointerDragSession::abandon`].
#[derive(Debug, Clone, Default)]
pub struct PointerDragSession {
    config: PointerSessionConfig,
    active: Option<ActivePointer>,
}

impl PointerDragSession {
    #[must_use]
    pub const fn new(config: PointerSessionConfig) -> Self {
        Self {
            config,
            active: None,
        }
    }

    #[must_use]
    pub const fn config(&self) -> PointerSessionConfig {
        self.config
    }

    #[must_use]
    pub fn active_pointer_id(&self) -> Option<u32> {
        self.active.map(|active| active.pointer_id)
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Pointer-down on a draggable element carrying `payload`.
    pub fn pointer_down(
        &mut self,
        payload: DragPayload,
        pointer_id: u32,
        button: PointerButton,
        position: Point,
    ) -> PointerDispatch {
        if pointer_id == 0 {
            return PointerDispatch::ignored(PointerIgnoredReason::InvalidPointerId);
        }
        if button != self.config.activation_button {
            return PointerDispatch::ignored(PointerIgnoredReason::ButtonNotAllowed);
        }
        if self.active.is_some() {
            return PointerDispatch::ignored(PointerIgnoredReason::ActivePointerAlreadyInProgress);
        }

        self.active = Some(ActivePointer {
            pointer_id,
            button,
            capture_state: CaptureState::Requested,
        });
        PointerDispatch::forward(
            DragIntent::Start {
                payload,
                origin: position,
            },
            Some(CaptureCommand::Acquire { pointer_id }),
        )
    }

    /// The host confirmed `setPointerCapture()`.
    pub fn capture_acquired(&mut self, pointer_id: u32) -> PointerDispatch {
        let mut active = match self.check_pointer(pointer_id) {
            Ok(active) => active,
            Err(reason) => return PointerDispatch::ignored(reason),
        };
        active.capture_state = CaptureState::Acquired;
        self.active = Some(active);
        PointerDispatch {
            intent: None,
            capture_command: None,
            ignored: None,
        }
    }

    pub fn pointer_move(&mut self, pointer_id: u32, position: Point) -> PointerDispatch {
        if let Err(reason) = self.check_pointer(pointer_id) {
            return PointerDispatch::ignored(reason);
        }
        PointerDispatch::forward(DragIntent::Sample { point: position }, None)
    }

    /// Pointer-up ends the drag and releases capture.
    pub fn pointer_up(
        &mut self,
        pointer_id: u32,
        button: PointerButton,
        position: Point,
    ) -> PointerDispatch {
        let active = match self.check_pointer(pointer_id) {
            Ok(active) => active,
            Err(reason) => return PointerDispatch::ignored(reason),
        };
        if active.button != button {
            return PointerDispatch::ignored(PointerIgnoredReason::ButtonMismatch);
        }
        self.active = None;
        PointerDispatch::forward(
            DragIntent::Release {
                point: Some(position),
            },
            active
                .capture_state
                .is_acquired()
                .then_some(CaptureCommand::Release { pointer_id }),
        )
    }

    pub fn pointer_cancel(&mut self, pointer_id: Option<u32>) -> PointerDispatch {
        self.cancel_active(pointer_id, DragCancelReason::PointerCancel, true)
    }

    /// Leaving the document cancels only while capture is still pending.
    pub fn pointer_leave(&mut self, pointer_id: u32) -> PointerDispatch {
        let active = match self.check_pointer(pointer_id) {
            Ok(active) => active,
            Err(reason) => return PointerDispatch::ignored(reason),
        };
        if !active.capture_state.is_acquired() && self.config.cancel_on_leave_without_capture {
            self.cancel_active(Some(pointer_id), DragCancelReason::PointerLeave, true)
        } else {
            PointerDispatch::ignored(PointerIgnoredReason::LeaveWhileCaptured)
        }
    }

    pub fn blur(&mut self) -> PointerDispatch {
        self.cancel_active(None, DragCancelReason::Blur, true)
    }

    pub fn visibility_hidden(&mut self) -> PointerDispatch {
        self.cancel_active(None, DragCancelReason::VisibilityHidden, true)
    }

    /// `lostpointercapture`: capture is already gone, so no release command.
    pub fn lost_pointer_capture(&mut self, pointer_id: u32) -> PointerDispatch {
        self.cancel_active(
            Some(pointer_id),
            DragCancelReason::LostPointerCapture,
            false,
        )
    }

    pub fn escape(&mut self) -> PointerDispatch {
        self.cancel_active(None, DragCancelReason::EscapeKey, true)
    }

    /// Forget the active pointer without emitting an intent. Returns the
    /// release command the host still owes, if capture was acquired.
    pub fn abandon(&mut self) -> Option<CaptureCommand> {
        let active = self.active.take()?;
        active
            .capture_state
            .is_acquired()
            .then_some(CaptureCommand::Release {
                pointer_id: active.pointer_id,
            })
    }

    fn check_pointer(&self, pointer_id: u32) -> Result<ActivePointer, PointerIgnoredReason> {
        match self.active {
            None => Err(PointerIgnoredReason::NoActivePointer),
            Some(active) if active.pointer_id != pointer_id => {
                Err(PointerIgnoredReason::PointerMismatch)
            }
            Some(active) => Ok(active),
        }
    }

    fn cancel_active(
        &mut self,
        pointer_id: Option<u32>,
        reason: DragCancelReason,
        release_capture: bool,
    ) -> PointerDispatch {
        let active = match (self.active, pointer_id) {
            (None, _) => return PointerDispatch::ignored(PointerIgnoredReason::NoActivePointer),
            (Some(active), Some(id)) if id != active.pointer_id => {
                return PointerDispatch::ignored(PointerIgnoredReason::PointerMismatch);
            }
            (Some(active), _) => active,
        };

        self.active = None;
        let command = (release_capture && active.capture_state.is_acquired()).then_some(
            CaptureCommand::Release {
                pointer_id: active.pointer_id,
            },
        );
        PointerDispatch::forward(DragIntent::Cancel { reason }, command)
    }
}
