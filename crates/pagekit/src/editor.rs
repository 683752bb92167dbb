#![forbid(unsafe_code)]

//! One open document: the block store, the measured canvas, both drag
//! channels, inline editing, and the attached collaborators.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use pagekit_core::{BlockCatalog, Point};
use pagekit_dnd::{
    CanvasLayout, DragCancelReason, DragConfig, DragPayload, DragPhase, DropOutcome,
    EditActivation, EditOutcome, InlineEditBridge, InsertionPoint, MutationExecutor,
};
use pagekit_tree::{
    BlockChange, BlockId, BlockStore, BlockTreeSnapshot, ChangeOrigin, History, MoveOutcome,
    NewBlock, Parent, Persistence, Subscription,
};
use pagekit_web::{
    ControllerDispatch, DragDropController, DragInput, NativeDragEvent, PointerButton,
    PointerSessionConfig,
};
use tracing::debug;

use crate::error::{Error, Result};

/// What one [`Editor::undo`] or [`Editor::redo`] did.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReplayOutcome {
    /// `None` when there was nothing to replay or the operation changed
    /// nothing.
    pub change: Option<BlockChange>,
    /// Drag torn down before the operation was applied. Its
    /// `capture_command` is the pointer release the host still owes.
    pub cancelled_drag: Option<ControllerDispatch>,
}

struct AttachedHistory {
    history: Rc<RefCell<dyn History>>,
    _subscription: Subscription,
}

/// Editing surface for one document scope.
///
/// The host owns rendering: it measures blocks into [`Editor::layout_mut`]
/// after each paint and forwards browser events to the drag methods. Every
/// mutation, whether from a drop, an inline edit, or an explicit call, goes
/// through the same [`BlockStore`] and reaches the same subscribers.
pub struct Editor {
    store: BlockStore,
    layout: CanvasLayout,
    drag: DragDropController,
    inline: InlineEditBridge,
    executor: MutationExecutor,
    history: Option<AttachedHistory>,
    persistence: Option<Subscription>,
}

impl fmt::Debug for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Editor")
            .field("store", &self.store)
            .field("scope", &self.layout.scope())
            .field("phase", &self.drag.phase())
            .field("editing", &self.inline.editing_block())
            .field("history", &self.history.is_some())
            .field("persistence", &self.persistence.is_some())
            .finish_non_exhaustive()
    }
}

impl Editor {
    /// Empty document over `catalog`, drawn into `layout`.
    #[must_use]
    pub fn new(catalog: BlockCatalog, layout: CanvasLayout) -> Self {
        Self::with_store(BlockStore::new(catalog), layout)
    }

    #[must_use]
    pub fn with_store(store: BlockStore, layout: CanvasLayout) -> Self {
        Self::with_config(
            store,
            layout,
            DragConfig::default(),
            PointerSessionConfig::default(),
        )
    }

    #[must_use]
    pub fn with_config(
        store: BlockStore,
        layout: CanvasLayout,
        drag: DragConfig,
        pointer: PointerSessionConfig,
    ) -> Self {
        let drag = drag.validated();
        Self {
            store,
            layout,
            inline: InlineEditBridge::new(&drag),
            drag: DragDropController::new(drag, pointer),
            executor: MutationExecutor::new(),
            history: None,
            persistence: None,
        }
    }

    /// Reopen a persisted document.
    pub fn from_snapshot(
        snapshot: BlockTreeSnapshot,
        catalog: BlockCatalog,
        layout: CanvasLayout,
    ) -> Result<Self> {
        Ok(Self::with_store(
            BlockStore::from_snapshot(snapshot, catalog)?,
            layout,
        ))
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn store(&self) -> &BlockStore {
        &self.store
    }

    #[must_use]
    pub const fn layout(&self) -> &CanvasLayout {
        &self.layout
    }

    /// Geometry to re-measure after a paint.
    pub fn layout_mut(&mut self) -> &mut CanvasLayout {
        &mut self.layout
    }

    /// Swap in a new canvas, e.g. when the host switches pages. Any drag in
    /// flight is cancelled since its target was resolved against the old one.
    pub fn set_layout(&mut self, layout: CanvasLayout) -> Option<ControllerDispatch> {
        let cancelled = self.drag.cancel_all(DragCancelReason::Programmatic);
        self.layout = layout;
        cancelled
    }

    #[must_use]
    pub const fn drag(&self) -> &DragDropController {
        &self.drag
    }

    #[must_use]
    pub const fn drag_phase(&self) -> DragPhase {
        self.drag.phase()
    }

    /// Drop feedback to render.
    #[must_use]
    pub fn drag_target(&self) -> Option<InsertionPoint> {
        self.drag.target()
    }

    #[must_use]
    pub const fn inline_edit(&self) -> &InlineEditBridge {
        &self.inline
    }

    #[must_use]
    pub fn snapshot(&self) -> BlockTreeSnapshot {
        self.store.snapshot()
    }

    #[must_use]
    pub fn state_hash(&self) -> u64 {
        self.store.state_hash()
    }

    // ------------------------------------------------------------------
    // Direct mutations
    // ------------------------------------------------------------------

    pub fn insert_block(&mut self, block: NewBlock, parent: Parent, index: usize) -> Result<BlockId> {
        Ok(self.store.insert_block(block, parent, index)?.id)
    }

    pub fn move_block(&mut self, id: BlockId, parent: Parent, index: usize) -> Result<MoveOutcome> {
        Ok(self.store.move_block(id, parent, index)?)
    }

    pub fn archive_block(&mut self, id: BlockId) -> Result<()> {
        Ok(self.store.archive_block(id)?)
    }

    pub fn restore_block(&mut self, id: BlockId, parent: Parent, index: usize) -> Result<()> {
        Ok(self.store.restore_block(id, parent, index)?)
    }

    /// Set or, with `None`, remove a property.
    pub fn set_property(&mut self, id: BlockId, key: &str, value: Option<&str>) -> Result<bool> {
        Ok(self.store.set_property(id, key, value)?)
    }

    pub fn set_style(&mut self, id: BlockId, key: &str, value: Option<&str>) -> Result<bool> {
        Ok(self.store.set_style(id, key, value)?)
    }

    /// Commit `payload` at an already-resolved slot, e.g. from a keyboard
    /// "insert here" command. Goes through the same executor as a drag.
    pub fn drop_at(&mut self, payload: &DragPayload, target: InsertionPoint) -> Result<DropOutcome> {
        match self.executor.execute(&mut self.store, payload, Some(target)) {
            DropOutcome::Failed(err) => Err(err.into()),
            outcome => Ok(outcome),
        }
    }

    // ------------------------------------------------------------------
    // Drag channels
    // ------------------------------------------------------------------

    pub fn native_event(&mut self, event: NativeDragEvent<'_>) -> ControllerDispatch {
        self.drag.native_event(&mut self.store, &self.layout, event)
    }

    pub fn pointer_down(
        &mut self,
        source: DragInput<'_>,
        pointer_id: u32,
        button: PointerButton,
        position: Point,
    ) -> ControllerDispatch {
        self.drag.pointer_down(
            &mut self.store,
            &self.layout,
            source,
            pointer_id,
            button,
            position,
        )
    }

    pub fn capture_acquired(&mut self, pointer_id: u32) -> ControllerDispatch {
        self.drag.capture_acquired(pointer_id)
    }

    pub fn pointer_move(&mut self, pointer_id: u32, position: Point) -> ControllerDispatch {
        self.drag
            .pointer_move(&mut self.store, &self.layout, pointer_id, position)
    }

    pub fn pointer_up(
        &mut self,
        pointer_id: u32,
        button: PointerButton,
        position: Point,
    ) -> ControllerDispatch {
        self.drag
            .pointer_up(&mut self.store, &self.layout, pointer_id, button, position)
    }

    pub fn pointer_cancel(&mut self, pointer_id: Option<u32>) -> ControllerDispatch {
        self.drag
            .pointer_cancel(&mut self.store, &self.layout, pointer_id)
    }

    pub fn pointer_leave(&mut self, pointer_id: u32) -> ControllerDispatch {
        self.drag
            .pointer_leave(&mut self.store, &self.layout, pointer_id)
    }

    pub fn lost_pointer_capture(&mut self, pointer_id: u32) -> ControllerDispatch {
        self.drag
            .lost_pointer_capture(&mut self.store, &self.layout, pointer_id)
    }

    pub fn blur(&mut self) -> ControllerDispatch {
        self.drag.blur(&mut self.store, &self.layout)
    }

    pub fn visibility_hidden(&mut self) -> ControllerDispatch {
        self.drag.visibility_hidden(&mut self.store, &self.layout)
    }

    pub fn escape(&mut self) -> ControllerDispatch {
        self.drag.escape(&mut self.store, &self.layout)
    }

    /// Tear down any drag on either channel.
    pub fn cancel_drag(&mut self) -> Option<ControllerDispatch> {
        self.drag.cancel_all(DragCancelReason::Programmatic)
    }

    // ------------------------------------------------------------------
    // Inline editing
    // ------------------------------------------------------------------

    /// Click or tap on `block` at host time `at`.
    pub fn activate(&mut self, block: BlockId, at: Duration) -> EditActivation {
        self.inline.activate(&self.store, block, at)
    }

    pub fn set_draft(&mut self, text: impl Into<String>) -> bool {
        self.inline.set_draft(text)
    }

    pub fn commit_edit(&mut self) -> EditOutcome {
        self.inline.commit(&mut self.store)
    }

    pub fn cancel_edit(&mut self) -> bool {
        self.inline.cancel()
    }

    // ------------------------------------------------------------------
    // Collaborators
    // ------------------------------------------------------------------

    /// Register a change callback. Keep the guard alive to stay subscribed.
    pub fn subscribe(
        &mut self,
        callback: impl Fn(&BlockChange, &BlockStore) + 'static,
    ) -> Subscription {
        self.store.subscribe(callback)
    }

    /// Persist a snapshot after every committed change. Replaces any
    /// previously attached sink.
    pub fn attach_persistence<P: Persistence + 'static>(&mut self, sink: Rc<RefCell<P>>) {
        self.persistence = Some(self.store.attach_persistence(sink));
    }

    pub fn detach_persistence(&mut self) -> bool {
        self.persistence.take().is_some()
    }

    /// Record every committed change and serve [`Editor::undo`] /
    /// [`Editor::redo`]. Replaces any previously attached history.
    pub fn attach_history<H: History + 'static>(&mut self, history: Rc<RefCell<H>>) {
        let subscription = self.store.attach_history(Rc::clone(&history));
        self.history = Some(AttachedHistory {
            history,
            _subscription: subscription,
        });
    }

    pub fn detach_history(&mut self) -> bool {
        self.history.take().is_some()
    }

    /// Apply the history's next undo operation. A drag or inline edit in
    /// progress is cancelled first.
    pub fn undo(&mut self) -> Result<ReplayOutcome> {
        self.replay(ChangeOrigin::Undo)
    }

    /// Apply the history's next redo operation.
    pub fn redo(&mut self) -> Result<ReplayOutcome> {
        self.replay(ChangeOrigin::Redo)
    }

    fn replay(&mut self, origin: ChangeOrigin) -> Result<ReplayOutcome> {
        let Some(history) = self
            .history
            .as_ref()
            .map(|attached| Rc::clone(&attached.history))
        else {
            return Ok(ReplayOutcome::default());
        };
        // The history subscriber borrows the collaborator again while the
        // operation is applied, so the borrow must end here.
        let operation = match origin {
            ChangeOrigin::Redo => history.borrow_mut().redo(),
            ChangeOrigin::Undo | ChangeOrigin::User => history.borrow_mut().undo(),
        };
        let Some(operation) = operation else {
            return Ok(ReplayOutcome::default());
        };
        let cancelled_drag = self.drag.cancel_all(DragCancelReason::Programmatic);
        self.inline.cancel();
        debug!(?origin, kind = ?operation.kind(), block = %operation.subject(), "replaying history");
        let change = self.store.apply_operation(operation, origin)?;
        Ok(ReplayOutcome {
            change,
            cancelled_drag,
        })
    }
}
