#![forbid(unsafe_code)]

//! Change subscribers and external collaborator seams.
//!
//! The store keeps subscribers as `Weak` callbacks; the caller holds the
//! strong side inside a [`Subscription`] guard. Dropping the guard
//! unsubscribes, and dead entries are pruned on the next notification.
//!
//! Callbacks receive the change record plus shared access to the store, so a
//! persistence sink can take a full snapshot while a renderer only looks at
//! the affected block. Callbacks cannot mutate the store.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::operation::{BlockChange, BlockOperation};
use crate::snapshot::BlockTreeSnapshot;
use crate::store::BlockStore;

pub(crate) type ChangeCallbackRc = Rc<dyn Fn(&BlockChange, &BlockStore)>;
pub(crate) type ChangeCallbackWeak = Weak<dyn Fn(&BlockChange, &BlockStore)>;

/// RAII guard for a store subscription.
///
/// Dropping it stops further notifications.
pub struct Subscription {
    _guard: Box<dyn std::any::Any>,
}

impl Subscription {
    pub(crate) fn new(strong: ChangeCallbackRc) -> Self {
        Self {
            _guard: Box::new(strong),
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// Durable storage for the document.
///
/// Called with a full snapshot after every committed mutation.
pub trait Persistence {
    fn persist(&mut self, snapshot: &BlockTreeSnapshot);
}

/// Undo/redo history.
///
/// The engine reports every committed change and asks for operations to
/// replay; it does not keep history itself. Implementations typically push
/// `change.inverse` onto the undo stack for [`crate::ChangeOrigin::User`] and
/// [`crate::ChangeOrigin::Redo`] changes, and onto the redo stack for
/// [`crate::ChangeOrigin::Undo`] changes.
pub trait History {
    fn record(&mut self, change: &BlockChange);

    /// Next operation to apply for an undo, if any.
    fn undo(&mut self) -> Option<BlockOperation>;

    /// Next operation to apply for a redo, if any.
    fn redo(&mut self) -> Option<BlockOperation>;
}

impl BlockStore {
    /// Forward every committed change to a persistence collaborator.
    pub fn attach_persistence<P: Persistence + 'static>(
        &mut self,
        sink: Rc<RefCell<P>>,
    ) -> Subscription {
        self.subscribe(move |_change, store| {
            sink.borrow_mut().persist(&store.snapshot());
        })
    }

    /// Forward every committed change to a history collaborator.
    pub fn attach_history<H: History + 'static>(&mut self, history: Rc<RefCell<H>>) -> Subscription {
        self.subscribe(move |change, _store| {
            history.borrow_mut().record(change);
        })
    }
}
