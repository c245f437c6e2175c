//! Observer dispatch.

use crate::state::{DocumentChange, StateChange};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

/// State change callback function type
pub type StateChangeCallback = Box<dyn FnMut(&StateChange)>;

/// Versioned, re-entrant change dispatcher.
///
/// Changes are stamped with a version when they are published and delivered in publish order.
/// An observer may publish further changes (for example by editing the document from inside a
/// callback); those are queued and delivered by the outermost dispatch loop once the current
/// change has reached every observer.
#[derive(Default)]
pub(crate) struct Notifier {
    version: Cell<u64>,
    observers: RefCell<Vec<StateChangeCallback>>,
    queue: RefCell<VecDeque<StateChange>>,
    dispatching: Cell<bool>,
}

impl Notifier {
    pub(crate) fn version(&self) -> u64 {
        self.version.get()
    }

    pub(crate) fn subscribe(&self, callback: StateChangeCallback) {
        self.observers.borrow_mut().push(callback);
    }

    pub(crate) fn observer_count(&self) -> usize {
        self.observers.borrow().len()
    }

    pub(crate) fn publish(&self, changes: Vec<DocumentChange>) {
        if changes.is_empty() {
            return;
        }

        {
            let mut queue = self.queue.borrow_mut();
            for change in changes {
                let old_version = self.version.get();
                let new_version = if change.bumps_version() {
                    old_version + 1
                } else {
                    old_version
                };
                self.version.set(new_version);
                queue.push_back(StateChange::new(change, old_version, new_version));
            }
        }

        if self.dispatching.replace(true) {
            return;
        }
        let _guard = DispatchGuard(&self.dispatching);

        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some(change) = next else {
                break;
            };

            // Observers subscribed during delivery land in `self.observers` and are merged back
            // after this change; they see the next one.
            let mut observers = std::mem::take(&mut *self.observers.borrow_mut());
            for observer in observers.iter_mut() {
                observer(&change);
            }
            let mut slot = self.observers.borrow_mut();
            observers.append(&mut slot);
            *slot = observers;
        }
    }
}

struct DispatchGuard<'a>(&'a Cell<bool>);

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}
