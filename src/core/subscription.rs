//! Synchronous observer registry
//!
//! The SubscriptionBus calls every registered listener, in subscription order,
//! each time the ledger changes. Listeners receive an immutable snapshot.
//!
//! # Re-entrancy
//!
//! A listener may subscribe or unsubscribe while a notification is running
//! (for example to replace itself). Such changes are queued and take effect
//! once the current notification has reached every listener, so the set of
//! listeners called by one notification is fixed when it starts. A nested
//! `notify` issued from inside a listener is dropped.

use crate::types::LedgerSnapshot;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Listener = Rc<dyn Fn(&LedgerSnapshot)>;

/// Identifier of one subscription
pub type ListenerId = u64;

enum PendingChange {
    Add(ListenerId, Listener),
    Remove(ListenerId),
}

#[derive(Default)]
struct Registry {
    listeners: Vec<(ListenerId, Listener)>,
    pending: Vec<PendingChange>,
    notifying: bool,
    next_id: ListenerId,
}

impl Registry {
    fn apply(&mut self, change: PendingChange) {
        match change {
            PendingChange::Add(id, listener) => self.listeners.push((id, listener)),
            PendingChange::Remove(id) => self.listeners.retain(|(existing, _)| *existing != id),
        }
    }

    fn submit(&mut self, change: PendingChange) {
        if self.notifying {
            self.pending.push(change);
        } else {
            self.apply(change);
        }
    }
}

/// Clears the notifying flag and applies queued changes when dropped
struct NotifyGuard<'a> {
    registry: &'a RefCell<Registry>,
}

impl Drop for NotifyGuard<'_> {
    fn drop(&mut self) {
        let mut registry = self.registry.borrow_mut();
        registry.notifying = false;
        let pending = std::mem::take(&mut registry.pending);
        for change in pending {
            registry.apply(change);
        }
    }
}

/// Registry of ledger observers
///
/// Cloning the bus yields another handle to the same registry.
#[derive(Clone, Default)]
pub struct SubscriptionBus {
    registry: Rc<RefCell<Registry>>,
}

impl SubscriptionBus {
    /// Create a bus with no listeners
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener
    ///
    /// # Returns
    ///
    /// A [`Subscription`] handle; call [`Subscription::unsubscribe`] to stop
    /// receiving notifications. Dropping the handle keeps the listener registered.
    pub fn subscribe(&self, listener: impl Fn(&LedgerSnapshot) + 'static) -> Subscription {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.submit(PendingChange::Add(id, Rc::new(listener)));
        Subscription {
            id,
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Call every listener with `snapshot`, in subscription order
    pub fn notify(&self, snapshot: &LedgerSnapshot) {
        let listeners: Vec<Listener> = {
            let mut registry = self.registry.borrow_mut();
            if registry.notifying {
                tracing::warn!("nested ledger notification dropped");
                return;
            }
            registry.notifying = true;
            registry
                .listeners
                .iter()
                .map(|(_, listener)| Rc::clone(listener))
                .collect()
        };

        // Ends the notification even if a listener panics
        let _guard = NotifyGuard {
            registry: &self.registry,
        };
        for listener in &listeners {
            listener(snapshot);
        }
    }

    /// Number of registered listeners, excluding queued additions
    pub fn listener_count(&self) -> usize {
        self.registry.borrow().listeners.len()
    }
}

/// Handle to one registered listener
#[derive(Debug)]
pub struct Subscription {
    id: ListenerId,
    registry: Weak<RefCell<Registry>>,
}

impl Subscription {
    /// Identifier of the listener
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Stop notifying the listener
    ///
    /// Inside a running notification the removal is queued until the
    /// notification completes. Does nothing once the bus is gone.
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().submit(PendingChange::Remove(self.id));
        }
    }
}
