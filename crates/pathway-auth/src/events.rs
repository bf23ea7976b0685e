//! Session change notifications.
//!
//! Providers own a [`SessionEventHub`] and call [`SessionEventHub::emit`]
//! after every session change. Listeners are invoked synchronously on the
//! emitting task, outside the hub's lock, in registration order.

use crate::{Session, SessionEvent};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Callback receiving every session change. Must not block.
pub type SessionListener = Arc<dyn Fn(SessionEvent, Option<Session>) + Send + Sync>;

/// Fan-out of session events to registered listeners.
#[derive(Default)]
pub struct SessionEventHub {
    listeners: RwLock<Vec<(u64, SessionListener)>>,
    next_id: AtomicU64,
}

impl SessionEventHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register `listener`. It stays registered until the returned
    /// [`Subscription`] is cancelled or dropped.
    pub fn subscribe(self: &Arc<Self>, listener: SessionListener) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.write().push((id, listener));
        tracing::debug!(listener_id = id, "Session listener registered");
        Subscription {
            id,
            hub: Arc::downgrade(self),
        }
    }

    /// Deliver `event` to every registered listener.
    pub fn emit(&self, event: SessionEvent, session: Option<&Session>) {
        let listeners: Vec<SessionListener> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        tracing::debug!(
            event = %event,
            has_session = session.is_some(),
            listeners = listeners.len(),
            "Emitting session event"
        );
        for listener in listeners {
            listener(event, session.cloned());
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    fn remove(&self, id: u64) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        before != listeners.len()
    }
}

/// Handle returned by [`SessionEventHub::subscribe`].
///
/// Dropping it unsubscribes. Holds only a weak reference to the hub.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    hub: Weak<SessionEventHub>,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        self.hub
            .upgrade()
            .map(|hub| hub.listeners.read().iter().any(|(id, _)| *id == self.id))
            .unwrap_or(false)
    }

    /// Stop receiving events.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            if hub.remove(self.id) {
                tracing::debug!(listener_id = self.id, "Session listener removed");
            }
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
