//! Listener registry for emitted flat lists.

use super::flat::FlatNode;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

pub(crate) type Listener = Arc<dyn Fn(&[FlatNode]) + Send + Sync>;

/// One listener and the revision it has seen, plus one.
struct Entry {
    listener: Listener,
    next_revision: AtomicU64,
}

impl Entry {
    /// Lists older than one already delivered are skipped.
    fn deliver(&self, revision: u64, nodes: &[FlatNode]) {
        if self.next_revision.fetch_max(revision + 1, Ordering::AcqRel) <= revision {
            (self.listener)(nodes);
        }
    }
}

/// Registered listeners, notified in registration order.
#[derive(Default)]
pub(crate) struct SubscriberSet {
    next_id: AtomicU64,
    listeners: RwLock<BTreeMap<u64, Arc<Entry>>>,
}

impl SubscriberSet {
    pub(crate) fn add(self: &Arc<Self>, listener: Listener) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let entry = Entry {
            listener,
            next_revision: AtomicU64::new(0),
        };
        self.listeners.write().insert(id, Arc::new(entry));
        Subscription {
            id,
            set: Arc::downgrade(self),
        }
    }

    fn remove(&self, id: u64) {
        self.listeners.write().remove(&id);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.listeners.read().len()
    }

    /// Call every listener. The registry lock is released first so listeners
    /// may subscribe or unsubscribe from inside the callback.
    pub(crate) fn emit(&self, revision: u64, nodes: &[FlatNode]) {
        let entries: Vec<Arc<Entry>> = self.listeners.read().values().cloned().collect();
        for entry in entries {
            entry.deliver(revision, nodes);
        }
    }

    /// Deliver the current list to one freshly added listener.
    pub(crate) fn replay(&self, subscription: &Subscription, revision: u64, nodes: &[FlatNode]) {
        let entry = self.listeners.read().get(&subscription.id).cloned();
        if let Some(entry) = entry {
            entry.deliver(revision, nodes);
        }
    }
}

/// Handle returned by `FlatTreeStore::subscribe`. Dropping it unsubscribes.
#[must_use = "dropping the subscription unsubscribes the listener"]
pub struct Subscription {
    id: u64,
    set: Weak<SubscriberSet>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(set) = self.set.upgrade() {
            set.remove(self.id);
        }
    }
}
