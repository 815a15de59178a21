//! Registry of connected subscribers.
//!
//! The registry is an owned handle passed to both the broadcast engine and
//! every connection task. All access goes through one mutex that is never
//! held across an `.await`.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::subscriber::Subscriber;

/// Thread-safe set of active subscribers keyed by id
#[derive(Clone, Default)]
pub struct SubscriberRegistry {
    subscribers: Arc<Mutex<HashMap<Uuid, Arc<Subscriber>>>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber and return the new count
    pub fn add(&self, subscriber: Arc<Subscriber>) -> usize {
        let mut subscribers = self.subscribers.lock();
        subscribers.insert(subscriber.id(), subscriber);
        subscribers.len()
    }

    /// Remove a subscriber.
    ///
    /// Returns the entry only to the first caller, so concurrent cleanup paths
    /// can tell which of them owns closing the connection.
    pub fn remove(&self, id: &Uuid) -> Option<Arc<Subscriber>> {
        self.subscribers.lock().remove(id)
    }

    pub fn get(&self, id: &Uuid) -> Option<Arc<Subscriber>> {
        self.subscribers.lock().get(id).cloned()
    }

    /// Stable copy of the current subscribers
    pub fn subscribers(&self) -> Vec<Arc<Subscriber>> {
        self.subscribers.lock().values().cloned().collect()
    }

    /// Visit every subscriber.
    ///
    /// Iterates over a copy taken under the lock, so `f` may add or remove
    /// entries, including the one it is visiting.
    pub fn for_each(&self, mut f: impl FnMut(&Arc<Subscriber>)) {
        for subscriber in self.subscribers() {
            f(&subscriber);
        }
    }

    pub fn count(&self) -> usize {
        self.subscribers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.lock().is_empty()
    }
}

impl std::fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("count", &self.count())
            .finish()
    }
}
