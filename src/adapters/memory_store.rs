//! In-memory store adapter.
//!
//! Implements [`StorePort`] over a flat path → value map.  Used by the
//! simulator binary and by tests; a hosted-backend adapter would implement
//! the same trait over its client SDK.
//!
//! Subscribers receive the current value on registration and again after
//! every write that touches their exact path, in commit order.  Writes can
//! be made to fail on demand to exercise the user-notice path.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::app::ports::{StoreError, StorePort, StoreValue, Subscriber, SubscriptionId};

struct Subscription {
    id: SubscriptionId,
    path: String,
    callback: Subscriber,
}

/// Flat in-memory store with push subscriptions.
#[derive(Default)]
pub struct InMemoryStore {
    values: HashMap<String, StoreValue>,
    subscriptions: Vec<Subscription>,
    next_id: u32,
    /// Every accepted write in commit order.
    history: Vec<(String, StoreValue)>,
    write_failure: Option<StoreError>,
    read_failure: Option<StoreError>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value at `path`, bypassing failure injection.
    pub fn get(&self, path: &str) -> Option<StoreValue> {
        self.values.get(path).cloned()
    }

    /// Accepted writes, oldest first.
    pub fn history(&self) -> &[(String, StoreValue)] {
        &self.history
    }

    /// Make every subsequent write fail with `error` (`None` to heal).
    pub fn fail_writes(&mut self, error: Option<StoreError>) {
        self.write_failure = error;
    }

    /// Make every subsequent one-shot read fail with `error`.
    pub fn fail_reads(&mut self, error: Option<StoreError>) {
        self.read_failure = error;
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.len()
    }

    fn commit(&mut self, path: &str, value: StoreValue) {
        self.values.insert(path.to_string(), value.clone());
        self.history.push((path.to_string(), value));
    }

    fn notify(&mut self, path: &str) {
        let current = self.values.get(path).cloned();
        for sub in self.subscriptions.iter_mut().filter(|s| s.path == path) {
            (sub.callback)(current.clone());
        }
    }
}

impl StorePort for InMemoryStore {
    fn subscribe(
        &mut self,
        path: &str,
        mut subscriber: Subscriber,
    ) -> Result<SubscriptionId, StoreError> {
        let id = SubscriptionId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        subscriber(self.values.get(path).cloned());
        self.subscriptions.push(Subscription {
            id,
            path: path.to_string(),
            callback: subscriber,
        });
        debug!("Store: subscription {} on {}", id.0, path);
        Ok(id)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscriptions.retain(|s| s.id != id);
    }

    fn set(&mut self, path: &str, value: StoreValue) -> Result<(), StoreError> {
        if let Some(err) = &self.write_failure {
            return Err(err.clone());
        }
        self.commit(path, value);
        self.notify(path);
        Ok(())
    }

    fn update(&mut self, updates: &[(&str, StoreValue)]) -> Result<(), StoreError> {
        if let Some(err) = &self.write_failure {
            return Err(err.clone());
        }
        for (path, value) in updates {
            self.commit(path, value.clone());
        }
        for (path, _) in updates {
            self.notify(path);
        }
        Ok(())
    }

    fn read_once(&self, path: &str) -> Result<Option<StoreValue>, StoreError> {
        if let Some(err) = &self.read_failure {
            return Err(err.clone());
        }
        Ok(self.values.get(path).cloned())
    }
}

/// Cloneable handle onto one [`InMemoryStore`], so a simulated device can
/// write telemetry into the same store the session is subscribed to.
#[derive(Clone, Default)]
pub struct SharedStore(Rc<RefCell<InMemoryStore>>);

impl SharedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against the underlying store.  Must not be called from
    /// inside a subscriber callback.
    pub fn with<R>(&self, f: impl FnOnce(&mut InMemoryStore) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }
}

impl StorePort for SharedStore {
    fn subscribe(&mut self, path: &str, subscriber: Subscriber) -> Result<SubscriptionId, StoreError> {
        self.0.borrow_mut().subscribe(path, subscriber)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.0.borrow_mut().unsubscribe(id);
    }

    fn set(&mut self, path: &str, value: StoreValue) -> Result<(), StoreError> {
        self.0.borrow_mut().set(path, value)
    }

    fn update(&mut self, updates: &[(&str, StoreValue)]) -> Result<(), StoreError> {
        self.0.borrow_mut().update(updates)
    }

    fn read_once(&self, path: &str) -> Result<Option<StoreValue>, StoreError> {
        self.0.borrow().read_once(path)
    }
}
