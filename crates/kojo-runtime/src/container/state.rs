//! # State Store
//!
//! Process-lifetime bag of shared objects: database handles, transport
//! clients, feature flags. Values are type-erased; readers ask for the type
//! they expect and get `None` when the key is missing or holds something
//! else.
//!
//! The lock is never held across an `.await`, so a single `set` or `get` is
//! atomic, but a read, suspend, write sequence is not.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

/// A stored value.
pub type StateValue = Arc<dyn Any + Send + Sync>;

/// Shared key/value store. Clones share the same map.
#[derive(Clone, Default)]
pub struct StateStore {
    entries: Arc<RwLock<HashMap<String, StateValue>>>,
}

impl StateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`, replacing any previous value.
    pub fn set<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) {
        self.set_raw(key, Arc::new(value));
    }

    /// Store an already type-erased value.
    pub fn set_raw(&self, key: impl Into<String>, value: StateValue) {
        self.entries.write().insert(key.into(), value);
    }

    /// Typed read.
    #[must_use]
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.get_raw(key)?.downcast::<T>().ok()
    }

    #[must_use]
    pub fn get_raw(&self, key: &str) -> Option<StateValue> {
        self.entries.read().get(key).cloned()
    }

    /// Every entry at this instant.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, StateValue> {
        self.entries.read().clone()
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore").field("keys", &self.keys()).finish()
    }
}
