//! The data bag shared by a reporter and every sub-reporter derived from it.

use serde_json::{Map, Value};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Shared, mutex-guarded JSON object.
///
/// Cloning the handle shares the underlying map; it never copies it. Every
/// node of a reporter subtree holds a clone of the same handle.
#[derive(Clone, Default)]
pub struct DataBag {
    inner: Arc<Mutex<Map<String, Value>>>,
}

impl DataBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(map)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Map<String, Value>> {
        // A panicking callback must not wedge the whole tree.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set `key`, returning the previous value.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.lock().insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.lock().remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    /// Copy every entry of `patch` in, last write wins.
    pub fn merge(&self, patch: Map<String, Value>) {
        let mut map = self.lock();
        for (key, value) in patch {
            map.insert(key, value);
        }
    }

    /// Run `f` with exclusive access to the map.
    ///
    /// Read-modify-write sequences (counters, appends) must go through here so
    /// concurrent branches do not lose updates.
    pub fn update<R>(&self, f: impl FnOnce(&mut Map<String, Value>) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn snapshot(&self) -> Map<String, Value> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// True when both handles point at the same map.
    pub fn shares_with(&self, other: &DataBag) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for DataBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DataBag").field(&*self.lock()).finish()
    }
}
