//! Per-agent build locks
//!
//! The context cache may be shared by several sessions. Building an agent's
//! context suspends on content reads, so the check-then-build-then-insert
//! sequence is serialized per agent name with an async mutex. Builds for
//! different agents proceed concurrently.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Lock manager keyed by agent name.
pub struct KeyLockManager {
    /// Map from key to its async mutex, shared with callers while held
    locks: RwLock<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyLockManager {
    pub fn new() -> Self {
        Self {
            locks: RwLock::new(HashMap::new()),
        }
    }

    /// Get or create the lock for `key`.
    pub fn get_lock(&self, key: &str) -> Arc<Mutex<()>> {
        {
            let map = self.locks.read();
            if let Some(lock) = map.get(key) {
                return lock.clone();
            }
        }

        let mut map = self.locks.write();
        // Another caller may have created it between the two lock acquisitions
        map.entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop locks nobody else holds a handle to.
    pub fn prune_idle(&self) {
        self.locks
            .write()
            .retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    pub fn len(&self) -> usize {
        self.locks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.read().is_empty()
    }
}

impl Default for KeyLockManager {
    fn default() -> Self {
        Self::new()
    }
}
