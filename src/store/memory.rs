//! In-memory content store for hosts that already hold their content, and for tests.

use super::ContentStore;
use crate::error::StoreError;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Content store backed by a map of path to bytes.
#[derive(Default)]
pub struct MemoryContentStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
    reads: AtomicUsize,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with_entry(self, path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.insert(path, content);
        self
    }

    /// Insert or replace the content at `path`.
    pub fn insert(&self, path: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.entries.write().insert(path.into(), content.into());
    }

    /// Remove the content at `path`, returning whether it existed.
    pub fn remove(&self, path: &str) -> bool {
        self.entries.write().remove(path).is_some()
    }

    /// Number of successful and failed reads served so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn read(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.entries
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }
}
