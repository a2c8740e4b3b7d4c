//! Content Store
//!
//! The port through which all persona, task, template, checklist, and data
//! content is read. The core never touches the filesystem itself; hosts inject
//! an implementation of [`ContentStore`].

pub mod fs;
pub mod memory;

use crate::error::StoreError;
use async_trait::async_trait;

/// Read-only access to externally stored content.
///
/// Reads may suspend, so independent agents can be loaded concurrently.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Read the full content stored at `path`.
    async fn read(&self, path: &str) -> Result<Vec<u8>, StoreError>;
}

pub use fs::FsContentStore;
pub use memory::MemoryContentStore;
