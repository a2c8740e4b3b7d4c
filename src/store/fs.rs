//! Filesystem-backed content store rooted at a single directory.

use super::ContentStore;
use crate::error::{ConfigurationError, StoreError};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

/// Resolve a content root with support for absolute, tilde, and relative paths
///
/// Path resolution priority:
/// 1. Absolute path (if starts with `/`)
/// 2. Tilde expansion (if starts with `~/`)
/// 3. Relative to current directory (if starts with `./`)
/// 4. Relative to base_dir
pub fn resolve_root_path(path: &str, base_dir: &Path) -> Result<PathBuf, ConfigurationError> {
    if path.starts_with('/') {
        return Ok(PathBuf::from(path));
    }
    if let Some(rest) = path.strip_prefix("~/") {
        let base_dirs = directories::BaseDirs::new().ok_or_else(|| {
            ConfigurationError::Invalid("Could not determine home directory".to_string())
        })?;
        return Ok(base_dirs.home_dir().join(rest));
    }
    if let Some(rest) = path.strip_prefix("./") {
        let current_dir = std::env::current_dir().map_err(|e| {
            ConfigurationError::Invalid(format!("Failed to get current directory: {}", e))
        })?;
        return Ok(current_dir.join(rest));
    }
    Ok(base_dir.join(path))
}

/// Reads content relative to `root`. Paths may not escape the root.
#[derive(Debug, Clone)]
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Build a store from a root spec such as `~/jaegis` or `./content`.
    pub fn from_root_spec(spec: &str, base_dir: &Path) -> Result<Self, ConfigurationError> {
        Ok(Self::new(resolve_root_path(spec, base_dir)?))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, path: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(path);
        let invalid = |reason: &str| StoreError::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        };
        if path.trim().is_empty() {
            return Err(invalid("empty path"));
        }
        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                Component::ParentDir => return Err(invalid("parent directory segments")),
                Component::RootDir | Component::Prefix(_) => {
                    return Err(invalid("absolute path"))
                }
            }
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ContentStore for FsContentStore {
    async fn read(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        let full_path = self.full_path(path)?;
        tokio::fs::read(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound(path.to_string())
            } else {
                StoreError::Io {
                    path: path.to_string(),
                    message: e.to_string(),
                }
            }
        })
    }
}
