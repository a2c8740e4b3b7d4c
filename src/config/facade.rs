//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::JaegisConfig;
use crate::error::ConfigurationError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from files and environment.
    pub fn load(workspace_root: &Path) -> Result<JaegisConfig, ConfigurationError> {
        Ok(MergeService::load(workspace_root)?)
    }

    /// Load configuration from a specific file, with the environment overlay.
    pub fn load_from_file(path: &Path) -> Result<JaegisConfig, ConfigurationError> {
        MergeService::load_from_file(path)
    }

    /// Create default configuration.
    pub fn default() -> JaegisConfig {
        JaegisConfig::default()
    }
}
