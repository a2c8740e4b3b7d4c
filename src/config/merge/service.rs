//! MergeService: orchestrates sources, applies merge policy, deserializes to JaegisConfig.

use super::merge_policy;
use crate::config::sources::{environment, global_file, workspace_file};
use crate::config::JaegisConfig;
use crate::error::ConfigurationError;
use config::{ConfigError, File};
use std::path::Path;
use tracing::debug;

/// Merge service for config composition.
pub struct MergeService;

impl MergeService {
    /// Load config from workspace and standard sources.
    /// Precedence: defaults (lowest) -> global file -> workspace file -> environment (highest).
    pub fn load(workspace_root: &Path) -> Result<JaegisConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder)?;

        let config = builder.build()?;
        let config: JaegisConfig = config.try_deserialize()?;
        debug!(
            "Loaded configuration for {}: {} agents, {} phases",
            workspace_root.display(),
            config.agents.len(),
            config.phases.len()
        );
        Ok(config)
    }

    /// Load config from a specific file with environment overlay.
    pub fn load_from_file(path: &Path) -> Result<JaegisConfig, ConfigurationError> {
        let path_str = path.to_str().ok_or_else(|| {
            ConfigurationError::Invalid(format!("Config path is not valid UTF-8: {:?}", path))
        })?;

        let builder = merge_policy::builder_with_defaults()?;
        let builder = builder.add_source(File::with_name(path_str));
        let builder = environment::add_to_builder(builder)?;

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }
}
