//! Workspace config file: `<workspace>/jaegis.{toml,yaml,...}`

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::Path;

pub const WORKSPACE_CONFIG_STEM: &str = "jaegis";

/// Add the workspace file to builder. A missing file is not an error.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let stem = workspace_root.join(WORKSPACE_CONFIG_STEM);
    let stem = stem.to_str().ok_or_else(|| {
        ConfigError::Message(format!("Workspace path is not valid UTF-8: {:?}", workspace_root))
    })?;
    Ok(builder.add_source(File::with_name(stem).required(false)))
}
