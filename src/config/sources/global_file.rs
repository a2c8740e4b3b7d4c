//! Global config file: `<platform config dir>/config.{toml,yaml,...}`

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::PathBuf;

/// Path stem of the global config file, without extension.
pub fn global_config_stem() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "jaegis", "jaegis")
        .map(|dirs| dirs.config_dir().join("config"))
}

/// Add the global file to builder when the platform has a config directory.
/// A missing file is not an error.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let Some(stem) = global_config_stem() else {
        return Ok(builder);
    };
    let Some(stem) = stem.to_str() else {
        return Ok(builder);
    };
    Ok(builder.add_source(File::with_name(stem).required(false)))
}
