//! Built-in defaults every load starts from.

use crate::config::DEFAULT_MAX_CONTEXT_BYTES;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Builder seeded with the defaults env overrides are parsed against.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("context.max_bytes", DEFAULT_MAX_CONTEXT_BYTES as u64)?
        .set_default("resolver.begin_keyword", "START")?
        .set_default("resolver.end_keyword", "END")?
        .set_default("resolver.bundle_extension", "txt")
}
