//! Environment variable source: JAEGIS_* prefix with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Add environment variable overlay to builder.
/// Uses JAEGIS_ prefix and __ as separator for nested keys, so
/// `JAEGIS__CONTEXT__MAX_BYTES=4096` sets `context.max_bytes`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let builder = builder.add_source(
        Environment::with_prefix("JAEGIS")
            .separator("__")
            .try_parsing(true),
    );
    Ok(builder)
}
