//! Merge rules: built-in defaults that every later layer overrides.

use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with scalar defaults applied.
///
/// List and map sections take their defaults from serde so a layer that sets
/// a list replaces it instead of merging element-wise.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("logging.enabled", true)?
        .set_default("logging.level", "warn")?
        .set_default("logging.format", "text")?
        .set_default("logging.output", "stderr")?
        .set_default("readiness.install_on_pending", true)?
        .set_default("readiness.php_binary", "php")
}
