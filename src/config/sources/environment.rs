//! Environment source: `DXREADY__SECTION__KEY` variables.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

pub const ENV_PREFIX: &str = "DXREADY";

/// Add environment overrides. `vars` replaces the process environment when set.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    vars: Option<config::Map<String, String>>,
) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("readiness.doctor_keys")
            .with_list_parse_key("readiness.ensure_keys")
            .source(vars),
    )
}
