//! Workspace config file source: `<workspace>/dxready.toml`.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::File;
use std::path::{Path, PathBuf};

pub const WORKSPACE_CONFIG_FILE: &str = "dxready.toml";

pub fn workspace_config_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join(WORKSPACE_CONFIG_FILE)
}

/// Add the workspace config file to the builder if it exists.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> ConfigBuilder<DefaultState> {
    let path = workspace_config_path(workspace_root);
    if path.is_file() {
        builder.add_source(File::from(path).required(false))
    } else {
        builder
    }
}
