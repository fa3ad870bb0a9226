//! Workspace layer: `config/config.toml`, then the file named by `FORGE_ENV`.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::{Path, PathBuf};

const ENV_SELECTOR: &str = "FORGE_ENV";
const DEFAULT_ENV: &str = "development";

/// Workspace files that exist, lowest precedence first.
pub fn layered_files(workspace_root: &Path) -> Vec<PathBuf> {
    let dir = workspace_root.join("config");
    let env = std::env::var(ENV_SELECTOR)
        .ok()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ENV.to_string());

    [dir.join("config.toml"), dir.join(format!("{env}.toml"))]
        .into_iter()
        .filter(|path| path.is_file())
        .collect()
}

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(layered_files(workspace_root)
        .into_iter()
        .fold(builder, |builder, path| {
            builder.add_source(File::from(path).required(false))
        }))
}
