pub mod config;
pub mod inspect;
pub mod output;
pub mod parse;

use std::path::{Path, PathBuf};

use sso_core::SsoConfig;

/// `<config dir>/sso-extract/config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sso-extract")
        .join("config.json")
}

/// Explicit `--config` path, else the default path when it exists, else
/// built-in defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<SsoConfig> {
    if let Some(path) = config_path {
        return SsoConfig::from_file(Path::new(path))
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path, e));
    }
    let default_path = default_config_path();
    if default_path.exists() {
        Ok(SsoConfig::from_file(&default_path)?)
    } else {
        Ok(SsoConfig::default())
    }
}
