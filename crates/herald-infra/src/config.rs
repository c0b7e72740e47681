//! Configuration loader for Herald.
//!
//! Reads `config.toml` from the data directory (`~/.herald/` by default) and
//! deserializes it into [`HeraldConfig`]. Falls back to defaults when the file
//! is missing or malformed.

use std::path::{Path, PathBuf};

use herald_types::config::HeraldConfig;

/// Name of the config file inside the data directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Load configuration from `{data_dir}/config.toml`.
///
/// - Missing file: [`HeraldConfig::default()`].
/// - Unreadable or unparseable file: logs a warning, returns the default.
pub async fn load_config(data_dir: &Path) -> HeraldConfig {
    let config_path = data_dir.join(CONFIG_FILE);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return HeraldConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return HeraldConfig::default();
        }
    };

    match toml::from_str::<HeraldConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            HeraldConfig::default()
        }
    }
}

/// Resolve the data directory.
///
/// Priority:
/// 1. `HERALD_DATA_DIR` environment variable
/// 2. `~/.herald`
/// 3. `.herald` in the current directory
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("HERALD_DATA_DIR") {
        return PathBuf::from(dir);
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".herald");
    }
    PathBuf::from(".herald")
}
