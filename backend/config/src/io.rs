//! Config file location and loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::fs;

/// Default config file name within the config directory.
const CONFIG_FILE_NAME: &str = "photodrop.yaml";

/// Resolve the config directory.
/// Priority: `PHOTODROP_CONFIG_DIR` env > `~/.photodrop/` > `./.photodrop`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PHOTODROP_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .map(|home| home.join(".photodrop"))
        .unwrap_or_else(|| PathBuf::from(".photodrop"))
}

pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Read the YAML file as an untyped tree, ready for env substitution.
///
/// A missing file yields an empty mapping (first run, everything from defaults and env).
pub async fn load_raw(path: &Path) -> Result<Value> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        tracing::debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(Value::Object(Default::default()));
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    if raw.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }

    let value: Value = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    // A comment-only document parses as null.
    Ok(match value {
        Value::Null => Value::Object(Default::default()),
        other => other,
    })
}
