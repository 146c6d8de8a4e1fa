//! `photodrop-config`: runtime configuration for the photodrop bot.
//!
//! Provides:
//! - Typed config schema (Telegram, hosting backends, batching, audit, logging)
//! - YAML loading from `PHOTODROP_CONFIG_DIR` or `~/.photodrop/`
//! - `${ENV_VAR}` substitution
//! - Default value application
//! - Validation and redaction for `photodrop check-config`

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_raw};
pub use redact::redact;
pub use schema::{
    AnoimageSection, AuditConfig, BatchingConfig, HostingConfig, LoggingConfig, NinjaboxSection,
    PhotodropConfig, TelegramConfig,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{Context, Result};
use std::path::Path;

/// Load, substitute env vars, and apply defaults.
///
/// Validation is left to the caller, which usually wants logging set up (from
/// this very config) before reporting problems.
pub async fn load_and_prepare(path: &Path) -> Result<PhotodropConfig> {
    let raw = load_raw(path).await?;
    let value = resolve_env_vars(&raw).context("Failed to resolve env vars in config")?;
    let config: PhotodropConfig =
        serde_json::from_value(value).context("Failed to deserialize config")?;
    Ok(apply_all_defaults(config))
}
