//! Config defaults for the batching, audit, and logging sections.
//!
//! Hosting sections are left sparse: anything unset there falls back to the
//! adapter's built-in configuration.

use crate::schema::{AuditConfig, BatchingConfig, LoggingConfig, PhotodropConfig};

/// Wait for album siblings (milliseconds).
pub const DEFAULT_ALBUM_DELAY_MS: u64 = 1_000;

/// Dedup window (seconds).
pub const DEFAULT_DUPLICATE_INTERVAL_SECS: u64 = 600;

/// Lifetime of an unanswered hosting prompt (seconds).
pub const DEFAULT_SELECTION_TOKEN_TTL_SECS: u64 = 3_600;

pub const DEFAULT_AUDIT_PATH: &str = "uploads.csv";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: PhotodropConfig) -> PhotodropConfig {
    let config = apply_batching_defaults(config);
    let config = apply_audit_defaults(config);
    apply_logging_defaults(config)
}

fn apply_batching_defaults(mut config: PhotodropConfig) -> PhotodropConfig {
    let batching = config.batching.get_or_insert_with(BatchingConfig::default);
    batching.album_delay_ms.get_or_insert(DEFAULT_ALBUM_DELAY_MS);
    batching
        .duplicate_interval_secs
        .get_or_insert(DEFAULT_DUPLICATE_INTERVAL_SECS);
    batching
        .selection_token_ttl_secs
        .get_or_insert(DEFAULT_SELECTION_TOKEN_TTL_SECS);
    config
}

fn apply_audit_defaults(mut config: PhotodropConfig) -> PhotodropConfig {
    let audit = config.audit.get_or_insert_with(AuditConfig::default);
    if audit.path.is_none() {
        audit.path = Some(DEFAULT_AUDIT_PATH.to_string());
    }
    config
}

fn apply_logging_defaults(mut config: PhotodropConfig) -> PhotodropConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    if logging.level.is_none() {
        logging.level = Some(DEFAULT_LOG_LEVEL.to_string());
    }
    if logging.dir.is_none() {
        logging.dir = Some(DEFAULT_LOG_DIR.to_string());
    }
    logging.json.get_or_insert(false);
    config
}
