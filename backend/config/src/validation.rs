//! Config validation with field paths in every message.

use regex::Regex;
use thiserror::Error;

use crate::schema::PhotodropConfig;

/// Album delays above this hold replies back noticeably.
const ALBUM_DELAY_WARN_MS: u64 = 10_000;

#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &PhotodropConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_telegram(config, &mut report);
    validate_anoimage(config, &mut report);
    validate_ninjabox(config, &mut report);
    validate_batching(config, &mut report);
    report
}

fn validate_telegram(config: &PhotodropConfig, report: &mut ValidationReport) {
    if config.bot_token().map(str::trim).unwrap_or("").is_empty() {
        report.error("telegram.botToken", "Telegram bot token is required");
    }
}

fn check_timeout(path: &str, timeout: Option<u64>, report: &mut ValidationReport) {
    if timeout == Some(0) {
        report.error(path, "timeoutSecs must be > 0; uploads would never be bounded");
    }
}

fn validate_anoimage(config: &PhotodropConfig, report: &mut ValidationReport) {
    let section = config.anoimage();
    check_timeout("hosting.anoimage.timeoutSecs", section.timeout_secs, report);
    if let Some(base) = &section.public_base_url {
        if !base.starts_with("http://") && !base.starts_with("https://") {
            report.error("hosting.anoimage.publicBaseUrl", format!("'{base}' is not an http(s) URL"));
        }
    }
}

fn validate_ninjabox(config: &PhotodropConfig, report: &mut ValidationReport) {
    let section = config.ninjabox();
    check_timeout("hosting.ninjabox.timeoutSecs", section.timeout_secs, report);

    if let Some(selectors) = &section.selectors {
        if selectors.is_empty() {
            report.error(
                "hosting.ninjabox.selectors",
                "At least one selector is required; omit the key to use the built-in list",
            );
        }
        for (i, css) in selectors.iter().enumerate() {
            if css.trim().is_empty() {
                report.error(format!("hosting.ninjabox.selectors[{i}]"), "Selector cannot be empty");
            }
        }
    }

    if let Some(pattern) = &section.link_pattern {
        if let Err(e) = Regex::new(pattern) {
            report.error("hosting.ninjabox.linkPattern", format!("Invalid regex: {e}"));
        }
    }

    if section.link_host.as_deref().is_some_and(|h| h.trim().is_empty()) {
        report.error("hosting.ninjabox.linkHost", "linkHost cannot be empty");
    }

    if section.landing_markers.as_ref().is_some_and(Vec::is_empty) {
        report.warn(
            "hosting.ninjabox.landingMarkers",
            "No landing-page markers; bounced uploads will only be caught by link extraction",
        );
    }
}

fn validate_batching(config: &PhotodropConfig, report: &mut ValidationReport) {
    let batching = config.batching();
    if let Some(delay) = batching.album_delay_ms {
        if delay > ALBUM_DELAY_WARN_MS {
            report.warn(
                "batching.albumDelayMs",
                format!("Album delay of {delay}ms delays every album reply by that long"),
            );
        }
    }
    if batching.selection_token_ttl_secs == Some(0) {
        report.error("batching.selectionTokenTtlSecs", "selectionTokenTtlSecs must be > 0");
    }
}
