//! photodrop runtime configuration schema.
//!
//! Every field is optional in the file; missing values are filled by
//! [`crate::defaults`] or, for the hosting sections, by the adapters' own defaults.

use serde::{Deserialize, Serialize};

/// Root configuration (`photodrop.yaml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotodropConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram: Option<TelegramConfig>,

    /// Per-backend overrides for endpoints, headers, and result-page scraping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosting: Option<HostingConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batching: Option<BatchingConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit: Option<AuditConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,
}

// ---------------------------------------------------------------------------
// Hosting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anoimage: Option<AnoimageSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ninjabox: Option<NinjaboxSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnoimageSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Base of the returned link: `<publicBaseUrl>/<id>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NinjaboxSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Host substring every scraped link must contain, e.g. `nbox.me`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_host: Option<String>,
    /// Regex used on the raw body when no selector matched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_pattern: Option<String>,
    /// CSS selectors tried in order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selectors: Option<Vec<String>>,
    /// Substrings that identify the landing page (upload bounced).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landing_markers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

// ---------------------------------------------------------------------------
// Batching, audit, logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicate_interval_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_token_ttl_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    /// JSON console output instead of plain text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
}

impl PhotodropConfig {
    pub fn bot_token(&self) -> Option<&str> {
        self.telegram.as_ref()?.bot_token.as_deref()
    }

    pub fn batching(&self) -> BatchingConfig {
        self.batching.clone().unwrap_or_default()
    }

    pub fn anoimage(&self) -> AnoimageSection {
        self.hosting
            .as_ref()
            .and_then(|h| h.anoimage.clone())
            .unwrap_or_default()
    }

    pub fn ninjabox(&self) -> NinjaboxSection {
        self.hosting
            .as_ref()
            .and_then(|h| h.ninjabox.clone())
            .unwrap_or_default()
    }
}
