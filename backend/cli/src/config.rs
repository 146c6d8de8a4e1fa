//! Translation from the file config into the runtime components' settings.
//! Unset hosting fields keep the adapters' built-in values.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use photodrop_config::{AnoimageSection, BatchingConfig, NinjaboxSection, PhotodropConfig};
use photodrop_config::defaults::{
    DEFAULT_ALBUM_DELAY_MS, DEFAULT_DUPLICATE_INTERVAL_SECS, DEFAULT_SELECTION_TOKEN_TTL_SECS,
};
use photodrop_hosting::{
    AnoimageAdapter, AnoimageConfig, HostingRegistry, NinjaboxAdapter, NinjaboxConfig,
};
use photodrop_orchestrator::OrchestratorConfig;

pub fn anoimage_config(section: &AnoimageSection) -> AnoimageConfig {
    let mut cfg = AnoimageConfig::default();
    if let Some(endpoint) = &section.endpoint {
        cfg.endpoint = endpoint.clone();
    }
    if let Some(base) = &section.public_base_url {
        cfg.public_base_url = base.trim_end_matches('/').to_string();
    }
    if let Some(origin) = &section.origin {
        cfg.origin = origin.clone();
    }
    if let Some(secs) = section.timeout_secs {
        cfg.timeout = Duration::from_secs(secs);
    }
    cfg
}

pub fn ninjabox_config(section: &NinjaboxSection) -> NinjaboxConfig {
    let mut cfg = NinjaboxConfig::default();
    if let Some(endpoint) = &section.endpoint {
        cfg.endpoint = endpoint.clone();
    }
    if let Some(origin) = &section.origin {
        cfg.origin = origin.clone();
    }
    if let Some(ua) = &section.user_agent {
        cfg.user_agent = ua.clone();
    }
    if let Some(host) = &section.link_host {
        cfg.link_host = host.clone();
    }
    if let Some(pattern) = &section.link_pattern {
        cfg.link_pattern = pattern.clone();
    }
    if let Some(selectors) = &section.selectors {
        cfg.selectors = selectors.clone();
    }
    if let Some(markers) = &section.landing_markers {
        cfg.landing_markers = markers.clone();
    }
    if let Some(secs) = section.timeout_secs {
        cfg.timeout = Duration::from_secs(secs);
    }
    cfg
}

pub fn orchestrator_config(batching: &BatchingConfig) -> OrchestratorConfig {
    let album_ms = batching.album_delay_ms.unwrap_or(DEFAULT_ALBUM_DELAY_MS);
    let dup_secs = batching
        .duplicate_interval_secs
        .unwrap_or(DEFAULT_DUPLICATE_INTERVAL_SECS);
    let ttl_secs = batching
        .selection_token_ttl_secs
        .unwrap_or(DEFAULT_SELECTION_TOKEN_TTL_SECS);
    OrchestratorConfig {
        album_delay: Duration::from_millis(album_ms),
        duplicate_interval: chrono_secs(dup_secs),
        selection_token_ttl: chrono_secs(ttl_secs),
    }
}

fn chrono_secs(secs: u64) -> chrono::Duration {
    let secs = i64::try_from(secs).unwrap_or(i64::MAX).min(i64::MAX / 1_000);
    chrono::Duration::seconds(secs)
}

/// Both hosting adapters, configured from the file.
pub fn build_registry(config: &PhotodropConfig) -> Result<HostingRegistry> {
    let anoimage = AnoimageAdapter::new(anoimage_config(&config.anoimage()))
        .context("Failed to build Anoimage adapter")?;
    let ninjabox = NinjaboxAdapter::new(ninjabox_config(&config.ninjabox()))
        .context("Failed to build Ninjabox adapter")?;
    Ok(HostingRegistry::new()
        .with(Arc::new(anoimage))
        .with(Arc::new(ninjabox)))
}
