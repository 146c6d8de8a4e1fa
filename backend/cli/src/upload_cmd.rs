//! `photodrop upload`: push one file through an adapter and print the link.
//! Handy when a backend changes its markup and extraction needs retuning.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use bytes::Bytes;
use photodrop_core::Hosting;

use crate::config::build_registry;
use photodrop_config::PhotodropConfig;

pub async fn run(config: &PhotodropConfig, hosting: Hosting, file: &Path) -> Result<()> {
    let image = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let file_name = file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("image.jpg")
        .to_string();

    let registry = build_registry(config)?;
    let adapter = registry
        .get(hosting)
        .ok_or_else(|| anyhow!("{hosting} adapter is not registered"))?;

    tracing::info!(%hosting, file = %file.display(), bytes = image.len(), "Uploading");
    let url = adapter
        .upload(Bytes::from(image), &file_name)
        .await
        .map_err(|e| anyhow!("{} upload failed: {e}", hosting.display_name()))?;
    println!("{url}");
    Ok(())
}
