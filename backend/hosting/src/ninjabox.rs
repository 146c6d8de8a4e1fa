//! Ninjabox adapter.
//!
//! The upload form posts back an HTML page. The share link (on `nbox.me`) has
//! moved between several elements over time, so it is located by
//! [`LinkExtractor`] rules rather than by one fixed path.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use photodrop_core::{Hosting, HostingAdapter, UploadError};
use reqwest::multipart::{Form, Part};
use tracing::{debug, info, warn};

use crate::extract::LinkExtractor;
use crate::{build_client, request_error, success_body};

/// Selectors that have carried the share link, most specific first.
pub const DEFAULT_SELECTORS: &[&str] = &[
    "input.share-input",
    "input#share-link",
    "input.link-input",
    "a.share-link",
    "a.direct-link",
    r#"input[type="text"][readonly="readonly"]"#,
    "div.share-block",
    r#"input[name="link"]"#,
];

pub const DEFAULT_LINK_PATTERN: &str = r"https://nbox\.me/[a-f0-9\-]+";

/// Substrings of the home page; seeing them means the upload did not happen.
pub const DEFAULT_LANDING_MARKERS: &[&str] = &["main-form", "files to upload"];

#[derive(Debug, Clone)]
pub struct NinjaboxConfig {
    pub endpoint: String,
    pub origin: String,
    pub user_agent: String,
    /// Host every accepted share link must contain.
    pub link_host: String,
    pub link_pattern: String,
    pub selectors: Vec<String>,
    pub landing_markers: Vec<String>,
    pub timeout: Duration,
}

impl Default for NinjaboxConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://ninjabox.org/put".to_string(),
            origin: "https://ninjabox.org".to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            link_host: "nbox.me".to_string(),
            link_pattern: DEFAULT_LINK_PATTERN.to_string(),
            selectors: DEFAULT_SELECTORS.iter().map(|s| s.to_string()).collect(),
            landing_markers: DEFAULT_LANDING_MARKERS.iter().map(|s| s.to_string()).collect(),
            timeout: Duration::from_secs(40),
        }
    }
}

pub struct NinjaboxAdapter {
    client: reqwest::Client,
    extractor: LinkExtractor,
    config: NinjaboxConfig,
}

impl NinjaboxAdapter {
    pub fn new(config: NinjaboxConfig) -> Result<Self> {
        let extractor =
            LinkExtractor::new(&config.selectors, &config.link_pattern, config.link_host.clone())?;
        Ok(Self {
            client: build_client(config.timeout)?,
            extractor,
            config,
        })
    }

    /// Turn a result page into a share link.
    pub fn parse_result_page(&self, body: &str) -> Result<String, UploadError> {
        if let Some(marker) = self
            .config
            .landing_markers
            .iter()
            .find(|m| !m.is_empty() && body.contains(m.as_str()))
        {
            warn!(marker = %marker, "Ninjabox returned its landing page");
            return Err(UploadError::LandingPage);
        }
        self.extractor
            .extract(body)
            .ok_or_else(|| UploadError::parse("no share link in result page", body))
    }
}

#[async_trait]
impl HostingAdapter for NinjaboxAdapter {
    fn hosting(&self) -> Hosting {
        Hosting::Ninjabox
    }

    async fn upload(&self, image: Bytes, file_name: &str) -> Result<String, UploadError> {
        if image.is_empty() {
            return Err(UploadError::EmptyPayload);
        }
        let size = image.len() as u64;
        let part = Part::stream_with_length(image, size)
            .file_name(file_name.to_string())
            .mime_str("image/jpeg")
            .map_err(request_error)?;
        let form = Form::new().part("files", part).text("password", "");

        debug!(endpoint = %self.config.endpoint, file = file_name, size, "Uploading to Ninjabox");
        // Redirects are followed by the client's default policy.
        let resp = self
            .client
            .post(&self.config.endpoint)
            .header("Origin", &self.config.origin)
            .header("Referer", format!("{}/", self.config.origin.trim_end_matches('/')))
            .header("User-Agent", &self.config.user_agent)
            .multipart(form)
            .send()
            .await
            .map_err(request_error)?;

        let body = success_body(resp).await?;
        let url = self.parse_result_page(&body)?;
        info!(file = file_name, url = %url, "Ninjabox upload complete");
        Ok(url)
    }
}
