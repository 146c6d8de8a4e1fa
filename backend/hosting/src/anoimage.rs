//! Anoimage adapter.
//!
//! The upload endpoint answers with a JSON object whose only stable feature is
//! that the image id sits under a key made of digits; every other key is noise.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use photodrop_core::{Hosting, HostingAdapter, UploadError};
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::{debug, info};

use crate::{build_client, request_error, success_body};

#[derive(Debug, Clone)]
pub struct AnoimageConfig {
    /// Upload endpoint (multipart POST).
    pub endpoint: String,
    /// Prefix of the public link; the image id is appended as a path segment.
    pub public_base_url: String,
    /// Sent as `Origin`, and with a trailing slash as `Referer`.
    pub origin: String,
    pub timeout: Duration,
}

impl Default for AnoimageConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://anoimage.com/upload-image.php".to_string(),
            public_base_url: "https://anoimage.com".to_string(),
            origin: "https://anoimage.com".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct AnoimageAdapter {
    client: reqwest::Client,
    config: AnoimageConfig,
}

impl AnoimageAdapter {
    pub fn new(config: AnoimageConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout)?,
            config,
        })
    }
}

#[async_trait]
impl HostingAdapter for AnoimageAdapter {
    fn hosting(&self) -> Hosting {
        Hosting::Anoimage
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
        let form = Form::new().part("file", part);

        debug!(endpoint = %self.config.endpoint, file = file_name, size, "Uploading to Anoimage");
        let resp = self
            .client
            .post(&self.config.endpoint)
            .header("Origin", &self.config.origin)
            .header("Referer", format!("{}/", self.config.origin.trim_end_matches('/')))
            .header("X-Requested-With", "XMLHttpRequest")
            .multipart(form)
            .send()
            .await
            .map_err(request_error)?;

        let body = success_body(resp).await?;
        let id = extract_image_id(&body)?;
        let url = format!("{}/{}", self.config.public_base_url.trim_end_matches('/'), id);
        info!(file = file_name, url = %url, "Anoimage upload complete");
        Ok(url)
    }
}

/// Value of the first key consisting only of ASCII digits.
pub fn extract_image_id(body: &str) -> Result<String, UploadError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| UploadError::parse(format!("invalid JSON: {e}"), body))?;
    let Value::Object(map) = &value else {
        return Err(UploadError::parse("expected a JSON object", body));
    };
    let (_, id) = map
        .iter()
        .find(|(key, _)| !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(|| UploadError::parse("no digit-only key", body))?;
    match id {
        Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(UploadError::parse("digit-only key holds no id", body)),
    }
}
