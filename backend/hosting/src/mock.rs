use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use photodrop_core::{Hosting, HostingAdapter, UploadError};
use tokio::sync::Mutex;

/// Scripted in-process adapter.
///
/// Succeeds with `https://<hosting>.example/<file stem>` unless a failure or a
/// delay was scripted for the file name.
pub struct MockHosting {
    hosting: Hosting,
    failures: HashMap<String, UploadError>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
}

impl MockHosting {
    pub fn new(hosting: Hosting) -> Self {
        Self {
            hosting,
            failures: HashMap::new(),
            delays: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_on(mut self, file_name: impl Into<String>, error: UploadError) -> Self {
        self.failures.insert(file_name.into(), error);
        self
    }

    pub fn delay_on(mut self, file_name: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(file_name.into(), delay);
        self
    }

    /// File names passed to `upload`, in call order.
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    pub fn url_for(&self, file_name: &str) -> String {
        let stem = file_name.strip_suffix(".jpg").unwrap_or(file_name);
        format!("https://{}.example/{}", self.hosting.name(), stem)
    }
}

#[async_trait]
impl HostingAdapter for MockHosting {
    fn hosting(&self) -> Hosting {
        self.hosting
    }

    async fn upload(&self, image: Bytes, file_name: &str) -> Result<String, UploadError> {
        self.calls.lock().await.push(file_name.to_string());
        if let Some(delay) = self.delays.get(file_name) {
            tokio::time::sleep(*delay).await;
        }
        if image.is_empty() {
            return Err(UploadError::EmptyPayload);
        }
        match self.failures.get(file_name) {
            Some(err) => Err(err.clone()),
            None => Ok(self.url_for(file_name)),
        }
    }
}
