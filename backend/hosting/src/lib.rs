//! Hosting adapters: one per external image host, all behind
//! [`photodrop_core::HostingAdapter`].

pub mod anoimage;
pub mod extract;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod ninjabox;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use photodrop_core::{Hosting, HostingAdapter, UploadError};

pub use anoimage::{AnoimageAdapter, AnoimageConfig};
pub use extract::{ExtractionStrategy, LinkExtractor};
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockHosting;
pub use ninjabox::{NinjaboxAdapter, NinjaboxConfig};

/// Registry of hosting adapters, looked up by backend.
#[derive(Clone, Default)]
pub struct HostingRegistry {
    adapters: HashMap<Hosting, Arc<dyn HostingAdapter>>,
}

impl HostingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under the backend it reports. Replaces any previous one.
    pub fn register(&mut self, adapter: Arc<dyn HostingAdapter>) {
        self.adapters.insert(adapter.hosting(), adapter);
    }

    pub fn with(mut self, adapter: Arc<dyn HostingAdapter>) -> Self {
        self.register(adapter);
        self
    }

    pub fn get(&self, hosting: Hosting) -> Option<Arc<dyn HostingAdapter>> {
        self.adapters.get(&hosting).cloned()
    }

    /// Registered backends in menu order.
    pub fn list(&self) -> Vec<Hosting> {
        Hosting::ALL
            .into_iter()
            .filter(|h| self.adapters.contains_key(h))
            .collect()
    }
}

pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

pub(crate) fn request_error(err: reqwest::Error) -> UploadError {
    if err.is_timeout() {
        UploadError::Timeout
    } else {
        UploadError::Transport(err.to_string())
    }
}

/// Read the body, turning any non-2xx status into [`UploadError::Status`].
pub(crate) async fn success_body(resp: reqwest::Response) -> Result<String, UploadError> {
    let status = resp.status();
    let body = resp.text().await.map_err(request_error)?;
    if !status.is_success() {
        return Err(UploadError::status(status.as_u16(), &body));
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lists_in_menu_order() {
        let registry = HostingRegistry::new()
            .with(Arc::new(MockHosting::new(Hosting::Ninjabox)))
            .with(Arc::new(MockHosting::new(Hosting::Anoimage)));
        assert_eq!(registry.list(), vec![Hosting::Anoimage, Hosting::Ninjabox]);
        assert!(registry.get(Hosting::Ninjabox).is_some());
    }

    #[test]
    fn missing_backend_is_none() {
        let registry = HostingRegistry::new().with(Arc::new(MockHosting::new(Hosting::Anoimage)));
        assert!(registry.get(Hosting::Ninjabox).is_none());
    }
}
