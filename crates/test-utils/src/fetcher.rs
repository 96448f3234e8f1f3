//! Catalog fetchers serving canned documents.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use thredds::CatalogFetcher;
use wx_common::{WxError, WxResult};

/// Serves documents from a URL map; unknown URLs are `CatalogNotFound`,
/// like a 404 from the server. Every request is recorded.
#[derive(Default)]
pub struct StaticCatalogFetcher {
    docs: HashMap<String, String>,
    requested: Mutex<Vec<String>>,
}

impl StaticCatalogFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.docs.insert(url.into(), body.into());
        self
    }

    /// URLs requested so far, in order.
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requested().iter().filter(|u| u.as_str() == url).count()
    }
}

#[async_trait]
impl CatalogFetcher for StaticCatalogFetcher {
    async fn fetch_text(&self, url: &str) -> WxResult<String> {
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(url.to_string());
        }
        self.docs
            .get(url)
            .cloned()
            .ok_or_else(|| WxError::CatalogNotFound(url.to_string()))
    }
}

/// Fails every request with a non-HTTP error, for error propagation tests.
pub struct BrokenFetcher;

#[async_trait]
impl CatalogFetcher for BrokenFetcher {
    async fn fetch_text(&self, url: &str) -> WxResult<String> {
        Err(WxError::CatalogInit(format!("broken fetcher: {}", url)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_fetcher_serves_and_records() {
        let fetcher = StaticCatalogFetcher::new().with("http://a/catalog.xml", "<catalog/>");
        assert_eq!(fetcher.fetch_text("http://a/catalog.xml").await.unwrap(), "<catalog/>");
        assert!(matches!(
            fetcher.fetch_text("http://b/catalog.xml").await,
            Err(WxError::CatalogNotFound(_))
        ));
        assert_eq!(fetcher.requested(), vec!["http://a/catalog.xml", "http://b/catalog.xml"]);
        assert_eq!(fetcher.request_count("http://a/catalog.xml"), 1);
    }
}
