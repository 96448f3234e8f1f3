//! Async catalog fetching.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};
use wx_common::{WxError, WxResult};

use crate::catalog::Catalog;

/// Source of catalog XML documents.
///
/// A missing document is reported as [`WxError::CatalogNotFound`]; any other
/// transport failure as [`WxError::Http`].
#[async_trait]
pub trait CatalogFetcher: Send + Sync {
    /// Fetch the raw document at `url`.
    async fn fetch_text(&self, url: &str) -> WxResult<String>;

    /// Fetch and parse the catalog at `url`.
    async fn fetch_catalog(&self, url: &str) -> WxResult<Catalog> {
        let xml = self.fetch_text(url).await?;
        Catalog::parse(url, &xml)
    }
}

/// HTTP implementation backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpCatalogFetcher {
    client: Client,
}

impl HttpCatalogFetcher {
    pub fn new(timeout: Duration) -> WxResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(4)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| WxError::Http(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CatalogFetcher for HttpCatalogFetcher {
    #[instrument(skip(self), fields(url = %url))]
    async fn fetch_text(&self, url: &str) -> WxResult<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| WxError::Http(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(WxError::CatalogNotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(WxError::Http(format!("GET {} returned {}", url, status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| WxError::Http(format!("Failed to read body of {}: {}", url, e)))?;
        debug!(bytes = body.len(), "Fetched catalog document");
        Ok(body)
    }
}
