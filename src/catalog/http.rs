//! HTTP catalog client

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::{
    catalog::{CatalogError, CatalogSource, records::CatalogEntry},
    products::ProductRecord,
};

/// Where the catalog API lives and how to authenticate against it.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Catalog API base address, e.g. `"https://catalog.internal"`.
    pub base_url: String,

    /// Bearer token, if the API requires one.
    pub api_token: Option<String>,
}

/// Catalog source backed by the catalog HTTP API.
#[derive(Debug, Clone)]
pub struct HttpCatalogSource {
    config: CatalogConfig,
    http: Client,
}

impl HttpCatalogSource {
    /// Create a new client from the given configuration.
    #[must_use]
    pub fn new(config: CatalogConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    fn products_url(&self) -> String {
        format!("{}/products", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch_products(&self) -> Result<Vec<ProductRecord>, CatalogError> {
        let mut request = self.http.get(self.products_url());

        if let Some(token) = &self.config.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(CatalogError::UnexpectedResponse(format!(
                "products request failed with status {status}: {text}"
            )));
        }

        let entries: Vec<CatalogEntry> = response.json().await?;

        debug!(count = entries.len(), "fetched catalog entries");

        Ok(entries.into_iter().map(ProductRecord::from).collect())
    }
}
