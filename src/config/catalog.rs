//! Catalog Config

use std::{path::PathBuf, sync::Arc};

use clap::Args;

use packwise::{
    catalog::{CatalogConfig, CatalogSource, HttpCatalogSource, StaticCatalog},
    fixtures::{self, FixtureError},
};

/// Catalog fallback settings.
#[derive(Debug, Args)]
pub struct CatalogArgs {
    /// Catalog service base URL
    #[arg(long, env = "CATALOG_URL", conflicts_with = "catalog_file")]
    pub catalog_url: Option<String>,

    /// Catalog service bearer token
    #[arg(long, env = "CATALOG_TOKEN", hide_env_values = true)]
    pub catalog_token: Option<String>,

    /// Products YAML file used as the catalog
    #[arg(long, env = "CATALOG_FILE")]
    pub catalog_file: Option<PathBuf>,
}

impl CatalogArgs {
    /// Build the configured catalog source.
    ///
    /// Without a URL or file the catalog is empty, so requests must list
    /// their own products.
    ///
    /// # Errors
    ///
    /// Returns a [`FixtureError`] if the catalog file cannot be read.
    pub fn source(&self) -> Result<Arc<dyn CatalogSource>, FixtureError> {
        if let Some(base_url) = &self.catalog_url {
            return Ok(Arc::new(HttpCatalogSource::new(CatalogConfig {
                base_url: base_url.clone(),
                api_token: self.catalog_token.clone(),
            })));
        }

        let products = match &self.catalog_file {
            Some(path) => fixtures::read_products(path)?,
            None => Vec::new(),
        };

        Ok(Arc::new(StaticCatalog::new(products)))
    }
}
