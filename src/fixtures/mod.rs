//! Fixtures
//!
//! Requests and catalogs stored as YAML under `fixtures/requests/` and
//! `fixtures/products/`.

use std::{
    fs,
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::{
    catalog::StaticCatalog, fixtures::products::ProductsFixture, products::ProductRecord,
    request::OptimizationRequest,
};

pub mod products;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// No request loaded
    #[error("No request loaded; cannot build an optimization request")]
    NoRequest,
}

/// Fixture
#[derive(Debug)]
pub struct Fixture {
    /// Base path for fixture files
    base_path: PathBuf,

    /// Request parameters, possibly with inline products
    request: Option<OptimizationRequest>,

    /// Catalog products
    products: Vec<ProductRecord>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            request: None,
            products: Vec::new(),
        }
    }

    /// Load request parameters from `requests/{name}.yml`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_request(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("requests").join(format!("{name}.yml"));

        self.request = Some(read_request(&file_path)?);

        Ok(self)
    }

    /// Load catalog products from `products/{name}.yml`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_products(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("products").join(format!("{name}.yml"));

        self.products.extend(read_products(&file_path)?);

        Ok(self)
    }

    /// Load a complete fixture set (request and products with the same name)
    ///
    /// # Errors
    ///
    /// Returns an error if either fixture file cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::new();

        fixture.load_request(name)?.load_products(name)?;

        Ok(fixture)
    }

    /// Catalog products loaded so far
    pub fn products(&self) -> &[ProductRecord] {
        &self.products
    }

    /// Catalog serving the loaded products
    pub fn catalog(&self) -> StaticCatalog {
        StaticCatalog::new(self.products.clone())
    }

    /// The loaded request, with the fixture products filled in when the
    /// request file did not list any.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::NoRequest`] if no request has been loaded.
    pub fn request(&self) -> Result<OptimizationRequest, FixtureError> {
        let mut request = self.request.clone().ok_or(FixtureError::NoRequest)?;

        if request.products.is_empty() {
            request.products.clone_from(&self.products);
        }

        Ok(request)
    }
}

/// Read a request from any YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn read_request(path: &Path) -> Result<OptimizationRequest, FixtureError> {
    let contents = fs::read_to_string(path)?;

    Ok(serde_norway::from_str(&contents)?)
}

/// Read a product list from any YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn read_products(path: &Path) -> Result<Vec<ProductRecord>, FixtureError> {
    let contents = fs::read_to_string(path)?;
    let fixture: ProductsFixture = serde_norway::from_str(&contents)?;

    Ok(fixture.products)
}
