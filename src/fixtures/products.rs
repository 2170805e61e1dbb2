//! Product Fixtures

use serde::Deserialize;

use crate::products::ProductRecord;

/// Products fixture file
#[derive(Debug, Deserialize)]
pub struct ProductsFixture {
    /// Catalog records, in catalog order
    pub products: Vec<ProductRecord>,
}
