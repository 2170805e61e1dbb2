//! Catalog
//!
//! Where product records come from, and the normalization they go through
//! before a model is built from them.

use async_trait::async_trait;
use mockall::automock;
use rustc_hash::FxHashSet;
use thiserror::Error;
use tracing::debug;

use crate::{products::ProductRecord, request::OptimizationRequest};

pub mod http;
pub mod records;

pub use http::{CatalogConfig, HttpCatalogSource};
pub use records::CatalogEntry;

/// Catalog errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A record failed validation.
    #[error("invalid catalog record {name:?}: {reason}")]
    InvalidRecord {
        /// Record name
        name: String,
        /// What is wrong with it
        reason: &'static str,
    },

    /// Two records share a name.
    #[error("duplicate catalog record name: {0}")]
    DuplicateName(String),

    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The catalog returned a non-2xx response.
    #[error("unexpected response from catalog: {0}")]
    UnexpectedResponse(String),
}

/// A supplier of product records for requests that arrive without any.
#[automock]
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch every product eligible for packing.
    async fn fetch_products(&self) -> Result<Vec<ProductRecord>, CatalogError>;
}

/// Fixed, in-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    products: Vec<ProductRecord>,
}

impl StaticCatalog {
    /// Create a catalog serving the given records.
    pub fn new(products: Vec<ProductRecord>) -> Self {
        Self { products }
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn fetch_products(&self) -> Result<Vec<ProductRecord>, CatalogError> {
        Ok(self.products.clone())
    }
}

/// Reject records that cannot be modelled.
///
/// # Errors
///
/// Returns [`CatalogError::InvalidRecord`] for the first malformed record, or
/// [`CatalogError::DuplicateName`] if two records share a name.
pub fn validate_records(products: &[ProductRecord]) -> Result<(), CatalogError> {
    let mut names = FxHashSet::default();

    for product in products {
        if let Some(reason) = record_problem(product) {
            return Err(CatalogError::InvalidRecord {
                name: product.name.clone(),
                reason,
            });
        }

        if !names.insert(product.name.as_str()) {
            return Err(CatalogError::DuplicateName(product.name.clone()));
        }
    }

    Ok(())
}

fn record_problem(product: &ProductRecord) -> Option<&'static str> {
    if product.name.trim().is_empty() {
        return Some("name is empty");
    }

    if !product.unit_price.is_finite() || product.unit_price <= 0.0 {
        return Some("unit price must be a positive number");
    }

    if product.pieces_per_box == 0 {
        return Some("pieces per box must be at least 1");
    }

    if !product.tax_rate.is_finite() || product.tax_rate < 0.0 {
        return Some("tax rate must be a non-negative number");
    }

    if !product.min_weight_per_box.is_finite() || !product.max_weight_per_box.is_finite() {
        return Some("weight bounds must be finite");
    }

    // Records without a usable maximum are normalized, whatever their minimum says.
    if product.has_weight_range() {
        if product.min_weight_per_box < 0.0 {
            return Some("minimum weight per box must not be negative");
        }

        if product.min_weight_per_box > product.max_weight_per_box {
            return Some("minimum weight per box exceeds maximum");
        }
    }

    None
}

/// Give every record without a usable weight range a fixed weight equal to
/// the request's average box weight.
///
/// Order and count are preserved.
pub fn normalize(
    mut products: Vec<ProductRecord>,
    request: &OptimizationRequest,
) -> Vec<ProductRecord> {
    let average = request.average_weight_per_box();

    for product in products.iter_mut().filter(|p| !p.has_weight_range()) {
        debug!(product = %product.name, average, "defaulting box weight range to average");

        product.min_weight_per_box = average;
        product.max_weight_per_box = average;
    }

    products
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn request(weight: f64, boxes: u32) -> OptimizationRequest {
        OptimizationRequest {
            target_total_weight: weight,
            target_total_boxes: boxes,
            min_value_density: 0.0,
            max_tax_density: 100.0,
            exchange_rate: 1.0,
            max_categories: 1,
            min_boxes_per_selected_category: 1,
            stress_multiplier: None,
            products: Vec::new(),
        }
    }

    #[test]
    fn normalize_fills_missing_range_with_average() {
        let products = vec![
            ProductRecord::new("ranged", 1.0, 1, 0.1, (2.0, 6.0)),
            ProductRecord::new("unknown", 1.0, 1, 0.1, (0.0, 0.0)),
        ];

        let normalized = normalize(products, &request(45.0, 10));

        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0].name, "ranged");
        assert!((normalized[0].max_weight_per_box - 6.0).abs() <= f64::EPSILON);
        assert!((normalized[1].min_weight_per_box - 4.5).abs() <= f64::EPSILON);
        assert!((normalized[1].max_weight_per_box - 4.5).abs() <= f64::EPSILON);
    }

    #[test]
    fn normalize_treats_negative_maximum_as_missing() {
        let products = vec![ProductRecord::new("odd", 1.0, 1, 0.1, (3.0, -1.0))];

        let normalized = normalize(products, &request(20.0, 4));

        assert!((normalized[0].min_weight_per_box - 5.0).abs() <= f64::EPSILON);
        assert!((normalized[0].max_weight_per_box - 5.0).abs() <= f64::EPSILON);
    }

    #[test]
    fn validate_rejects_inverted_range() {
        let products = [ProductRecord::new("inverted", 1.0, 1, 0.1, (6.0, 2.0))];

        let result = validate_records(&products);

        assert!(matches!(
            result,
            Err(CatalogError::InvalidRecord { ref name, .. }) if name == "inverted"
        ));
    }

    #[test]
    fn validate_rejects_bad_prices_pieces_and_rates() {
        let cases = [
            ProductRecord::new("free", 0.0, 1, 0.1, (1.0, 1.0)),
            ProductRecord::new("empty box", 1.0, 0, 0.1, (1.0, 1.0)),
            ProductRecord::new("rebate", 1.0, 1, -0.1, (1.0, 1.0)),
            ProductRecord::new("nan", f64::NAN, 1, 0.1, (1.0, 1.0)),
        ];

        for product in cases {
            assert!(
                validate_records(std::slice::from_ref(&product)).is_err(),
                "{} should be rejected",
                product.name
            );
        }
    }

    #[test]
    fn validate_rejects_duplicate_names() {
        let products = [
            ProductRecord::new("twin", 1.0, 1, 0.1, (1.0, 1.0)),
            ProductRecord::new("twin", 2.0, 1, 0.1, (1.0, 1.0)),
        ];

        assert!(matches!(
            validate_records(&products),
            Err(CatalogError::DuplicateName(name)) if name == "twin"
        ));
    }

    #[test]
    fn validate_accepts_range_invalid_records() {
        let products = [ProductRecord::new("unknown", 1.0, 1, 0.0, (0.0, 0.0))];

        assert!(validate_records(&products).is_ok());
    }

    #[tokio::test]
    async fn static_catalog_serves_its_records() -> TestResult {
        let catalog = StaticCatalog::new(vec![ProductRecord::new("a", 1.0, 1, 0.0, (1.0, 1.0))]);

        let products = catalog.fetch_products().await?;

        assert_eq!(products.len(), 1);

        Ok(())
    }
}
