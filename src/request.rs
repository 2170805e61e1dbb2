//! Optimization Requests

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::products::ProductRecord;

/// Request validation errors
#[derive(Debug, Error, PartialEq)]
pub enum RequestError {
    /// The shipment must contain at least one box.
    #[error("target total boxes must be greater than zero")]
    ZeroBoxes,

    /// The shipment weight must be a positive number.
    #[error("target total weight must be greater than zero, got {0}")]
    NonPositiveWeight(f64),

    /// Nothing to choose from.
    #[error("product list is empty")]
    NoProducts,

    /// At least one category has to be selected.
    #[error("max categories must be at least 1")]
    ZeroCategories,

    /// Minimum order size must be a positive integer.
    #[error("min boxes per selected category must be at least 1")]
    ZeroMinimumBoxes,

    /// A numeric field was NaN or infinite.
    #[error("{field} must be a finite number, got {value}")]
    NonFinite {
        /// Request field name
        field: &'static str,
        /// Offending value
        value: f64,
    },

    /// Exchange rate must be positive.
    #[error("exchange rate must be greater than zero, got {0}")]
    NonPositiveExchangeRate(f64),

    /// Stress multiplier must be positive.
    #[error("stress multiplier must be greater than zero, got {0}")]
    NonPositiveStressMultiplier(f64),
}

/// One packing-selection request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRequest {
    /// Exact shipment weight (kg)
    pub target_total_weight: f64,

    /// Exact shipment box count
    pub target_total_boxes: u32,

    /// Floor on declared value per kg (currency A)
    pub min_value_density: f64,

    /// Ceiling on duty per kg (currency B)
    pub max_tax_density: f64,

    /// Currency A to currency B
    pub exchange_rate: f64,

    /// Number of categories to ship
    pub max_categories: usize,

    /// Minimum order size for every shipped category
    pub min_boxes_per_selected_category: u32,

    /// Conservative valuation factor. Also lifts the duty-density ceiling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stress_multiplier: Option<f64>,

    /// Catalog records. Empty means "ask the catalog source".
    #[serde(default, alias = "products_data")]
    pub products: Vec<ProductRecord>,
}

impl OptimizationRequest {
    /// Average box weight implied by the targets.
    pub fn average_weight_per_box(&self) -> f64 {
        self.target_total_weight / f64::from(self.target_total_boxes)
    }

    /// Whether the duty-density ceiling is part of the model.
    pub fn enforces_tax_ceiling(&self) -> bool {
        self.stress_multiplier.is_none()
    }

    /// Check the scalar parameters, ignoring the product list.
    ///
    /// # Errors
    ///
    /// Returns a [`RequestError`] describing the first invalid parameter.
    pub fn validate_parameters(&self) -> Result<(), RequestError> {
        finite("target_total_weight", self.target_total_weight)?;
        finite("min_value_density", self.min_value_density)?;
        finite("max_tax_density", self.max_tax_density)?;
        finite("exchange_rate", self.exchange_rate)?;

        if self.target_total_boxes == 0 {
            return Err(RequestError::ZeroBoxes);
        }

        if self.target_total_weight <= 0.0 {
            return Err(RequestError::NonPositiveWeight(self.target_total_weight));
        }

        if self.exchange_rate <= 0.0 {
            return Err(RequestError::NonPositiveExchangeRate(self.exchange_rate));
        }

        if self.max_categories == 0 {
            return Err(RequestError::ZeroCategories);
        }

        if self.min_boxes_per_selected_category == 0 {
            return Err(RequestError::ZeroMinimumBoxes);
        }

        if let Some(multiplier) = self.stress_multiplier {
            finite("stress_multiplier", multiplier)?;

            if multiplier <= 0.0 {
                return Err(RequestError::NonPositiveStressMultiplier(multiplier));
            }
        }

        Ok(())
    }

    /// Check the scalar parameters and that there is something to choose from.
    ///
    /// # Errors
    ///
    /// Returns a [`RequestError`] describing the first problem found.
    pub fn validate(&self) -> Result<(), RequestError> {
        self.validate_parameters()?;

        if self.products.is_empty() {
            return Err(RequestError::NoProducts);
        }

        Ok(())
    }
}

fn finite(field: &'static str, value: f64) -> Result<(), RequestError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(RequestError::NonFinite { field, value })
    }
}
