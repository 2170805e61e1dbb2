//! Products

use serde::{Deserialize, Serialize};

/// A catalog line eligible for inclusion in a shipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Product name, unique within a request
    pub name: String,

    /// Unit price in the declaration currency
    pub unit_price: f64,

    /// Pieces packed in each box
    pub pieces_per_box: u32,

    /// Base duty plus every additional levy, as a fraction
    pub tax_rate: f64,

    /// Lightest acceptable box weight (kg)
    #[serde(default)]
    pub min_weight_per_box: f64,

    /// Heaviest acceptable box weight (kg). Zero or less means "unknown".
    #[serde(default)]
    pub max_weight_per_box: f64,
}

impl ProductRecord {
    /// Create a product with an explicit per-box weight range.
    pub fn new(
        name: impl Into<String>,
        unit_price: f64,
        pieces_per_box: u32,
        tax_rate: f64,
        weight_range: (f64, f64),
    ) -> Self {
        let (min_weight_per_box, max_weight_per_box) = weight_range;

        Self {
            name: name.into(),
            unit_price,
            pieces_per_box,
            tax_rate,
            min_weight_per_box,
            max_weight_per_box,
        }
    }

    /// Whether the record carries a usable per-box weight range.
    pub fn has_weight_range(&self) -> bool {
        self.max_weight_per_box > 0.0
    }
}

/// Per-box amounts derived once from a [`ProductRecord`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProductCosts {
    /// Declared value of one box (currency A)
    pub value_per_box: f64,

    /// Duty on one box (currency A)
    pub tax_per_box_a: f64,

    /// Duty on one box (currency B)
    pub tax_per_box_b: f64,
}

impl ProductCosts {
    /// Derive the per-box amounts, scaling the unit price by the stress multiplier if present.
    pub fn derive(product: &ProductRecord, exchange_rate: f64, stress: Option<f64>) -> Self {
        let unit_price = product.unit_price * stress.unwrap_or(1.0);
        let value_per_box = unit_price * f64::from(product.pieces_per_box);
        let tax_per_box_a = value_per_box * product.tax_rate;

        Self {
            value_per_box,
            tax_per_box_a,
            tax_per_box_b: tax_per_box_a * exchange_rate,
        }
    }
}
