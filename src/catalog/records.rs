//! Catalog wire records

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::products::ProductRecord;

/// Product as served by the catalog API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Localized display name, used as the product identifier
    pub localized_name: String,

    /// Unit price in the declaration currency
    pub unit_price: f64,

    /// Units packed per box
    #[serde(default)]
    pub units_per_box: Option<u32>,

    /// Base duty rate
    #[serde(default)]
    pub base_duty_rate: f64,

    /// Additional levy rates keyed by levy name
    #[serde(default)]
    pub additional_levies: BTreeMap<String, f64>,

    /// Lightest box weight (kg)
    #[serde(default)]
    pub min_weight_per_box: Option<f64>,

    /// Heaviest box weight (kg)
    #[serde(default)]
    pub max_weight_per_box: Option<f64>,
}

impl CatalogEntry {
    /// Base duty plus every levy on the record.
    pub fn total_tax_rate(&self) -> f64 {
        self.base_duty_rate + self.additional_levies.values().sum::<f64>()
    }
}

impl From<CatalogEntry> for ProductRecord {
    fn from(entry: CatalogEntry) -> Self {
        let tax_rate = entry.total_tax_rate();

        Self {
            name: entry.localized_name,
            unit_price: entry.unit_price,
            pieces_per_box: entry.units_per_box.unwrap_or(1),
            tax_rate,
            min_weight_per_box: entry.min_weight_per_box.unwrap_or_default(),
            max_weight_per_box: entry.max_weight_per_box.unwrap_or_default(),
        }
    }
}
