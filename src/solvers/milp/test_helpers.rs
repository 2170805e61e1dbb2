//! Shared test builders

use crate::{products::ProductRecord, request::OptimizationRequest};

/// Linear congruential generator; the same seed always yields the same catalog.
struct Lcg(u64);

impl Lcg {
    fn next_u32(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        u32::try_from(self.0 >> 32).unwrap_or(u32::MAX)
    }

    /// Uniform in `[0, 1]`.
    fn unit(&mut self) -> f64 {
        f64::from(self.next_u32()) / f64::from(u32::MAX)
    }
}

/// 150 categories choosing 47 under a binding value floor. Branch and bound
/// runs for seconds on it, far past a millisecond budget.
pub(crate) fn crowded_request() -> OptimizationRequest {
    let mut rng = Lcg(0x5eed_cafe);

    let products = (0..150)
        .map(|idx| {
            let min_weight = 6.0 + 4.0 * rng.unit();
            let max_weight = min_weight + 2.0 + 4.0 * rng.unit();

            ProductRecord::new(
                format!("line {idx:03}"),
                0.5 + 4.5 * rng.unit(),
                10 + rng.next_u32() % 40,
                0.05 + 0.4 * rng.unit(),
                (min_weight, max_weight),
            )
        })
        .collect();

    OptimizationRequest {
        target_total_weight: 4000.0,
        target_total_boxes: 400,
        min_value_density: 9.0,
        max_tax_density: 1000.0,
        exchange_rate: 7.1,
        max_categories: 47,
        min_boxes_per_selected_category: 3,
        stress_multiplier: None,
        products,
    }
}
