//! Solution extraction

use num_traits::ToPrimitive;
use smallvec::SmallVec;
use tracing::{error, warn};

use crate::{
    products::{ProductCosts, ProductRecord},
    request::OptimizationRequest,
    results::{OptimizationResult, PackingSolution, SelectedCategory},
    solvers::{SolverError, milp::run::SolvedValues},
};

/// Relative tolerance for the solved weight total.
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Translate solved variable values back into shipped categories.
///
/// A solution that misses the shipment totals can only come from a backend
/// stopped by the budget before it found an incumbent; it is reported as
/// timed out. Anywhere else it is a solver bug.
///
/// # Errors
///
/// Returns a [`SolverError`] if a box count cannot be represented or the
/// solution is inconsistent with the model.
pub(crate) fn extract(
    request: &OptimizationRequest,
    products: &[ProductRecord],
    costs: &[ProductCosts],
    values: &SolvedValues,
) -> Result<OptimizationResult, SolverError> {
    if products.len() != costs.len()
        || products.len() != values.boxes.len()
        || products.len() != values.weights.len()
    {
        return Err(SolverError::InvariantViolation {
            message: "solved value count does not match number of categories",
        });
    }

    let mut selected: SmallVec<[SelectedCategory; 8]> = SmallVec::new();
    let mut box_total: u64 = 0;
    let mut weight_total = 0.0;

    let lines = products
        .iter()
        .zip(costs)
        .zip(values.boxes.iter().zip(&values.weights));

    for ((product, product_costs), (&raw_boxes, &raw_weight)) in lines {
        let boxes = box_count(raw_boxes)?;
        let weight = raw_weight.max(0.0);

        box_total += u64::from(boxes);
        weight_total += weight;

        // Unselected categories are forced to zero weight by the upper weight link.
        if boxes > 0 {
            selected.push(SelectedCategory::new(product, product_costs, boxes, weight));
        }
    }

    if !meets_totals(request, box_total, weight_total) {
        if values.budget_exhausted {
            warn!(box_total, weight_total, "incumbent at time budget misses shipment totals");

            return Ok(OptimizationResult::timed_out());
        }

        error!(box_total, weight_total, "solution misses shipment totals");

        return Err(SolverError::InvariantViolation {
            message: "solution does not meet shipment totals",
        });
    }

    Ok(OptimizationResult::optimal(PackingSolution::new(
        selected, request,
    )))
}

/// Round a solved integer variable to a box count.
fn box_count(value: f64) -> Result<u32, SolverError> {
    value
        .round()
        .to_u32()
        .ok_or(SolverError::BoxCountNotRepresentable { value })
}

fn meets_totals(request: &OptimizationRequest, box_total: u64, weight_total: f64) -> bool {
    let target_weight = request.target_total_weight;

    box_total == u64::from(request.target_total_boxes)
        && (weight_total - target_weight).abs() <= WEIGHT_TOLERANCE * target_weight.max(1.0)
}
