//! Optimization Results

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{
    products::{ProductCosts, ProductRecord},
    request::OptimizationRequest,
};

pub mod fee;
pub mod table;

pub use fee::minimum_processing_fee;
pub use table::RenderError;

/// Relative slack allowed when re-checking density limits.
pub const DENSITY_TOLERANCE: f64 = 1e-9;

/// Outcome of a solve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// A solution was found (optimal, or the incumbent when the budget ran out)
    Optimal,

    /// No packing satisfies the request
    Infeasible,

    /// The budget ran out before any solution was found
    TimedOutNoSolution,
}

/// One shipped category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedCategory {
    /// Category name
    pub name: String,

    /// Boxes shipped
    pub boxes: u32,

    /// Weight attributed to the category (kg)
    pub total_weight: f64,

    /// Implied weight of each box (kg)
    pub avg_weight_per_box: f64,

    /// Declared value (currency A)
    pub value_a: f64,

    /// Duty (currency B)
    pub tax_b: f64,

    /// Pieces shipped
    pub pieces: u64,
}

impl SelectedCategory {
    /// Derive the line amounts for `boxes` boxes weighing `total_weight` in total.
    pub fn new(
        product: &ProductRecord,
        costs: &ProductCosts,
        boxes: u32,
        total_weight: f64,
    ) -> Self {
        let box_count = f64::from(boxes);

        Self {
            name: product.name.clone(),
            boxes,
            total_weight,
            avg_weight_per_box: total_weight / box_count,
            value_a: costs.value_per_box * box_count,
            tax_b: costs.tax_per_box_b * box_count,
            pieces: u64::from(product.pieces_per_box) * u64::from(boxes),
        }
    }
}

/// Shipment totals and the re-checked density limits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackingSummary {
    /// Shipment weight (kg)
    pub total_weight: f64,

    /// Declared value (currency A)
    pub total_value_a: f64,

    /// Duty (currency B)
    pub total_tax_b: f64,

    /// Number of categories shipped
    pub selected_count: usize,

    /// Declared value per kg (currency A)
    pub value_density_a: f64,

    /// Duty per kg (currency B)
    pub tax_density_b: f64,

    /// `value_density_a` reaches the requested floor
    pub value_floor_met: bool,

    /// `tax_density_b` stays under the requested ceiling
    pub tax_ceiling_met: bool,

    /// Whether the ceiling was a constraint of the solve (off in stress mode)
    pub tax_ceiling_enforced: bool,

    /// Customs processing fee estimate (currency A)
    pub minimum_processing_fee: f64,
}

impl PackingSummary {
    /// Aggregate the selected lines and re-check the density limits of `request`.
    pub fn compute(selected: &[SelectedCategory], request: &OptimizationRequest) -> Self {
        let total_weight: f64 = selected.iter().map(|line| line.total_weight).sum();
        let total_value_a: f64 = selected.iter().map(|line| line.value_a).sum();
        let total_tax_b: f64 = selected.iter().map(|line| line.tax_b).sum();

        let (value_density_a, tax_density_b) = if total_weight > 0.0 {
            (total_value_a / total_weight, total_tax_b / total_weight)
        } else {
            (0.0, 0.0)
        };

        let floor = request.min_value_density;
        let ceiling = request.max_tax_density;

        Self {
            total_weight,
            total_value_a,
            total_tax_b,
            selected_count: selected.len(),
            value_density_a,
            tax_density_b,
            value_floor_met: value_density_a >= floor - slack(floor),
            tax_ceiling_met: tax_density_b <= ceiling + slack(ceiling),
            tax_ceiling_enforced: request.enforces_tax_ceiling(),
            minimum_processing_fee: minimum_processing_fee(total_value_a),
        }
    }
}

fn slack(limit: f64) -> f64 {
    DENSITY_TOLERANCE * limit.abs().max(1.0)
}

/// Selected categories plus their summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackingSolution {
    /// Shipped categories, in catalog order
    pub selected: SmallVec<[SelectedCategory; 8]>,

    /// Totals and checks
    pub summary: PackingSummary,
}

impl PackingSolution {
    /// Build the solution for the given lines.
    pub fn new(selected: SmallVec<[SelectedCategory; 8]>, request: &OptimizationRequest) -> Self {
        let summary = PackingSummary::compute(&selected, request);

        Self { selected, summary }
    }
}

/// Result returned to the caller.
///
/// Numeric fields exist only for [`SolveStatus::Optimal`], so "no solution"
/// can never be mistaken for a zero-duty solution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationResult {
    status: SolveStatus,
    success: bool,
    #[serde(flatten)]
    solution: Option<PackingSolution>,
}

impl OptimizationResult {
    /// Successful result.
    pub fn optimal(solution: PackingSolution) -> Self {
        Self {
            status: SolveStatus::Optimal,
            success: true,
            solution: Some(solution),
        }
    }

    /// No packing satisfies the request.
    pub fn infeasible() -> Self {
        Self::unsolved(SolveStatus::Infeasible)
    }

    /// The budget ran out without a solution.
    pub fn timed_out() -> Self {
        Self::unsolved(SolveStatus::TimedOutNoSolution)
    }

    fn unsolved(status: SolveStatus) -> Self {
        Self {
            status,
            success: false,
            solution: None,
        }
    }

    /// Solve status
    pub fn status(&self) -> SolveStatus {
        self.status
    }

    /// Whether a solution was found
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// The solution, if one was found
    pub fn solution(&self) -> Option<&PackingSolution> {
        self.solution.as_ref()
    }

    /// Shipped categories; empty unless successful.
    pub fn selected(&self) -> &[SelectedCategory] {
        self.solution
            .as_ref()
            .map(|solution| solution.selected.as_slice())
            .unwrap_or_default()
    }

    /// Summary, if a solution was found
    pub fn summary(&self) -> Option<&PackingSummary> {
        self.solution.as_ref().map(|solution| &solution.summary)
    }
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;
    use testresult::TestResult;

    use super::*;

    fn request(alpha: f64, beta: f64, stress: Option<f64>) -> OptimizationRequest {
        OptimizationRequest {
            target_total_weight: 50.0,
            target_total_boxes: 10,
            min_value_density: alpha,
            max_tax_density: beta,
            exchange_rate: 7.0,
            max_categories: 1,
            min_boxes_per_selected_category: 1,
            stress_multiplier: stress,
            products: Vec::new(),
        }
    }

    fn line() -> SelectedCategory {
        let product = ProductRecord::new("a", 1.0, 10, 0.1, (5.0, 5.0));
        let costs = ProductCosts::derive(&product, 7.0, None);

        SelectedCategory::new(&product, &costs, 10, 50.0)
    }

    #[test]
    fn selected_category_derives_line_amounts() {
        let line = line();

        assert!((line.avg_weight_per_box - 5.0).abs() < 1e-12);
        assert!((line.value_a - 100.0).abs() < 1e-9);
        assert!((line.tax_b - 70.0).abs() < 1e-9);
        assert_eq!(line.pieces, 100);
    }

    #[test]
    fn summary_rechecks_density_limits() {
        let summary = PackingSummary::compute(&[line()], &request(2.0, 1.4, None));

        // value density 2.0 meets a floor of 2.0; duty density 1.4 meets a ceiling of 1.4
        assert!(summary.value_floor_met);
        assert!(summary.tax_ceiling_met);
        assert!(summary.tax_ceiling_enforced);

        let strict = PackingSummary::compute(&[line()], &request(2.5, 1.0, Some(2.0)));

        assert!(!strict.value_floor_met);
        assert!(!strict.tax_ceiling_met);
        assert!(!strict.tax_ceiling_enforced);
    }

    #[test]
    fn unsolved_results_carry_no_numbers() -> TestResult {
        let result = OptimizationResult::infeasible();

        assert!(!result.is_success());
        assert!(result.selected().is_empty());
        assert!(result.summary().is_none());

        let json = serde_json::to_value(&result)?;

        assert_eq!(
            json,
            serde_json::json!({"status": "infeasible", "success": false})
        );

        let timed_out = serde_json::to_value(OptimizationResult::timed_out())?;

        assert_eq!(timed_out["status"], "timed_out_no_solution");

        Ok(())
    }

    #[test]
    fn optimal_result_serializes_selected_and_summary() -> TestResult {
        let solution = PackingSolution::new(smallvec![line()], &request(0.0, 999.0, None));
        let result = OptimizationResult::optimal(solution);

        let json = serde_json::to_value(&result)?;

        assert_eq!(json["success"], true);
        assert_eq!(json["selected"][0]["boxes"], 10);
        assert_eq!(json["summary"]["selected_count"], 1);

        Ok(())
    }
}
