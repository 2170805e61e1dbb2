//! MILP Solver
//!
//! Packing selection as a mixed-integer linear program. Every category gets an
//! integer box count, a binary "ships at all" flag and a continuous weight.
//! Per-box weights are only known as ranges, so the weight of a category is
//! not `boxes × weight_per_box`; it is a free variable pinned between the
//! lightest and heaviest boxes scaled by the box count:
//!
//! ```text
//! min_weight_per_box[i] × boxes[i] <= weight[i] <= max_weight_per_box[i] × boxes[i]
//! ```
//!
//! which keeps the model linear while letting the solver pick any average box
//! weight inside the range.

use good_lp::Expression;
use tracing::{debug, info, warn};

use crate::{
    catalog,
    products::{ProductCosts, ProductRecord},
    request::OptimizationRequest,
    results::OptimizationResult,
    solvers::{Solver, SolverConfig, SolverError},
};

pub(crate) mod extract;
pub mod observer;
pub(crate) mod run;
pub mod state;
#[cfg(test)]
mod test_helpers;

pub use observer::{ModelObserver, NoopObserver, TracingObserver};
pub use state::{CategoryVars, ConstraintKind, ConstraintRelation, ModelConstraint, ModelState};

use run::{SolveOutcome, SolverSlots};

/// Solver using Mixed Integer Linear Programming (MILP)
///
/// Clones share one pool of solver slots, sized by
/// [`SolverConfig::max_in_flight`].
#[derive(Debug, Clone)]
pub struct MilpSolver {
    config: SolverConfig,
    slots: SolverSlots,
}

impl Default for MilpSolver {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}

impl MilpSolver {
    /// Create a solver with the given settings.
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            slots: SolverSlots::new(config.max_in_flight),
        }
    }

    /// Solver settings
    pub fn config(&self) -> SolverConfig {
        self.config
    }

    /// Solver slots not currently held by a running solve.
    pub fn available_slots(&self) -> usize {
        self.slots.available()
    }

    /// Solve with an observer for capturing the model formulation.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError`] if the request or catalog is invalid, every
    /// solver slot is busy, or the backend fails.
    pub fn solve_with_observer(
        &self,
        request: &OptimizationRequest,
        observer: &mut dyn ModelObserver,
    ) -> Result<OptimizationResult, SolverError> {
        request.validate()?;
        catalog::validate_records(&request.products)?;

        if request.max_categories > request.products.len() {
            warn!(
                max_categories = request.max_categories,
                available = request.products.len(),
                "more categories requested than the catalog holds"
            );

            return Ok(OptimizationResult::infeasible());
        }

        let products = catalog::normalize(request.products.clone(), request);

        let costs: Vec<ProductCosts> = products
            .iter()
            .map(|product| {
                ProductCosts::derive(product, request.exchange_rate, request.stress_multiplier)
            })
            .collect();

        let model = build_model(request, &products, &costs, observer)?;

        debug!(
            categories = model.categories().len(),
            constraints = model.constraints().len(),
            "built packing model"
        );

        let result = match run::solve_within(model, self.config.time_budget, &self.slots)? {
            SolveOutcome::Solved(values) => extract::extract(request, &products, &costs, &values)?,
            SolveOutcome::Infeasible => OptimizationResult::infeasible(),
            SolveOutcome::TimedOut => OptimizationResult::timed_out(),
        };

        info!(status = ?result.status(), "packing solve finished");

        Ok(result)
    }
}

impl Solver for MilpSolver {
    fn solve(&self, request: &OptimizationRequest) -> Result<OptimizationResult, SolverError> {
        let mut observer = NoopObserver;

        self.solve_with_observer(request, &mut observer)
    }
}

/// Build the packing model for normalized products and their derived costs.
///
/// The duty-density ceiling is left out when the request runs in stress mode.
///
/// # Errors
///
/// Returns a [`SolverError`] if `products` and `costs` disagree in length.
pub fn build_model<O: ModelObserver + ?Sized>(
    request: &OptimizationRequest,
    products: &[ProductRecord],
    costs: &[ProductCosts],
    observer: &mut O,
) -> Result<ModelState, SolverError> {
    if products.len() != costs.len() {
        return Err(SolverError::InvariantViolation {
            message: "cost count does not match number of categories",
        });
    }

    let total_boxes = f64::from(request.target_total_boxes);
    let total_weight = request.target_total_weight;
    let min_boxes = f64::from(request.min_boxes_per_selected_category);

    let mut state = ModelState::new();

    let mut box_sum = Expression::default();
    let mut weight_sum = Expression::default();
    let mut value_sum = Expression::default();
    let mut tax_sum = Expression::default();
    let mut selected_sum = Expression::default();

    for (idx, (product, product_costs)) in products.iter().zip(costs).enumerate() {
        let vars = state.add_category(total_boxes, total_weight);

        observer.on_category_variables(idx, &product.name, vars);

        // Objective: total duty in currency B.
        state.add_to_objective(vars.boxes, product_costs.tax_per_box_b);
        observer.on_objective_term(vars.boxes, product_costs.tax_per_box_b);

        box_sum += vars.boxes;
        weight_sum += vars.weight;
        value_sum += vars.boxes * product_costs.value_per_box;
        tax_sum += vars.boxes * product_costs.tax_per_box_b;
        selected_sum += vars.selected;

        // A selected category ships at least the minimum order size...
        record(
            &mut state,
            observer,
            ModelConstraint::geq(
                ConstraintKind::SelectionLower(idx),
                Expression::from(vars.boxes) - vars.selected * min_boxes,
                0.0,
            ),
        );

        // ...and an unselected one ships nothing.
        record(
            &mut state,
            observer,
            ModelConstraint::leq(
                ConstraintKind::SelectionUpper(idx),
                Expression::from(vars.boxes) - vars.selected * total_boxes,
                0.0,
            ),
        );

        record(
            &mut state,
            observer,
            ModelConstraint::geq(
                ConstraintKind::WeightLower(idx),
                Expression::from(vars.weight) - vars.boxes * product.min_weight_per_box,
                0.0,
            ),
        );

        record(
            &mut state,
            observer,
            ModelConstraint::leq(
                ConstraintKind::WeightUpper(idx),
                Expression::from(vars.weight) - vars.boxes * product.max_weight_per_box,
                0.0,
            ),
        );
    }

    record(
        &mut state,
        observer,
        ModelConstraint::eq(ConstraintKind::BoxTotal, box_sum, total_boxes),
    );

    record(
        &mut state,
        observer,
        ModelConstraint::eq(ConstraintKind::WeightTotal, weight_sum, total_weight),
    );

    record(
        &mut state,
        observer,
        ModelConstraint::geq(
            ConstraintKind::ValueFloor,
            value_sum,
            request.min_value_density * total_weight,
        ),
    );

    if request.enforces_tax_ceiling() {
        record(
            &mut state,
            observer,
            ModelConstraint::leq(
                ConstraintKind::TaxCeiling,
                tax_sum,
                request.max_tax_density * total_weight,
            ),
        );
    }

    // Exactly k, not at most k.
    #[expect(
        clippy::cast_precision_loss,
        reason = "category counts are far below 2^52"
    )]
    let categories = request.max_categories as f64;

    record(
        &mut state,
        observer,
        ModelConstraint::eq(ConstraintKind::CategoryCount, selected_sum, categories),
    );

    Ok(state)
}

fn record<O: ModelObserver + ?Sized>(
    state: &mut ModelState,
    observer: &mut O,
    constraint: ModelConstraint,
) {
    observer.on_constraint(&constraint);
    state.add_constraint(constraint);
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use good_lp::{Solution, Variable};
    use smallvec::SmallVec;
    use testresult::TestResult;

    use crate::results::SolveStatus;

    use super::*;

    #[derive(Default)]
    struct RecordingObserver {
        names: Vec<String>,
        kinds: Vec<ConstraintKind>,
        objective_terms: usize,
    }

    impl ModelObserver for RecordingObserver {
        fn on_category_variables(&mut self, _: usize, name: &str, _: CategoryVars) {
            self.names.push(name.to_string());
        }

        fn on_objective_term(&mut self, _: Variable, _: f64) {
            self.objective_terms += 1;
        }

        fn on_constraint(&mut self, constraint: &ModelConstraint) {
            self.kinds.push(constraint.kind);
        }
    }

    fn request(products: Vec<ProductRecord>) -> OptimizationRequest {
        OptimizationRequest {
            target_total_weight: 50.0,
            target_total_boxes: 10,
            min_value_density: 1.0,
            max_tax_density: 10.0,
            exchange_rate: 7.0,
            max_categories: 2,
            min_boxes_per_selected_category: 2,
            stress_multiplier: None,
            products,
        }
    }

    fn products() -> Vec<ProductRecord> {
        vec![
            ProductRecord::new("a", 1.0, 10, 0.1, (4.0, 6.0)),
            ProductRecord::new("b", 2.0, 5, 0.2, (3.0, 5.0)),
            ProductRecord::new("c", 0.5, 20, 0.0, (5.0, 5.0)),
        ]
    }

    fn costs(request: &OptimizationRequest) -> Vec<ProductCosts> {
        request
            .products
            .iter()
            .map(|p| ProductCosts::derive(p, request.exchange_rate, request.stress_multiplier))
            .collect()
    }

    fn satisfied(constraint: &ModelConstraint, solution: &HashMap<Variable, f64>) -> bool {
        let lhs = solution.eval(&constraint.lhs);
        let eps = 1e-9;

        match constraint.relation {
            ConstraintRelation::Eq => (lhs - constraint.rhs).abs() <= eps,
            ConstraintRelation::Leq => lhs <= constraint.rhs + eps,
            ConstraintRelation::Geq => lhs >= constraint.rhs - eps,
        }
    }

    #[test]
    fn build_model_records_every_rule() -> TestResult {
        let request = request(products());
        let mut observer = RecordingObserver::default();

        let state = build_model(&request, &request.products, &costs(&request), &mut observer)?;

        assert_eq!(observer.names, ["a", "b", "c"]);
        assert_eq!(observer.objective_terms, 3);
        assert_eq!(state.constraints().len(), 3 * 4 + 5);
        assert!(observer.kinds.contains(&ConstraintKind::TaxCeiling));
        assert!(observer.kinds.contains(&ConstraintKind::WeightUpper(2)));

        Ok(())
    }

    #[test]
    fn stress_mode_drops_tax_ceiling() -> TestResult {
        let request = OptimizationRequest {
            stress_multiplier: Some(2.0),
            ..request(products())
        };
        let mut observer = RecordingObserver::default();

        let state = build_model(&request, &request.products, &costs(&request), &mut observer)?;

        assert!(!observer.kinds.contains(&ConstraintKind::TaxCeiling));
        assert_eq!(state.constraints().len(), 3 * 4 + 4);

        Ok(())
    }

    #[test]
    fn hand_built_packing_satisfies_model() -> TestResult {
        let request = request(products());
        let state = build_model(&request, &request.products, &costs(&request), &mut NoopObserver)?;
        let vars: SmallVec<[CategoryVars; 16]> = state.categories().iter().copied().collect();

        // 6 boxes of a at 5 kg, 4 boxes of c at 5 kg, none of b.
        let mut point = HashMap::new();

        for (vars, (boxes, selected, weight)) in vars
            .iter()
            .zip([(6.0, 1.0, 30.0), (0.0, 0.0, 0.0), (4.0, 1.0, 20.0)])
        {
            point.insert(vars.boxes, boxes);
            point.insert(vars.selected, selected);
            point.insert(vars.weight, weight);
        }

        for constraint in state.constraints() {
            assert!(satisfied(constraint, &point), "{:?} violated", constraint.kind);
        }

        // duty: a = 10 * 0.1 * 7 = 7 per box, c is duty free
        assert!((point.eval(state.objective()) - 42.0).abs() < 1e-9);

        Ok(())
    }

    #[test]
    fn weight_links_reject_out_of_range_box_weights() -> TestResult {
        let request = request(products());
        let state = build_model(&request, &request.products, &costs(&request), &mut NoopObserver)?;
        let vars = state.categories().first().copied().ok_or("no categories")?;

        // 6 boxes of a weighing 42 kg means 7 kg per box; the range tops out at 6.
        let point: HashMap<Variable, f64> =
            [(vars.boxes, 6.0), (vars.selected, 1.0), (vars.weight, 42.0)].into();

        let upper = state
            .constraints()
            .iter()
            .find(|c| c.kind == ConstraintKind::WeightUpper(0))
            .ok_or("missing weight upper link")?;

        assert!(!satisfied(upper, &point));

        Ok(())
    }

    #[test]
    fn build_model_rejects_mismatched_costs() {
        let request = request(products());

        let result = build_model(&request, &request.products, &[], &mut NoopObserver);

        assert!(matches!(result, Err(SolverError::InvariantViolation { .. })));
    }

    #[test]
    fn too_many_categories_short_circuits_to_infeasible() -> TestResult {
        let request = OptimizationRequest {
            max_categories: 4,
            ..request(products())
        };
        let mut observer = RecordingObserver::default();

        let result = MilpSolver::default().solve_with_observer(&request, &mut observer)?;

        assert_eq!(result.status(), SolveStatus::Infeasible);
        assert!(observer.kinds.is_empty());

        Ok(())
    }

    #[test]
    fn invalid_catalog_is_rejected_before_modelling() {
        let mut products = products();
        products[1].pieces_per_box = 0;

        let result = MilpSolver::default().solve(&request(products));

        assert!(matches!(result, Err(SolverError::Catalog(_))));
    }

    #[test]
    fn solve_picks_cheapest_categories() -> TestResult {
        let result = MilpSolver::default().solve(&request(products()))?;

        assert_eq!(result.status(), SolveStatus::Optimal);

        let summary = result.summary().ok_or("missing summary")?;

        // c is duty free; a (7 per box) is cheaper than b (14 per box).
        // The minimum of two boxes of a leaves eight for c: 2 * 7 = 14.
        assert!((summary.total_tax_b - 14.0).abs() < 1e-6);
        assert_eq!(summary.selected_count, 2);

        Ok(())
    }

    #[cfg(not(feature = "solver-highs"))]
    #[test]
    fn timed_out_result_carries_no_numbers() -> TestResult {
        let solver = MilpSolver::new(SolverConfig {
            time_budget: std::time::Duration::from_millis(1),
            ..SolverConfig::default()
        });

        let result = solver.solve(&test_helpers::crowded_request())?;

        assert_eq!(result.status(), SolveStatus::TimedOutNoSolution);
        assert!(!result.is_success());

        let json = serde_json::to_value(&result)?;
        let keys: Vec<&str> = json
            .as_object()
            .ok_or("result is not an object")?
            .keys()
            .map(String::as_str)
            .collect();

        assert_eq!(keys, ["status", "success"]);
        assert_eq!(json["status"], "timed_out_no_solution");

        Ok(())
    }

    #[cfg(not(feature = "solver-highs"))]
    #[test]
    fn clones_share_solver_slots() -> TestResult {
        let solver = MilpSolver::new(SolverConfig {
            time_budget: std::time::Duration::from_millis(1),
            max_in_flight: 1,
        });
        let clone = solver.clone();

        let first = solver.solve(&test_helpers::crowded_request())?;

        assert_eq!(first.status(), SolveStatus::TimedOutNoSolution);
        assert_eq!(clone.available_slots(), 0);
        assert!(matches!(
            clone.solve(&request(products())),
            Err(SolverError::Busy { limit: 1 })
        ));

        Ok(())
    }
}
