//! MILP Observer

use good_lp::Variable;
use tracing::trace;

use crate::solvers::milp::state::{CategoryVars, ModelConstraint};

/// Observer trait for capturing the packing model as it's built.
///
/// The builder remains the only implementation of model construction;
/// observers passively record what happens for logging or analysis.
pub trait ModelObserver: Send {
    /// Called when the variables for a category are created.
    ///
    /// # Parameters
    ///
    /// - `category_idx`: Index of the category in the normalized catalog
    /// - `name`: Category name
    /// - `vars`: Box, selection and weight variables
    fn on_category_variables(&mut self, category_idx: usize, name: &str, vars: CategoryVars);

    /// Called when a term is added to the objective function.
    ///
    /// # Parameters
    ///
    /// - `var`: The decision variable
    /// - `coefficient`: Duty per box in currency B
    fn on_objective_term(&mut self, _var: Variable, _coefficient: f64) {}

    /// Called when a constraint is recorded.
    fn on_constraint(&mut self, constraint: &ModelConstraint);
}

/// No-op observer for unobserved solves.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl ModelObserver for NoopObserver {
    fn on_category_variables(&mut self, _: usize, _: &str, _: CategoryVars) {}

    fn on_constraint(&mut self, _: &ModelConstraint) {}
}

/// Observer that emits the formulation as `trace` events.
#[derive(Debug, Default)]
pub struct TracingObserver {
    constraints: usize,
}

impl TracingObserver {
    /// Number of constraints seen so far.
    pub fn constraint_count(&self) -> usize {
        self.constraints
    }
}

impl ModelObserver for TracingObserver {
    fn on_category_variables(&mut self, category_idx: usize, name: &str, vars: CategoryVars) {
        trace!(
            category_idx,
            name,
            boxes = ?vars.boxes,
            selected = ?vars.selected,
            weight = ?vars.weight,
            "category variables"
        );
    }

    fn on_objective_term(&mut self, var: Variable, coefficient: f64) {
        trace!(?var, coefficient, "objective term");
    }

    fn on_constraint(&mut self, constraint: &ModelConstraint) {
        self.constraints += 1;

        trace!(
            kind = constraint.kind.name(),
            category = ?constraint.kind.category(),
            relation = constraint.relation.symbol(),
            rhs = constraint.rhs,
            "constraint"
        );
    }
}
