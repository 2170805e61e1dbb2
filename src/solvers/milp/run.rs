//! Time-bounded solve

use std::{
    sync::{
        Arc,
        mpsc::{self, RecvTimeoutError},
    },
    thread,
    time::{Duration, Instant},
};

use good_lp::{ResolutionError, Solution, SolverModel};
use smallvec::SmallVec;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

#[cfg(feature = "solver-highs")]
use good_lp::solvers::highs::highs as default_solver;
#[cfg(all(not(feature = "solver-highs"), feature = "solver-microlp"))]
use good_lp::solvers::microlp::microlp as default_solver;

use crate::solvers::{
    SolverError,
    milp::state::{ConstraintRelation, ModelConstraint, ModelState},
};

/// Upper bound on the extra time the watchdog waits past the budget for a
/// backend that honours the budget itself to report back.
const MAX_WATCHDOG_GRACE: Duration = Duration::from_secs(1);

/// A tenth of the budget, capped at [`MAX_WATCHDOG_GRACE`].
fn watchdog_grace(budget: Duration) -> Duration {
    (budget / 10).min(MAX_WATCHDOG_GRACE)
}

/// Raw variable values for each category, in catalog order.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct SolvedValues {
    pub(crate) boxes: SmallVec<[f64; 16]>,
    pub(crate) weights: SmallVec<[f64; 16]>,

    /// Whether the solve ran up against the time budget.
    pub(crate) budget_exhausted: bool,
}

/// What the backend made of the model.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SolveOutcome {
    /// The backend reported a solution (optimal, or the incumbent at the budget).
    Solved(SolvedValues),

    /// The backend proved there is no solution.
    Infeasible,

    /// The budget ran out before the backend reported anything.
    TimedOut,
}

/// Bounded pool of solver threads, shared between clones.
#[derive(Debug, Clone)]
pub(crate) struct SolverSlots {
    semaphore: Arc<Semaphore>,
    limit: usize,
}

impl SolverSlots {
    /// At least one slot, at most what the semaphore supports.
    pub(crate) fn new(limit: usize) -> Self {
        let limit = limit.clamp(1, Semaphore::MAX_PERMITS);

        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    pub(crate) fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

/// Solve `model` on a dedicated thread, giving up after `budget`.
///
/// The thread holds one of `slots` until the backend returns, even when the
/// watchdog has already given up on it; a backend that keeps running past the
/// deadline finishes on its own and its result is discarded. When no slot is
/// free the solve is refused rather than queued.
///
/// # Errors
///
/// Returns a [`SolverError`] if every slot is taken, the solver thread cannot
/// be started, stops without reporting, or the backend fails for a reason
/// other than infeasibility.
pub(crate) fn solve_within(
    model: ModelState,
    budget: Duration,
    slots: &SolverSlots,
) -> Result<SolveOutcome, SolverError> {
    let Ok(permit) = Arc::clone(&slots.semaphore).try_acquire_owned() else {
        warn!(limit = slots.limit, "no free solver slot");

        return Err(SolverError::Busy { limit: slots.limit });
    };

    let (tx, rx) = mpsc::sync_channel(1);

    thread::Builder::new()
        .name("packwise-solve".to_string())
        .spawn(move || {
            let outcome = solve_model(model, budget);

            drop(permit);

            // The receiver is gone once the watchdog gives up.
            _ = tx.send(outcome);
        })
        .map_err(SolverError::Spawn)?;

    match rx.recv_timeout(budget + watchdog_grace(budget)) {
        Ok(outcome) => outcome,
        Err(RecvTimeoutError::Timeout) => {
            warn!(budget_secs = budget.as_secs_f64(), "solve exceeded time budget");

            Ok(SolveOutcome::TimedOut)
        }
        Err(RecvTimeoutError::Disconnected) => Err(SolverError::WorkerLost),
    }
}

fn solve_model(model: ModelState, budget: Duration) -> Result<SolveOutcome, SolverError> {
    let (pb, objective, categories, constraints) = model.into_parts();

    let solver_model = with_time_limit(pb.minimise(objective).using(default_solver), budget);
    let solver_model = apply_recorded_constraints(solver_model, constraints);

    let started = Instant::now();
    let result = solver_model.solve();
    let elapsed = started.elapsed();

    debug!(elapsed_ms = elapsed.as_millis(), "backend returned");

    match result {
        Ok(solution) => Ok(SolveOutcome::Solved(SolvedValues {
            boxes: categories.iter().map(|vars| solution.value(vars.boxes)).collect(),
            weights: categories.iter().map(|vars| solution.value(vars.weight)).collect(),
            budget_exhausted: elapsed >= budget,
        })),
        Err(ResolutionError::Infeasible) => Ok(SolveOutcome::Infeasible),
        Err(err) => Err(err.into()),
    }
}

#[cfg(feature = "solver-highs")]
fn with_time_limit<S: good_lp::solvers::WithTimeLimit>(model: S, budget: Duration) -> S {
    model.with_time_limit(budget.as_secs_f64())
}

#[cfg(not(feature = "solver-highs"))]
fn with_time_limit<S>(model: S, budget: Duration) -> S {
    debug!(
        budget_secs = budget.as_secs_f64(),
        "backend has no native time limit, relying on watchdog"
    );

    model
}

fn apply_recorded_constraints<S: SolverModel>(mut model: S, constraints: Vec<ModelConstraint>) -> S {
    for constraint in constraints {
        model = match constraint.relation {
            ConstraintRelation::Eq => model.with(constraint.lhs.eq(constraint.rhs)),
            ConstraintRelation::Leq => model.with(constraint.lhs.leq(constraint.rhs)),
            ConstraintRelation::Geq => model.with(constraint.lhs.geq(constraint.rhs)),
        };
    }

    model
}

#[cfg(test)]
mod tests {
    use good_lp::Expression;
    use testresult::TestResult;

    use crate::{
        products::ProductCosts,
        solvers::milp::{
            NoopObserver, build_model, state::ConstraintKind, test_helpers::crowded_request,
        },
    };

    use super::*;

    const TINY_BUDGET: Duration = Duration::from_millis(1);

    fn single_category() -> ModelState {
        let mut state = ModelState::new();
        let vars = state.add_category(5.0, 10.0);

        state.add_to_objective(vars.boxes, 1.0);
        state.add_constraint(ModelConstraint::eq(
            ConstraintKind::BoxTotal,
            Expression::from(vars.boxes),
            3.0,
        ));
        state.add_constraint(ModelConstraint::eq(
            ConstraintKind::WeightTotal,
            Expression::from(vars.weight),
            6.0,
        ));

        state
    }

    fn crowded_model() -> Result<ModelState, SolverError> {
        let request = crowded_request();
        let costs: Vec<ProductCosts> = request
            .products
            .iter()
            .map(|p| ProductCosts::derive(p, request.exchange_rate, None))
            .collect();

        build_model(&request, &request.products, &costs, &mut NoopObserver)
    }

    #[test]
    fn solve_within_reports_values_in_category_order() -> TestResult {
        let slots = SolverSlots::new(1);

        let outcome = solve_within(single_category(), Duration::from_secs(30), &slots)?;

        let SolveOutcome::Solved(values) = outcome else {
            return Err("expected a solution".into());
        };

        assert_eq!(values.boxes.len(), 1);
        assert!((values.boxes[0] - 3.0).abs() < 1e-6);
        assert!((values.weights[0] - 6.0).abs() < 1e-6);
        assert!(!values.budget_exhausted);

        // The worker gives its slot back before reporting.
        assert_eq!(slots.available(), 1);

        Ok(())
    }

    #[test]
    fn solve_within_maps_infeasibility_to_outcome() -> TestResult {
        let mut state = ModelState::new();
        let vars = state.add_category(5.0, 10.0);

        state.add_constraint(ModelConstraint::geq(
            ConstraintKind::BoxTotal,
            Expression::from(vars.boxes),
            7.0,
        ));

        assert_eq!(
            solve_within(state, Duration::from_secs(30), &SolverSlots::new(1))?,
            SolveOutcome::Infeasible
        );

        Ok(())
    }

    #[cfg(not(feature = "solver-highs"))]
    #[test]
    fn watchdog_gives_up_when_budget_runs_out() -> TestResult {
        let slots = SolverSlots::new(2);
        let started = Instant::now();

        let outcome = solve_within(crowded_model()?, TINY_BUDGET, &slots)?;

        assert_eq!(outcome, SolveOutcome::TimedOut);
        assert!(started.elapsed() < Duration::from_secs(1));

        // The abandoned backend is still running and still holds its slot.
        assert_eq!(slots.available(), 1);

        Ok(())
    }

    #[cfg(not(feature = "solver-highs"))]
    #[test]
    fn abandoned_solves_block_new_ones_once_slots_run_out() -> TestResult {
        let slots = SolverSlots::new(1);

        assert_eq!(
            solve_within(crowded_model()?, TINY_BUDGET, &slots)?,
            SolveOutcome::TimedOut
        );

        let refused = solve_within(single_category(), Duration::from_secs(30), &slots);

        assert!(matches!(refused, Err(SolverError::Busy { limit: 1 })));

        Ok(())
    }

    #[test]
    fn zero_slots_still_allows_one_solve() {
        assert_eq!(SolverSlots::new(0).available(), 1);
    }

    #[test]
    fn grace_scales_with_budget() {
        assert_eq!(
            watchdog_grace(Duration::from_millis(100)),
            Duration::from_millis(10)
        );
        assert_eq!(watchdog_grace(Duration::from_secs(30)), MAX_WATCHDOG_GRACE);
    }
}
