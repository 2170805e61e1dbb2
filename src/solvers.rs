//! Solvers for packing selection

use std::time::Duration;

use good_lp::ResolutionError;
use thiserror::Error;

use crate::{
    catalog::CatalogError,
    request::{OptimizationRequest, RequestError},
    results::OptimizationResult,
};

pub mod milp;

/// Default wall-clock budget for one solve.
pub const DEFAULT_TIME_BUDGET: Duration = Duration::from_secs(30);

/// Default number of solver threads allowed to run at once.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 4;

/// Solver Errors
#[derive(Debug, Error)]
pub enum SolverError {
    /// Wrapped request validation error
    #[error(transparent)]
    Request(#[from] RequestError),

    /// Wrapped catalog record error
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Wrapped solver resolution error
    #[error(transparent)]
    ResolutionError(#[from] ResolutionError),

    /// The solver thread could not be started.
    #[error("failed to start solver thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The solver thread went away without reporting a result.
    #[error("solver thread stopped without reporting a result")]
    WorkerLost,

    /// Every solver slot is taken, possibly by solves that outlived their budget.
    #[error("all {limit} solver slots are busy")]
    Busy {
        /// Configured number of slots
        limit: usize,
    },

    /// A solved box count does not fit the result type.
    #[error("solved box count cannot be represented: {value}")]
    BoxCountNotRepresentable {
        /// Raw solver value
        value: f64,
    },

    /// Internal solver invariant was violated (this is a bug).
    #[error("solver invariant violated: {message}")]
    InvariantViolation {
        /// What invariant was violated
        message: &'static str,
    },
}

/// Solver settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverConfig {
    /// Budget for one solve.
    ///
    /// The caller waits at most the budget plus a grace of a tenth of it
    /// (capped at one second). Backends without a native time limit keep
    /// their thread busy past that point; they still hold a solver slot until
    /// they finish.
    pub time_budget: Duration,

    /// Solver threads allowed to run at once, including ones whose caller has
    /// already given up. Zero is treated as one.
    pub max_in_flight: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_budget: DEFAULT_TIME_BUDGET,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

/// Trait for solving packing-selection requests
pub trait Solver {
    /// Choose categories and box counts for the request.
    ///
    /// Infeasible requests and exhausted budgets are reported through the
    /// result's status, not as errors.
    ///
    /// # Errors
    ///
    /// Returns a [`SolverError`] if the request or its catalog is invalid, or
    /// the solver backend fails.
    fn solve(&self, request: &OptimizationRequest) -> Result<OptimizationResult, SolverError>;
}
