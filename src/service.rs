//! Optimizer service

use std::sync::Arc;

use thiserror::Error;
use tokio::task::{self, JoinError};
use tracing::{Span, info};

use crate::{
    catalog::{CatalogError, CatalogSource},
    request::{OptimizationRequest, RequestError},
    results::OptimizationResult,
    solvers::{
        SolverConfig, SolverError,
        milp::{MilpSolver, ModelObserver, NoopObserver},
    },
};

/// Optimizer service errors
#[derive(Debug, Error)]
pub enum OptimizeError {
    /// Wrapped request validation error
    #[error(transparent)]
    Request(#[from] RequestError),

    /// Wrapped catalog error
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Wrapped solver error
    #[error(transparent)]
    Solver(#[from] SolverError),

    /// The blocking solve task panicked or was cancelled.
    #[error("solve task failed: {0}")]
    Join(#[from] JoinError),
}

/// Runs packing requests, falling back to a catalog source for requests that
/// arrive without products.
#[derive(Clone)]
pub struct OptimizerService {
    catalog: Arc<dyn CatalogSource>,
    solver: MilpSolver,
}

impl std::fmt::Debug for OptimizerService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptimizerService")
            .field("catalog", &"<dyn CatalogSource>")
            .field("solver", &self.solver)
            .finish()
    }
}

impl OptimizerService {
    /// Create a service using the given catalog source and solver settings.
    pub fn new(catalog: Arc<dyn CatalogSource>, config: SolverConfig) -> Self {
        Self {
            catalog,
            solver: MilpSolver::new(config),
        }
    }

    /// Solve one request.
    ///
    /// The solve itself is blocking and runs on tokio's blocking pool, so
    /// concurrent requests do not stall the async executor.
    ///
    /// # Errors
    ///
    /// Returns an [`OptimizeError`] if the request is invalid, the catalog
    /// cannot be fetched, or the solver fails.
    pub async fn optimize(
        &self,
        request: OptimizationRequest,
    ) -> Result<OptimizationResult, OptimizeError> {
        self.optimize_with_observer(request, Box::new(NoopObserver))
            .await
    }

    /// Solve one request, reporting the model formulation to `observer`.
    ///
    /// # Errors
    ///
    /// Returns an [`OptimizeError`] if the request is invalid, the catalog
    /// cannot be fetched, or the solver fails.
    #[tracing::instrument(
        name = "optimizer.service.optimize",
        skip(self, request, observer),
        fields(
            target_boxes = request.target_total_boxes,
            target_weight = request.target_total_weight,
            categories = request.max_categories,
            stress = request.stress_multiplier.is_some(),
            catalog_fallback = tracing::field::Empty
        ),
        err
    )]
    pub async fn optimize_with_observer(
        &self,
        mut request: OptimizationRequest,
        mut observer: Box<dyn ModelObserver>,
    ) -> Result<OptimizationResult, OptimizeError> {
        request.validate_parameters()?;

        let fallback = request.products.is_empty();

        Span::current().record("catalog_fallback", fallback);

        if fallback {
            request.products = self.catalog.fetch_products().await?;

            info!(count = request.products.len(), "loaded products from catalog");
        }

        let solver = self.solver.clone();
        let result = task::spawn_blocking(move || {
            solver.solve_with_observer(&request, observer.as_mut())
        })
        .await??;

        info!(status = ?result.status(), "optimized packing");

        Ok(result)
    }
}
