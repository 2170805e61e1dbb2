//! Packwise prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    catalog::{
        CatalogConfig, CatalogEntry, CatalogError, CatalogSource, HttpCatalogSource,
        StaticCatalog,
    },
    fixtures::{Fixture, FixtureError},
    products::{ProductCosts, ProductRecord},
    request::{OptimizationRequest, RequestError},
    results::{
        OptimizationResult, PackingSolution, PackingSummary, RenderError, SelectedCategory,
        SolveStatus, minimum_processing_fee,
    },
    service::{OptimizeError, OptimizerService},
    solvers::{
        Solver, SolverConfig, SolverError,
        milp::{MilpSolver, ModelObserver, NoopObserver, TracingObserver},
    },
};
