//! Packwise CLI

use std::{
    io::{self, Write},
    process,
    time::Instant,
};

use humanize_duration::{Truncate, prelude::DurationExt};
use thiserror::Error;
use tracing::{error, info};

use packwise::{
    fixtures::{self, FixtureError},
    results::RenderError,
    service::{OptimizeError, OptimizerService},
    solvers::milp::TracingObserver,
};

use crate::config::{Config, OutputFormat};

mod config;
mod logging;

/// CLI errors
#[derive(Debug, Error)]
enum CliError {
    /// Request or catalog file could not be loaded
    #[error(transparent)]
    Fixture(#[from] FixtureError),

    /// The optimization failed
    #[error(transparent)]
    Optimize(#[from] OptimizeError),

    /// Table output failed
    #[error(transparent)]
    Render(#[from] RenderError),

    /// JSON output failed
    #[error("failed to write JSON result: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing to stdout failed
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

/// Packwise CLI entry point
#[tokio::main]
pub async fn main() {
    // Load configuration from .env and CLI arguments
    let config = Config::load().unwrap_or_else(|e| e.exit());

    if let Err(e) = logging::init_subscriber(&config.logging, config.trace_model) {
        #[expect(
            clippy::print_stderr,
            reason = "logging failed to initialize, must use eprintln"
        )]
        {
            eprintln!("Logging error: {e}");
        }

        process::exit(1);
    }

    if let Err(e) = run(config).await {
        error!(error = %e, "packwise failed");

        process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), CliError> {
    let request = fixtures::read_request(&config.request)?;
    let catalog = config.catalog.source()?;
    let service = OptimizerService::new(catalog, config.solver_config());

    info!(request = %config.request.display(), "solving");

    let start = Instant::now();

    let result = if config.trace_model {
        service
            .optimize_with_observer(request, Box::new(TracingObserver::default()))
            .await?
    } else {
        service.optimize(request).await?
    };

    let elapsed = start.elapsed();
    let mut out = io::stdout().lock();

    match config.format {
        OutputFormat::Table => {
            result.write_to(&mut out)?;

            writeln!(out, "\nSolved in {}", elapsed.human(Truncate::Nano))?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &result)?;

            writeln!(out)?;
        }
    }

    Ok(())
}
