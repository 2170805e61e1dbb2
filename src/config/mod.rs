//! Command-line configuration

use std::{path::PathBuf, time::Duration};

use clap::{Parser, ValueEnum};

use packwise::solvers::SolverConfig;

use crate::config::{catalog::CatalogArgs, observability::LoggingConfig};

pub(crate) mod catalog;
pub(crate) mod observability;

/// Result output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table of shipped categories followed by a summary.
    Table,

    /// The full result as pretty-printed JSON.
    Json,
}

/// Packwise CLI configuration
#[derive(Debug, Parser)]
#[command(
    name = "packwise",
    about = "Choose product categories and box counts that minimise shipment duty",
    long_about = None
)]
pub struct Config {
    /// Request YAML file
    #[arg(value_name = "REQUEST")]
    pub request: PathBuf,

    /// Wall-clock budget for the solve, in seconds
    #[arg(long, env = "SOLVER_TIME_BUDGET_SECS", default_value_t = 30)]
    pub time_budget_secs: u64,

    /// Output format (table, json)
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Log every model variable and constraint at trace level
    #[arg(long)]
    pub trace_model: bool,

    /// Catalog used when the request lists no products.
    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    /// Solver settings for this run
    #[must_use]
    pub fn solver_config(&self) -> SolverConfig {
        SolverConfig {
            time_budget: Duration::from_secs(self.time_budget_secs),
            ..SolverConfig::default()
        }
    }
}
