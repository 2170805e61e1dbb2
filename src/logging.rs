//! Logging subscriber initialisation.

use tracing_subscriber::{
    EnvFilter, Registry,
    layer::{Layer, SubscriberExt},
    util::{SubscriberInitExt, TryInitError},
};

use crate::config::observability::{LogFormat, LoggingConfig};

/// Install the global subscriber. Logs go to stderr so stdout carries only results.
///
/// `trace_model` raises the solver module to trace level so model observer
/// events are emitted regardless of the base level.
pub(crate) fn init_subscriber(
    config: &LoggingConfig,
    trace_model: bool,
) -> Result<(), TryInitError> {
    let filter = build_env_filter(config, trace_model);

    match config.log_format {
        LogFormat::Compact => init_with_layer(
            filter,
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr)
                .with_target(true),
        ),
        LogFormat::Json => init_with_layer(
            filter,
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .with_span_list(true)
                .with_target(true),
        ),
    }
}

/// The level comes from the parsed config only. Clap already resolves it
/// from `--log-level`, then `RUST_LOG`, then the default.
fn build_env_filter(config: &LoggingConfig, trace_model: bool) -> EnvFilter {
    let filter = EnvFilter::new(format!(
        "{},hyper=warn,reqwest=warn,rustls=warn",
        config.log_level
    ));

    if !trace_model {
        return filter;
    }

    match "packwise::solvers::milp=trace".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

fn init_with_layer<L>(filter: EnvFilter, fmt_layer: L) -> Result<(), TryInitError>
where
    L: Layer<Registry> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .try_init()
}
