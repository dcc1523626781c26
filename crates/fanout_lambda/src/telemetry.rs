use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

/// Installs JSON-line logging for the worker. `RUST_LOG` overrides the
/// default `info` filter; set it to `debug` to see placeholder substitutions.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // A subscriber may already be installed (tests, embedding); keep it.
    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_target(false)
        .with_current_span(false)
        .with_ansi(false)
        .try_init();
}
