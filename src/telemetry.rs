use tracing_subscriber::{EnvFilter, fmt};

/// Logs go to stderr; stdout is reserved for the JSON response.
pub fn init_telemetry(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
