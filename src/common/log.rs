//! Logging initialization.

use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber. An explicit filter spec takes
/// precedence over `RUST_LOG`; with neither, everything at `info` and above
/// is emitted.
pub fn init(filter: Option<&str>) {
    let filter = match filter {
        Some(spec) => EnvFilter::new(spec),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
}
