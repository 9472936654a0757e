//! Logger setup based on `tracing-subscriber`.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// The filter is taken from the `RUST_LOG` environment variable when set,
/// falling back to `default_level` otherwise.
///
/// # Arguments
///
/// * `service_name` - Name of the running binary, included in the startup log
/// * `default_level` - Filter directive used when `RUST_LOG` is not set
pub fn setup_logger(service_name: &str, default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::debug!("logger initialized for '{}'", service_name);
}
