//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Install a JSON `tracing` subscriber for the process.
///
/// `RUST_LOG` wins over `default_level`. Safe to call more than once; only the
/// first call installs anything.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_target(false)
        .try_init();
}
