//! Utilities for logging.

use tracing_subscriber::filter::EnvFilter;

/// Initialize a global tracing subscriber.
///
/// Filtering is controlled through `RUST_LOG`, defaulting to `info` if unset.
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}

/// Initialize logging for tests.
///
/// Output is captured per-test, and repeated initialization is ignored.
pub fn init_test() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
