//! Tracing subscriber setup for the binary.

use tracing_subscriber::EnvFilter;

/// Level used when `RUST_LOG` is unset or invalid.
const DEFAULT_FILTER: &str = "info";

/// Installs a formatted subscriber writing to stderr.
///
/// Honors `RUST_LOG`; falls back to `info`. Calling it twice is a no-op.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
