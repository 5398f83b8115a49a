//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Installs the global formatter.
///
/// `RUST_LOG` wins over `default_filter`. Returns false if a subscriber was
/// already installed, which makes repeated calls from tests harmless.
pub fn init_tracing(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
