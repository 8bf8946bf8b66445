//! Log output setup.

use tracing_subscriber::EnvFilter;

/// Installs a formatted log subscriber filtered by `RUST_LOG`, falling back
/// to `info`. Calling it again after a subscriber is installed does
/// nothing.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
