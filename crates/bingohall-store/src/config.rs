//! Store configuration.

use std::time::Duration;

/// Configuration for a [`MemoryStore`](crate::MemoryStore).
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Upper bound on waiting for any single row lock. A caller that
    /// waits longer gets [`StoreError::LockTimeout`](crate::StoreError)
    /// and its operation writes nothing.
    pub lock_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(5),
        }
    }
}
