//! Key/value storage with per-entry expiry.
//!
//! Values are opaque bytes so that an external shared service can stand in
//! for [`MemoryKv`] without this crate knowing the format.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::SessionError;

/// A key/value store whose entries expire.
///
/// # Trait bounds
///
/// - `Send + Sync` → one backend is shared by every request task.
/// - `'static` → it lives as long as the process.
pub trait KvBackend: Send + Sync + 'static {
    /// The value under `key`, or `None` if absent or expired.
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<Vec<u8>>, SessionError>> + Send;

    /// Stores `value` under `key` for `ttl`, replacing any existing value.
    fn put(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<(), SessionError>> + Send;

    /// Removes `key`. Returns `true` if a live value was removed.
    fn remove(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<bool, SessionError>> + Send;

    /// Removes `key` only if its live value is exactly `expected`, as one
    /// atomic step. Returns `true` if this call removed it.
    fn compare_and_remove(
        &self,
        key: &str,
        expected: &[u8],
    ) -> impl std::future::Future<Output = Result<bool, SessionError>> + Send;

    /// Drops every expired entry. Returns how many were dropped.
    fn purge_expired(&self) -> impl std::future::Future<Output = usize> + Send;
}

/// An in-process [`KvBackend`].
#[derive(Default)]
pub struct MemoryKv {
    entries: Mutex<HashMap<String, (Vec<u8>, Instant)>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvBackend for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, SessionError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            None => return Ok(None),
            Some((value, expires_at)) if now < *expires_at => return Ok(Some(value.clone())),
            Some(_) => {}
        }
        entries.remove(key);
        Ok(None)
    }

    async fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), SessionError> {
        let expires_at = Instant::now() + ttl;
        self.entries
            .lock()
            .await
            .insert(key.to_owned(), (value, expires_at));
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, SessionError> {
        let removed = self.entries.lock().await.remove(key);
        Ok(removed.is_some_and(|(_, expires_at)| Instant::now() < expires_at))
    }

    async fn compare_and_remove(&self, key: &str, expected: &[u8]) -> Result<bool, SessionError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let matches = entries
            .get(key)
            .is_some_and(|(value, expires_at)| now < *expires_at && value.as_slice() == expected);
        if matches {
            entries.remove(key);
        }
        Ok(matches)
    }

    async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, (_, expires_at)| now < *expires_at);
        before - entries.len()
    }
}
