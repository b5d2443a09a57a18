//! Cache capability injected into the manifest loader and bundle builder.

use crate::cache::types::CacheError;
use bytes::Bytes;
use std::future::Future;
use std::time::Duration;

/// Key/value cache with a per-entry TTL.
///
/// Values are opaque bytes so the same trait fits an in-process map or a
/// remote cache service. Each `set` replaces the whole value; readers never
/// see a partial write.
pub trait CacheStore: Send + Sync {
    /// Returns the value for `key` if present and not expired.
    fn get(&self, key: &str) -> impl Future<Output = Option<Bytes>> + Send;

    /// Stores `value` under `key` for `ttl`.
    fn set(
        &self,
        key: &str,
        value: Bytes,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), CacheError>> + Send;

    /// Removes `key`. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), CacheError>> + Send;
}

/// Cache that never stores anything.
///
/// Every lookup misses, so each request goes to the object store. Useful
/// when diagnosing cache-related problems.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCache;

impl NoOpCache {
    pub fn new() -> Self {
        Self
    }
}

impl CacheStore for NoOpCache {
    async fn get(&self, _key: &str) -> Option<Bytes> {
        None
    }

    async fn set(&self, _key: &str, _value: Bytes, _ttl: Duration) -> Result<(), CacheError> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Ok(())
    }
}
