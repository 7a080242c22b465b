//! Cache store trait

use async_trait::async_trait;
use std::time::Duration;

/// Key/value cache with per-key TTL
///
/// Implementations never raise: while the backend is unreachable `get`
/// misses and `set` reports failure, so callers can run without a cache.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Whether the backend is connected and usable
    fn is_ready(&self) -> bool;

    /// Value stored under `key`, or `None` on miss, expiry or backend failure
    async fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Store `value` under `key` for `ttl`. Returns `false` if nothing was written.
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> bool;
}
