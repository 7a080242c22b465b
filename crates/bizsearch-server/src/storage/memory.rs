//! In-memory cache using DashMap (stand-in for Redis in single-node setups)

use async_trait::async_trait;
use bizsearch_core::CacheStore;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// How often expired entries are swept
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// In-process cache with TTL support. Always ready.
pub struct MemoryCache {
    data: Arc<DashMap<String, CacheEntry>>,
}

struct CacheEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl MemoryCache {
    pub fn new() -> Self {
        let cache = Self {
            data: Arc::new(DashMap::new()),
        };

        // Start cleanup task
        cache.start_cleanup_task();

        cache
    }

    fn get_live(&self, key: &str) -> Option<Vec<u8>> {
        let entry = self.data.get(key)?;
        if Instant::now() >= entry.expires_at {
            drop(entry);
            self.data.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }

    fn start_cleanup_task(&self) {
        let data = self.data.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
            loop {
                interval.tick().await;

                let now = Instant::now();
                data.retain(|_, entry| entry.expires_at > now);
                debug!("Memory cache sweep done, {} live keys", data.len());
            }
        });
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    fn is_ready(&self) -> bool {
        true
    }

    async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.get_live(key)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> bool {
        self.data.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_vec(),
                expires_at: Instant::now() + ttl,
            },
        );
        true
    }
}
