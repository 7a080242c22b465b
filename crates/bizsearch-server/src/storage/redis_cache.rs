//! Redis-backed cache
//!
//! The connection is established in the background so startup never waits
//! on Redis. Until it is up (or if it never comes up) the cache is not ready
//! and every call degrades to a miss or a skipped write. Connection
//! attempts repeat with backoff, so a Redis that starts late is picked up.

use async_trait::async_trait;
use bizsearch_core::{CacheStore, Result, SearchError};
use redis::aio::ConnectionManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

pub struct RedisCache {
    connection: Arc<OnceCell<ConnectionManager>>,
}

/// Upper bound on the wait between connection attempts
const MAX_RETRY_DELAY_SECS: u64 = 30;

impl RedisCache {
    /// Start connecting to `url` and return immediately.
    ///
    /// Failed attempts are retried with exponential backoff until one
    /// succeeds. A malformed URL is never retried.
    pub fn connect(url: &str, connect_timeout: Duration) -> Self {
        let connection = Arc::new(OnceCell::new());

        let client = match redis::Client::open(url) {
            Ok(client) => client,
            Err(e) => {
                error!("Invalid redis url {}: {}", url, e);
                warn!("Continuing without cache");
                return Self { connection };
            }
        };

        let cell = connection.clone();
        tokio::spawn(async move {
            let mut backoff = 1;
            loop {
                match Self::establish(&client, connect_timeout).await {
                    Ok(manager) => {
                        if cell.set(manager).is_ok() {
                            info!("Redis connection established");
                        }
                        return;
                    }
                    Err(e) => {
                        error!("Failed to connect to redis server: {}", e);
                        warn!("Serving without cache, retrying in {} seconds...", backoff);
                        tokio::time::sleep(Duration::from_secs(backoff)).await;
                        backoff = next_backoff(backoff);
                    }
                }
            }
        });

        Self { connection }
    }

    async fn establish(
        client: &redis::Client,
        connect_timeout: Duration,
    ) -> Result<ConnectionManager> {
        tokio::time::timeout(connect_timeout, client.get_connection_manager())
            .await
            .map_err(|_| {
                SearchError::Cache(format!(
                    "connection timed out after {}s",
                    connect_timeout.as_secs()
                ))
            })?
            .map_err(|e| SearchError::Cache(e.to_string()))
    }

    fn connection(&self) -> Option<ConnectionManager> {
        self.connection.get().cloned()
    }
}

fn next_backoff(seconds: u64) -> u64 {
    std::cmp::min(seconds * 2, MAX_RETRY_DELAY_SECS)
}

#[async_trait]
impl CacheStore for RedisCache {
    fn is_ready(&self) -> bool {
        self.connection.initialized()
    }

    async fn get(&self, key: &str) -> Option<Vec<u8>> {
        let mut conn = self.connection()?;

        match redis::cmd("GET")
            .arg(key)
            .query_async::<_, Option<Vec<u8>>>(&mut conn)
            .await
        {
            Ok(value) => value,
            Err(e) => {
                warn!("Redis GET {} failed: {}", key, e);
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> bool {
        let Some(mut conn) = self.connection() else {
            debug!("Redis not ready, skipping SET {}", key);
            return false;
        };

        // EX takes whole seconds
        let seconds = ttl.as_secs().max(1);
        match redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(seconds)
            .query_async::<_, ()>(&mut conn)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!("Redis SET {} failed: {}", key, e);
                false
            }
        }
    }
}
