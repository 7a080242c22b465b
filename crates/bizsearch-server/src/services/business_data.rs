//! Business data service
//!
//! Cache-aside access to the fixed business list: serve from the cache when
//! it holds a readable copy, otherwise fetch every business from the
//! provider, normalize and cache the result.

use bizsearch_core::{
    compress_opening_hours, Business, BusinessProvider, CacheStore, ProviderRecord, Result,
};
use futures::future::try_join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Cache key holding the JSON-encoded business list
pub const BUSINESSES_CACHE_KEY: &str = "businesses";

pub struct BusinessDataService {
    provider: Arc<dyn BusinessProvider>,
    cache: Arc<dyn CacheStore>,
    business_ids: Vec<String>,
    ttl: Duration,
}

impl BusinessDataService {
    pub fn new(
        provider: Arc<dyn BusinessProvider>,
        cache: Arc<dyn CacheStore>,
        business_ids: Vec<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            provider,
            cache,
            business_ids,
            ttl,
        }
    }

    /// All businesses, from the cache if possible.
    ///
    /// Only fails when the provider does; one failed fetch fails the whole
    /// call. Concurrent misses may both fetch and both write the cache.
    pub async fn get_businesses(&self) -> Result<Vec<Business>> {
        if let Some(businesses) = self.cached_businesses().await {
            return Ok(businesses);
        }

        info!(
            "Cache is empty, fetching {} businesses from provider",
            self.business_ids.len()
        );

        let businesses = try_join_all(
            self.business_ids
                .iter()
                .map(|business_id| self.fetch_business(business_id)),
        )
        .await?;

        self.cache_businesses(&businesses).await;

        Ok(businesses)
    }

    async fn fetch_business(&self, business_id: &str) -> Result<Business> {
        let record = self.provider.fetch_record(business_id).await?;
        debug!("Fetched business {}: {}", business_id, record.displayed_what);
        Ok(normalize_record(record))
    }

    async fn cached_businesses(&self) -> Option<Vec<Business>> {
        if !self.cache.is_ready() {
            debug!("Cache not ready, treating as miss");
            return None;
        }

        let payload = self.cache.get(BUSINESSES_CACHE_KEY).await?;
        match serde_json::from_slice::<Vec<Business>>(&payload) {
            Ok(businesses) => {
                debug!("Cache hit: {} businesses", businesses.len());
                Some(businesses)
            }
            Err(e) => {
                warn!("Ignoring malformed cached businesses: {}", e);
                None
            }
        }
    }

    async fn cache_businesses(&self, businesses: &[Business]) {
        if !self.cache.is_ready() {
            return;
        }

        let payload = match encode_businesses(businesses) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Not caching businesses: {}", e);
                return;
            }
        };

        if !self.cache.set(BUSINESSES_CACHE_KEY, &payload, self.ttl).await {
            warn!("Failed to cache businesses");
        }
    }
}

/// JSON payload stored under [`BUSINESSES_CACHE_KEY`]
fn encode_businesses(businesses: &[Business]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(businesses)?)
}

/// Build the client-facing record from a provider record
pub fn normalize_record(record: ProviderRecord) -> Business {
    let phone = record.phone().unwrap_or_default().to_string();
    let website = record.website().unwrap_or_default().to_string();
    let working_hours = compress_opening_hours(&record.opening_hours.days);

    Business {
        name: record.displayed_what,
        address: record.displayed_where,
        website,
        phone,
        working_hours,
    }
}
