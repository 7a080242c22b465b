//! Test doubles shared by the unit tests

use async_trait::async_trait;
use bizsearch_core::{BusinessProvider, CacheStore, ProviderRecord, Result, SearchError};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::services::BusinessDataService;
use crate::storage::MemoryCache;

/// Provider serving canned records and counting every fetch
#[derive(Default)]
pub struct StubProvider {
    records: HashMap<String, ProviderRecord>,
    failing: HashSet<String>,
    calls: AtomicUsize,
}

impl StubProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(mut self, id: &str, record: ProviderRecord) -> Self {
        self.records.insert(id.to_string(), record);
        self
    }

    pub fn with_failure(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BusinessProvider for StubProvider {
    async fn fetch_record(&self, business_id: &str) -> Result<ProviderRecord> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.failing.contains(business_id) {
            return Err(SearchError::UpstreamStatus {
                business_id: business_id.to_string(),
                status: 500,
            });
        }
        self.records
            .get(business_id)
            .cloned()
            .ok_or_else(|| SearchError::UpstreamStatus {
                business_id: business_id.to_string(),
                status: 404,
            })
    }
}

/// Cache whose backend never came up
pub struct OfflineCache;

#[async_trait]
impl CacheStore for OfflineCache {
    fn is_ready(&self) -> bool {
        false
    }

    async fn get(&self, _key: &str) -> Option<Vec<u8>> {
        None
    }

    async fn set(&self, _key: &str, _value: &[u8], _ttl: Duration) -> bool {
        false
    }
}

/// Provider record open 08:00-18:00 on weekdays, closed at the weekend
pub fn record(name: &str, address: &str) -> ProviderRecord {
    let weekday = json!([{"start": "08:00", "end": "18:00"}]);
    serde_json::from_value(json!({
        "displayed_what": name,
        "displayed_where": address,
        "addresses": [{
            "contacts": [
                {"contact_type": "phone", "call_link": format!("tel:{}", name.len())},
                {"contact_type": "url", "service_code": format!("https://{}.example", name.len())}
            ]
        }],
        "opening_hours": {
            "days": {
                "monday": weekday,
                "tuesday": weekday,
                "wednesday": weekday,
                "thursday": weekday,
                "friday": weekday
            }
        }
    }))
    .expect("valid provider record")
}

/// Provider with three businesses under ids `a`, `b`, `c`
pub fn sample_provider() -> StubProvider {
    StubProvider::new()
        .with_record("a", record("Blue Cafe", "Main Street 1, Zurich"))
        .with_record("b", record("Tea House", "Lake Road 3, Geneva"))
        .with_record("c", record("cafe corner", "Cafe Square 7, Bern"))
}

pub fn sample_service(provider: Arc<StubProvider>) -> Arc<BusinessDataService> {
    service_with_cache(provider, Arc::new(MemoryCache::new()))
}

pub fn service_with_cache(
    provider: Arc<StubProvider>,
    cache: Arc<dyn CacheStore>,
) -> Arc<BusinessDataService> {
    Arc::new(BusinessDataService::new(
        provider,
        cache,
        vec!["a".to_string(), "b".to_string(), "c".to_string()],
        Duration::from_secs(60),
    ))
}
