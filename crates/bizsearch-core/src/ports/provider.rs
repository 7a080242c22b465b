//! Business provider trait

use crate::{ProviderRecord, Result};
use async_trait::async_trait;

/// Source of raw business records, one per identifier
#[async_trait]
pub trait BusinessProvider: Send + Sync {
    /// Fetch the record for `business_id`. Transport failures, non-success
    /// responses and undecodable bodies are all upstream errors.
    async fn fetch_record(&self, business_id: &str) -> Result<ProviderRecord>;
}
