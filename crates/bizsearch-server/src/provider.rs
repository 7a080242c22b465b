//! HTTP client for the business provider API

use async_trait::async_trait;
use bizsearch_core::{BusinessProvider, ProviderRecord, Result, SearchError};
use reqwest::Client as ReqwestClient;
use std::time::Duration;
use tracing::debug;

/// Fetches provider records from `<base_url>/<business_id>`
pub struct HttpBusinessProvider {
    http: ReqwestClient,
    base_url: String,
}

impl HttpBusinessProvider {
    pub fn new(base_url: &str, timeout: Duration) -> reqwest::Result<Self> {
        let http = ReqwestClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn record_url(&self, business_id: &str) -> String {
        format!("{}/{}", self.base_url, business_id)
    }
}

#[async_trait]
impl BusinessProvider for HttpBusinessProvider {
    async fn fetch_record(&self, business_id: &str) -> Result<ProviderRecord> {
        let url = self.record_url(business_id);
        debug!("Fetching provider record {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| SearchError::UpstreamRequest {
                business_id: business_id.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::UpstreamStatus {
                business_id: business_id.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| SearchError::UpstreamRequest {
                business_id: business_id.to_string(),
                message: e.to_string(),
            })?;

        serde_json::from_str(&body).map_err(|e| SearchError::UpstreamPayload {
            business_id: business_id.to_string(),
            message: e.to_string(),
        })
    }
}
