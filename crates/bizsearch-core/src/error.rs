//! Error types for Bizsearch

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Upstream request for {business_id} failed: {message}")]
    UpstreamRequest {
        business_id: String,
        message: String,
    },

    #[error("Upstream returned status {status} for {business_id}")]
    UpstreamStatus { business_id: String, status: u16 },

    #[error("Upstream returned unusable data for {business_id}: {message}")]
    UpstreamPayload {
        business_id: String,
        message: String,
    },

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SearchError {
    /// Whether the failure came from the provider rather than from us
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            SearchError::UpstreamRequest { .. }
                | SearchError::UpstreamStatus { .. }
                | SearchError::UpstreamPayload { .. }
        )
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(e: serde_json::Error) -> Self {
        SearchError::Serialization(e.to_string())
    }
}
