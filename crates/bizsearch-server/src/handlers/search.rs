//! Business search handler
//!
//! `POST /business/search?type=businessName|businessAddress` with body
//! `{"term": "..."}`. The term is compiled as a case-insensitive regular
//! expression, so pattern syntax in it is honoured.

use crate::router::{HandlerError, HandlerRequest, HandlerResponse, RequestHandler};
use crate::services::BusinessDataService;
use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use bizsearch_core::Business;
use regex::RegexBuilder;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Which business field a search looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchType {
    BusinessName,
    BusinessAddress,
}

impl SearchType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "businessName" => Some(SearchType::BusinessName),
            "businessAddress" => Some(SearchType::BusinessAddress),
            _ => None,
        }
    }

    fn field<'a>(&self, business: &'a Business) -> &'a str {
        match self {
            SearchType::BusinessName => &business.name,
            SearchType::BusinessAddress => &business.address,
        }
    }
}

pub struct SearchHandler {
    businesses: Arc<BusinessDataService>,
}

impl SearchHandler {
    pub fn new(businesses: Arc<BusinessDataService>) -> Self {
        Self { businesses }
    }
}

#[async_trait]
impl RequestHandler for SearchHandler {
    fn method(&self) -> Method {
        Method::POST
    }

    fn path(&self) -> &str {
        "/business/search"
    }

    async fn handle(&self, request: HandlerRequest) -> Result<HandlerResponse, HandlerError> {
        let raw_type = request.query.get("type").map(String::as_str).unwrap_or_default();
        let Some(search_type) = SearchType::parse(raw_type) else {
            return Ok(HandlerResponse::bad_request(format!(
                "Invalid search term type \"{}\"",
                raw_type
            )));
        };

        let term = match request.body.get("term").and_then(Value::as_str) {
            Some(term) if !term.is_empty() => term,
            _ => return Ok(HandlerResponse::bad_request("Search term may not be empty")),
        };

        let Ok(pattern) = RegexBuilder::new(term).case_insensitive(true).build() else {
            return Ok(HandlerResponse::bad_request(format!(
                "Invalid search term pattern \"{}\"",
                term
            )));
        };

        let businesses = self.businesses.get_businesses().await?;
        let matches: Vec<&Business> = businesses
            .iter()
            .filter(|business| pattern.is_match(search_type.field(business)))
            .collect();

        info!(
            "Search {:?} \"{}\": {} of {} businesses match",
            search_type,
            term,
            matches.len(),
            businesses.len()
        );
        debug!("Matches: {:?}", matches.iter().map(|b| &b.name).collect::<Vec<_>>());

        HandlerResponse::json(StatusCode::OK, &matches)
    }
}
