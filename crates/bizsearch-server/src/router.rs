//! Request routing
//!
//! Every HTTP request lands in one axum fallback which hands it to the
//! [`RequestRouter`]. The router keeps an ordered table of
//! [`RequestHandler`]s and picks the first whose method matches exactly and
//! whose path matches ignoring case.

use crate::AppState;
use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Query, Request, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use bizsearch_core::SearchError;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tower::{service_fn, ServiceExt};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

/// Parsed inbound request handed to a handler
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    /// Path component of the request URL
    pub url: String,
    pub query: HashMap<String, String>,
    /// JSON body, `{}` when absent or not valid JSON
    pub body: Value,
}

impl HandlerRequest {
    pub fn parse(uri: &Uri, body: &[u8]) -> Self {
        let query = Query::<HashMap<String, String>>::try_from_uri(uri)
            .map(|Query(query)| query)
            .unwrap_or_default();

        let body = serde_json::from_slice(body).unwrap_or_else(|_| json!({}));

        Self {
            url: uri.path().to_string(),
            query,
            body,
        }
    }
}

/// Status plus JSON body written back to the client
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl HandlerResponse {
    pub fn json<T: Serialize>(status: StatusCode, result: &T) -> Result<Self, HandlerError> {
        let body = serde_json::to_value(result)
            .map_err(|e| HandlerError::Internal(format!("Failed to encode response: {}", e)))?;
        Ok(Self { status, body })
    }

    /// `{"message": ...}` body
    pub fn message(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "message": message.into() }),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::message(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found() -> Self {
        Self::message(StatusCode::NOT_FOUND, "Route not found")
    }
}

impl IntoResponse for HandlerResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Failures a handler cannot turn into a response itself
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Upstream failure: {0}")]
    Upstream(SearchError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SearchError> for HandlerError {
    fn from(e: SearchError) -> Self {
        if e.is_upstream() {
            HandlerError::Upstream(e)
        } else {
            HandlerError::Internal(e.to_string())
        }
    }
}

impl HandlerError {
    pub fn to_response(&self) -> HandlerResponse {
        match self {
            HandlerError::Upstream(_) => {
                HandlerResponse::message(StatusCode::BAD_GATEWAY, "Failed to load businesses")
            }
            HandlerError::Internal(_) => {
                HandlerResponse::message(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

/// Route table is rejected at construction, before any request is served
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RouterError {
    #[error("Invalid request handler at index {index}: {reason}")]
    InvalidHandler { index: usize, reason: String },

    #[error("Request handler at index {index} duplicates {method} {path}")]
    DuplicateRoute {
        index: usize,
        method: Method,
        path: String,
    },
}

/// A route: the method and exact path it answers, and the logic behind it
#[async_trait]
pub trait RequestHandler: Send + Sync {
    fn method(&self) -> Method;

    fn path(&self) -> &str;

    async fn handle(&self, request: HandlerRequest) -> Result<HandlerResponse, HandlerError>;
}

pub struct RequestRouter {
    handlers: Vec<Arc<dyn RequestHandler>>,
}

impl std::fmt::Debug for RequestRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.handlers.iter().map(|h| format!("{} {}", h.method(), h.path())))
            .finish()
    }
}

impl RequestRouter {
    /// Validate and freeze the route table
    pub fn new(handlers: Vec<Arc<dyn RequestHandler>>) -> Result<Self, RouterError> {
        for (index, handler) in handlers.iter().enumerate() {
            let path = handler.path();
            let invalid = |reason: &str| RouterError::InvalidHandler {
                index,
                reason: reason.to_string(),
            };

            if !path.starts_with('/') {
                return Err(invalid("path must start with '/'"));
            }
            if path.contains(&['?', '#'][..]) {
                return Err(invalid("path may not contain a query or fragment"));
            }

            let method = handler.method();
            let duplicate = handlers[..index].iter().any(|earlier| {
                earlier.method() == method && earlier.path().eq_ignore_ascii_case(path)
            });
            if duplicate {
                return Err(RouterError::DuplicateRoute {
                    index,
                    method,
                    path: path.to_string(),
                });
            }
        }

        Ok(Self { handlers })
    }

    /// First handler for `method` and `path`, path compared ignoring case
    pub fn find(&self, method: &Method, path: &str) -> Option<&Arc<dyn RequestHandler>> {
        self.handlers.iter().find(|handler| {
            handler.method() == *method && handler.path().eq_ignore_ascii_case(path)
        })
    }

    pub async fn dispatch(&self, method: &Method, uri: &Uri, body: &[u8]) -> HandlerResponse {
        let request = HandlerRequest::parse(uri, body);

        let Some(handler) = self.find(method, &request.url) else {
            debug!("No route for {} {}", method, request.url);
            return HandlerResponse::not_found();
        };

        match handler.handle(request).await {
            Ok(response) => response,
            Err(e) => {
                error!("{} {} failed: {}", method, uri.path(), e);
                e.to_response()
            }
        }
    }
}

/// Build the axum app: one fallback feeding the request router.
///
/// The CORS layer answers real preflights only. Any other `OPTIONS` request
/// is routed like every other method, so unmatched ones get the JSON 404.
pub fn app(state: AppState) -> Router {
    let routed = Router::new().fallback(dispatch).with_state(state);
    let with_cors = routed.clone().layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    );

    Router::new()
        .fallback_service(service_fn(move |request: Request| {
            let service = if request.method() == Method::OPTIONS
                && !is_cors_preflight(request.headers())
            {
                routed.clone()
            } else {
                with_cors.clone()
            };
            service.oneshot(request)
        }))
        .layer(TraceLayer::new_for_http())
}

fn is_cors_preflight(headers: &HeaderMap) -> bool {
    headers.contains_key(header::ORIGIN)
        && headers.contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
}

async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    body: Result<Bytes, BytesRejection>,
) -> HandlerResponse {
    // An unreadable body is treated like an empty one
    let body = body.unwrap_or_default();
    state.router.dispatch(&method, &uri, &body).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::SearchHandler;
    use crate::testing::{sample_provider, sample_service};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;

    /// Echoes the parsed request back
    struct EchoHandler {
        method: Method,
        path: &'static str,
    }

    #[async_trait]
    impl RequestHandler for EchoHandler {
        fn method(&self) -> Method {
            self.method.clone()
        }

        fn path(&self) -> &str {
            self.path
        }

        async fn handle(&self, request: HandlerRequest) -> Result<HandlerResponse, HandlerError> {
            HandlerResponse::json(
                StatusCode::OK,
                &json!({
                    "url": request.url,
                    "query": request.query,
                    "body": request.body,
                }),
            )
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl RequestHandler for FailingHandler {
        fn method(&self) -> Method {
            Method::GET
        }

        fn path(&self) -> &str {
            "/fail"
        }

        async fn handle(&self, _request: HandlerRequest) -> Result<HandlerResponse, HandlerError> {
            Err(SearchError::UpstreamStatus {
                business_id: "a".to_string(),
                status: 503,
            }
            .into())
        }
    }

    fn echo(method: Method, path: &'static str) -> Arc<dyn RequestHandler> {
        Arc::new(EchoHandler { method, path })
    }

    #[test]
    fn test_rejects_invalid_paths() {
        let err = RequestRouter::new(vec![echo(Method::GET, "/ok"), echo(Method::GET, "no-slash")])
            .unwrap_err();
        assert!(matches!(err, RouterError::InvalidHandler { index: 1, .. }));

        let err = RequestRouter::new(vec![echo(Method::GET, "")]).unwrap_err();
        assert!(matches!(err, RouterError::InvalidHandler { index: 0, .. }));

        let err = RequestRouter::new(vec![echo(Method::GET, "/search?type=x")]).unwrap_err();
        assert!(matches!(err, RouterError::InvalidHandler { index: 0, .. }));
    }

    #[test]
    fn test_rejects_duplicate_routes() {
        let err = RequestRouter::new(vec![
            echo(Method::POST, "/business/search"),
            echo(Method::GET, "/business/search"),
            echo(Method::POST, "/Business/Search"),
        ])
        .unwrap_err();

        assert_eq!(
            err,
            RouterError::DuplicateRoute {
                index: 2,
                method: Method::POST,
                path: "/Business/Search".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_table_is_allowed() {
        let router = RequestRouter::new(vec![]).unwrap();
        assert!(router.find(&Method::GET, "/").is_none());
    }

    #[test]
    fn test_find_matches_method_exactly_and_path_ignoring_case() {
        let router = RequestRouter::new(vec![
            echo(Method::GET, "/items"),
            echo(Method::POST, "/items"),
        ])
        .unwrap();

        let found = router.find(&Method::POST, "/ITEMS").unwrap();
        assert_eq!(found.method(), Method::POST);
        assert!(router.find(&Method::DELETE, "/items").is_none());
        assert!(router.find(&Method::GET, "/items/1").is_none());
    }

    #[test]
    fn test_parse_request() {
        let uri: Uri = "/echo?type=businessName&empty=".parse().unwrap();
        let request = HandlerRequest::parse(&uri, br#"{"term":"Cafe"}"#);

        assert_eq!(request.url, "/echo");
        assert_eq!(request.query.get("type").map(String::as_str), Some("businessName"));
        assert_eq!(request.query.get("empty").map(String::as_str), Some(""));
        assert_eq!(request.body, json!({"term": "Cafe"}));
    }

    #[test]
    fn test_parse_request_defaults_body() {
        let uri: Uri = "/echo".parse().unwrap();

        assert_eq!(HandlerRequest::parse(&uri, b"").body, json!({}));
        assert_eq!(HandlerRequest::parse(&uri, b"{broken").body, json!({}));
        assert!(HandlerRequest::parse(&uri, b"").query.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_unknown_route() {
        let router = RequestRouter::new(vec![echo(Method::GET, "/echo")]).unwrap();

        let response = router
            .dispatch(&Method::GET, &"/missing".parse().unwrap(), b"")
            .await;
        assert_eq!(response, HandlerResponse::not_found());
        assert_eq!(response.body, json!({"message": "Route not found"}));
    }

    #[tokio::test]
    async fn test_dispatch_passes_parsed_request() {
        let router = RequestRouter::new(vec![echo(Method::POST, "/echo")]).unwrap();

        let response = router
            .dispatch(
                &Method::POST,
                &"/Echo?type=businessName".parse().unwrap(),
                br#"{"term":"Cafe"}"#,
            )
            .await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(
            response.body,
            json!({
                "url": "/Echo",
                "query": {"type": "businessName"},
                "body": {"term": "Cafe"},
            })
        );
    }

    #[tokio::test]
    async fn test_dispatch_first_match_wins() {
        struct Fixed(StatusCode);

        #[async_trait]
        impl RequestHandler for Fixed {
            fn method(&self) -> Method {
                Method::GET
            }
            fn path(&self) -> &str {
                "/first"
            }
            async fn handle(&self, _: HandlerRequest) -> Result<HandlerResponse, HandlerError> {
                Ok(HandlerResponse::message(self.0, "fixed"))
            }
        }

        let fixed: Arc<dyn RequestHandler> = Arc::new(Fixed(StatusCode::ACCEPTED));
        let router = RequestRouter::new(vec![echo(Method::GET, "/other"), fixed]).unwrap();

        let response = router
            .dispatch(&Method::GET, &"/FIRST".parse().unwrap(), b"")
            .await;
        assert_eq!(response.status, StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_dispatch_maps_upstream_failure() {
        let failing: Arc<dyn RequestHandler> = Arc::new(FailingHandler);
        let router = RequestRouter::new(vec![failing]).unwrap();

        let response = router
            .dispatch(&Method::GET, &"/fail".parse().unwrap(), b"")
            .await;
        assert_eq!(response.status, StatusCode::BAD_GATEWAY);
        assert_eq!(response.body, json!({"message": "Failed to load businesses"}));
    }

    fn search_app() -> (Router, Arc<crate::testing::StubProvider>) {
        let provider = Arc::new(sample_provider());
        let handler: Arc<dyn RequestHandler> =
            Arc::new(SearchHandler::new(sample_service(provider.clone())));
        let router = RequestRouter::new(vec![handler]).unwrap();
        let app = app(AppState {
            router: Arc::new(router),
        });
        (app, provider)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Option<String>, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_end_to_end_wrong_method_is_not_found() {
        let (app, provider) = search_app();

        let request = Request::builder()
            .method(Method::GET)
            .uri("/business/search?type=businessName")
            .body(Body::empty())
            .unwrap();
        let (status, content_type, body) = send(app, request).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(content_type.as_deref(), Some("application/json"));
        assert_eq!(body, json!({"message": "Route not found"}));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_end_to_end_search_by_name() {
        let (app, _provider) = search_app();

        let request = Request::builder()
            .method(Method::POST)
            .uri("/business/search?type=businessName")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"term":"Cafe"}"#))
            .unwrap();
        let (status, content_type, body) = send(app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("application/json"));

        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Blue Cafe", "cafe corner"]);
        assert_eq!(body[0]["workingHours"]["Saturday-Sunday"], Value::Null);
        assert!(body[0]["workingHours"]["Monday-Friday"].is_array());
    }

    #[tokio::test]
    async fn test_end_to_end_path_is_case_insensitive() {
        let (app, _provider) = search_app();

        let request = Request::builder()
            .method(Method::POST)
            .uri("/Business/SEARCH?type=businessAddress")
            .body(Body::from(r#"{"term":"geneva"}"#))
            .unwrap();
        let (status, _, body) = send(app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["name"], "Tea House");
    }

    #[tokio::test]
    async fn test_end_to_end_garbage_body_is_empty_term() {
        let (app, provider) = search_app();

        let request = Request::builder()
            .method(Method::POST)
            .uri("/business/search?type=businessName")
            .body(Body::from("term=Cafe"))
            .unwrap();
        let (status, _, body) = send(app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"message": "Search term may not be empty"}));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_end_to_end_bare_options_is_not_found() {
        let (app, provider) = search_app();

        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/business/search?type=businessName")
            .body(Body::empty())
            .unwrap();
        let (status, content_type, body) = send(app, request).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(content_type.as_deref(), Some("application/json"));
        assert_eq!(body, json!({"message": "Route not found"}));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_end_to_end_cors_preflight_is_answered() {
        let (app, provider) = search_app();

        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/business/search?type=businessName")
            .header(header::ORIGIN, "http://localhost:8080")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_end_to_end_search_response_allows_any_origin() {
        let (app, _provider) = search_app();

        let request = Request::builder()
            .method(Method::POST)
            .uri("/business/search?type=businessName")
            .header(header::ORIGIN, "http://localhost:8080")
            .body(Body::from(r#"{"term":"Tea"}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }
}
