//! Front-end relay: static files, a `/health` probe, and an `/api/*` reverse proxy.
//!
//! Requests under `/api` are forwarded to the configured upstream with the API key attached.
//! Anything that is not `/health` or `/api` is served from the static directory.

use crate::config::RelayConfig;
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::{any, get},
};
use reqwest::Client;
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use thiserror::Error;
use tower_http::{cors::CorsLayer, services::ServeDir};

const API_PREFIX: &str = "/api";
const API_KEY_HEADER: &str = "x-api-key";

/// Request headers that never cross the proxy.
const SKIPPED_HEADERS: [&str; 11] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
    "accept-encoding",
];

/// Errors raised while forwarding a request upstream.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Upstream could not be reached.
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
    /// Upstream answered with a body that is not JSON.
    #[error("upstream returned a non-JSON body: {0}")]
    InvalidBody(#[from] serde_json::Error),
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "API proxy error");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to proxy request to API" })),
        )
            .into_response()
    }
}

/// Shared relay state.
struct RelayState {
    config: RelayConfig,
    http: Client,
}

/// Build the relay router for `config`.
pub fn create_relay_router(config: RelayConfig) -> Result<Router, reqwest::Error> {
    let http = Client::builder().user_agent("docflow/relay").build()?;
    let static_files = ServeDir::new(&config.static_dir);
    let state = Arc::new(RelayState { config, http });

    Ok(Router::new()
        .route("/health", get(health))
        .route(API_PREFIX, any(proxy))
        .route("/api/*rest", any(proxy))
        .fallback_service(static_files)
        .layer(CorsLayer::permissive())
        .with_state(state))
}

/// Body returned by `/health`.
#[derive(Serialize)]
struct HealthResponse {
    #[serde(rename = "statusCode")]
    status_code: u16,
    message: &'static str,
    api_endpoint: String,
    environment: String,
}

async fn health(State(state): State<Arc<RelayState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status_code: 200,
        message: "ok",
        api_endpoint: state.config.api_endpoint.clone(),
        environment: state.config.environment.clone(),
    })
}

/// Forward an `/api` request upstream and relay the JSON answer with its status.
async fn proxy(
    State(state): State<Arc<RelayState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, RelayError> {
    let target = upstream_url(&state.config.api_endpoint, &uri);
    tracing::info!(method = %method, original = %uri, target = %target, "Proxying request");

    let mut request = state
        .http
        .request(method.clone(), &target)
        .headers(forwarded_headers(&headers, &state.config.api_key));
    if carries_body(&method) {
        request = request.body(body);
    }

    let response = request.send().await?;
    let status = response.status();
    let bytes = response.bytes().await?;
    let data: Value = serde_json::from_slice(&bytes)?;
    tracing::debug!(status = status.as_u16(), "Upstream responded");

    Ok((status, Json(data)).into_response())
}

/// Upstream URL for an incoming request: the endpoint plus the path after `/api` and the query.
fn upstream_url(endpoint: &str, uri: &Uri) -> String {
    let path = uri.path().strip_prefix(API_PREFIX).unwrap_or(uri.path());
    let path = if path.is_empty() { "/" } else { path };
    match uri.query() {
        Some(query) => format!("{}{path}?{query}", endpoint.trim_end_matches('/')),
        None => format!("{}{path}", endpoint.trim_end_matches('/')),
    }
}

/// Client headers minus the skipped set, with JSON content type and the API key applied last.
fn forwarded_headers(incoming: &HeaderMap, api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in incoming {
        if SKIPPED_HEADERS.contains(&name.as_str()) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    match HeaderValue::from_str(api_key) {
        Ok(value) => {
            headers.insert(HeaderName::from_static(API_KEY_HEADER), value);
        }
        Err(_) => tracing::warn!("API key is not a valid header value; sending without it"),
    }
    headers
}

fn carries_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use httpmock::{Method::GET, Method::POST, MockServer};
    use tower::ServiceExt;

    fn config_for(endpoint: String) -> RelayConfig {
        RelayConfig {
            api_endpoint: endpoint,
            api_key: "secret-key".into(),
            port: 0,
            static_dir: "public".into(),
            environment: "test".into(),
        }
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[test]
    fn upstream_url_keeps_path_and_query() {
        let uri: Uri = "/api/documents?exclusiveStartKey=abc".parse().expect("uri");
        assert_eq!(
            upstream_url("https://api.example.com/prod/", &uri),
            "https://api.example.com/prod/documents?exclusiveStartKey=abc"
        );
        let bare: Uri = "/api".parse().expect("uri");
        assert_eq!(upstream_url("https://api.example.com", &bare), "https://api.example.com/");
    }

    #[test]
    fn api_key_overrides_client_supplied_value() {
        let mut incoming = HeaderMap::new();
        incoming.insert(API_KEY_HEADER, HeaderValue::from_static("forged"));
        incoming.insert(header::HOST, HeaderValue::from_static("localhost:3000"));
        incoming.insert("x-trace", HeaderValue::from_static("1"));

        let headers = forwarded_headers(&incoming, "secret-key");
        assert_eq!(headers.get(API_KEY_HEADER).expect("key"), "secret-key");
        assert_eq!(headers.get_all(API_KEY_HEADER).iter().count(), 1);
        assert!(headers.get(header::HOST).is_none());
        assert_eq!(headers.get("x-trace").expect("trace"), "1");
    }

    #[tokio::test]
    async fn health_reports_endpoint_and_environment() {
        let app = create_relay_router(config_for("https://api.example.com".into())).expect("router");
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({
                "statusCode": 200,
                "message": "ok",
                "api_endpoint": "https://api.example.com",
                "environment": "test"
            })
        );
    }

    #[tokio::test]
    async fn proxy_forwards_post_with_api_key() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/documents")
                    .header("x-api-key", "secret-key")
                    .json_body(json!({ "name": "a.txt" }));
                then.status(200).json_body(json!({ "documentId": "abc" }));
            })
            .await;

        let app = create_relay_router(config_for(server.base_url())).expect("router");
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/documents")
                    .header("content-type", "application/json")
                    .body(Body::from(json!({ "name": "a.txt" }).to_string()))
                    .expect("request"),
            )
            .await
            .expect("response");

        mock.assert_async().await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "documentId": "abc" }));
    }

    #[tokio::test]
    async fn proxy_passes_upstream_status_through() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/documents/missing");
                then.status(404).json_body(json!({ "message": "Document not found" }));
            })
            .await;

        let app = create_relay_router(config_for(server.base_url())).expect("router");
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/documents/missing")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["message"], "Document not found");
    }

    #[tokio::test]
    async fn non_json_upstream_body_is_proxy_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/documents");
                then.status(502).body("<html>bad gateway</html>");
            })
            .await;

        let app = create_relay_router(config_for(server.base_url())).expect("router");
        let response = app
            .oneshot(Request::builder().uri("/api/documents").body(Body::empty()).expect("request"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Failed to proxy request to API" })
        );
    }
}
