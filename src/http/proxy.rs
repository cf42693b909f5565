//! Reverse proxy forwarding.
//!
//! # Responsibilities
//! - Compose the upstream URL from base + path suffix + raw query
//! - Strip hop-by-hop headers in both directions
//! - Inject the server-held upstream credential when one is configured
//! - Relay `text/event-stream` responses chunk by chunk, buffer the rest
//!
//! # Design Decisions
//! - The upstream status code is passed through unmodified, error or not
//! - One attempt per call, bounded by a single deadline
//! - A streamed body is tied to the client connection: when the client goes
//!   away the body is dropped and the upstream connection with it

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::{Body, Bytes};
use axum::extract::{FromRequest, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::TryStreamExt;

use crate::config::UpstreamConfig;
use crate::http::request::request_id;
use crate::http::response::EdgeError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::resilience::timeouts::before_deadline;
use crate::security::headers::filter_hop_by_hop;

/// Largest request body accepted for forwarding.
pub const MAX_PROXY_BODY: usize = 64 * 1024 * 1024;

const EVENT_STREAM: &str = "text/event-stream";

/// Where a proxy route forwards to.
#[derive(Debug, Clone)]
pub struct UpstreamTarget {
    /// Metrics label.
    pub label: &'static str,
    /// Setting reported when `base` is missing.
    pub setting: &'static str,
    /// Base URL without a trailing slash. `None` = unconfigured.
    pub base: Option<String>,
    /// Bearer credential sent upstream in place of anything the client sent.
    pub bearer: Option<String>,
}

impl UpstreamTarget {
    /// Target behind `/proxy`: the configured mock upstream, no credential.
    pub fn mock(config: &UpstreamConfig) -> Self {
        Self {
            label: "proxy",
            setting: "MOCK_API_UPSTREAM",
            base: non_empty(&config.mock_base).map(str::to_string),
            bearer: None,
        }
    }

    /// Target behind `/v1`: `<api_base>/v1` with the server's API key.
    pub fn api(config: &UpstreamConfig) -> Self {
        Self {
            label: "v1",
            setting: "UPSTREAM_BASE",
            base: non_empty(&config.api_base).map(|base| format!("{base}/v1")),
            bearer: non_empty(&config.api_key).map(str::to_string),
        }
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

/// Everything needed to forward one inbound request.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    /// Path below the route prefix, leading slash optional.
    pub path: String,
    /// Raw query string, forwarded verbatim.
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ProxyRequest {
    /// Collect an inbound request whose path starts with `prefix`.
    ///
    /// The body is buffered under the route's `DefaultBodyLimit`.
    pub async fn from_request(request: Request<Body>, prefix: &str) -> Result<Self, EdgeError> {
        let method = request.method().clone();
        let path = request
            .uri()
            .path()
            .strip_prefix(prefix)
            .unwrap_or_default()
            .to_string();
        let query = request.uri().query().map(str::to_string);
        let headers = request.headers().clone();

        let body = Bytes::from_request(request, &()).await.map_err(|rejection| {
            if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                EdgeError::PayloadTooLarge
            } else {
                EdgeError::BadRequest("could not read request body")
            }
        })?;

        Ok(Self {
            method,
            path,
            query,
            headers,
            body,
        })
    }
}

/// Build `base + "/" + path` with the query appended verbatim.
pub fn upstream_url(base: &str, path: &str, query: Option<&str>) -> String {
    let mut url = format!("{}/{}", base, path.trim_start_matches('/'));
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(query);
    }
    url
}

/// Whether a response should be relayed as a stream.
pub fn is_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with(EVENT_STREAM))
}

/// HTTP client wrapper that forwards requests upstream.
#[derive(Debug, Clone)]
pub struct ReverseProxy {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReverseProxy {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .no_proxy()
            .build()?;
        Ok(Self { client, timeout })
    }

    /// Forward `request` to `target` and relay the upstream response.
    pub async fn forward(
        &self,
        target: &UpstreamTarget,
        request: ProxyRequest,
    ) -> Result<Response, EdgeError> {
        let base = target
            .base
            .as_deref()
            .ok_or(EdgeError::NotConfigured(target.setting))?;
        let url = reqwest::Url::parse(&upstream_url(
            base,
            &request.path,
            request.query.as_deref(),
        ))?;

        let mut headers = filter_hop_by_hop(&request.headers);
        if let Some(bearer) = &target.bearer {
            let value = HeaderValue::from_str(&format!("Bearer {bearer}"))
                .map_err(|_| EdgeError::NotConfigured("a valid upstream API key"))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let start = Instant::now();
        let deadline = tokio::time::Instant::now() + self.timeout;
        let method = request.method.clone();

        tracing::debug!(upstream = target.label, method = %method, url = %url, "Forwarding upstream");

        let send = self
            .client
            .request(request.method, url)
            .headers(headers)
            .body(request.body)
            .send();
        let upstream = before_deadline(deadline, send)
            .await
            .inspect_err(|err| record_failure(target.label, err))?;

        let status = upstream.status();
        let response_headers = filter_hop_by_hop(upstream.headers());

        let body = if is_event_stream(upstream.headers()) {
            tracing::debug!(upstream = target.label, status = %status, "Relaying event stream");
            let label = target.label;
            let stream = upstream.bytes_stream().inspect_err(move |err| {
                tracing::warn!(upstream = label, error = %err, "Upstream stream ended with error");
            });
            Body::from_stream(stream)
        } else {
            let bytes = before_deadline(deadline, upstream.bytes())
                .await
                .inspect_err(|err| record_failure(target.label, err))?;
            Body::from(bytes)
        };

        metrics::record_request(target.label, method.as_str(), status.as_u16(), start);

        let mut response = Response::new(body);
        *response.status_mut() = status;
        *response.headers_mut() = response_headers;
        Ok(response)
    }
}

fn record_failure(label: &'static str, err: &EdgeError) {
    let kind = match err {
        EdgeError::UpstreamTimeout => "timeout",
        _ => "connect",
    };
    metrics::record_upstream_error(label, kind);
    tracing::warn!(upstream = label, kind, error = %err, "Upstream call failed");
}

async fn forward_to(
    state: AppState,
    target: Arc<UpstreamTarget>,
    prefix: &str,
    request: Request<Body>,
) -> Response {
    let id = request_id(&request);
    let result = match ProxyRequest::from_request(request, prefix).await {
        Ok(proxy_request) => state.proxy.forward(&target, proxy_request).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(response) => response,
        Err(err) => {
            if err.status() != StatusCode::INTERNAL_SERVER_ERROR {
                tracing::info!(request_id = %id, upstream = target.label, error = %err, "Proxy request failed");
            } else {
                tracing::error!(request_id = %id, upstream = target.label, error = %err, "Proxy misconfigured");
            }
            err.into_response()
        }
    }
}

/// `ANY /proxy/{path...}` → mock upstream.
pub async fn mock_proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let target = state.mock_target.clone();
    forward_to(state, target, "/proxy", request).await
}

/// `ANY /v1/{path...}` → API upstream (proxy mode).
pub async fn api_proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let target = state.api_target.clone();
    forward_to(state, target, "/v1", request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_base_path_and_query() {
        assert_eq!(
            upstream_url("http://up.local/codex", "/chat/completions", Some("stream=true&x=%20")),
            "http://up.local/codex/chat/completions?stream=true&x=%20"
        );
        assert_eq!(upstream_url("http://up.local", "models", None), "http://up.local/models");
        assert_eq!(upstream_url("http://up.local", "", Some("")), "http://up.local/");
        assert_eq!(upstream_url("http://up.local", "//a", None), "http://up.local/a");
    }

    #[test]
    fn event_stream_detection() {
        let mut headers = HeaderMap::new();
        assert!(!is_event_stream(&headers));

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert!(!is_event_stream(&headers));

        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/event-stream; charset=utf-8"),
        );
        assert!(is_event_stream(&headers));
    }

    #[test]
    fn targets_from_config() {
        let config = UpstreamConfig {
            api_base: "https://api.example.com".into(),
            api_key: "sk-server".into(),
            mock_base: String::new(),
            timeout_secs: 60,
        };

        let api = UpstreamTarget::api(&config);
        assert_eq!(api.base.as_deref(), Some("https://api.example.com/v1"));
        assert_eq!(api.bearer.as_deref(), Some("sk-server"));

        let mock = UpstreamTarget::mock(&config);
        assert_eq!(mock.base, None);
        assert_eq!(mock.setting, "MOCK_API_UPSTREAM");
        assert_eq!(mock.bearer, None);
    }

    #[tokio::test]
    async fn unconfigured_target_short_circuits() {
        let proxy = ReverseProxy::new(Duration::from_secs(1)).unwrap();
        let target = UpstreamTarget::mock(&UpstreamConfig {
            mock_base: String::new(),
            ..Default::default()
        });
        let request = ProxyRequest {
            method: Method::GET,
            path: "anything".into(),
            query: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        };

        let err = proxy.forward(&target, request).await.unwrap_err();
        assert_eq!(err.to_string(), "MOCK_API_UPSTREAM is not set");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn path_below_prefix_is_extracted() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/proxy/v1/responses?stream=1")
            .body(Body::from("{}"))
            .unwrap();
        let proxy_request = ProxyRequest::from_request(request, "/proxy").await.unwrap();

        assert_eq!(proxy_request.method, Method::POST);
        assert_eq!(proxy_request.path, "/v1/responses");
        assert_eq!(proxy_request.query.as_deref(), Some("stream=1"));
        assert_eq!(proxy_request.body, Bytes::from_static(b"{}"));
    }

    #[tokio::test]
    async fn oversized_body_is_payload_too_large() {
        use axum::extract::DefaultBodyLimit;
        use axum::routing::post;
        use axum::Router;
        use tower::ServiceExt;

        let app = Router::new()
            .route(
                "/proxy/{*path}",
                post(|request: Request<Body>| async move {
                    match ProxyRequest::from_request(request, "/proxy").await {
                        Ok(_) => StatusCode::OK.into_response(),
                        Err(err) => err.into_response(),
                    }
                }),
            )
            .layer(DefaultBodyLimit::max(8));

        let res = app
            .clone()
            .oneshot(Request::post("/proxy/x").body(Body::from("0123456789abcdef")).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let res = app
            .oneshot(Request::post("/proxy/x").body(Body::from("small")).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
}
