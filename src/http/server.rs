//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, CORS, session guards)
//! - Pick `/v1` behaviour from the configured mode
//! - Bind server to listener and shut down gracefully

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, State},
    http::{Method, Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, on, MethodFilter},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::auth::{self, require_auth_or_401, require_auth_or_redirect, SessionGuard};
use crate::config::{EdgeConfig, Mode};
use crate::http::proxy::{
    api_proxy_handler, mock_proxy_handler, ReverseProxy, UpstreamTarget, MAX_PROXY_BODY,
};
use crate::http::request::{request_id, MakeRequestUuid, X_REQUEST_ID};
use crate::mock::{self, handlers::echo, DirectiveResponder, MockResponder};
use crate::security::cors::build_cors_layer;
use crate::security::rate_limit::LoginRateLimiter;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<EdgeConfig>,
    pub guard: SessionGuard,
    pub limiter: LoginRateLimiter,
    pub proxy: ReverseProxy,
    pub mock_target: Arc<UpstreamTarget>,
    pub api_target: Arc<UpstreamTarget>,
    pub responder: Arc<dyn MockResponder>,
}

impl AppState {
    pub fn new(config: EdgeConfig) -> Result<Self, reqwest::Error> {
        let proxy = ReverseProxy::new(Duration::from_secs(config.upstream.timeout_secs))?;
        Ok(Self {
            guard: SessionGuard::from_config(&config.auth),
            limiter: LoginRateLimiter::new(config.auth.login_max_per_minute),
            proxy,
            mock_target: Arc::new(UpstreamTarget::mock(&config.upstream)),
            api_target: Arc::new(UpstreamTarget::api(&config.upstream)),
            responder: Arc::new(DirectiveResponder::new(
                Duration::from_secs(config.mock.max_delay_secs),
                config.mock.max_lines,
            )),
            config: Arc::new(config),
        })
    }

    /// Replace the mock responder.
    pub fn with_responder(mut self, responder: Arc<dyn MockResponder>) -> Self {
        self.responder = responder;
        self
    }
}

/// Methods accepted on the proxy prefixes.
fn proxy_methods() -> MethodFilter {
    MethodFilter::GET
        .or(MethodFilter::POST)
        .or(MethodFilter::PUT)
        .or(MethodFilter::PATCH)
        .or(MethodFilter::DELETE)
        .or(MethodFilter::OPTIONS)
}

/// HTTP server for the edge service.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: EdgeConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::from_state(AppState::new(config)?))
    }

    /// Create a server around prepared state.
    pub fn from_state(state: AppState) -> Self {
        let router = Self::build_router(state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        let guarded = middleware::from_fn_with_state(state.clone(), require_auth_or_401);
        let page_guard = middleware::from_fn_with_state(state.clone(), require_auth_or_redirect);

        let mut proxied = Router::new()
            .route("/proxy/", on(proxy_methods(), mock_proxy_handler))
            .route("/proxy/{*path}", on(proxy_methods(), mock_proxy_handler));
        if state.config.mode == Mode::Proxy {
            proxied = proxied.route("/v1/{*path}", on(proxy_methods(), api_proxy_handler));
        }
        let proxied = proxied
            .route_layer(guarded)
            .layer(DefaultBodyLimit::max(MAX_PROXY_BODY));

        let mut router = Router::new()
            .merge(auth::setup_auth_router())
            .merge(proxied)
            .route("/", get(page_not_found).route_layer(page_guard).post(echo))
            .fallback(page_fallback);
        if state.config.mode == Mode::Mock {
            router = router.merge(mock::setup_mock_router());
        }

        router
            .with_state(state.clone())
            .layer(build_cors_layer(&state.config.cors))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id(request),
                )
            }))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
    }

    /// The fully layered router, for driving the service without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        let config = &self.state.config;
        tracing::info!(
            address = %addr,
            mode = ?config.mode,
            auth_enabled = self.state.guard.auth_enabled(),
            "HTTP server starting"
        );
        if !self.state.guard.auth_enabled() {
            tracing::warn!(
                "APP_PASSKEY is not set: authentication is DISABLED and every route is open"
            );
        }

        let sweeper_shutdown = shutdown.resubscribe();
        tokio::spawn(self.state.limiter.clone().run_sweeper(sweeper_shutdown));

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Pages that passed the session guard. Asset serving lives elsewhere.
async fn page_not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Anything unmatched. Reserved prefixes 404; other paths are pages and
/// need a session (redirect to login).
async fn page_fallback(State(state): State<AppState>, request: Request<Body>) -> Response {
    let path = request.uri().path().trim_start_matches('/');
    if is_reserved_path(path) || request.method() != Method::GET {
        return StatusCode::NOT_FOUND.into_response();
    }
    if !state.guard.is_authenticated(request.headers()) {
        return auth::redirect_found(auth::LOGIN_PATH);
    }
    page_not_found().await.into_response()
}

fn is_reserved_path(path: &str) -> bool {
    path == "v1"
        || path == "login"
        || path.starts_with("v1/")
        || path.starts_with("auth/")
        || path.starts_with("proxy/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower::ServiceExt;

    fn server() -> HttpServer {
        HttpServer::new(EdgeConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn responses_carry_a_request_id() {
        let res = server()
            .router()
            .oneshot(Request::get("/nowhere").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let id = res.headers()[X_REQUEST_ID].to_str().unwrap();
        assert_eq!(id.len(), 36);
    }

    #[tokio::test]
    async fn client_request_id_is_kept() {
        let res = server()
            .router()
            .oneshot(
                Request::get("/v1/models")
                    .header(X_REQUEST_ID, "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[X_REQUEST_ID], "abc-123");
    }

    struct Fixed;

    impl MockResponder for Fixed {
        fn respond(&self, _instructions: &str) -> mock::MockAnswer {
            mock::MockAnswer {
                text: "fixed".to_string(),
                delay: None,
            }
        }
    }

    #[tokio::test]
    async fn custom_responder_answers_mock_routes() {
        let state = AppState::new(EdgeConfig::default())
            .unwrap()
            .with_responder(Arc::new(Fixed));
        let res = HttpServer::from_state(state)
            .router()
            .oneshot(
                Request::post("/v1/chat/completions")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"messages":[]}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["choices"][0]["message"]["content"], "fixed");
    }

    #[tokio::test]
    async fn proxy_mode_has_no_mock_routes() {
        let mut config = EdgeConfig::default();
        config.mode = Mode::Proxy;
        config.upstream.api_base = String::new();
        let res = HttpServer::new(config)
            .unwrap()
            .router()
            .oneshot(Request::get("/v1/models").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn reserved_paths() {
        for path in ["v1", "v1/models", "auth/whatever", "proxy/x", "login"] {
            assert!(is_reserved_path(path), "{path}");
        }
        for path in ["", "index.html", "assets/app.js", "v10", "loginx"] {
            assert!(!is_reserved_path(path), "{path}");
        }
    }
}
