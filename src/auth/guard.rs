//! Session guard.
//!
//! Decides whether a request carries an authenticated session and provides
//! the two enforcement middlewares used by route groups: API routes answer
//! 401 JSON, page routes redirect to the login page.
//!
//! With no passkey configured every request counts as authenticated.

use axum::{
    body::Body,
    extract::{FromRef, State},
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::AuthConfig;
use crate::http::response::EdgeError;
use crate::http::server::AppState;
use crate::security::session::SessionCodec;

/// Path unauthenticated page requests are sent to.
pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone)]
pub struct SessionGuard {
    enabled: bool,
    codec: SessionCodec,
}

impl SessionGuard {
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            enabled: config.enabled(),
            codec: SessionCodec::new(
                config.signing_secret(),
                config.session_max_age_secs,
                config.https_only,
            ),
        }
    }

    /// Whether a passkey is configured.
    pub fn auth_enabled(&self) -> bool {
        self.enabled
    }

    pub fn codec(&self) -> &SessionCodec {
        &self.codec
    }

    /// `true` when auth is disabled or the request holds a valid session
    /// with the `authed` flag set. Unreadable sessions are unauthenticated.
    pub fn is_authenticated(&self, headers: &HeaderMap) -> bool {
        if !self.enabled {
            return true;
        }
        match self.codec.read(headers) {
            Ok(Some(session)) => session.authed,
            Ok(None) => false,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring unusable session cookie");
                false
            }
        }
    }
}

impl FromRef<AppState> for SessionGuard {
    fn from_ref(state: &AppState) -> Self {
        state.guard.clone()
    }
}

/// API routes: `401 {"error":"unauthorized"}` without a session.
pub async fn require_auth_or_401(
    State(guard): State<SessionGuard>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if guard.is_authenticated(request.headers()) {
        return next.run(request).await;
    }
    tracing::debug!(path = %request.uri().path(), "Rejecting unauthenticated API request");
    EdgeError::Unauthorized.into_response()
}

/// Page routes: `302` to the login page without a session.
pub async fn require_auth_or_redirect(
    State(guard): State<SessionGuard>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if guard.is_authenticated(request.headers()) {
        return next.run(request).await;
    }
    redirect_found(LOGIN_PATH)
}

/// `302 Found` to `location`.
pub fn redirect_found(location: &'static str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}
