use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, Request, StatusCode},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;

use crate::auth::guard::redirect_found;
use crate::http::response::{ok_json, EdgeError};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::passkey::passkey_matches;
use crate::security::session::Session;

/// Login bodies are tiny; anything larger is not a login attempt.
const LOGIN_BODY_LIMIT: usize = 16 * 1024;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub passkey: Option<String>,
}

/// Peer IP of the connection, or `"unknown"`.
pub fn client_ip<B>(request: &Request<B>) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// `POST /auth/login`
pub async fn login(
    State(state): State<AppState>,
    request: Request<Body>,
) -> Result<Response, EdgeError> {
    if !state.guard.auth_enabled() {
        return Err(EdgeError::NotConfigured("APP_PASSKEY"));
    }

    let ip = client_ip(&request);
    if !state.limiter.allow(&ip) {
        tracing::warn!(client = %ip, "Login rate limit exceeded");
        metrics::record_rate_limited("login");
        metrics::record_login("rate_limited");
        return Err(EdgeError::RateLimited);
    }

    let body = axum::body::to_bytes(request.into_body(), LOGIN_BODY_LIMIT)
        .await
        .map_err(|_| EdgeError::BadRequest("invalid request body"))?;
    let login: LoginRequest = serde_json::from_slice(&body)
        .map_err(|_| EdgeError::BadRequest("invalid request body"))?;
    let passkey = login.passkey.unwrap_or_default();

    if !passkey_matches(passkey.trim(), &state.config.auth.passkey) {
        tracing::info!(client = %ip, "Login rejected: invalid passkey");
        metrics::record_login("invalid");
        return Err(EdgeError::InvalidPasskey);
    }

    tracing::info!(client = %ip, "Login succeeded");
    metrics::record_login("ok");

    let cookie = state.guard.codec().set_cookie(&Session::authed_now());
    let mut response = ok_json();
    response.headers_mut().append(header::SET_COOKIE, cookie);
    Ok(response)
}

/// `POST /auth/logout`. Always succeeds.
pub async fn logout(State(state): State<AppState>) -> Response {
    let mut response = ok_json();
    if state.guard.auth_enabled() {
        response
            .headers_mut()
            .append(header::SET_COOKIE, state.guard.codec().clear_cookie());
    }
    response
}

/// `GET /login`
pub async fn login_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if !state.guard.auth_enabled() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html("<h3>APP_PASSKEY is not set</h3><p>Set APP_PASSKEY to enable login protection.</p>"),
        )
            .into_response();
    }
    if state.guard.is_authenticated(&headers) {
        return redirect_found("/");
    }
    Html(LOGIN_PAGE).into_response()
}

const LOGIN_PAGE: &str = r#"<!doctype html>
<html>
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Login</title>
    <style>
      body { font-family: system-ui, sans-serif; max-width: 520px; margin: 10vh auto; padding: 0 16px; }
      input, button { font-size: 16px; padding: 10px 12px; width: 100%; box-sizing: border-box; }
      button { margin-top: 12px; cursor: pointer; }
      .err { color: #b00020; margin-top: 10px; white-space: pre-wrap; }
    </style>
  </head>
  <body>
    <h2>API2Web</h2>
    <p>Enter passkey to continue.</p>
    <input id="passkey" type="password" autocomplete="current-password" placeholder="Passkey" />
    <button id="btn">Login</button>
    <div id="err" class="err"></div>
    <script>
      const pass = document.getElementById('passkey');
      const err = document.getElementById('err');
      async function submit() {
        err.textContent = '';
        try {
          const r = await fetch('/auth/login', {
            method: 'POST',
            headers: { 'content-type': 'application/json' },
            body: JSON.stringify({ passkey: pass.value || '' })
          });
          const data = await r.json().catch(() => ({}));
          if (!r.ok) throw new Error(data?.error || ('HTTP ' + r.status));
          location.href = '/';
        } catch (e) {
          err.textContent = String(e?.message || e);
        }
      }
      document.getElementById('btn').addEventListener('click', submit);
      pass.addEventListener('keydown', (e) => { if (e.key === 'Enter') submit(); });
      pass.focus();
    </script>
  </body>
</html>"#;
