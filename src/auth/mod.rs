//! Passkey login and session enforcement.
//!
//! `/auth/login` exchanges the shared passkey for a signed session cookie,
//! `/auth/logout` clears it and `/login` serves the form.

pub mod guard;
pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};

use crate::http::server::AppState;
use self::handlers::{login, login_page, logout};

pub use guard::{
    redirect_found, require_auth_or_401, require_auth_or_redirect, SessionGuard, LOGIN_PATH,
};

pub fn setup_auth_router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route(LOGIN_PATH, get(login_page))
}
