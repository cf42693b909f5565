//! Mock completion endpoints.
//!
//! Used when the edge runs in mock mode, so front-ends can be exercised
//! without a real model API. Requests are answered from a `MockResponder`;
//! the default one reads `d<N>` / `l<N>` directives from the last message.

pub mod extract;
pub mod handlers;
pub mod responder;

use axum::{
    routing::{get, post},
    Router,
};

use crate::http::server::AppState;
use self::handlers::{chat_completions, list_models, responses};

pub use responder::{DirectiveResponder, MockAnswer, MockResponder};

pub fn setup_mock_router() -> Router<AppState> {
    Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .route("/v1/responses", post(responses))
        .route("/v1/models", get(list_models))
}
