//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, route groups)
//!     → request.rs (request ID assignment)
//!     → proxy.rs (relay /proxy and /v1 upstream, buffered or streamed)
//!     → response.rs (error taxonomy, JSON error bodies)
//!     → Send to client
//! ```

pub mod proxy;
pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use response::EdgeError;
pub use server::{AppState, HttpServer};
