//! CORS policy built from configuration.
//!
//! An explicit origin list is required for credentialed requests; with no
//! list any origin is allowed and credentials are never advertised.
//! Methods and headers mirror the preflight request, which is what lets a
//! credentialed policy accept "any" of them.

use axum::http::HeaderValue;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::config::CorsConfig;

pub fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request());

    let origins: Vec<HeaderValue> = config
        .allow_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if origins.is_empty() {
        if config.allow_credentials {
            tracing::warn!("CORS credentials ignored: no explicit allow-origin list configured");
        }
        return layer.allow_origin(AllowOrigin::any());
    }

    layer
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(config.allow_credentials)
}
