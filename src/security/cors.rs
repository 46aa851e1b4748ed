//! Cross-origin policy for browser callers.
//!
//! An empty origin list allows any origin and mirrors whatever request
//! headers the preflight asks for, so `x-api-key` and `x-target-*` headers
//! pass. A non-empty list is matched exactly; unknown origins get no CORS
//! headers at all. Credentials are never allowed.

use std::time::Duration;

use axum::http::HeaderValue;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};

use crate::config::CorsConfig;

/// Build the CORS layer from configuration.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origin = if config.allowed_origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let allowed: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring unparseable CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(allowed)
    };

    let layer = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request());

    match config.max_age_secs {
        Some(secs) => layer.max_age(Duration::from_secs(secs)),
        None => layer,
    }
}
