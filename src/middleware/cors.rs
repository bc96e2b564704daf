// ABOUTME: CORS middleware configuration for the admin and dashboard web clients
// ABOUTME: Allows either any origin or the configured list of origins
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

use http::{
    header::{HeaderName, ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use super::tracing::REQUEST_ID_HEADER;
use crate::config::ServerConfig;

/// Configure CORS for the browser clients
///
/// Origins come from `CORS_ALLOWED_ORIGINS`. An empty list or `*` allows any
/// origin, which is what development setups use.
///
/// ```bash
/// # Allow specific origins (production)
/// export CORS_ALLOWED_ORIGINS="https://admin.fithub.app,https://fithub.app"
/// ```
#[must_use]
pub fn setup_cors(config: &ServerConfig) -> CorsLayer {
    let allow_origin = allowed_origins(&config.cors_origins)
        .map_or_else(AllowOrigin::any, AllowOrigin::list);

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            ACCEPT,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
}

/// Parsed origin list, or `None` when any origin is allowed
fn allowed_origins(configured: &[String]) -> Option<Vec<HeaderValue>> {
    if configured.iter().any(|o| o.trim() == "*") {
        return None;
    }
    let origins: Vec<HeaderValue> = configured
        .iter()
        .map(|o| o.trim())
        .filter(|o| !o.is_empty())
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    (!origins.is_empty()).then_some(origins)
}
