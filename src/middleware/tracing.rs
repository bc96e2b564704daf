// ABOUTME: Request tracing for correlation and structured logging
// ABOUTME: Builds one span per HTTP request carrying method, path and request id
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

use axum::http::Request;
use tower_http::trace::MakeSpan;
use tracing::Span;

/// Header carrying the request id, set by `SetRequestIdLayer` when absent
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Span factory for `TraceLayer`
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            path = %request.uri().path(),
            request_id = %request_id,
        )
    }
}
