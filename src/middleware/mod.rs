// ABOUTME: HTTP middleware shared by every router: CORS policy and request tracing
// ABOUTME: Session guards live in `crate::auth` next to the token verification they wrap
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

/// Cross-origin policy
pub mod cors;
/// Request spans and request ids
pub mod tracing;

pub use cors::setup_cors;
pub use self::tracing::{RequestSpan, REQUEST_ID_HEADER};
