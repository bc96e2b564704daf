// ABOUTME: Utility modules shared by managers, routes and email rendering
// ABOUTME: Slug generation, input validation helpers and HTML escaping
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

/// HTML escaping for rendered email bodies
pub mod html;
/// URL slug generation
pub mod slug;
/// Plain-Rust input validation helpers
pub mod validation;
