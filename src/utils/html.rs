// ABOUTME: HTML escaping utilities to prevent injection in server-rendered email bodies
// ABOUTME: Wraps html-escape for text nodes and double-quoted attribute values
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

/// Escape user content placed inside an HTML text node
#[must_use]
pub fn escape_text(input: &str) -> String {
    html_escape::encode_text(input).into_owned()
}

/// Escape a value placed inside a double-quoted attribute such as `href="..."`
#[must_use]
pub fn escape_attribute(input: &str) -> String {
    html_escape::encode_double_quoted_attribute(input).into_owned()
}
