// ABOUTME: Input validation helpers returning invalid-input errors with field names
// ABOUTME: Covers required/optional text, numeric ranges and URL checks for admin and dashboard forms
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

use std::fmt::Display;
use std::sync::LazyLock;

use regex::Regex;

use crate::constants::limits::{MAX_TEXT_LEN, MAX_TITLE_LEN};
use crate::errors::{AppError, AppResult};

/// Trim a required single-line field and enforce the title length limit
///
/// # Errors
///
/// Returns an invalid input error when the value is blank or too long
pub fn require_title(field: &str, value: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input(format!("{field} is required")));
    }
    if trimmed.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::invalid_input(format!(
            "{field} must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(trimmed.to_owned())
}

/// Trim free text, mapping blank input to an empty string
///
/// # Errors
///
/// Returns an invalid input error when the text exceeds the length limit
pub fn text(field: &str, value: Option<&str>) -> AppResult<String> {
    let trimmed = value.unwrap_or_default().trim();
    if trimmed.chars().count() > MAX_TEXT_LEN {
        return Err(AppError::invalid_input(format!(
            "{field} must be at most {MAX_TEXT_LEN} characters"
        )));
    }
    Ok(trimmed.to_owned())
}

/// Trim optional text, mapping blank input to `None`
///
/// # Errors
///
/// Returns an invalid input error when the text exceeds the length limit
pub fn optional_text(field: &str, value: Option<&str>) -> AppResult<Option<String>> {
    let text = text(field, value)?;
    Ok(if text.is_empty() { None } else { Some(text) })
}

/// Ensure a numeric value lies within an inclusive range
///
/// # Errors
///
/// Returns a value out of range error naming the field and bounds
pub fn in_range<T>(field: &str, value: T, min: T, max: T) -> AppResult<T>
where
    T: PartialOrd + Display + Copy,
{
    if value < min || value > max {
        return Err(AppError::out_of_range(format!(
            "{field} must be between {min} and {max}"
        ))
        .with_details(serde_json::json!({ "field": field })));
    }
    Ok(value)
}

/// Validate an optional media link (`http` or `https`)
///
/// # Errors
///
/// Returns an invalid input error for other schemes
pub fn optional_url(field: &str, value: Option<&str>) -> AppResult<Option<String>> {
    let Some(url) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if !(url.starts_with("https://") || url.starts_with("http://")) || url.contains(char::is_whitespace) {
        return Err(AppError::invalid_input(format!(
            "{field} must be an http(s) URL"
        )));
    }
    Ok(Some(url.to_owned()))
}

/// Validate an object storage URL: https only, and under `prefix` when one is configured
///
/// # Errors
///
/// Returns an invalid input error when the URL is not https or lies outside the prefix
pub fn storage_url(field: &str, value: &str, prefix: Option<&str>) -> AppResult<String> {
    let url = value.trim();
    if !url.starts_with("https://") || url.len() <= "https://".len() || url.contains(char::is_whitespace) {
        return Err(AppError::invalid_input(format!("{field} must be an https URL")));
    }
    if let Some(prefix) = prefix.map(str::trim).filter(|p| !p.is_empty()) {
        // Match whole path segments so `https://cdn.test` does not admit `https://cdn.test.evil`
        let base = prefix.trim_end_matches('/');
        let inside = url
            .strip_prefix(base)
            .is_some_and(|rest| rest.len() > 1 && rest.starts_with('/'));
        if !inside {
            return Err(AppError::invalid_input(format!(
                "{field} must point at the media storage ({base}/)"
            )));
        }
    }
    Ok(url.to_owned())
}

/// Normalize and check an email address
///
/// # Errors
///
/// Returns an invalid input error when the value does not look like an address
pub fn email_address(field: &str, value: &str) -> AppResult<String> {
    let trimmed = value.trim();
    let valid = EMAIL_PATTERN
        .as_ref()
        .is_some_and(|re| re.is_match(trimmed));
    if !valid || trimmed.len() > 254 {
        return Err(AppError::invalid_input(format!("{field} must be an email address")));
    }
    Ok(trimmed.to_lowercase())
}

static EMAIL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]{2,}$").ok());

/// Trim a list of strings, dropping blanks
#[must_use]
pub fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .collect()
}
