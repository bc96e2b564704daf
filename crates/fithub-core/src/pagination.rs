// ABOUTME: Offset and cursor pagination types shared by catalog and timeline endpoints
// ABOUTME: Provides clamped page parameters and opaque timestamp cursors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

use std::fmt::{self, Display, Formatter};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

/// Default page size for list endpoints
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Upper bound for any requested page size
pub const MAX_PAGE_SIZE: u32 = 100;

/// Offset pagination parameters as received from a query string
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageParams {
    /// Requested page size
    pub limit: Option<u32>,
    /// Number of items to skip
    pub offset: Option<u32>,
}

impl PageParams {
    /// Create parameters with an explicit limit and offset
    #[must_use]
    pub const fn new(limit: u32, offset: u32) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
        }
    }

    /// Page size clamped to `1..=MAX_PAGE_SIZE`
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Offset, zero when absent
    #[must_use]
    pub fn offset(&self) -> u32 {
        self.offset.unwrap_or(0)
    }
}

/// A page of results from an offset-paginated query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// The items in this page
    pub items: Vec<T>,
    /// Total number of items matching the query
    pub total: u64,
    /// Page size used
    pub limit: u32,
    /// Offset used
    pub offset: u32,
    /// Whether more items exist after this page
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Build a page from query results and the total match count
    #[must_use]
    pub fn new(items: Vec<T>, total: u64, params: &PageParams) -> Self {
        let limit = params.limit();
        let offset = params.offset();
        let has_more = u64::from(offset) + (items.len() as u64) < total;
        Self {
            items,
            total,
            limit,
            offset,
            has_more,
        }
    }

    /// Transform every item while keeping pagination metadata
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            limit: self.limit,
            offset: self.offset,
            has_more: self.has_more,
        }
    }
}

/// Where a keyset page ends: the sort timestamp and the tie-breaking id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorPosition {
    /// Sort timestamp of the last row returned
    pub at: DateTime<Utc>,
    /// Id of the last row returned
    pub id: String,
}

impl CursorPosition {
    /// Position of a row
    #[must_use]
    pub fn new(at: DateTime<Utc>, id: impl Into<String>) -> Self {
        Self { at, id: id.into() }
    }
}

/// Opaque continuation token, URL-safe base64 of `millis:id`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Encode a position
    #[must_use]
    pub fn encode(position: &CursorPosition) -> Self {
        let raw = format!("{}:{}", position.at.timestamp_millis(), position.id);
        Self(URL_SAFE_NO_PAD.encode(raw))
    }

    /// Encode the position of a row
    #[must_use]
    pub fn new(at: DateTime<Utc>, id: &str) -> Self {
        Self::encode(&CursorPosition::new(at, id))
    }

    /// Decode the position this cursor points after
    ///
    /// # Errors
    ///
    /// Returns invalid input when the token was not produced by [`Cursor::encode`]
    pub fn position(&self) -> AppResult<CursorPosition> {
        let invalid = || AppError::invalid_input("Invalid cursor");
        let bytes = URL_SAFE_NO_PAD.decode(&self.0).map_err(|_| invalid())?;
        let raw = String::from_utf8(bytes).map_err(|_| invalid())?;
        // ids may themselves contain ':'
        let (millis, id) = raw.split_once(':').ok_or_else(invalid)?;
        let at = millis
            .parse::<i64>()
            .ok()
            .and_then(DateTime::from_timestamp_millis)
            .ok_or_else(invalid)?;
        if id.is_empty() {
            return Err(invalid());
        }
        Ok(CursorPosition::new(at, id))
    }

    /// The token as sent to clients
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Cursor {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl Display for Cursor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A page of a keyset-paginated timeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CursorPage<T> {
    /// Items, in timeline order
    pub items: Vec<T>,
    /// Pass back to fetch the following page
    pub next_cursor: Option<Cursor>,
    /// Whether another page exists
    pub has_more: bool,
}

impl<T> CursorPage<T> {
    /// Build a page from a query that fetched up to `limit + 1` rows
    ///
    /// The extra row only signals that another page exists; it is dropped
    /// and the cursor points at the last row kept.
    #[must_use]
    pub fn from_overfetch(
        mut rows: Vec<T>,
        limit: usize,
        position_of: impl Fn(&T) -> CursorPosition,
    ) -> Self {
        let has_more = rows.len() > limit;
        rows.truncate(limit);
        let next_cursor = if has_more {
            rows.last().map(|row| Cursor::encode(&position_of(row)))
        } else {
            None
        };
        Self {
            items: rows,
            next_cursor,
            has_more,
        }
    }
}
