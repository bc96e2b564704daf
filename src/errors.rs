// ABOUTME: Re-exports the unified error types from fithub-core
// ABOUTME: Keeps `crate::errors::AppError` as the single import path inside the server
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

//! # Unified Error Handling System
//!
//! The canonical definitions live in `fithub_core::errors`; the server crate
//! enables the `http-response` and `database-errors` features so that
//! `AppError` renders as an HTTP response and absorbs `sqlx` failures.

pub use fithub_core::errors::{AppError, AppResult, ErrorCode, ErrorResponse, ErrorResponseDetails};
