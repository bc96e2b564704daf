// ABOUTME: Core types for the FitHub fitness platform
// ABOUTME: Foundation crate with error handling and pagination
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

#![deny(unsafe_code)]

//! # FitHub Core
//!
//! Foundation crate providing shared types for the FitHub server. It changes
//! rarely, which keeps incremental builds of the server crate fast.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError` and `ErrorCode`
//! - **pagination**: Offset pages for catalogs, cursor pages for timelines

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Offset and cursor pagination
pub mod pagination;
