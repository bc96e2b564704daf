// ABOUTME: Configuration module for the FitHub server
// ABOUTME: Re-exports the environment-driven server configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

//! Configuration module for the FitHub server
//!
//! Configuration is environment-only: every setting is read from a
//! variable at startup, with development defaults where that is safe.

/// Environment and server configuration
pub mod environment;

pub use environment::{AuthConfig, DatabaseUrl, Environment, MailConfig, MediaConfig, ServerConfig};
