// ABOUTME: Main library entry point for the FitHub fitness platform API
// ABOUTME: Admin back office and end-user dashboard over a shared SQLite catalog
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

#![recursion_limit = "256"]
#![deny(unsafe_code)]

//! # FitHub Server
//!
//! An HTTP API for a fitness platform. Administrators curate a catalog of
//! exercises, workouts, programs, recipes, nutrition plans, courses and
//! achievements; signed-in users browse it, track progress and earn
//! achievements.
//!
//! ## Architecture
//!
//! - **Database**: one SQLite pool with a `*Manager` per domain
//! - **Routes**: public, dashboard and admin routers merged by [`server`]
//! - **Auth**: session tokens come from an external session library and are
//!   verified here, never issued
//! - **Nutrition**: pure calorie calculator and recipe scaling
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use fithub_server::config::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     fithub_server::server::run(config).await
//! }
//! ```

/// Achievement evaluation after user activity
pub mod achievements;

/// Session token verification and route guards
pub mod auth;

/// Environment-driven configuration
pub mod config;

/// Defaults, limits and environment variable names
pub mod constants;

/// Database pool, schema and domain managers
pub mod database;

/// Outbound email senders and templates
pub mod email;

/// Closed value sets with labels
pub mod enums;

/// Unified error handling
pub mod errors;

/// Structured logging setup
pub mod logging;

/// HTTP middleware: CORS and request tracing
pub mod middleware;

/// Calorie calculator and recipe scaling
pub mod nutrition;

/// HTTP routers
pub mod routes;

/// Server resources, router assembly and serve loop
pub mod server;

/// Slugs, validation and escaping helpers
pub mod utils;

/// Limit/offset and cursor pagination
pub use fithub_core::pagination;
