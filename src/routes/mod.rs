// ABOUTME: Route module organization for the FitHub HTTP API
// ABOUTME: Public, end-user dashboard and admin back office routers grouped by audience
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

//! Route modules
//!
//! Each module exposes a `*Routes` type whose `routes` function returns a
//! router with state already applied, ready to be merged by the server.

/// Back office CRUD behind the admin guard
pub mod admin;
/// Email verification and password reset utilities
pub mod auth;
/// End-user dashboard behind the session guard
pub mod dashboard;
/// Liveness and readiness probes
pub mod health;
/// Dropdown and filter option lists
pub mod options;

pub use admin::AdminRoutes;
pub use auth::AuthEmailRoutes;
pub use dashboard::DashboardRoutes;
pub use health::HealthRoutes;
pub use options::OptionsRoutes;
