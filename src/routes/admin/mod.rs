// ABOUTME: Back office CRUD routes for content editors, guarded by the admin role
// ABOUTME: Courses and achievements, recipes and nutrition plans, exercises, workouts and programs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

//! Admin routes
//!
//! All handlers are thin wrappers over the database managers, which own
//! validation and the copy-on-write rules. [`require_admin`] rejects
//! callers without the `admin` role before any handler runs.

mod content;
mod nutrition;
mod training;

use std::sync::Arc;

use axum::{middleware, Router};
use serde::Deserialize;

use crate::auth::require_admin;
use crate::pagination::PageParams;
use crate::server::ServerResources;

/// Admin routes handler
pub struct AdminRoutes;

impl AdminRoutes {
    /// Create all admin routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .merge(content::routes())
            .merge(nutrition::routes())
            .merge(training::routes())
            .route_layer(middleware::from_fn_with_state(resources.clone(), require_admin))
            .with_state(resources)
    }
}

/// Query shared by admin list screens
#[derive(Debug, Deserialize, Default)]
pub struct AdminListQuery {
    /// Search term
    pub q: Option<String>,
    /// Difficulty or level
    pub difficulty: Option<String>,
    /// Goal
    pub goal: Option<String>,
    /// Category
    pub category: Option<String>,
    /// Muscle group
    pub muscle_group: Option<String>,
    /// Equipment
    pub equipment: Option<String>,
    /// Page size
    pub limit: Option<u32>,
    /// Page offset
    pub offset: Option<u32>,
}

impl AdminListQuery {
    fn page(&self) -> PageParams {
        PageParams {
            limit: self.limit,
            offset: self.offset,
        }
    }
}
