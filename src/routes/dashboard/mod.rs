// ABOUTME: End-user dashboard routes behind the session guard
// ABOUTME: Merges learning, nutrition, training and progress photo routers under one middleware layer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

//! Dashboard routes
//!
//! Every handler here runs after [`require_user`], so it can read the
//! caller from the `AuthenticatedUser` request extension. Catalog reads
//! only ever return published content.

mod learning;
mod nutrition;
mod progress;
mod training;

use std::sync::Arc;

use axum::{middleware, Router};
use tracing::warn;

use crate::achievements::AchievementEngine;
use crate::auth::require_user;
use crate::database::achievements::Achievement;
use crate::server::ServerResources;

pub use nutrition::{CalculatorRequest, CalculatorResponse};

/// Dashboard routes handler
pub struct DashboardRoutes;

impl DashboardRoutes {
    /// Create all dashboard routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .merge(learning::routes())
            .merge(nutrition::routes())
            .merge(training::routes())
            .merge(progress::routes())
            .route_layer(middleware::from_fn_with_state(resources.clone(), require_user))
            .with_state(resources)
    }
}

/// Run achievement evaluation after an activity was recorded
///
/// The activity is already stored, so evaluation failures are logged and
/// reported as no new awards.
async fn award_achievements(resources: &ServerResources, user_id: &str) -> Vec<Achievement> {
    match AchievementEngine::from_resources(resources).evaluate(user_id).await {
        Ok(awarded) => awarded,
        Err(e) => {
            warn!(user.id = %user_id, error = %e, "Achievement evaluation failed");
            Vec::new()
        }
    }
}
