// ABOUTME: Dashboard exercise library, published training programs and workout completion
// ABOUTME: Program schedules are grouped by week then day; completions feed achievement evaluation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use super::award_achievements;
use crate::auth::AuthenticatedUser;
use crate::database::achievements::Achievement;
use crate::database::exercises::{Exercise, ExerciseFilter};
use crate::database::programs::{CompleteWorkout, Program, ProgramFilter, ProgramSchedule, WorkoutLog};
use crate::enums::{Difficulty, Equipment, MuscleGroup, ProgramGoal};
use crate::errors::AppError;
use crate::pagination::{Page, PageParams};
use crate::server::ServerResources;

/// Query parameters for the exercise library
#[derive(Debug, Deserialize, Default)]
pub struct ExerciseQuery {
    /// Muscle group
    pub muscle_group: Option<String>,
    /// Equipment
    pub equipment: Option<String>,
    /// Difficulty
    pub difficulty: Option<String>,
    /// Search term
    pub q: Option<String>,
    /// Page size
    pub limit: Option<u32>,
    /// Page offset
    pub offset: Option<u32>,
}

/// Query parameters for the program catalog
#[derive(Debug, Deserialize, Default)]
pub struct ProgramQuery {
    /// Training goal
    pub goal: Option<String>,
    /// Difficulty
    pub difficulty: Option<String>,
    /// Search term
    pub q: Option<String>,
    /// Page size
    pub limit: Option<u32>,
    /// Page offset
    pub offset: Option<u32>,
}

/// A logged workout and any achievements it unlocked
#[derive(Debug, Serialize)]
pub struct WorkoutCompletedResponse {
    /// The log entry
    pub log: WorkoutLog,
    /// Achievements unlocked by this completion
    pub new_achievements: Vec<Achievement>,
}

pub(super) fn routes() -> Router<Arc<ServerResources>> {
    Router::new()
        .route("/api/exercises", get(handle_list_exercises))
        .route("/api/programs", get(handle_list_programs))
        .route("/api/programs/:slug", get(handle_get_program))
        .route("/api/workouts/:id/complete", post(handle_complete_workout))
}

/// Handle GET /api/exercises
async fn handle_list_exercises(
    State(resources): State<Arc<ServerResources>>,
    Query(query): Query<ExerciseQuery>,
) -> Result<Json<Page<Exercise>>, AppError> {
    let filter = ExerciseFilter {
        muscle_group: MuscleGroup::parse_filter("muscle_group", query.muscle_group.as_deref())?,
        equipment: Equipment::parse_filter("equipment", query.equipment.as_deref())?,
        difficulty: Difficulty::parse_filter("difficulty", query.difficulty.as_deref())?,
        q: query.q,
    };
    let page = PageParams {
        limit: query.limit,
        offset: query.offset,
    };
    Ok(Json(resources.database.exercises().list(&filter, &page).await?))
}

/// Handle GET /api/programs
async fn handle_list_programs(
    State(resources): State<Arc<ServerResources>>,
    Query(query): Query<ProgramQuery>,
) -> Result<Json<Page<Program>>, AppError> {
    let filter = ProgramFilter {
        published_only: true,
        goal: ProgramGoal::parse_filter("goal", query.goal.as_deref())?,
        difficulty: Difficulty::parse_filter("difficulty", query.difficulty.as_deref())?,
        q: query.q,
    };
    let page = PageParams {
        limit: query.limit,
        offset: query.offset,
    };
    Ok(Json(resources.database.programs().list(&filter, &page).await?))
}

/// Handle GET /api/programs/:slug
async fn handle_get_program(
    State(resources): State<Arc<ServerResources>>,
    Path(slug): Path<String>,
) -> Result<Json<ProgramSchedule>, AppError> {
    Ok(Json(resources.database.programs().schedule_by_slug(&slug).await?))
}

/// Handle POST /api/workouts/:id/complete
async fn handle_complete_workout(
    State(resources): State<Arc<ServerResources>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(workout_id): Path<String>,
    body: Option<Json<CompleteWorkout>>,
) -> Result<(StatusCode, Json<WorkoutCompletedResponse>), AppError> {
    let request = body.map(|Json(b)| b).unwrap_or_default();
    let log = resources
        .database
        .programs()
        .log_completion(&user.user_id, &workout_id, &request)
        .await?;
    let new_achievements = award_achievements(&resources, &user.user_id).await;

    Ok((
        StatusCode::CREATED,
        Json(WorkoutCompletedResponse {
            log,
            new_achievements,
        }),
    ))
}
