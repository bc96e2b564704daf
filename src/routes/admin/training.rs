// ABOUTME: Admin CRUD for exercises, workouts, workout exercises, programs and program workouts
// ABOUTME: Workout exercise edits accept a program workout context that triggers copy-on-write
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

//! Training content administration
//!
//! Editing a workout exercise with `program_workout_id` edits the workout
//! as seen from that program slot. If other slots share the workout, the
//! slot gets its own copy first and the response reports `copied: true`
//! with the new `workout_id`.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use super::AdminListQuery;
use crate::database::exercises::{Exercise, ExerciseFilter, ExerciseInput};
use crate::database::programs::{
    AddProgramWorkout, MoveProgramWorkout, Program, ProgramDetail, ProgramFilter, ProgramInput,
    ProgramWorkout,
};
use crate::database::workouts::{
    NewWorkoutExercise, ReorderWorkoutExercises, UpdateWorkoutExercise, Workout, WorkoutDetail,
    WorkoutFilter, WorkoutInput, WorkoutMutation,
};
use crate::enums::{Difficulty, Equipment, MuscleGroup, ProgramGoal};
use crate::errors::AppError;
use crate::pagination::Page;
use crate::server::ServerResources;

/// Program context of a workout exercise removal
#[derive(Debug, Deserialize, Default)]
pub struct ProgramWorkoutContext {
    /// Program workout the edit is made through
    pub program_workout_id: Option<String>,
}

pub(super) fn routes() -> Router<Arc<ServerResources>> {
    Router::new()
        .route(
            "/api/admin/exercises",
            get(handle_list_exercises).post(handle_create_exercise),
        )
        .route(
            "/api/admin/exercises/:id",
            get(handle_get_exercise)
                .put(handle_update_exercise)
                .delete(handle_delete_exercise),
        )
        .route(
            "/api/admin/workouts",
            get(handle_list_workouts).post(handle_create_workout),
        )
        .route(
            "/api/admin/workouts/:id",
            get(handle_get_workout)
                .put(handle_update_workout)
                .delete(handle_delete_workout),
        )
        .route(
            "/api/admin/workout-exercises",
            post(handle_add_workout_exercise),
        )
        .route(
            "/api/admin/workout-exercises/reorder",
            put(handle_reorder_workout_exercises),
        )
        .route(
            "/api/admin/workout-exercises/:id",
            put(handle_update_workout_exercise).delete(handle_remove_workout_exercise),
        )
        .route(
            "/api/admin/programs",
            get(handle_list_programs).post(handle_create_program),
        )
        .route(
            "/api/admin/programs/:id",
            get(handle_get_program)
                .put(handle_update_program)
                .delete(handle_delete_program),
        )
        .route("/api/admin/programs/:id/workouts", post(handle_add_program_workout))
        .route("/api/admin/programs/:id/duplicate", post(handle_duplicate_program))
        .route(
            "/api/admin/program-workouts/:id",
            put(handle_move_program_workout).delete(handle_remove_program_workout),
        )
}

/// Handle GET /api/admin/exercises
async fn handle_list_exercises(
    State(resources): State<Arc<ServerResources>>,
    Query(query): Query<AdminListQuery>,
) -> Result<Json<Page<Exercise>>, AppError> {
    let filter = ExerciseFilter {
        muscle_group: MuscleGroup::parse_filter("muscle_group", query.muscle_group.as_deref())?,
        equipment: Equipment::parse_filter("equipment", query.equipment.as_deref())?,
        difficulty: Difficulty::parse_filter("difficulty", query.difficulty.as_deref())?,
        q: query.q.clone(),
    };
    Ok(Json(
        resources.database.exercises().list(&filter, &query.page()).await?,
    ))
}

/// Handle POST /api/admin/exercises
async fn handle_create_exercise(
    State(resources): State<Arc<ServerResources>>,
    Json(body): Json<ExerciseInput>,
) -> Result<(StatusCode, Json<Exercise>), AppError> {
    let exercise = resources.database.exercises().create(&body).await?;
    Ok((StatusCode::CREATED, Json(exercise)))
}

/// Handle GET /api/admin/exercises/:id
async fn handle_get_exercise(
    State(resources): State<Arc<ServerResources>>,
    Path(id): Path<String>,
) -> Result<Json<Exercise>, AppError> {
    Ok(Json(resources.database.exercises().get(&id).await?))
}

/// Handle PUT /api/admin/exercises/:id
async fn handle_update_exercise(
    State(resources): State<Arc<ServerResources>>,
    Path(id): Path<String>,
    Json(body): Json<ExerciseInput>,
) -> Result<Json<Exercise>, AppError> {
    Ok(Json(resources.database.exercises().update(&id, &body).await?))
}

/// Handle DELETE /api/admin/exercises/:id
async fn handle_delete_exercise(
    State(resources): State<Arc<ServerResources>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    resources.database.exercises().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handle GET /api/admin/workouts
async fn handle_list_workouts(
    State(resources): State<Arc<ServerResources>>,
    Query(query): Query<AdminListQuery>,
) -> Result<Json<Page<Workout>>, AppError> {
    let filter = WorkoutFilter {
        difficulty: Difficulty::parse_filter("difficulty", query.difficulty.as_deref())?,
        q: query.q.clone(),
    };
    Ok(Json(
        resources.database.workouts().list(&filter, &query.page()).await?,
    ))
}

/// Handle POST /api/admin/workouts
async fn handle_create_workout(
    State(resources): State<Arc<ServerResources>>,
    Json(body): Json<WorkoutInput>,
) -> Result<(StatusCode, Json<WorkoutDetail>), AppError> {
    let workout = resources.database.workouts().create(&body).await?;
    Ok((StatusCode::CREATED, Json(workout)))
}

/// Handle GET /api/admin/workouts/:id
async fn handle_get_workout(
    State(resources): State<Arc<ServerResources>>,
    Path(id): Path<String>,
) -> Result<Json<WorkoutDetail>, AppError> {
    Ok(Json(resources.database.workouts().get(&id).await?))
}

/// Handle PUT /api/admin/workouts/:id
async fn handle_update_workout(
    State(resources): State<Arc<ServerResources>>,
    Path(id): Path<String>,
    Json(body): Json<WorkoutInput>,
) -> Result<Json<WorkoutDetail>, AppError> {
    Ok(Json(resources.database.workouts().update(&id, &body).await?))
}

/// Handle DELETE /api/admin/workouts/:id
async fn handle_delete_workout(
    State(resources): State<Arc<ServerResources>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    resources.database.workouts().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handle POST /api/admin/workout-exercises
async fn handle_add_workout_exercise(
    State(resources): State<Arc<ServerResources>>,
    Json(body): Json<NewWorkoutExercise>,
) -> Result<(StatusCode, Json<WorkoutMutation>), AppError> {
    let mutation = resources.database.workouts().add_exercise(&body).await?;
    Ok((StatusCode::CREATED, Json(mutation)))
}

/// Handle PUT /api/admin/workout-exercises/:id
async fn handle_update_workout_exercise(
    State(resources): State<Arc<ServerResources>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateWorkoutExercise>,
) -> Result<Json<WorkoutMutation>, AppError> {
    Ok(Json(
        resources.database.workouts().update_exercise(&id, &body).await?,
    ))
}

/// Handle DELETE /api/admin/workout-exercises/:id
async fn handle_remove_workout_exercise(
    State(resources): State<Arc<ServerResources>>,
    Path(id): Path<String>,
    Query(context): Query<ProgramWorkoutContext>,
) -> Result<Json<WorkoutMutation>, AppError> {
    let program_workout_id = context.program_workout_id.filter(|p| !p.is_empty());
    Ok(Json(
        resources
            .database
            .workouts()
            .remove_exercise(&id, program_workout_id.as_deref())
            .await?,
    ))
}

/// Handle PUT /api/admin/workout-exercises/reorder
async fn handle_reorder_workout_exercises(
    State(resources): State<Arc<ServerResources>>,
    Json(body): Json<ReorderWorkoutExercises>,
) -> Result<Json<WorkoutMutation>, AppError> {
    Ok(Json(
        resources.database.workouts().reorder_exercises(&body).await?,
    ))
}

/// Handle GET /api/admin/programs
async fn handle_list_programs(
    State(resources): State<Arc<ServerResources>>,
    Query(query): Query<AdminListQuery>,
) -> Result<Json<Page<Program>>, AppError> {
    let filter = ProgramFilter {
        published_only: false,
        goal: ProgramGoal::parse_filter("goal", query.goal.as_deref())?,
        difficulty: Difficulty::parse_filter("difficulty", query.difficulty.as_deref())?,
        q: query.q.clone(),
    };
    Ok(Json(
        resources.database.programs().list(&filter, &query.page()).await?,
    ))
}

/// Handle POST /api/admin/programs
async fn handle_create_program(
    State(resources): State<Arc<ServerResources>>,
    Json(body): Json<ProgramInput>,
) -> Result<(StatusCode, Json<Program>), AppError> {
    let program = resources.database.programs().create(&body).await?;
    Ok((StatusCode::CREATED, Json(program)))
}

/// Handle GET /api/admin/programs/:id
async fn handle_get_program(
    State(resources): State<Arc<ServerResources>>,
    Path(id): Path<String>,
) -> Result<Json<ProgramDetail>, AppError> {
    Ok(Json(resources.database.programs().detail(&id).await?))
}

/// Handle PUT /api/admin/programs/:id
async fn handle_update_program(
    State(resources): State<Arc<ServerResources>>,
    Path(id): Path<String>,
    Json(body): Json<ProgramInput>,
) -> Result<Json<Program>, AppError> {
    Ok(Json(resources.database.programs().update(&id, &body).await?))
}

/// Handle DELETE /api/admin/programs/:id
async fn handle_delete_program(
    State(resources): State<Arc<ServerResources>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    resources.database.programs().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handle POST /api/admin/programs/:id/workouts
async fn handle_add_program_workout(
    State(resources): State<Arc<ServerResources>>,
    Path(program_id): Path<String>,
    Json(body): Json<AddProgramWorkout>,
) -> Result<(StatusCode, Json<ProgramWorkout>), AppError> {
    let slot = resources
        .database
        .programs()
        .add_workout(&program_id, &body)
        .await?;
    Ok((StatusCode::CREATED, Json(slot)))
}

/// Handle POST /api/admin/programs/:id/duplicate
async fn handle_duplicate_program(
    State(resources): State<Arc<ServerResources>>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<ProgramDetail>), AppError> {
    let copy = resources.database.programs().duplicate(&id).await?;
    Ok((StatusCode::CREATED, Json(copy)))
}

/// Handle PUT /api/admin/program-workouts/:id
async fn handle_move_program_workout(
    State(resources): State<Arc<ServerResources>>,
    Path(id): Path<String>,
    Json(body): Json<MoveProgramWorkout>,
) -> Result<Json<ProgramWorkout>, AppError> {
    Ok(Json(resources.database.programs().move_workout(&id, body).await?))
}

/// Handle DELETE /api/admin/program-workouts/:id
async fn handle_remove_program_workout(
    State(resources): State<Arc<ServerResources>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    resources.database.programs().remove_workout(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
