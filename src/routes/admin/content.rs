// ABOUTME: Admin CRUD for courses, their lessons and achievements
// ABOUTME: Lesson order is replaced wholesale by the reorder endpoint
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::AdminListQuery;
use crate::database::achievements::{Achievement, AchievementInput};
use crate::database::courses::{Course, CourseFilter, CourseInput, Lesson, LessonInput};
use crate::enums::Difficulty;
use crate::errors::AppError;
use crate::pagination::Page;
use crate::server::ServerResources;

/// A course with all of its lessons
#[derive(Debug, Serialize)]
pub struct AdminCourseResponse {
    /// The course
    #[serde(flatten)]
    pub course: Course,
    /// Lessons in order
    pub lessons: Vec<Lesson>,
}

/// New lesson order
#[derive(Debug, Deserialize)]
pub struct ReorderLessons {
    /// Every lesson id of the course, in the desired order
    pub lesson_ids: Vec<String>,
}

pub(super) fn routes() -> Router<Arc<ServerResources>> {
    Router::new()
        .route(
            "/api/admin/courses",
            get(handle_list_courses).post(handle_create_course),
        )
        .route(
            "/api/admin/courses/:id",
            get(handle_get_course)
                .put(handle_update_course)
                .delete(handle_delete_course),
        )
        .route("/api/admin/courses/:id/lessons", post(handle_add_lesson))
        .route("/api/admin/courses/:id/lessons/order", put(handle_reorder_lessons))
        .route(
            "/api/admin/lessons/:id",
            put(handle_update_lesson).delete(handle_delete_lesson),
        )
        .route(
            "/api/admin/achievements",
            get(handle_list_achievements).post(handle_create_achievement),
        )
        .route(
            "/api/admin/achievements/:id",
            get(handle_get_achievement)
                .put(handle_update_achievement)
                .delete(handle_delete_achievement),
        )
}

async fn course_with_lessons(
    resources: &ServerResources,
    course: Course,
) -> Result<AdminCourseResponse, AppError> {
    let lessons = resources.database.courses().list_lessons(&course.id).await?;
    Ok(AdminCourseResponse { course, lessons })
}

/// Handle GET /api/admin/courses
async fn handle_list_courses(
    State(resources): State<Arc<ServerResources>>,
    Query(query): Query<AdminListQuery>,
) -> Result<Json<Page<Course>>, AppError> {
    let filter = CourseFilter {
        published_only: false,
        level: Difficulty::parse_filter("difficulty", query.difficulty.as_deref())?,
        q: query.q.clone(),
    };
    Ok(Json(
        resources.database.courses().list(&filter, &query.page()).await?,
    ))
}

/// Handle POST /api/admin/courses
async fn handle_create_course(
    State(resources): State<Arc<ServerResources>>,
    Json(body): Json<CourseInput>,
) -> Result<(StatusCode, Json<AdminCourseResponse>), AppError> {
    let course = resources.database.courses().create(&body).await?;
    Ok((
        StatusCode::CREATED,
        Json(course_with_lessons(&resources, course).await?),
    ))
}

/// Handle GET /api/admin/courses/:id
async fn handle_get_course(
    State(resources): State<Arc<ServerResources>>,
    Path(id): Path<String>,
) -> Result<Json<AdminCourseResponse>, AppError> {
    let course = resources.database.courses().require(&id).await?;
    Ok(Json(course_with_lessons(&resources, course).await?))
}

/// Handle PUT /api/admin/courses/:id
async fn handle_update_course(
    State(resources): State<Arc<ServerResources>>,
    Path(id): Path<String>,
    Json(body): Json<CourseInput>,
) -> Result<Json<AdminCourseResponse>, AppError> {
    let course = resources.database.courses().update(&id, &body).await?;
    Ok(Json(course_with_lessons(&resources, course).await?))
}

/// Handle DELETE /api/admin/courses/:id
async fn handle_delete_course(
    State(resources): State<Arc<ServerResources>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    resources.database.courses().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handle POST /api/admin/courses/:id/lessons
async fn handle_add_lesson(
    State(resources): State<Arc<ServerResources>>,
    Path(course_id): Path<String>,
    Json(body): Json<LessonInput>,
) -> Result<(StatusCode, Json<Lesson>), AppError> {
    let lesson = resources.database.courses().add_lesson(&course_id, &body).await?;
    Ok((StatusCode::CREATED, Json(lesson)))
}

/// Handle PUT /api/admin/courses/:id/lessons/order
async fn handle_reorder_lessons(
    State(resources): State<Arc<ServerResources>>,
    Path(course_id): Path<String>,
    Json(body): Json<ReorderLessons>,
) -> Result<Json<Vec<Lesson>>, AppError> {
    Ok(Json(
        resources
            .database
            .courses()
            .reorder_lessons(&course_id, &body.lesson_ids)
            .await?,
    ))
}

/// Handle PUT /api/admin/lessons/:id
async fn handle_update_lesson(
    State(resources): State<Arc<ServerResources>>,
    Path(id): Path<String>,
    Json(body): Json<LessonInput>,
) -> Result<Json<Lesson>, AppError> {
    Ok(Json(resources.database.courses().update_lesson(&id, &body).await?))
}

/// Handle DELETE /api/admin/lessons/:id
async fn handle_delete_lesson(
    State(resources): State<Arc<ServerResources>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    resources.database.courses().delete_lesson(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handle GET /api/admin/achievements
async fn handle_list_achievements(
    State(resources): State<Arc<ServerResources>>,
) -> Result<Json<Vec<Achievement>>, AppError> {
    Ok(Json(resources.database.achievements().list(false).await?))
}

/// Handle POST /api/admin/achievements
async fn handle_create_achievement(
    State(resources): State<Arc<ServerResources>>,
    Json(body): Json<AchievementInput>,
) -> Result<(StatusCode, Json<Achievement>), AppError> {
    let achievement = resources.database.achievements().create(&body).await?;
    Ok((StatusCode::CREATED, Json(achievement)))
}

/// Handle GET /api/admin/achievements/:id
async fn handle_get_achievement(
    State(resources): State<Arc<ServerResources>>,
    Path(id): Path<String>,
) -> Result<Json<Achievement>, AppError> {
    Ok(Json(resources.database.achievements().get(&id).await?))
}

/// Handle PUT /api/admin/achievements/:id
async fn handle_update_achievement(
    State(resources): State<Arc<ServerResources>>,
    Path(id): Path<String>,
    Json(body): Json<AchievementInput>,
) -> Result<Json<Achievement>, AppError> {
    Ok(Json(
        resources.database.achievements().update(&id, &body).await?,
    ))
}

/// Handle DELETE /api/admin/achievements/:id
async fn handle_delete_achievement(
    State(resources): State<Arc<ServerResources>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    resources.database.achievements().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
