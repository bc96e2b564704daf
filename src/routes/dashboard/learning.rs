// ABOUTME: Dashboard course browsing, lesson completion and achievement listing
// ABOUTME: Completing a lesson records progress and runs achievement evaluation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use super::award_achievements;
use crate::auth::AuthenticatedUser;
use crate::database::achievements::{Achievement, UserAchievement};
use crate::database::courses::{Course, CourseFilter, CourseProgress, Lesson};
use crate::enums::Difficulty;
use crate::errors::AppError;
use crate::pagination::{Page, PageParams};
use crate::server::ServerResources;

/// Query parameters for the course catalog
#[derive(Debug, Deserialize, Default)]
pub struct CourseQuery {
    /// Skill level
    pub level: Option<String>,
    /// Search term
    pub q: Option<String>,
    /// Page size
    pub limit: Option<u32>,
    /// Page offset
    pub offset: Option<u32>,
}

/// A course with its lessons and the caller's completion state
#[derive(Debug, Serialize)]
pub struct CourseDetailResponse {
    /// The course
    #[serde(flatten)]
    pub course: Course,
    /// Lessons in order
    pub lessons: Vec<LessonView>,
    /// Caller's progress
    pub progress: CourseProgress,
}

/// A lesson flagged with the caller's completion
#[derive(Debug, Serialize)]
pub struct LessonView {
    /// The lesson
    #[serde(flatten)]
    pub lesson: Lesson,
    /// Whether the caller completed it
    pub completed: bool,
}

/// Result of completing a lesson
#[derive(Debug, Serialize)]
pub struct LessonCompletedResponse {
    /// Updated course progress
    pub progress: CourseProgress,
    /// Achievements unlocked by this completion
    pub new_achievements: Vec<Achievement>,
}

/// The caller's achievements
#[derive(Debug, Serialize)]
pub struct AchievementsResponse {
    /// Active achievements plus any already earned
    pub achievements: Vec<UserAchievement>,
    /// Sum of points earned
    pub total_points: u32,
}

pub(super) fn routes() -> Router<Arc<ServerResources>> {
    Router::new()
        .route("/api/courses", get(handle_list_courses))
        .route("/api/courses/:course", get(handle_get_course))
        .route(
            "/api/courses/:course/lessons/:lesson_id/complete",
            post(handle_complete_lesson),
        )
        .route("/api/achievements", get(handle_achievements))
}

/// Handle GET /api/courses
async fn handle_list_courses(
    State(resources): State<Arc<ServerResources>>,
    Query(query): Query<CourseQuery>,
) -> Result<Json<Page<Course>>, AppError> {
    let filter = CourseFilter {
        published_only: true,
        level: Difficulty::parse_filter("level", query.level.as_deref())?,
        q: query.q,
    };
    let page = PageParams {
        limit: query.limit,
        offset: query.offset,
    };
    Ok(Json(resources.database.courses().list(&filter, &page).await?))
}

/// Handle GET /api/courses/:slug
///
/// The segment is a slug here and an id for lesson completion; both share one
/// router parameter name.
async fn handle_get_course(
    State(resources): State<Arc<ServerResources>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(slug): Path<String>,
) -> Result<Json<CourseDetailResponse>, AppError> {
    let courses = resources.database.courses();
    let course = courses
        .get_published_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::not_found("Course"))?;
    let completed = courses.completed_lesson_ids(&user.user_id, &course.id).await?;
    let lessons = courses
        .list_lessons(&course.id)
        .await?
        .into_iter()
        .map(|lesson| LessonView {
            completed: completed.contains(&lesson.id),
            lesson,
        })
        .collect();
    let progress = courses.progress(&user.user_id, &course.id).await?;

    Ok(Json(CourseDetailResponse {
        course,
        lessons,
        progress,
    }))
}

/// Handle POST /api/courses/:id/lessons/:lesson_id/complete
async fn handle_complete_lesson(
    State(resources): State<Arc<ServerResources>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path((course_id, lesson_id)): Path<(String, String)>,
) -> Result<Json<LessonCompletedResponse>, AppError> {
    let courses = resources.database.courses();
    if !courses.require(&course_id).await?.is_published {
        return Err(AppError::not_found("Course"));
    }
    let progress = courses
        .complete_lesson(&user.user_id, &course_id, &lesson_id)
        .await?;
    let new_achievements = award_achievements(&resources, &user.user_id).await;

    Ok(Json(LessonCompletedResponse {
        progress,
        new_achievements,
    }))
}

/// Handle GET /api/achievements
async fn handle_achievements(
    State(resources): State<Arc<ServerResources>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<AchievementsResponse>, AppError> {
    let (achievements, total_points) = resources
        .database
        .achievements()
        .for_user(&user.user_id)
        .await?;
    Ok(Json(AchievementsResponse {
        achievements,
        total_points,
    }))
}
