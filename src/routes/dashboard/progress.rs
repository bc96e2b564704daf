// ABOUTME: Dashboard progress photo timeline: register uploads, browse by cursor, compare and delete
// ABOUTME: Photos are always scoped to the caller; another user's photo is indistinguishable from a missing one
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use super::award_achievements;
use crate::auth::AuthenticatedUser;
use crate::database::achievements::Achievement;
use crate::database::progress_photos::{NewProgressPhoto, PhotoComparison, ProgressPhoto};
use crate::enums::Pose;
use crate::errors::AppError;
use crate::pagination::{Cursor, CursorPage, PageParams};
use crate::server::ServerResources;

/// Query parameters for the timeline
#[derive(Debug, Deserialize, Default)]
pub struct PhotoQuery {
    /// Only this pose
    pub pose: Option<String>,
    /// Continue after this cursor
    pub cursor: Option<String>,
    /// Page size
    pub limit: Option<u32>,
}

/// Query parameters for a comparison
#[derive(Debug, Deserialize, Default)]
pub struct CompareQuery {
    /// Pose to compare; defaults to front
    pub pose: Option<String>,
}

/// A registered photo and any achievements it unlocked
#[derive(Debug, Serialize)]
pub struct PhotoCreatedResponse {
    /// The stored photo
    pub photo: ProgressPhoto,
    /// Achievements unlocked by this upload
    pub new_achievements: Vec<Achievement>,
}

pub(super) fn routes() -> Router<Arc<ServerResources>> {
    Router::new()
        .route(
            "/api/progress-photos",
            get(handle_list_photos).post(handle_create_photo),
        )
        .route("/api/progress-photos/compare", get(handle_compare_photos))
        .route("/api/progress-photos/:id", delete(handle_delete_photo))
}

/// Handle POST /api/progress-photos
async fn handle_create_photo(
    State(resources): State<Arc<ServerResources>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(body): Json<NewProgressPhoto>,
) -> Result<(StatusCode, Json<PhotoCreatedResponse>), AppError> {
    let photo = resources
        .database
        .progress_photos()
        .create(&user.user_id, &body, resources.media_prefix())
        .await?;
    let new_achievements = award_achievements(&resources, &user.user_id).await;

    Ok((
        StatusCode::CREATED,
        Json(PhotoCreatedResponse {
            photo,
            new_achievements,
        }),
    ))
}

/// Handle GET /api/progress-photos
async fn handle_list_photos(
    State(resources): State<Arc<ServerResources>>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<PhotoQuery>,
) -> Result<Json<CursorPage<ProgressPhoto>>, AppError> {
    let pose = Pose::parse_filter("pose", query.pose.as_deref())?;
    let cursor = query
        .cursor
        .filter(|c| !c.is_empty())
        .map(Cursor::from);
    let limit = PageParams {
        limit: query.limit,
        offset: None,
    }
    .limit();

    Ok(Json(
        resources
            .database
            .progress_photos()
            .list(&user.user_id, pose, cursor.as_ref(), limit)
            .await?,
    ))
}

/// Handle GET /api/progress-photos/compare
async fn handle_compare_photos(
    State(resources): State<Arc<ServerResources>>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<CompareQuery>,
) -> Result<Json<PhotoComparison>, AppError> {
    let pose = Pose::parse_filter("pose", query.pose.as_deref())?.unwrap_or(Pose::Front);
    Ok(Json(
        resources
            .database
            .progress_photos()
            .compare(&user.user_id, pose)
            .await?,
    ))
}

/// Handle DELETE /api/progress-photos/:id
async fn handle_delete_photo(
    State(resources): State<Arc<ServerResources>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    resources
        .database
        .progress_photos()
        .delete(&user.user_id, &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
