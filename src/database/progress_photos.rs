// ABOUTME: Per-user progress photo timeline with keyset pagination and first/last comparison
// ABOUTME: Photos are only ever visible to their owner; other users see not found
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

use chrono::{DateTime, Duration, Utc};
use fithub_core::pagination::{Cursor, CursorPage, CursorPosition};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use super::filters::Filters;
use super::{new_id, now_timestamp, parse_db_timestamp, to_db_timestamp, Database};
use crate::enums::Pose;
use crate::errors::{AppError, AppResult};
use crate::nutrition::scaling::round2;
use crate::utils::validation::{in_range, optional_text, storage_url};

/// Clock skew tolerated when checking that a photo is not from the future
const FUTURE_SKEW_MINUTES: i64 = 5;

/// A progress photo
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressPhoto {
    /// Unique identifier
    pub id: String,
    /// Owner
    pub user_id: String,
    /// Object storage URL
    pub image_url: String,
    /// Body pose
    pub pose: Pose,
    /// When the photo was taken
    pub taken_at: DateTime<Utc>,
    /// Body weight that day
    pub weight_kg: Option<f64>,
    /// Body fat estimate
    pub body_fat_percent: Option<f64>,
    /// Free-form notes
    pub notes: Option<String>,
    /// Upload time
    pub created_at: DateTime<Utc>,
}

/// Upload form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProgressPhoto {
    /// Object storage URL
    pub image_url: String,
    /// Body pose
    pub pose: Pose,
    /// When the photo was taken; now when absent
    #[serde(default)]
    pub taken_at: Option<DateTime<Utc>>,
    /// Body weight that day
    #[serde(default)]
    pub weight_kg: Option<f64>,
    /// Body fat estimate
    #[serde(default)]
    pub body_fat_percent: Option<f64>,
    /// Free-form notes
    #[serde(default)]
    pub notes: Option<String>,
}

/// Earliest and latest photo of one pose
#[derive(Debug, Clone, Serialize)]
pub struct PhotoComparison {
    /// Compared pose
    pub pose: Pose,
    /// Photos of this pose
    pub photo_count: u64,
    /// Oldest photo
    pub earliest: Option<ProgressPhoto>,
    /// Newest photo
    pub latest: Option<ProgressPhoto>,
    /// Latest minus earliest weight, when both were recorded
    pub weight_change_kg: Option<f64>,
    /// Whole days between the two photos
    pub days_between: Option<i64>,
}

impl Database {
    pub(super) async fn migrate_progress_photos(&self) -> AppResult<()> {
        self.execute_all(&[
            r"
            CREATE TABLE IF NOT EXISTS progress_photos (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                image_url TEXT NOT NULL,
                pose TEXT NOT NULL,
                taken_at TEXT NOT NULL,
                weight_kg REAL,
                body_fat_percent REAL,
                notes TEXT,
                created_at TEXT NOT NULL
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_progress_photos_timeline ON progress_photos(user_id, taken_at DESC, id DESC)",
        ])
        .await
    }
}

/// Progress photo database operations
pub struct ProgressPhotosManager {
    pool: SqlitePool,
}

impl ProgressPhotosManager {
    /// Create a new progress photos manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record an uploaded photo
    ///
    /// `media_prefix` is the configured public storage base URL, if any.
    ///
    /// # Errors
    ///
    /// Returns invalid input for a non-https or foreign URL, a future
    /// `taken_at` or out of range measurements
    pub async fn create(
        &self,
        user_id: &str,
        input: &NewProgressPhoto,
        media_prefix: Option<&str>,
    ) -> AppResult<ProgressPhoto> {
        let image_url = storage_url("image_url", &input.image_url, media_prefix)?;
        let now = Utc::now();
        let taken_at = input.taken_at.unwrap_or(now);
        if taken_at > now + Duration::minutes(FUTURE_SKEW_MINUTES) {
            return Err(AppError::invalid_input("taken_at cannot be in the future"));
        }
        let weight_kg = input
            .weight_kg
            .map(|w| in_range("weight_kg", w, 20.0, 400.0))
            .transpose()?;
        let body_fat_percent = input
            .body_fat_percent
            .map(|b| in_range("body_fat_percent", b, 3.0, 60.0))
            .transpose()?;

        let id = new_id();
        sqlx::query(
            r"
            INSERT INTO progress_photos (id, user_id, image_url, pose, taken_at, weight_kg,
                                         body_fat_percent, notes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(&id)
        .bind(user_id)
        .bind(&image_url)
        .bind(input.pose.as_str())
        .bind(to_db_timestamp(taken_at))
        .bind(weight_kg)
        .bind(body_fat_percent)
        .bind(optional_text("notes", input.notes.as_deref())?)
        .bind(now_timestamp())
        .execute(&self.pool)
        .await?;
        self.get(user_id, &id).await
    }

    /// Get one of the user's photos
    ///
    /// # Errors
    ///
    /// Returns not found for unknown photos and photos of other users
    pub async fn get(&self, user_id: &str, id: &str) -> AppResult<ProgressPhoto> {
        sqlx::query("SELECT * FROM progress_photos WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(row_to_photo)
            .transpose()?
            .ok_or_else(|| AppError::not_found("Progress photo"))
    }

    /// The user's photos newest first, continuing after `cursor`
    ///
    /// # Errors
    ///
    /// Returns invalid input for a malformed cursor
    pub async fn list(
        &self,
        user_id: &str,
        pose: Option<Pose>,
        cursor: Option<&Cursor>,
        limit: u32,
    ) -> AppResult<CursorPage<ProgressPhoto>> {
        let mut filters = Filters::new();
        filters.push_text("user_id = ?", user_id);
        if let Some(pose) = pose {
            filters.push_text("pose = ?", pose.as_str());
        }
        if let Some(cursor) = cursor {
            let after = cursor.position()?;
            filters.push_before("taken_at", "id", to_db_timestamp(after.at), after.id);
        }

        // One extra row tells whether another page exists
        let sql = format!(
            "SELECT * FROM progress_photos {} ORDER BY taken_at DESC, id DESC LIMIT ?",
            filters.where_clause()
        );
        let rows = filters
            .bind(sqlx::query(&sql))
            .bind(i64::from(limit) + 1)
            .fetch_all(&self.pool)
            .await?;
        let items = rows.iter().map(row_to_photo).collect::<AppResult<Vec<_>>>()?;
        Ok(CursorPage::from_overfetch(
            items,
            usize::try_from(limit).unwrap_or(usize::MAX),
            |photo| CursorPosition::new(photo.taken_at, photo.id.as_str()),
        ))
    }

    /// Compare the user's first and latest photo of a pose
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails
    pub async fn compare(&self, user_id: &str, pose: Pose) -> AppResult<PhotoComparison> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM progress_photos WHERE user_id = $1 AND pose = $2")
                .bind(user_id)
                .bind(pose.as_str())
                .fetch_one(&self.pool)
                .await?;
        let earliest = self.edge(user_id, pose, "ASC").await?;
        let latest = self.edge(user_id, pose, "DESC").await?;

        let (weight_change_kg, days_between) = match (&earliest, &latest) {
            (Some(first), Some(last)) => (
                first
                    .weight_kg
                    .zip(last.weight_kg)
                    .map(|(from, to)| round2(to - from)),
                Some((last.taken_at - first.taken_at).num_days()),
            ),
            _ => (None, None),
        };

        Ok(PhotoComparison {
            pose,
            photo_count: super::to_u64(count),
            earliest,
            latest,
            weight_change_kg,
            days_between,
        })
    }

    async fn edge(
        &self,
        user_id: &str,
        pose: Pose,
        direction: &'static str,
    ) -> AppResult<Option<ProgressPhoto>> {
        let sql = format!(
            "SELECT * FROM progress_photos WHERE user_id = $1 AND pose = $2 ORDER BY taken_at {direction}, id {direction} LIMIT 1"
        );
        sqlx::query(&sql)
            .bind(user_id)
            .bind(pose.as_str())
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(row_to_photo)
            .transpose()
    }

    /// Delete one of the user's photos
    ///
    /// # Errors
    ///
    /// Returns not found for unknown photos and photos of other users
    pub async fn delete(&self, user_id: &str, id: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM progress_photos WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Progress photo"));
        }
        Ok(())
    }
}

fn row_to_photo(row: &SqliteRow) -> AppResult<ProgressPhoto> {
    let pose: String = row.get("pose");
    let taken_at: String = row.get("taken_at");
    let created_at: String = row.get("created_at");
    Ok(ProgressPhoto {
        id: row.get("id"),
        user_id: row.get("user_id"),
        image_url: row.get("image_url"),
        pose: Pose::from_db(&pose)?,
        taken_at: parse_db_timestamp(&taken_at)?,
        weight_kg: row.get("weight_kg"),
        body_fat_percent: row.get("body_fat_percent"),
        notes: row.get("notes"),
        created_at: parse_db_timestamp(&created_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthenticatedUser, UserRole};

    async fn setup() -> (Database, String) {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let user = AuthenticatedUser {
            user_id: "user-1".to_owned(),
            email: "ana@example.com".to_owned(),
            name: None,
            role: UserRole::User,
        };
        db.users().upsert_from_session(&user).await.unwrap();
        (db, user.user_id)
    }

    fn photo(days_ago: i64, weight: f64) -> NewProgressPhoto {
        NewProgressPhoto {
            image_url: format!("https://cdn.example.com/u/{days_ago}.jpg"),
            pose: Pose::Front,
            taken_at: Some(Utc::now() - Duration::days(days_ago)),
            weight_kg: Some(weight),
            body_fat_percent: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_validation() {
        let (db, user_id) = setup().await;
        let photos = db.progress_photos();

        let mut http = photo(1, 80.0);
        http.image_url = "http://cdn.example.com/a.jpg".to_owned();
        assert!(photos.create(&user_id, &http, None).await.is_err());

        let foreign = photo(1, 80.0);
        assert!(photos
            .create(&user_id, &foreign, Some("https://media.fithub.test/"))
            .await
            .is_err());

        let mut future = photo(0, 80.0);
        future.taken_at = Some(Utc::now() + Duration::days(1));
        assert!(photos.create(&user_id, &future, None).await.is_err());

        let mut lean = photo(1, 80.0);
        lean.body_fat_percent = Some(2.0);
        assert!(photos.create(&user_id, &lean, None).await.is_err());
    }

    #[tokio::test]
    async fn test_cursor_pages_and_compare() {
        let (db, user_id) = setup().await;
        let photos = db.progress_photos();
        for (days_ago, weight) in [(30, 84.0), (20, 82.5), (10, 81.0)] {
            photos.create(&user_id, &photo(days_ago, weight), None).await.unwrap();
        }

        let first = photos.list(&user_id, None, None, 2).await.unwrap();
        assert_eq!(first.items.len(), 2);
        assert!(first.has_more);
        assert!((first.items[0].weight_kg.unwrap() - 81.0).abs() < f64::EPSILON);

        let second = photos
            .list(&user_id, None, first.next_cursor.as_ref(), 2)
            .await
            .unwrap();
        assert_eq!(second.items.len(), 1);
        assert!(!second.has_more);
        assert!(second.next_cursor.is_none());

        let comparison = photos.compare(&user_id, Pose::Front).await.unwrap();
        assert_eq!(comparison.photo_count, 3);
        assert_eq!(comparison.weight_change_kg, Some(-3.0));
        assert_eq!(comparison.days_between, Some(20));

        let bad = Cursor::from("%%%".to_owned());
        assert!(photos.list(&user_id, None, Some(&bad), 2).await.is_err());
    }

    #[tokio::test]
    async fn test_other_users_photos_are_not_found() {
        let (db, user_id) = setup().await;
        let created = db
            .progress_photos()
            .create(&user_id, &photo(1, 80.0), None)
            .await
            .unwrap();
        assert!(db.progress_photos().delete("someone-else", &created.id).await.is_err());
        db.progress_photos().delete(&user_id, &created.id).await.unwrap();
    }
}
