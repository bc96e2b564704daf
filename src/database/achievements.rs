// ABOUTME: Achievement definitions, per-user awards and the activity metrics they are checked against
// ABOUTME: Awards are unique per user and achievement and inserted idempotently
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use super::{new_id, now_timestamp, parse_db_timestamp, to_u32, Database};
use crate::enums::AchievementCriteria;
use crate::errors::{AppError, AppResult};
use crate::utils::validation::{in_range, optional_url, require_title, text};

/// An achievement users can unlock
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Achievement {
    /// Unique identifier
    pub id: String,
    /// Unique name
    pub name: String,
    /// Description
    pub description: String,
    /// Badge icon
    pub icon_url: Option<String>,
    /// Points granted
    pub points: u32,
    /// Metric checked
    pub criteria: AchievementCriteria,
    /// Metric value required
    pub threshold: u32,
    /// Whether new awards are granted
    pub is_active: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Admin form for an achievement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementInput {
    /// Unique name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Badge icon
    #[serde(default)]
    pub icon_url: Option<String>,
    /// Points granted
    #[serde(default)]
    pub points: u32,
    /// Metric checked
    pub criteria: AchievementCriteria,
    /// Metric value required (at least 1)
    pub threshold: u32,
    /// Whether new awards are granted
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

/// Activity counts of one user
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserMetrics {
    /// Logged workout completions
    pub workouts_completed: u32,
    /// Courses with every lesson completed
    pub courses_completed: u32,
    /// Lessons completed
    pub lessons_completed: u32,
    /// Progress photos registered
    pub progress_photos_uploaded: u32,
}

impl UserMetrics {
    /// Value of the metric an achievement checks
    #[must_use]
    pub const fn value(&self, criteria: AchievementCriteria) -> u32 {
        match criteria {
            AchievementCriteria::WorkoutsCompleted => self.workouts_completed,
            AchievementCriteria::CoursesCompleted => self.courses_completed,
            AchievementCriteria::LessonsCompleted => self.lessons_completed,
            AchievementCriteria::ProgressPhotosUploaded => self.progress_photos_uploaded,
        }
    }
}

/// An achievement with the user's award state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAchievement {
    /// The achievement
    #[serde(flatten)]
    pub achievement: Achievement,
    /// When the user earned it
    pub earned_at: Option<DateTime<Utc>>,
}

impl Database {
    pub(super) async fn migrate_achievements(&self) -> AppResult<()> {
        self.execute_all(&[
            r"
            CREATE TABLE IF NOT EXISTS achievements (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE COLLATE NOCASE,
                description TEXT NOT NULL DEFAULT '',
                icon_url TEXT,
                points INTEGER NOT NULL DEFAULT 0,
                criteria TEXT NOT NULL,
                threshold INTEGER NOT NULL CHECK (threshold >= 1),
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
            r"
            CREATE TABLE IF NOT EXISTS user_achievements (
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                achievement_id TEXT NOT NULL REFERENCES achievements(id) ON DELETE CASCADE,
                earned_at TEXT NOT NULL,
                PRIMARY KEY (user_id, achievement_id)
            )
            ",
        ])
        .await
    }
}

/// Achievement database operations
pub struct AchievementsManager {
    pool: SqlitePool,
}

impl AchievementsManager {
    /// Create a new achievements manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn validate(input: &AchievementInput) -> AppResult<(String, String, Option<String>)> {
        in_range("threshold", input.threshold, 1, 1_000_000)?;
        in_range("points", input.points, 0, 1_000_000)?;
        Ok((
            require_title("name", &input.name)?,
            text("description", input.description.as_deref())?,
            optional_url("icon_url", input.icon_url.as_deref())?,
        ))
    }

    /// Create an achievement
    ///
    /// # Errors
    ///
    /// Returns invalid input for bad fields and a conflict for a taken name
    pub async fn create(&self, input: &AchievementInput) -> AppResult<Achievement> {
        let (name, description, icon_url) = Self::validate(input)?;
        let id = new_id();
        sqlx::query(
            r"
            INSERT INTO achievements (id, name, description, icon_url, points, criteria,
                                      threshold, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            ",
        )
        .bind(&id)
        .bind(&name)
        .bind(&description)
        .bind(&icon_url)
        .bind(i64::from(input.points))
        .bind(input.criteria.as_str())
        .bind(i64::from(input.threshold))
        .bind(input.is_active)
        .bind(now_timestamp())
        .execute(&self.pool)
        .await?;
        self.get(&id).await
    }

    /// Get an achievement
    ///
    /// # Errors
    ///
    /// Returns not found when it does not exist
    pub async fn get(&self, id: &str) -> AppResult<Achievement> {
        sqlx::query("SELECT * FROM achievements WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(row_to_achievement)
            .transpose()?
            .ok_or_else(|| AppError::not_found("Achievement"))
    }

    /// Every achievement, grouped by criteria then threshold
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list(&self, active_only: bool) -> AppResult<Vec<Achievement>> {
        let sql = if active_only {
            "SELECT * FROM achievements WHERE is_active = 1 ORDER BY criteria, threshold, name"
        } else {
            "SELECT * FROM achievements ORDER BY criteria, threshold, name"
        };
        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_achievement).collect()
    }

    /// Replace an achievement's fields
    ///
    /// # Errors
    ///
    /// Returns not found, invalid input or a name conflict
    pub async fn update(&self, id: &str, input: &AchievementInput) -> AppResult<Achievement> {
        let (name, description, icon_url) = Self::validate(input)?;
        let result = sqlx::query(
            r"
            UPDATE achievements SET name = $1, description = $2, icon_url = $3, points = $4,
                criteria = $5, threshold = $6, is_active = $7, updated_at = $8
            WHERE id = $9
            ",
        )
        .bind(&name)
        .bind(&description)
        .bind(&icon_url)
        .bind(i64::from(input.points))
        .bind(input.criteria.as_str())
        .bind(i64::from(input.threshold))
        .bind(input.is_active)
        .bind(now_timestamp())
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Achievement"));
        }
        self.get(id).await
    }

    /// Delete an achievement and its awards
    ///
    /// # Errors
    ///
    /// Returns not found when it does not exist
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM achievements WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Achievement"));
        }
        Ok(())
    }

    /// Count the user's activity for every criteria
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn metrics(&self, user_id: &str) -> AppResult<UserMetrics> {
        let row = sqlx::query(
            r"
            SELECT
                (SELECT COUNT(*) FROM workout_logs WHERE user_id = $1) AS workouts_completed,
                (SELECT COUNT(*) FROM lesson_progress WHERE user_id = $1) AS lessons_completed,
                (SELECT COUNT(*) FROM progress_photos WHERE user_id = $1) AS progress_photos_uploaded,
                (SELECT COUNT(*) FROM courses c
                 WHERE EXISTS (SELECT 1 FROM lessons l WHERE l.course_id = c.id)
                   AND NOT EXISTS (
                       SELECT 1 FROM lessons l
                       WHERE l.course_id = c.id
                         AND NOT EXISTS (
                             SELECT 1 FROM lesson_progress p
                             WHERE p.lesson_id = l.id AND p.user_id = $1
                         )
                   )
                ) AS courses_completed
            ",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(UserMetrics {
            workouts_completed: to_u32(row.get("workouts_completed")),
            courses_completed: to_u32(row.get("courses_completed")),
            lessons_completed: to_u32(row.get("lessons_completed")),
            progress_photos_uploaded: to_u32(row.get("progress_photos_uploaded")),
        })
    }

    /// Achievement ids the user holds with their award time
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn earned(&self, user_id: &str) -> AppResult<HashMap<String, DateTime<Utc>>> {
        let rows = sqlx::query("SELECT achievement_id, earned_at FROM user_achievements WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| {
                let earned_at: String = row.get("earned_at");
                Ok((row.get("achievement_id"), parse_db_timestamp(&earned_at)?))
            })
            .collect()
    }

    /// Award an achievement; returns whether this call created the award
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn award(&self, user_id: &str, achievement_id: &str) -> AppResult<bool> {
        let result = sqlx::query(
            r"
            INSERT OR IGNORE INTO user_achievements (user_id, achievement_id, earned_at)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(user_id)
        .bind(achievement_id)
        .bind(now_timestamp())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Active achievements with the user's award state, plus the user's total points
    ///
    /// Points count every earned achievement, including ones deactivated since.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails
    pub async fn for_user(&self, user_id: &str) -> AppResult<(Vec<UserAchievement>, u32)> {
        let earned = self.earned(user_id).await?;
        let achievements = self.list(false).await?;

        let total_points = achievements
            .iter()
            .filter(|a| earned.contains_key(&a.id))
            .map(|a| a.points)
            .sum();

        let items = achievements
            .into_iter()
            .filter(|a| a.is_active || earned.contains_key(&a.id))
            .map(|achievement| UserAchievement {
                earned_at: earned.get(&achievement.id).copied(),
                achievement,
            })
            .collect();

        Ok((items, total_points))
    }
}

fn row_to_achievement(row: &SqliteRow) -> AppResult<Achievement> {
    let criteria: String = row.get("criteria");
    let points: i64 = row.get("points");
    let threshold: i64 = row.get("threshold");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(Achievement {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        icon_url: row.get("icon_url"),
        points: to_u32(points),
        criteria: AchievementCriteria::from_db(&criteria)?,
        threshold: to_u32(threshold),
        is_active: row.get("is_active"),
        created_at: parse_db_timestamp(&created_at)?,
        updated_at: parse_db_timestamp(&updated_at)?,
    })
}
