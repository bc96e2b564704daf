// ABOUTME: SQLite connection pool, schema migrations and per-domain manager accessors
// ABOUTME: Timestamps are stored as fixed-width RFC3339 UTC text so they sort lexically
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

//! # Database Management
//!
//! One [`Database`] owns the pool and creates the schema at startup. Each
//! domain has a `*Manager` holding a clone of the pool, obtained through
//! the accessors below, e.g. `database.workouts().get(id)`.

/// Achievements and awards
pub mod achievements;
/// Courses, lessons and lesson progress
pub mod courses;
/// Single-use hashed email tokens
pub mod email_tokens;
/// Exercise catalog
pub mod exercises;
/// Dynamic WHERE clause builder
pub mod filters;
/// Nutrition plans, plan meals and plan selection
pub mod nutrition_plans;
/// Dense child ordering
pub mod positions;
/// Training programs, program workouts and workout logs
pub mod programs;
/// Progress photo timeline
pub mod progress_photos;
/// Recipe catalog
pub mod recipes;
/// Users synced from session claims
pub mod users;
/// Workouts, workout exercises and copy-on-write
pub mod workouts;

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::config::DatabaseUrl;
use crate::errors::{AppError, AppResult};

pub use achievements::AchievementsManager;
pub use courses::CoursesManager;
pub use email_tokens::EmailTokensManager;
pub use exercises::ExercisesManager;
pub use nutrition_plans::NutritionPlansManager;
pub use programs::ProgramsManager;
pub use progress_photos::ProgressPhotosManager;
pub use recipes::RecipesManager;
pub use users::UsersManager;
pub use workouts::WorkoutsManager;

/// Database handle shared by all managers
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect and run migrations
    ///
    /// In-memory databases use a single long-lived connection so every
    /// query sees the same schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the connection fails or a
    /// migration fails
    pub async fn new(database_url: &str) -> AppResult<Self> {
        let url = DatabaseUrl::parse_url(database_url);
        let options = SqliteConnectOptions::from_str(&url.to_connection_string())
            .map_err(|e| AppError::config(format!("Invalid database URL {database_url}: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = if url.is_memory() {
            SqlitePoolOptions::new()
                .min_connections(1)
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            if let DatabaseUrl::SQLite { path } = &url {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        AppError::config(format!(
                            "Cannot create database directory {}: {e}",
                            parent.display()
                        ))
                    })?;
                }
            }
            SqlitePoolOptions::new()
                .max_connections(8)
                .connect_with(options)
                .await?
        };

        let db = Self { pool };
        db.migrate().await?;
        info!(database = %url, "Database ready");
        Ok(db)
    }

    /// Underlying pool
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create every table and index
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails
    pub async fn migrate(&self) -> AppResult<()> {
        self.migrate_users().await?;
        self.migrate_email_tokens().await?;
        self.migrate_courses().await?;
        self.migrate_achievements().await?;
        self.migrate_recipes().await?;
        self.migrate_exercises().await?;
        self.migrate_workouts().await?;
        self.migrate_programs().await?;
        self.migrate_nutrition_plans().await?;
        self.migrate_progress_photos().await?;
        Ok(())
    }

    /// Cheap connectivity check for readiness probes
    ///
    /// # Errors
    ///
    /// Returns a database error when the pool cannot serve a query
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn execute_all(&self, statements: &[&str]) -> AppResult<()> {
        for statement in statements {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Users
    #[must_use]
    pub fn users(&self) -> UsersManager {
        UsersManager::new(self.pool.clone())
    }

    /// Email tokens
    #[must_use]
    pub fn email_tokens(&self) -> EmailTokensManager {
        EmailTokensManager::new(self.pool.clone())
    }

    /// Courses and lessons
    #[must_use]
    pub fn courses(&self) -> CoursesManager {
        CoursesManager::new(self.pool.clone())
    }

    /// Achievements
    #[must_use]
    pub fn achievements(&self) -> AchievementsManager {
        AchievementsManager::new(self.pool.clone())
    }

    /// Recipes
    #[must_use]
    pub fn recipes(&self) -> RecipesManager {
        RecipesManager::new(self.pool.clone())
    }

    /// Exercises
    #[must_use]
    pub fn exercises(&self) -> ExercisesManager {
        ExercisesManager::new(self.pool.clone())
    }

    /// Workouts and workout exercises
    #[must_use]
    pub fn workouts(&self) -> WorkoutsManager {
        WorkoutsManager::new(self.pool.clone())
    }

    /// Training programs
    #[must_use]
    pub fn programs(&self) -> ProgramsManager {
        ProgramsManager::new(self.pool.clone())
    }

    /// Nutrition plans
    #[must_use]
    pub fn nutrition_plans(&self) -> NutritionPlansManager {
        NutritionPlansManager::new(self.pool.clone())
    }

    /// Progress photos
    #[must_use]
    pub fn progress_photos(&self) -> ProgressPhotosManager {
        ProgressPhotosManager::new(self.pool.clone())
    }
}

/// Format a timestamp for storage
#[must_use]
pub fn to_db_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current time formatted for storage
#[must_use]
pub fn now_timestamp() -> String {
    to_db_timestamp(Utc::now())
}

/// Parse a stored timestamp
///
/// # Errors
///
/// Returns an error if the column is not RFC3339
pub fn parse_db_timestamp(value: &str) -> AppResult<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}

/// Decode a JSON array column
///
/// # Errors
///
/// Returns a serialization error if the column holds invalid JSON
pub fn json_column<T: serde::de::DeserializeOwned>(value: &str) -> AppResult<Vec<T>> {
    if value.is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(value)?)
}

/// Fresh identifier for a new row
#[must_use]
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Convert a `u32` count into the `i64` sqlite binds
#[must_use]
pub fn to_i64(value: u32) -> i64 {
    i64::from(value)
}

/// Convert a stored non-negative integer back into `u32`
#[must_use]
pub fn to_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

/// Convert a `COUNT(*)` result into `u64`
#[must_use]
pub fn to_u64(value: i64) -> u64 {
    u64::try_from(value.max(0)).unwrap_or_default()
}
