// ABOUTME: User rows mirrored from session claims plus the saved calculator profile
// ABOUTME: Handles session upserts, email verification flags and calorie target storage
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use super::{now_timestamp, parse_db_timestamp, to_u32, Database};
use crate::auth::{AuthenticatedUser, UserRole};
use crate::errors::AppResult;
use crate::nutrition::calculator::{ActivityLevel, BodyProfile, CalorieGoal, Sex, AGE_RANGE};

/// A platform user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// Identifier issued by the session library
    pub id: String,
    /// Email address
    pub email: String,
    /// Display name
    pub display_name: Option<String>,
    /// Role from the latest session
    pub role: UserRole,
    /// Whether the email address was confirmed
    pub email_verified: bool,
    /// Saved daily calorie target
    pub daily_calorie_target: Option<u32>,
    /// First seen
    pub created_at: DateTime<Utc>,
    /// Last session sync
    pub updated_at: DateTime<Utc>,
}

impl Database {
    pub(super) async fn migrate_users(&self) -> AppResult<()> {
        self.execute_all(&[
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE COLLATE NOCASE,
                display_name TEXT,
                role TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('user', 'admin')),
                email_verified INTEGER NOT NULL DEFAULT 0,
                sex TEXT,
                birth_year INTEGER,
                height_cm REAL,
                weight_kg REAL,
                activity_level TEXT,
                goal TEXT,
                daily_calorie_target INTEGER,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        ])
        .await
    }
}

/// User database operations
pub struct UsersManager {
    pool: SqlitePool,
}

impl UsersManager {
    /// Create a new users manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or refresh the user row from verified session claims
    ///
    /// Returns `true` when the user was seen for the first time.
    ///
    /// # Errors
    ///
    /// Returns a conflict if another account already owns the email
    pub async fn upsert_from_session(&self, user: &AuthenticatedUser) -> AppResult<bool> {
        let existing: Option<String> = sqlx::query_scalar("SELECT id FROM users WHERE id = $1")
            .bind(&user.user_id)
            .fetch_optional(&self.pool)
            .await?;
        let now = now_timestamp();
        sqlx::query(
            r"
            INSERT INTO users (id, email, display_name, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            ON CONFLICT(id) DO UPDATE SET
                email = excluded.email,
                display_name = COALESCE(excluded.display_name, users.display_name),
                role = excluded.role,
                updated_at = excluded.updated_at
            ",
        )
        .bind(&user.user_id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(existing.is_none())
    }

    /// Get a user by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get(&self, user_id: &str) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_user).transpose()
    }

    /// Get a user by email (case-insensitive)
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = $1 COLLATE NOCASE")
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_user).transpose()
    }

    /// Flag the user's email as verified
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn mark_email_verified(&self, user_id: &str) -> AppResult<()> {
        sqlx::query("UPDATE users SET email_verified = 1, updated_at = $1 WHERE id = $2")
            .bind(now_timestamp())
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Store the calculator profile and resulting daily target
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn save_calculator_profile(
        &self,
        user_id: &str,
        profile: &BodyProfile,
        daily_calorie_target: u32,
    ) -> AppResult<()> {
        let birth_year = Utc::now().year() - i32::try_from(profile.age).unwrap_or(0);
        sqlx::query(
            r"
            UPDATE users SET sex = $1, birth_year = $2, height_cm = $3, weight_kg = $4,
                activity_level = $5, goal = $6, daily_calorie_target = $7, updated_at = $8
            WHERE id = $9
            ",
        )
        .bind(profile.sex.as_str())
        .bind(birth_year)
        .bind(profile.height_cm)
        .bind(profile.weight_kg)
        .bind(profile.activity_level.as_str())
        .bind(profile.goal.as_str())
        .bind(i64::from(daily_calorie_target))
        .bind(now_timestamp())
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Load the saved calculator profile, if one was stored
    ///
    /// Age is derived from the stored birth year.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored enums are unknown
    pub async fn get_calculator_profile(&self, user_id: &str) -> AppResult<Option<BodyProfile>> {
        let row = sqlx::query(
            r"
            SELECT sex, birth_year, height_cm, weight_kg, activity_level, goal
            FROM users WHERE id = $1 AND sex IS NOT NULL
            ",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let sex: String = row.get("sex");
        let birth_year: i64 = row.get("birth_year");
        let activity_level: String = row.get("activity_level");
        let goal: String = row.get("goal");
        let age = to_u32(i64::from(Utc::now().year()) - birth_year).clamp(AGE_RANGE.0, AGE_RANGE.1);

        Ok(Some(BodyProfile {
            sex: Sex::from_db(&sex)?,
            age,
            weight_kg: row.get("weight_kg"),
            height_cm: row.get("height_cm"),
            activity_level: ActivityLevel::from_db(&activity_level)?,
            goal: CalorieGoal::from_db(&goal)?,
        }))
    }
}

fn row_to_user(row: &SqliteRow) -> AppResult<User> {
    let role: String = row.get("role");
    let target: Option<i64> = row.get("daily_calorie_target");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(User {
        id: row.get("id"),
        email: row.get("email"),
        display_name: row.get("display_name"),
        role: UserRole::parse(&role),
        email_verified: row.get("email_verified"),
        daily_calorie_target: target.map(to_u32),
        created_at: parse_db_timestamp(&created_at)?,
        updated_at: parse_db_timestamp(&updated_at)?,
    })
}
