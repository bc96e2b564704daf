// ABOUTME: Exercise catalog operations with muscle group, equipment and difficulty filters
// ABOUTME: Exercises referenced by any workout cannot be deleted
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

use chrono::{DateTime, Utc};
use fithub_core::pagination::{Page, PageParams};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use super::filters::Filters;
use super::{json_column, new_id, now_timestamp, parse_db_timestamp, to_u64, Database};
use crate::enums::{Difficulty, Equipment, MuscleGroup};
use crate::errors::{AppError, AppResult};
use crate::utils::validation::{clean_list, optional_url, require_title, text};

/// A catalog exercise
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Exercise {
    /// Unique identifier
    pub id: String,
    /// Unique name
    pub name: String,
    /// Description
    pub description: String,
    /// Primary muscle group
    pub muscle_group: MuscleGroup,
    /// Equipment needed
    pub equipment: Equipment,
    /// Skill level
    pub difficulty: Difficulty,
    /// Demonstration video
    pub video_url: Option<String>,
    /// Illustration
    pub image_url: Option<String>,
    /// Step-by-step cues
    pub instructions: Vec<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Admin form for an exercise
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseInput {
    /// Unique name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Primary muscle group
    pub muscle_group: MuscleGroup,
    /// Equipment needed
    pub equipment: Equipment,
    /// Skill level
    pub difficulty: Difficulty,
    /// Demonstration video
    #[serde(default)]
    pub video_url: Option<String>,
    /// Illustration
    #[serde(default)]
    pub image_url: Option<String>,
    /// Step-by-step cues
    #[serde(default)]
    pub instructions: Vec<String>,
}

/// Exercise list filter
#[derive(Debug, Clone, Default)]
pub struct ExerciseFilter {
    /// Muscle group
    pub muscle_group: Option<MuscleGroup>,
    /// Equipment
    pub equipment: Option<Equipment>,
    /// Difficulty
    pub difficulty: Option<Difficulty>,
    /// Name or description search
    pub q: Option<String>,
}

impl Database {
    pub(super) async fn migrate_exercises(&self) -> AppResult<()> {
        self.execute_all(&[
            r"
            CREATE TABLE IF NOT EXISTS exercises (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE COLLATE NOCASE,
                description TEXT NOT NULL DEFAULT '',
                muscle_group TEXT NOT NULL,
                equipment TEXT NOT NULL,
                difficulty TEXT NOT NULL,
                video_url TEXT,
                image_url TEXT,
                instructions TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_exercises_muscle ON exercises(muscle_group)",
        ])
        .await
    }
}

/// Exercise database operations
pub struct ExercisesManager {
    pool: SqlitePool,
}

impl ExercisesManager {
    /// Create a new exercises manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an exercise
    ///
    /// # Errors
    ///
    /// Returns invalid input for bad fields and a conflict for a taken name
    pub async fn create(&self, input: &ExerciseInput) -> AppResult<Exercise> {
        let id = new_id();
        sqlx::query(
            r"
            INSERT INTO exercises (id, name, description, muscle_group, equipment, difficulty,
                                   video_url, image_url, instructions, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
            ",
        )
        .bind(&id)
        .bind(require_title("name", &input.name)?)
        .bind(text("description", input.description.as_deref())?)
        .bind(input.muscle_group.as_str())
        .bind(input.equipment.as_str())
        .bind(input.difficulty.as_str())
        .bind(optional_url("video_url", input.video_url.as_deref())?)
        .bind(optional_url("image_url", input.image_url.as_deref())?)
        .bind(serde_json::to_string(&clean_list(input.instructions.clone()))?)
        .bind(now_timestamp())
        .execute(&self.pool)
        .await?;
        self.get(&id).await
    }

    /// Get an exercise
    ///
    /// # Errors
    ///
    /// Returns not found when it does not exist
    pub async fn get(&self, id: &str) -> AppResult<Exercise> {
        sqlx::query("SELECT * FROM exercises WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(row_to_exercise)
            .transpose()?
            .ok_or_else(|| AppError::not_found("Exercise"))
    }

    /// Number of catalog exercises
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn count(&self) -> AppResult<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM exercises")
            .fetch_one(&self.pool)
            .await?;
        Ok(to_u64(count))
    }

    /// List exercises alphabetically
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list(&self, filter: &ExerciseFilter, page: &PageParams) -> AppResult<Page<Exercise>> {
        let mut filters = Filters::new();
        if let Some(muscle_group) = filter.muscle_group {
            filters.push_text("muscle_group = ?", muscle_group.as_str());
        }
        if let Some(equipment) = filter.equipment {
            filters.push_text("equipment = ?", equipment.as_str());
        }
        if let Some(difficulty) = filter.difficulty {
            filters.push_text("difficulty = ?", difficulty.as_str());
        }
        filters.push_search(&["name", "description"], filter.q.as_deref());
        let where_clause = filters.where_clause();

        let count_sql = format!("SELECT COUNT(*) FROM exercises {where_clause}");
        let (total,): (i64,) = filters
            .bind_as(sqlx::query_as(&count_sql))
            .fetch_one(&self.pool)
            .await?;

        let list_sql = format!(
            "SELECT * FROM exercises {where_clause} ORDER BY name COLLATE NOCASE, id LIMIT ? OFFSET ?"
        );
        let rows = filters
            .bind(sqlx::query(&list_sql))
            .bind(i64::from(page.limit()))
            .bind(i64::from(page.offset()))
            .fetch_all(&self.pool)
            .await?;
        let items = rows.iter().map(row_to_exercise).collect::<AppResult<Vec<_>>>()?;
        Ok(Page::new(items, to_u64(total), page))
    }

    /// Replace an exercise's fields
    ///
    /// # Errors
    ///
    /// Returns not found, invalid input or a name conflict
    pub async fn update(&self, id: &str, input: &ExerciseInput) -> AppResult<Exercise> {
        let result = sqlx::query(
            r"
            UPDATE exercises SET name = $1, description = $2, muscle_group = $3, equipment = $4,
                difficulty = $5, video_url = $6, image_url = $7, instructions = $8, updated_at = $9
            WHERE id = $10
            ",
        )
        .bind(require_title("name", &input.name)?)
        .bind(text("description", input.description.as_deref())?)
        .bind(input.muscle_group.as_str())
        .bind(input.equipment.as_str())
        .bind(input.difficulty.as_str())
        .bind(optional_url("video_url", input.video_url.as_deref())?)
        .bind(optional_url("image_url", input.image_url.as_deref())?)
        .bind(serde_json::to_string(&clean_list(input.instructions.clone()))?)
        .bind(now_timestamp())
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Exercise"));
        }
        self.get(id).await
    }

    /// Delete an exercise no workout uses
    ///
    /// # Errors
    ///
    /// Returns not found, or resource in use while workouts reference it
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let (uses,): (i64,) = sqlx::query_as(
            "SELECT COUNT(DISTINCT workout_id) FROM workout_exercises WHERE exercise_id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        if uses > 0 {
            return Err(AppError::resource_in_use(format!(
                "Exercise is used by {uses} workout(s)"
            ))
            .with_details(serde_json::json!({ "workouts": uses })));
        }
        let result = sqlx::query("DELETE FROM exercises WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Exercise"));
        }
        Ok(())
    }
}

fn row_to_exercise(row: &SqliteRow) -> AppResult<Exercise> {
    let muscle_group: String = row.get("muscle_group");
    let equipment: String = row.get("equipment");
    let difficulty: String = row.get("difficulty");
    let instructions: String = row.get("instructions");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(Exercise {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        muscle_group: MuscleGroup::from_db(&muscle_group)?,
        equipment: Equipment::from_db(&equipment)?,
        difficulty: Difficulty::from_db(&difficulty)?,
        video_url: row.get("video_url"),
        image_url: row.get("image_url"),
        instructions: json_column(&instructions)?,
        created_at: parse_db_timestamp(&created_at)?,
        updated_at: parse_db_timestamp(&updated_at)?,
    })
}
