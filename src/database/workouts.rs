// ABOUTME: Workouts and their ordered exercises, with copy-on-write for workouts shared by programs
// ABOUTME: Editing through a program workout clones a shared workout and re-points that slot first
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

//! # Workouts
//!
//! A workout can be scheduled by many program workouts at once, most
//! commonly after a program is duplicated. Admin edits made "from inside" a
//! program pass that `program_workout_id`; when the workout is shared, the
//! edit lands on a private clone so the other programs keep their version.
//!
//! Every mutation runs in a single transaction: resolve the edit target,
//! clone if needed, apply the change, keep positions dense.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use fithub_core::pagination::{Page, PageParams};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection, SqlitePool};

use super::filters::Filters;
use super::positions::{ensure_same_members, WORKOUT_EXERCISES};
use super::{new_id, now_timestamp, parse_db_timestamp, to_i64, to_u32, to_u64, Database};
use crate::constants::limits::MAX_SETS;
use crate::enums::{Difficulty, MuscleGroup};
use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;
use crate::utils::validation::{in_range, optional_text, require_title, text};

/// Rest between sets when none is given
pub const DEFAULT_REST_SECONDS: u32 = 60;

/// A workout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Workout {
    /// Unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Description
    pub description: String,
    /// Skill level
    pub difficulty: Difficulty,
    /// Expected duration
    pub estimated_minutes: u32,
    /// Workout this one was cloned from
    pub copied_from: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// An exercise slot within a workout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkoutExercise {
    /// Unique identifier
    pub id: String,
    /// Owning workout
    pub workout_id: String,
    /// Catalog exercise
    pub exercise_id: String,
    /// Catalog exercise name
    pub exercise_name: String,
    /// Catalog exercise muscle group
    pub muscle_group: MuscleGroup,
    /// Zero-based order within the workout
    pub position: u32,
    /// Number of sets
    pub sets: u32,
    /// Repetitions per set
    pub reps: Option<u32>,
    /// Timed sets
    pub duration_seconds: Option<u32>,
    /// Rest between sets
    pub rest_seconds: u32,
    /// Coaching notes
    pub notes: Option<String>,
}

/// Workout with its exercises
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkoutDetail {
    /// The workout row
    #[serde(flatten)]
    pub workout: Workout,
    /// Exercises in position order
    pub exercises: Vec<WorkoutExercise>,
    /// Program workouts scheduling this workout
    pub program_workout_count: u32,
}

/// Result of a workout-exercise mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutMutation {
    /// Workout the change was applied to
    pub workout_id: String,
    /// Whether a shared workout was cloned first
    pub copied: bool,
    /// The edited workout
    pub workout: WorkoutDetail,
}

/// Admin form for a workout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutInput {
    /// Display name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Skill level
    pub difficulty: Difficulty,
    /// Expected duration
    #[serde(default)]
    pub estimated_minutes: u32,
}

/// Workout list filter
#[derive(Debug, Clone, Default)]
pub struct WorkoutFilter {
    /// Skill level
    pub difficulty: Option<Difficulty>,
    /// Name search
    pub q: Option<String>,
}

/// Editable fields of a workout exercise
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutExerciseFields {
    /// Catalog exercise
    pub exercise_id: String,
    /// Number of sets
    pub sets: u32,
    /// Repetitions per set
    #[serde(default)]
    pub reps: Option<u32>,
    /// Timed sets
    #[serde(default)]
    pub duration_seconds: Option<u32>,
    /// Rest between sets
    #[serde(default)]
    pub rest_seconds: Option<u32>,
    /// Coaching notes
    #[serde(default)]
    pub notes: Option<String>,
    /// Target position; appended or left in place when absent
    #[serde(default)]
    pub position: Option<u32>,
}

/// Add an exercise to a workout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWorkoutExercise {
    /// Workout to add to
    pub workout_id: String,
    /// Exercise fields
    #[serde(flatten)]
    pub fields: WorkoutExerciseFields,
    /// Program workout context for copy-on-write
    #[serde(default)]
    pub program_workout_id: Option<String>,
}

/// Replace a workout exercise's fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateWorkoutExercise {
    /// Exercise fields
    #[serde(flatten)]
    pub fields: WorkoutExerciseFields,
    /// Program workout context for copy-on-write
    #[serde(default)]
    pub program_workout_id: Option<String>,
}

/// New exercise order for a workout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderWorkoutExercises {
    /// Workout to reorder
    pub workout_id: String,
    /// Every workout exercise id in the desired order
    pub workout_exercise_ids: Vec<String>,
    /// Program workout context for copy-on-write
    #[serde(default)]
    pub program_workout_id: Option<String>,
}

struct ValidWorkout {
    name: String,
    description: String,
    difficulty: Difficulty,
    estimated_minutes: u32,
}

impl WorkoutInput {
    fn validate(&self) -> AppResult<ValidWorkout> {
        Ok(ValidWorkout {
            name: require_title("name", &self.name)?,
            description: text("description", self.description.as_deref())?,
            difficulty: self.difficulty,
            estimated_minutes: in_range("estimated_minutes", self.estimated_minutes, 0, 600)?,
        })
    }
}

struct ValidExerciseFields {
    exercise_id: String,
    sets: u32,
    reps: Option<u32>,
    duration_seconds: Option<u32>,
    rest_seconds: u32,
    notes: Option<String>,
}

impl WorkoutExerciseFields {
    fn validate(&self) -> AppResult<ValidExerciseFields> {
        let reps = self.reps.map(|r| in_range("reps", r, 1, 1000)).transpose()?;
        let duration_seconds = self
            .duration_seconds
            .map(|d| in_range("duration_seconds", d, 1, 86_400))
            .transpose()?;
        if reps.is_none() && duration_seconds.is_none() {
            return Err(AppError::invalid_input(
                "Either reps or duration_seconds is required",
            ));
        }
        Ok(ValidExerciseFields {
            exercise_id: self.exercise_id.trim().to_owned(),
            sets: in_range("sets", self.sets, 1, MAX_SETS)?,
            reps,
            duration_seconds,
            rest_seconds: in_range(
                "rest_seconds",
                self.rest_seconds.unwrap_or(DEFAULT_REST_SECONDS),
                0,
                3600,
            )?,
            notes: optional_text("notes", self.notes.as_deref())?,
        })
    }
}

impl Database {
    pub(super) async fn migrate_workouts(&self) -> AppResult<()> {
        self.execute_all(&[
            r"
            CREATE TABLE IF NOT EXISTS workouts (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                difficulty TEXT NOT NULL,
                estimated_minutes INTEGER NOT NULL DEFAULT 0,
                copied_from TEXT REFERENCES workouts(id) ON DELETE SET NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
            r"
            CREATE TABLE IF NOT EXISTS workout_exercises (
                id TEXT PRIMARY KEY,
                workout_id TEXT NOT NULL REFERENCES workouts(id) ON DELETE CASCADE,
                exercise_id TEXT NOT NULL REFERENCES exercises(id) ON DELETE RESTRICT,
                position INTEGER NOT NULL,
                sets INTEGER NOT NULL CHECK (sets >= 1),
                reps INTEGER,
                duration_seconds INTEGER,
                rest_seconds INTEGER NOT NULL DEFAULT 60,
                notes TEXT,
                CHECK (reps IS NOT NULL OR duration_seconds IS NOT NULL)
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_workout_exercises_workout ON workout_exercises(workout_id, position)",
            "CREATE INDEX IF NOT EXISTS idx_workout_exercises_exercise ON workout_exercises(exercise_id)",
        ])
        .await
    }
}

/// Workout database operations
pub struct WorkoutsManager {
    pool: SqlitePool,
}

impl WorkoutsManager {
    /// Create a new workouts manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an empty workout
    ///
    /// # Errors
    ///
    /// Returns invalid input for bad fields
    pub async fn create(&self, input: &WorkoutInput) -> AppResult<WorkoutDetail> {
        let mut conn = self.pool.acquire().await?;
        let id = insert_workout(&mut conn, input).await?;
        load_detail(&mut conn, &id).await
    }

    /// Get a workout with its exercises
    ///
    /// # Errors
    ///
    /// Returns not found when it does not exist
    pub async fn get(&self, id: &str) -> AppResult<WorkoutDetail> {
        let mut conn = self.pool.acquire().await?;
        load_detail(&mut conn, id).await
    }

    /// List workouts by name
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list(&self, filter: &WorkoutFilter, page: &PageParams) -> AppResult<Page<Workout>> {
        let mut filters = Filters::new();
        if let Some(difficulty) = filter.difficulty {
            filters.push_text("difficulty = ?", difficulty.as_str());
        }
        filters.push_search(&["name", "description"], filter.q.as_deref());
        let where_clause = filters.where_clause();

        let count_sql = format!("SELECT COUNT(*) FROM workouts {where_clause}");
        let (total,): (i64,) = filters
            .bind_as(sqlx::query_as(&count_sql))
            .fetch_one(&self.pool)
            .await?;

        let list_sql = format!(
            "SELECT * FROM workouts {where_clause} ORDER BY name COLLATE NOCASE, created_at, id LIMIT ? OFFSET ?"
        );
        let rows = filters
            .bind(sqlx::query(&list_sql))
            .bind(i64::from(page.limit()))
            .bind(i64::from(page.offset()))
            .fetch_all(&self.pool)
            .await?;
        let items = rows.iter().map(row_to_workout).collect::<AppResult<Vec<_>>>()?;
        Ok(Page::new(items, to_u64(total), page))
    }

    /// Replace a workout's own fields
    ///
    /// # Errors
    ///
    /// Returns not found or invalid input
    pub async fn update(&self, id: &str, input: &WorkoutInput) -> AppResult<WorkoutDetail> {
        let workout = input.validate()?;
        let result = sqlx::query(
            r"
            UPDATE workouts SET name = $1, description = $2, difficulty = $3,
                estimated_minutes = $4, updated_at = $5
            WHERE id = $6
            ",
        )
        .bind(&workout.name)
        .bind(&workout.description)
        .bind(workout.difficulty.as_str())
        .bind(to_i64(workout.estimated_minutes))
        .bind(now_timestamp())
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Workout"));
        }
        self.get(id).await
    }

    /// Delete a workout no program schedules
    ///
    /// # Errors
    ///
    /// Returns not found, or resource in use while program workouts reference it
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let mut conn = self.pool.acquire().await?;
        let references = program_references(&mut conn, id).await?;
        if references > 0 {
            return Err(AppError::resource_in_use(format!(
                "Workout is scheduled by {references} program workout(s)"
            ))
            .with_details(serde_json::json!({ "program_workouts": references })));
        }
        let result = sqlx::query("DELETE FROM workouts WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Workout"));
        }
        Ok(())
    }

    /// Add an exercise, cloning the workout first when the program workout shares it
    ///
    /// # Errors
    ///
    /// Returns not found for an unknown workout, invalid input for bad
    /// fields, an unknown exercise or a mismatched program workout
    pub async fn add_exercise(&self, request: &NewWorkoutExercise) -> AppResult<WorkoutMutation> {
        let fields = request.fields.validate()?;
        let mut tx = self.pool.begin().await?;
        require_workout(&mut tx, &request.workout_id).await?;
        require_exercise(&mut tx, &fields.exercise_id).await?;

        let target =
            resolve_edit_target(&mut tx, &request.workout_id, request.program_workout_id.as_deref())
                .await?;
        let position = WORKOUT_EXERCISES
            .insert_slot(&mut tx, &target.workout_id, request.fields.position)
            .await?;
        WORKOUT_EXERCISES
            .open_gap(&mut tx, &target.workout_id, position)
            .await?;
        sqlx::query(
            r"
            INSERT INTO workout_exercises (id, workout_id, exercise_id, position, sets, reps,
                                           duration_seconds, rest_seconds, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(new_id())
        .bind(&target.workout_id)
        .bind(&fields.exercise_id)
        .bind(position)
        .bind(to_i64(fields.sets))
        .bind(fields.reps.map(to_i64))
        .bind(fields.duration_seconds.map(to_i64))
        .bind(to_i64(fields.rest_seconds))
        .bind(&fields.notes)
        .execute(&mut *tx)
        .await?;
        touch_workout(&mut tx, &target.workout_id).await?;
        tx.commit().await?;

        self.finish(target).await
    }

    /// Replace a workout exercise's fields, optionally moving it
    ///
    /// # Errors
    ///
    /// Returns not found for an unknown workout exercise, invalid input for
    /// bad fields, an unknown exercise or a mismatched program workout
    pub async fn update_exercise(
        &self,
        id: &str,
        request: &UpdateWorkoutExercise,
    ) -> AppResult<WorkoutMutation> {
        let fields = request.fields.validate()?;
        let mut tx = self.pool.begin().await?;
        let owner = owner_of(&mut tx, id).await?;
        require_exercise(&mut tx, &fields.exercise_id).await?;

        let target =
            resolve_edit_target(&mut tx, &owner, request.program_workout_id.as_deref()).await?;
        let target_id = target.exercise_id(id);
        sqlx::query(
            r"
            UPDATE workout_exercises SET exercise_id = $1, sets = $2, reps = $3,
                duration_seconds = $4, rest_seconds = $5, notes = $6
            WHERE id = $7
            ",
        )
        .bind(&fields.exercise_id)
        .bind(to_i64(fields.sets))
        .bind(fields.reps.map(to_i64))
        .bind(fields.duration_seconds.map(to_i64))
        .bind(to_i64(fields.rest_seconds))
        .bind(&fields.notes)
        .bind(&target_id)
        .execute(&mut *tx)
        .await?;
        if let Some(position) = request.fields.position {
            let to = usize::try_from(position).unwrap_or(usize::MAX);
            WORKOUT_EXERCISES
                .move_to(&mut tx, &target.workout_id, &target_id, to)
                .await?;
        }
        touch_workout(&mut tx, &target.workout_id).await?;
        tx.commit().await?;

        self.finish(target).await
    }

    /// Remove an exercise from its workout
    ///
    /// # Errors
    ///
    /// Returns not found for an unknown workout exercise, invalid input for
    /// a mismatched program workout
    pub async fn remove_exercise(
        &self,
        id: &str,
        program_workout_id: Option<&str>,
    ) -> AppResult<WorkoutMutation> {
        let mut tx = self.pool.begin().await?;
        let owner = owner_of(&mut tx, id).await?;
        let target = resolve_edit_target(&mut tx, &owner, program_workout_id).await?;
        sqlx::query("DELETE FROM workout_exercises WHERE id = $1")
            .bind(target.exercise_id(id))
            .execute(&mut *tx)
            .await?;
        WORKOUT_EXERCISES.compact(&mut tx, &target.workout_id).await?;
        touch_workout(&mut tx, &target.workout_id).await?;
        tx.commit().await?;

        self.finish(target).await
    }

    /// Put a workout's exercises in the given order
    ///
    /// # Errors
    ///
    /// Returns not found for an unknown workout, invalid input when the ids
    /// are not exactly the workout's exercises or the program workout mismatches
    pub async fn reorder_exercises(
        &self,
        request: &ReorderWorkoutExercises,
    ) -> AppResult<WorkoutMutation> {
        let mut tx = self.pool.begin().await?;
        require_workout(&mut tx, &request.workout_id).await?;
        let target =
            resolve_edit_target(&mut tx, &request.workout_id, request.program_workout_id.as_deref())
                .await?;
        let requested: Vec<String> = request
            .workout_exercise_ids
            .iter()
            .map(|id| target.exercise_id(id))
            .collect();
        let current = WORKOUT_EXERCISES.ids(&mut tx, &target.workout_id).await?;
        ensure_same_members(&current, &requested)?;
        WORKOUT_EXERCISES
            .renumber(&mut tx, &target.workout_id, &requested)
            .await?;
        touch_workout(&mut tx, &target.workout_id).await?;
        tx.commit().await?;

        self.finish(target).await
    }

    async fn finish(&self, target: EditTarget) -> AppResult<WorkoutMutation> {
        if let (true, Some(program_workout_id)) = (target.copied, &target.program_workout_id) {
            AppLogger::log_workout_copied(
                &target.original_id,
                &target.workout_id,
                program_workout_id,
            );
        }
        let workout = self.get(&target.workout_id).await?;
        Ok(WorkoutMutation {
            workout_id: target.workout_id,
            copied: target.copied,
            workout,
        })
    }
}

/// Workout a mutation applies to
struct EditTarget {
    original_id: String,
    workout_id: String,
    program_workout_id: Option<String>,
    copied: bool,
    // original workout exercise id -> clone's counterpart
    exercise_ids: HashMap<String, String>,
}

impl EditTarget {
    fn in_place(workout_id: &str) -> Self {
        Self {
            original_id: workout_id.to_owned(),
            workout_id: workout_id.to_owned(),
            program_workout_id: None,
            copied: false,
            exercise_ids: HashMap::new(),
        }
    }

    fn exercise_id(&self, original: &str) -> String {
        self.exercise_ids
            .get(original)
            .cloned()
            .unwrap_or_else(|| original.to_owned())
    }
}

async fn resolve_edit_target(
    conn: &mut SqliteConnection,
    workout_id: &str,
    program_workout_id: Option<&str>,
) -> AppResult<EditTarget> {
    let Some(program_workout_id) = program_workout_id.map(str::trim).filter(|id| !id.is_empty())
    else {
        return Ok(EditTarget::in_place(workout_id));
    };

    let scheduled: Option<String> =
        sqlx::query_scalar("SELECT workout_id FROM program_workouts WHERE id = $1")
            .bind(program_workout_id)
            .fetch_optional(&mut *conn)
            .await?;
    if scheduled.as_deref() != Some(workout_id) {
        return Err(AppError::invalid_input(
            "program_workout_id does not schedule this workout",
        )
        .with_details(serde_json::json!({
            "program_workout_id": program_workout_id,
            "workout_id": workout_id,
        })));
    }

    let mut target = EditTarget::in_place(workout_id);
    target.program_workout_id = Some(program_workout_id.to_owned());
    if program_references(conn, workout_id).await? <= 1 {
        return Ok(target);
    }

    let (clone_id, exercise_ids) = clone_workout(conn, workout_id).await?;
    sqlx::query("UPDATE program_workouts SET workout_id = $1 WHERE id = $2")
        .bind(&clone_id)
        .bind(program_workout_id)
        .execute(&mut *conn)
        .await?;

    target.workout_id = clone_id;
    target.copied = true;
    target.exercise_ids = exercise_ids;
    Ok(target)
}

async fn clone_workout(
    conn: &mut SqliteConnection,
    source_id: &str,
) -> AppResult<(String, HashMap<String, String>)> {
    let clone_id = new_id();
    sqlx::query(
        r"
        INSERT INTO workouts (id, name, description, difficulty, estimated_minutes, copied_from,
                              created_at, updated_at)
        SELECT $1, name, description, difficulty, estimated_minutes, id, $2, $2
        FROM workouts WHERE id = $3
        ",
    )
    .bind(&clone_id)
    .bind(now_timestamp())
    .bind(source_id)
    .execute(&mut *conn)
    .await?;

    let source_ids = WORKOUT_EXERCISES.ids(conn, source_id).await?;
    let mut exercise_ids = HashMap::with_capacity(source_ids.len());
    for (position, original) in (0_i64..).zip(source_ids) {
        let copy_id = new_id();
        sqlx::query(
            r"
            INSERT INTO workout_exercises (id, workout_id, exercise_id, position, sets, reps,
                                           duration_seconds, rest_seconds, notes)
            SELECT $1, $2, exercise_id, $3, sets, reps, duration_seconds, rest_seconds, notes
            FROM workout_exercises WHERE id = $4
            ",
        )
        .bind(&copy_id)
        .bind(&clone_id)
        .bind(position)
        .bind(&original)
        .execute(&mut *conn)
        .await?;
        exercise_ids.insert(original, copy_id);
    }
    Ok((clone_id, exercise_ids))
}

/// Insert a workout row and return its id
pub(crate) async fn insert_workout(
    conn: &mut SqliteConnection,
    input: &WorkoutInput,
) -> AppResult<String> {
    let workout = input.validate()?;
    let id = new_id();
    sqlx::query(
        r"
        INSERT INTO workouts (id, name, description, difficulty, estimated_minutes,
                              created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $6)
        ",
    )
    .bind(&id)
    .bind(&workout.name)
    .bind(&workout.description)
    .bind(workout.difficulty.as_str())
    .bind(to_i64(workout.estimated_minutes))
    .bind(now_timestamp())
    .execute(&mut *conn)
    .await?;
    Ok(id)
}

/// Load a workout with its exercises and reference count
pub(crate) async fn load_detail(conn: &mut SqliteConnection, id: &str) -> AppResult<WorkoutDetail> {
    let workout = sqlx::query("SELECT * FROM workouts WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .as_ref()
        .map(row_to_workout)
        .transpose()?
        .ok_or_else(|| AppError::not_found("Workout"))?;
    let exercises = load_exercises(conn, id).await?;
    let references = program_references(conn, id).await?;
    Ok(WorkoutDetail {
        workout,
        exercises,
        program_workout_count: to_u32(references),
    })
}

/// Exercises of one workout in position order
pub(crate) async fn load_exercises(
    conn: &mut SqliteConnection,
    workout_id: &str,
) -> AppResult<Vec<WorkoutExercise>> {
    let rows = sqlx::query(
        r"
        SELECT we.*, e.name AS exercise_name, e.muscle_group AS muscle_group
        FROM workout_exercises we
        JOIN exercises e ON e.id = we.exercise_id
        WHERE we.workout_id = $1
        ORDER BY we.position ASC, we.id ASC
        ",
    )
    .bind(workout_id)
    .fetch_all(&mut *conn)
    .await?;
    rows.iter().map(row_to_workout_exercise).collect()
}

async fn program_references(conn: &mut SqliteConnection, workout_id: &str) -> AppResult<i64> {
    Ok(
        sqlx::query_scalar("SELECT COUNT(*) FROM program_workouts WHERE workout_id = $1")
            .bind(workout_id)
            .fetch_one(&mut *conn)
            .await?,
    )
}

async fn require_workout(conn: &mut SqliteConnection, workout_id: &str) -> AppResult<()> {
    let exists: Option<String> = sqlx::query_scalar("SELECT id FROM workouts WHERE id = $1")
        .bind(workout_id)
        .fetch_optional(&mut *conn)
        .await?;
    exists.map(|_| ()).ok_or_else(|| AppError::not_found("Workout"))
}

async fn require_exercise(conn: &mut SqliteConnection, exercise_id: &str) -> AppResult<()> {
    let exists: Option<String> = sqlx::query_scalar("SELECT id FROM exercises WHERE id = $1")
        .bind(exercise_id)
        .fetch_optional(&mut *conn)
        .await?;
    exists.map(|_| ()).ok_or_else(|| {
        AppError::invalid_input(format!("Unknown exercise_id {exercise_id}"))
            .with_details(serde_json::json!({ "field": "exercise_id" }))
    })
}

async fn owner_of(conn: &mut SqliteConnection, workout_exercise_id: &str) -> AppResult<String> {
    let owner: Option<String> =
        sqlx::query_scalar("SELECT workout_id FROM workout_exercises WHERE id = $1")
            .bind(workout_exercise_id)
            .fetch_optional(&mut *conn)
            .await?;
    owner.ok_or_else(|| AppError::not_found("Workout exercise"))
}

async fn touch_workout(conn: &mut SqliteConnection, workout_id: &str) -> AppResult<()> {
    sqlx::query("UPDATE workouts SET updated_at = $1 WHERE id = $2")
        .bind(now_timestamp())
        .bind(workout_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

fn row_to_workout(row: &SqliteRow) -> AppResult<Workout> {
    let difficulty: String = row.get("difficulty");
    let estimated_minutes: i64 = row.get("estimated_minutes");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");
    Ok(Workout {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        difficulty: Difficulty::from_db(&difficulty)?,
        estimated_minutes: to_u32(estimated_minutes),
        copied_from: row.get("copied_from"),
        created_at: parse_db_timestamp(&created_at)?,
        updated_at: parse_db_timestamp(&updated_at)?,
    })
}

fn row_to_workout_exercise(row: &SqliteRow) -> AppResult<WorkoutExercise> {
    let muscle_group: String = row.get("muscle_group");
    let position: i64 = row.get("position");
    let sets: i64 = row.get("sets");
    let reps: Option<i64> = row.get("reps");
    let duration_seconds: Option<i64> = row.get("duration_seconds");
    let rest_seconds: i64 = row.get("rest_seconds");
    Ok(WorkoutExercise {
        id: row.get("id"),
        workout_id: row.get("workout_id"),
        exercise_id: row.get("exercise_id"),
        exercise_name: row.get("exercise_name"),
        muscle_group: MuscleGroup::from_db(&muscle_group)?,
        position: to_u32(position),
        sets: to_u32(sets),
        reps: reps.map(to_u32),
        duration_seconds: duration_seconds.map(to_u32),
        rest_seconds: to_u32(rest_seconds),
        notes: row.get("notes"),
    })
}
