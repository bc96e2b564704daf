// ABOUTME: Training programs, their week/day schedule of workouts and completed workout logs
// ABOUTME: Duplicating a program shares its workouts, which copy-on-write later separates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

use chrono::{DateTime, Utc};
use fithub_core::pagination::{Page, PageParams};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection, SqlitePool};

use super::filters::Filters;
use super::workouts::{insert_workout, load_detail, WorkoutDetail, WorkoutInput};
use super::{new_id, now_timestamp, parse_db_timestamp, to_i64, to_u32, to_u64, Database};
use crate::constants::limits::MAX_PROGRAM_WEEKS;
use crate::enums::{Difficulty, ProgramGoal};
use crate::errors::{AppError, AppResult};
use crate::utils::slug::{is_valid_slug, slugify};
use crate::utils::validation::{in_range, optional_url, require_title, text};

/// A training program
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Program {
    /// Unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Unique URL slug
    pub slug: String,
    /// Description
    pub description: String,
    /// Training goal
    pub goal: ProgramGoal,
    /// Skill level
    pub difficulty: Difficulty,
    /// Length in weeks
    pub duration_weeks: u32,
    /// Training days per week
    pub days_per_week: u32,
    /// Cover image
    pub cover_image_url: Option<String>,
    /// Visible on the dashboard
    pub is_published: bool,
    /// Scheduled program workouts
    pub workout_count: u32,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Admin form for a program
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramInput {
    /// Display name
    pub name: String,
    /// URL slug; derived from the name when absent
    #[serde(default)]
    pub slug: Option<String>,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Training goal
    pub goal: ProgramGoal,
    /// Skill level
    pub difficulty: Difficulty,
    /// Length in weeks
    pub duration_weeks: u32,
    /// Training days per week
    pub days_per_week: u32,
    /// Cover image
    #[serde(default)]
    pub cover_image_url: Option<String>,
    /// Visible on the dashboard
    #[serde(default)]
    pub is_published: bool,
}

/// Program list filter
#[derive(Debug, Clone, Default)]
pub struct ProgramFilter {
    /// Only published programs
    pub published_only: bool,
    /// Training goal
    pub goal: Option<ProgramGoal>,
    /// Skill level
    pub difficulty: Option<Difficulty>,
    /// Name or description search
    pub q: Option<String>,
}

/// A workout scheduled on a program day
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgramWorkout {
    /// Unique identifier
    pub id: String,
    /// Owning program
    pub program_id: String,
    /// Scheduled workout
    pub workout_id: String,
    /// Workout name
    pub workout_name: String,
    /// Week, 1-based
    pub week: u32,
    /// Day of week, 1..=7
    pub day: u32,
    /// Order within the day
    pub position: u32,
}

/// Program with its schedule slots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramDetail {
    /// The program row
    #[serde(flatten)]
    pub program: Program,
    /// Slots ordered by week, day and position
    pub program_workouts: Vec<ProgramWorkout>,
}

/// Schedule a workout on a program day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddProgramWorkout {
    /// Existing workout to schedule
    #[serde(default)]
    pub workout_id: Option<String>,
    /// Workout to create and schedule
    #[serde(default)]
    pub new_workout: Option<WorkoutInput>,
    /// Week, 1-based
    pub week: u32,
    /// Day of week, 1..=7
    pub day: u32,
}

/// Move a slot to another day
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MoveProgramWorkout {
    /// Week, 1-based
    pub week: u32,
    /// Day of week, 1..=7
    pub day: u32,
}

/// Published program with workouts grouped by week then day
#[derive(Debug, Clone, Serialize)]
pub struct ProgramSchedule {
    /// The program row
    #[serde(flatten)]
    pub program: Program,
    /// Weeks that have workouts
    pub weeks: Vec<ScheduleWeek>,
}

/// One week of a schedule
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleWeek {
    /// Week, 1-based
    pub week: u32,
    /// Days that have workouts
    pub days: Vec<ScheduleDay>,
}

/// One day of a schedule
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleDay {
    /// Day of week, 1..=7
    pub day: u32,
    /// Workouts in order
    pub workouts: Vec<ScheduledWorkout>,
}

/// A workout as scheduled
#[derive(Debug, Clone, Serialize)]
pub struct ScheduledWorkout {
    /// Slot identifier, used as copy-on-write context
    pub program_workout_id: String,
    /// Order within the day
    pub position: u32,
    /// The workout with its exercises
    pub workout: WorkoutDetail,
}

/// Log a completed workout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompleteWorkout {
    /// Program the workout was done as part of
    #[serde(default)]
    pub program_id: Option<String>,
    /// Actual duration
    #[serde(default)]
    pub duration_minutes: Option<u32>,
}

/// A completed workout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkoutLog {
    /// Unique identifier
    pub id: String,
    /// User who trained
    pub user_id: String,
    /// Workout done; cleared if the workout is later deleted
    pub workout_id: Option<String>,
    /// Program context
    pub program_id: Option<String>,
    /// Actual duration
    pub duration_minutes: Option<u32>,
    /// Completion time
    pub completed_at: DateTime<Utc>,
}

struct ValidProgram {
    name: String,
    slug: String,
    description: String,
    goal: ProgramGoal,
    difficulty: Difficulty,
    duration_weeks: u32,
    days_per_week: u32,
    cover_image_url: Option<String>,
    is_published: bool,
}

impl ProgramInput {
    fn validate(&self) -> AppResult<ValidProgram> {
        let name = require_title("name", &self.name)?;
        let slug = match self.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(slug) if is_valid_slug(slug) => slug.to_owned(),
            Some(slug) => {
                return Err(AppError::invalid_input(format!(
                    "slug must be lowercase words joined by hyphens, got {slug}"
                )))
            }
            None => slugify(&name),
        };
        if slug.is_empty() {
            return Err(AppError::invalid_input("name must contain letters or digits"));
        }
        Ok(ValidProgram {
            name,
            slug,
            description: text("description", self.description.as_deref())?,
            goal: self.goal,
            difficulty: self.difficulty,
            duration_weeks: in_range("duration_weeks", self.duration_weeks, 1, MAX_PROGRAM_WEEKS)?,
            days_per_week: in_range("days_per_week", self.days_per_week, 1, 7)?,
            cover_image_url: optional_url("cover_image_url", self.cover_image_url.as_deref())?,
            is_published: self.is_published,
        })
    }
}

impl Database {
    pub(super) async fn migrate_programs(&self) -> AppResult<()> {
        self.execute_all(&[
            r"
            CREATE TABLE IF NOT EXISTS programs (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                slug TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL DEFAULT '',
                goal TEXT NOT NULL,
                difficulty TEXT NOT NULL,
                duration_weeks INTEGER NOT NULL CHECK (duration_weeks >= 1),
                days_per_week INTEGER NOT NULL CHECK (days_per_week BETWEEN 1 AND 7),
                cover_image_url TEXT,
                is_published INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
            r"
            CREATE TABLE IF NOT EXISTS program_workouts (
                id TEXT PRIMARY KEY,
                program_id TEXT NOT NULL REFERENCES programs(id) ON DELETE CASCADE,
                workout_id TEXT NOT NULL REFERENCES workouts(id) ON DELETE RESTRICT,
                week INTEGER NOT NULL CHECK (week >= 1),
                day INTEGER NOT NULL CHECK (day BETWEEN 1 AND 7),
                position INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE (program_id, week, day, position)
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_program_workouts_workout ON program_workouts(workout_id)",
            r"
            CREATE TABLE IF NOT EXISTS workout_logs (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                workout_id TEXT REFERENCES workouts(id) ON DELETE SET NULL,
                program_id TEXT REFERENCES programs(id) ON DELETE SET NULL,
                duration_minutes INTEGER,
                completed_at TEXT NOT NULL
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_workout_logs_user ON workout_logs(user_id, completed_at)",
        ])
        .await
    }
}

const PROGRAM_COLUMNS: &str = r"
    p.id, p.name, p.slug, p.description, p.goal, p.difficulty, p.duration_weeks,
    p.days_per_week, p.cover_image_url, p.is_published, p.created_at, p.updated_at,
    (SELECT COUNT(*) FROM program_workouts pw WHERE pw.program_id = p.id) AS workout_count
";

/// Program database operations
pub struct ProgramsManager {
    pool: SqlitePool,
}

impl ProgramsManager {
    /// Create a new programs manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a program with an empty schedule
    ///
    /// # Errors
    ///
    /// Returns invalid input for bad fields and a conflict for a taken slug
    pub async fn create(&self, input: &ProgramInput) -> AppResult<Program> {
        let program = input.validate()?;
        let id = new_id();
        sqlx::query(
            r"
            INSERT INTO programs (id, name, slug, description, goal, difficulty, duration_weeks,
                                  days_per_week, cover_image_url, is_published, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
            ",
        )
        .bind(&id)
        .bind(&program.name)
        .bind(&program.slug)
        .bind(&program.description)
        .bind(program.goal.as_str())
        .bind(program.difficulty.as_str())
        .bind(to_i64(program.duration_weeks))
        .bind(to_i64(program.days_per_week))
        .bind(&program.cover_image_url)
        .bind(program.is_published)
        .bind(now_timestamp())
        .execute(&self.pool)
        .await?;
        self.get(&id).await
    }

    /// Get a program
    ///
    /// # Errors
    ///
    /// Returns not found when it does not exist
    pub async fn get(&self, id: &str) -> AppResult<Program> {
        let sql = format!("SELECT {PROGRAM_COLUMNS} FROM programs p WHERE p.id = $1");
        sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(row_to_program)
            .transpose()?
            .ok_or_else(|| AppError::not_found("Program"))
    }

    /// Get a program with its schedule slots
    ///
    /// # Errors
    ///
    /// Returns not found when it does not exist
    pub async fn detail(&self, id: &str) -> AppResult<ProgramDetail> {
        let program = self.get(id).await?;
        let program_workouts = self.program_workouts(id).await?;
        Ok(ProgramDetail {
            program,
            program_workouts,
        })
    }

    /// List programs by name
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list(&self, filter: &ProgramFilter, page: &PageParams) -> AppResult<Page<Program>> {
        let mut filters = Filters::new();
        if filter.published_only {
            filters.push("p.is_published = 1");
        }
        if let Some(goal) = filter.goal {
            filters.push_text("p.goal = ?", goal.as_str());
        }
        if let Some(difficulty) = filter.difficulty {
            filters.push_text("p.difficulty = ?", difficulty.as_str());
        }
        filters.push_search(&["p.name", "p.description"], filter.q.as_deref());
        let where_clause = filters.where_clause();

        let count_sql = format!("SELECT COUNT(*) FROM programs p {where_clause}");
        let (total,): (i64,) = filters
            .bind_as(sqlx::query_as(&count_sql))
            .fetch_one(&self.pool)
            .await?;

        let list_sql = format!(
            "SELECT {PROGRAM_COLUMNS} FROM programs p {where_clause} ORDER BY p.name COLLATE NOCASE, p.id LIMIT ? OFFSET ?"
        );
        let rows = filters
            .bind(sqlx::query(&list_sql))
            .bind(i64::from(page.limit()))
            .bind(i64::from(page.offset()))
            .fetch_all(&self.pool)
            .await?;
        let items = rows.iter().map(row_to_program).collect::<AppResult<Vec<_>>>()?;
        Ok(Page::new(items, to_u64(total), page))
    }

    /// Replace a program's fields
    ///
    /// # Errors
    ///
    /// Returns not found, invalid input (including shrinking below a
    /// scheduled week) or a slug conflict
    pub async fn update(&self, id: &str, input: &ProgramInput) -> AppResult<Program> {
        let program = input.validate()?;
        let last_week: Option<i64> =
            sqlx::query_scalar("SELECT MAX(week) FROM program_workouts WHERE program_id = $1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        if let Some(last_week) = last_week.filter(|w| *w > to_i64(program.duration_weeks)) {
            return Err(AppError::invalid_input(format!(
                "duration_weeks cannot be below scheduled week {last_week}"
            )));
        }

        let result = sqlx::query(
            r"
            UPDATE programs SET name = $1, slug = $2, description = $3, goal = $4, difficulty = $5,
                duration_weeks = $6, days_per_week = $7, cover_image_url = $8, is_published = $9,
                updated_at = $10
            WHERE id = $11
            ",
        )
        .bind(&program.name)
        .bind(&program.slug)
        .bind(&program.description)
        .bind(program.goal.as_str())
        .bind(program.difficulty.as_str())
        .bind(to_i64(program.duration_weeks))
        .bind(to_i64(program.days_per_week))
        .bind(&program.cover_image_url)
        .bind(program.is_published)
        .bind(now_timestamp())
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Program"));
        }
        self.get(id).await
    }

    /// Delete a program and its schedule; the workouts remain
    ///
    /// # Errors
    ///
    /// Returns not found when it does not exist
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM programs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Program"));
        }
        Ok(())
    }

    /// Schedule slots of a program
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn program_workouts(&self, program_id: &str) -> AppResult<Vec<ProgramWorkout>> {
        let rows = sqlx::query(
            r"
            SELECT pw.*, w.name AS workout_name
            FROM program_workouts pw
            JOIN workouts w ON w.id = pw.workout_id
            WHERE pw.program_id = $1
            ORDER BY pw.week, pw.day, pw.position
            ",
        )
        .bind(program_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_program_workout).collect())
    }

    /// Get one schedule slot
    ///
    /// # Errors
    ///
    /// Returns not found when it does not exist
    pub async fn get_program_workout(&self, id: &str) -> AppResult<ProgramWorkout> {
        sqlx::query(
            r"
            SELECT pw.*, w.name AS workout_name
            FROM program_workouts pw
            JOIN workouts w ON w.id = pw.workout_id
            WHERE pw.id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .as_ref()
        .map(row_to_program_workout)
        .ok_or_else(|| AppError::not_found("Program workout"))
    }

    /// Schedule an existing or new workout at the end of a program day
    ///
    /// # Errors
    ///
    /// Returns not found for an unknown program, invalid input for a day
    /// outside the program or an ambiguous or unknown workout
    pub async fn add_workout(
        &self,
        program_id: &str,
        request: &AddProgramWorkout,
    ) -> AppResult<ProgramWorkout> {
        let program = self.get(program_id).await?;
        check_slot(&program, request.week, request.day)?;

        let mut tx = self.pool.begin().await?;
        let workout_id = match (&request.workout_id, &request.new_workout) {
            (Some(workout_id), None) => {
                let exists: Option<String> =
                    sqlx::query_scalar("SELECT id FROM workouts WHERE id = $1")
                        .bind(workout_id)
                        .fetch_optional(&mut *tx)
                        .await?;
                exists.ok_or_else(|| {
                    AppError::invalid_input(format!("Unknown workout_id {workout_id}"))
                })?
            }
            (None, Some(new_workout)) => insert_workout(&mut tx, new_workout).await?,
            _ => {
                return Err(AppError::invalid_input(
                    "Provide exactly one of workout_id or new_workout",
                ))
            }
        };

        let id = new_id();
        let position = next_position(&mut tx, program_id, request.week, request.day).await?;
        sqlx::query(
            r"
            INSERT INTO program_workouts (id, program_id, workout_id, week, day, position, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(&id)
        .bind(program_id)
        .bind(&workout_id)
        .bind(to_i64(request.week))
        .bind(to_i64(request.day))
        .bind(position)
        .bind(now_timestamp())
        .execute(&mut *tx)
        .await?;
        touch_program(&mut tx, program_id).await?;
        tx.commit().await?;

        self.get_program_workout(&id).await
    }

    /// Move a slot to the end of another program day
    ///
    /// # Errors
    ///
    /// Returns not found for an unknown slot, invalid input for a day
    /// outside the program
    pub async fn move_workout(
        &self,
        id: &str,
        request: MoveProgramWorkout,
    ) -> AppResult<ProgramWorkout> {
        let slot = self.get_program_workout(id).await?;
        let program = self.get(&slot.program_id).await?;
        check_slot(&program, request.week, request.day)?;
        if slot.week == request.week && slot.day == request.day {
            return Ok(slot);
        }

        let mut tx = self.pool.begin().await?;
        let position = next_position(&mut tx, &slot.program_id, request.week, request.day).await?;
        sqlx::query("UPDATE program_workouts SET week = $1, day = $2, position = $3 WHERE id = $4")
            .bind(to_i64(request.week))
            .bind(to_i64(request.day))
            .bind(position)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        compact_day(&mut tx, &slot.program_id, slot.week, slot.day).await?;
        touch_program(&mut tx, &slot.program_id).await?;
        tx.commit().await?;

        self.get_program_workout(id).await
    }

    /// Unschedule a slot; the workout itself is kept
    ///
    /// # Errors
    ///
    /// Returns not found for an unknown slot
    pub async fn remove_workout(&self, id: &str) -> AppResult<()> {
        let slot = self.get_program_workout(id).await?;
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM program_workouts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        compact_day(&mut tx, &slot.program_id, slot.week, slot.day).await?;
        touch_program(&mut tx, &slot.program_id).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Copy a program and its slots as an unpublished draft sharing the same workouts
    ///
    /// # Errors
    ///
    /// Returns not found for an unknown program
    pub async fn duplicate(&self, id: &str) -> AppResult<ProgramDetail> {
        let source = self.get(id).await?;
        let copy_id = new_id();
        let now = now_timestamp();

        let mut tx = self.pool.begin().await?;
        let slug = free_copy_slug(&mut tx, &source.slug).await?;
        sqlx::query(
            r"
            INSERT INTO programs (id, name, slug, description, goal, difficulty, duration_weeks,
                                  days_per_week, cover_image_url, is_published, created_at, updated_at)
            SELECT $1, name || ' (copy)', $2, description, goal, difficulty, duration_weeks,
                   days_per_week, cover_image_url, 0, $3, $3
            FROM programs WHERE id = $4
            ",
        )
        .bind(&copy_id)
        .bind(&slug)
        .bind(&now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let slot_ids: Vec<String> = sqlx::query_scalar(
            "SELECT id FROM program_workouts WHERE program_id = $1 ORDER BY week, day, position",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;
        for slot_id in slot_ids {
            sqlx::query(
                r"
                INSERT INTO program_workouts (id, program_id, workout_id, week, day, position, created_at)
                SELECT $1, $2, workout_id, week, day, position, $3
                FROM program_workouts WHERE id = $4
                ",
            )
            .bind(new_id())
            .bind(&copy_id)
            .bind(&now)
            .bind(&slot_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        tracing::info!(program.source = %id, program.copy = %copy_id, "Program duplicated");
        self.detail(&copy_id).await
    }

    /// Published program schedule grouped by week then day
    ///
    /// # Errors
    ///
    /// Returns not found for an unknown or unpublished slug
    pub async fn schedule_by_slug(&self, slug: &str) -> AppResult<ProgramSchedule> {
        let sql = format!(
            "SELECT {PROGRAM_COLUMNS} FROM programs p WHERE p.slug = $1 AND p.is_published = 1"
        );
        let program = sqlx::query(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(row_to_program)
            .transpose()?
            .ok_or_else(|| AppError::not_found("Program"))?;

        let slots = self.program_workouts(&program.id).await?;
        let mut conn = self.pool.acquire().await?;
        let mut weeks: Vec<ScheduleWeek> = Vec::new();
        for slot in slots {
            let scheduled = ScheduledWorkout {
                workout: load_detail(&mut conn, &slot.workout_id).await?,
                program_workout_id: slot.id,
                position: slot.position,
            };
            if weeks.last().map(|w| w.week) != Some(slot.week) {
                weeks.push(ScheduleWeek {
                    week: slot.week,
                    days: Vec::new(),
                });
            }
            let Some(week) = weeks.last_mut() else {
                continue;
            };
            if week.days.last().map(|d| d.day) != Some(slot.day) {
                week.days.push(ScheduleDay {
                    day: slot.day,
                    workouts: Vec::new(),
                });
            }
            if let Some(day) = week.days.last_mut() {
                day.workouts.push(scheduled);
            }
        }
        Ok(ProgramSchedule { program, weeks })
    }

    /// Record that a user completed a workout
    ///
    /// # Errors
    ///
    /// Returns not found for an unknown workout or program, invalid input
    /// for an out of range duration
    pub async fn log_completion(
        &self,
        user_id: &str,
        workout_id: &str,
        request: &CompleteWorkout,
    ) -> AppResult<WorkoutLog> {
        let duration_minutes = request
            .duration_minutes
            .map(|d| in_range("duration_minutes", d, 1, 600))
            .transpose()?;
        let workout: Option<String> = sqlx::query_scalar("SELECT id FROM workouts WHERE id = $1")
            .bind(workout_id)
            .fetch_optional(&self.pool)
            .await?;
        if workout.is_none() {
            return Err(AppError::not_found("Workout"));
        }
        if let Some(program_id) = &request.program_id {
            self.get(program_id).await?;
        }

        let id = new_id();
        sqlx::query(
            r"
            INSERT INTO workout_logs (id, user_id, workout_id, program_id, duration_minutes, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(&id)
        .bind(user_id)
        .bind(workout_id)
        .bind(&request.program_id)
        .bind(duration_minutes.map(to_i64))
        .bind(now_timestamp())
        .execute(&self.pool)
        .await?;

        let row = sqlx::query("SELECT * FROM workout_logs WHERE id = $1")
            .bind(&id)
            .fetch_one(&self.pool)
            .await?;
        row_to_workout_log(&row)
    }
}

fn check_slot(program: &Program, week: u32, day: u32) -> AppResult<()> {
    in_range("week", week, 1, program.duration_weeks)?;
    in_range("day", day, 1, 7)?;
    Ok(())
}

async fn next_position(
    conn: &mut SqliteConnection,
    program_id: &str,
    week: u32,
    day: u32,
) -> AppResult<i64> {
    Ok(sqlx::query_scalar(
        "SELECT COUNT(*) FROM program_workouts WHERE program_id = $1 AND week = $2 AND day = $3",
    )
    .bind(program_id)
    .bind(to_i64(week))
    .bind(to_i64(day))
    .fetch_one(&mut *conn)
    .await?)
}

// Positions only ever move down here, so the unique slot index never collides
async fn compact_day(
    conn: &mut SqliteConnection,
    program_id: &str,
    week: u32,
    day: u32,
) -> AppResult<()> {
    let ids: Vec<String> = sqlx::query_scalar(
        r"
        SELECT id FROM program_workouts
        WHERE program_id = $1 AND week = $2 AND day = $3
        ORDER BY position
        ",
    )
    .bind(program_id)
    .bind(to_i64(week))
    .bind(to_i64(day))
    .fetch_all(&mut *conn)
    .await?;
    for (position, id) in (0_i64..).zip(ids) {
        sqlx::query("UPDATE program_workouts SET position = $1 WHERE id = $2")
            .bind(position)
            .bind(id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn free_copy_slug(conn: &mut SqliteConnection, slug: &str) -> AppResult<String> {
    let base = format!("{slug}-copy");
    let mut candidate = base.clone();
    let mut suffix = 2_u32;
    loop {
        let taken: Option<String> = sqlx::query_scalar("SELECT id FROM programs WHERE slug = $1")
            .bind(&candidate)
            .fetch_optional(&mut *conn)
            .await?;
        if taken.is_none() {
            return Ok(candidate);
        }
        candidate = format!("{base}-{suffix}");
        suffix += 1;
    }
}

async fn touch_program(conn: &mut SqliteConnection, program_id: &str) -> AppResult<()> {
    sqlx::query("UPDATE programs SET updated_at = $1 WHERE id = $2")
        .bind(now_timestamp())
        .bind(program_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

fn row_to_program(row: &SqliteRow) -> AppResult<Program> {
    let goal: String = row.get("goal");
    let difficulty: String = row.get("difficulty");
    let duration_weeks: i64 = row.get("duration_weeks");
    let days_per_week: i64 = row.get("days_per_week");
    let workout_count: i64 = row.get("workout_count");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");
    Ok(Program {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        description: row.get("description"),
        goal: ProgramGoal::from_db(&goal)?,
        difficulty: Difficulty::from_db(&difficulty)?,
        duration_weeks: to_u32(duration_weeks),
        days_per_week: to_u32(days_per_week),
        cover_image_url: row.get("cover_image_url"),
        is_published: row.get("is_published"),
        workout_count: to_u32(workout_count),
        created_at: parse_db_timestamp(&created_at)?,
        updated_at: parse_db_timestamp(&updated_at)?,
    })
}

fn row_to_program_workout(row: &SqliteRow) -> ProgramWorkout {
    let week: i64 = row.get("week");
    let day: i64 = row.get("day");
    let position: i64 = row.get("position");
    ProgramWorkout {
        id: row.get("id"),
        program_id: row.get("program_id"),
        workout_id: row.get("workout_id"),
        workout_name: row.get("workout_name"),
        week: to_u32(week),
        day: to_u32(day),
        position: to_u32(position),
    }
}

fn row_to_workout_log(row: &SqliteRow) -> AppResult<WorkoutLog> {
    let duration_minutes: Option<i64> = row.get("duration_minutes");
    let completed_at: String = row.get("completed_at");
    Ok(WorkoutLog {
        id: row.get("id"),
        user_id: row.get("user_id"),
        workout_id: row.get("workout_id"),
        program_id: row.get("program_id"),
        duration_minutes: duration_minutes.map(to_u32),
        completed_at: parse_db_timestamp(&completed_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program_input(name: &str, weeks: u32) -> ProgramInput {
        ProgramInput {
            name: name.to_owned(),
            slug: None,
            description: None,
            goal: ProgramGoal::Strength,
            difficulty: Difficulty::Beginner,
            duration_weeks: weeks,
            days_per_week: 3,
            cover_image_url: None,
            is_published: true,
        }
    }

    fn new_workout(name: &str) -> WorkoutInput {
        WorkoutInput {
            name: name.to_owned(),
            description: None,
            difficulty: Difficulty::Beginner,
            estimated_minutes: 40,
        }
    }

    #[test]
    fn test_program_validation() {
        assert!(program_input("Starter", 0).validate().is_err());
        assert!(program_input("Starter", MAX_PROGRAM_WEEKS + 1).validate().is_err());
        assert_eq!(program_input("Starter Strength", 4).validate().unwrap().slug, "starter-strength");
    }

    #[tokio::test]
    async fn test_schedule_slots_stay_dense_and_workouts_survive_removal() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let programs = db.programs();
        let program = programs.create(&program_input("Starter", 2)).await.unwrap();

        let first = programs
            .add_workout(
                &program.id,
                &AddProgramWorkout {
                    workout_id: None,
                    new_workout: Some(new_workout("Day A")),
                    week: 1,
                    day: 1,
                },
            )
            .await
            .unwrap();
        let second = programs
            .add_workout(
                &program.id,
                &AddProgramWorkout {
                    workout_id: Some(first.workout_id.clone()),
                    new_workout: None,
                    week: 1,
                    day: 1,
                },
            )
            .await
            .unwrap();
        assert_eq!((first.position, second.position), (0, 1));

        let out_of_range = programs
            .add_workout(
                &program.id,
                &AddProgramWorkout {
                    workout_id: Some(first.workout_id.clone()),
                    new_workout: None,
                    week: 3,
                    day: 1,
                },
            )
            .await;
        assert!(out_of_range.is_err());

        let moved = programs
            .move_workout(&first.id, MoveProgramWorkout { week: 2, day: 3 })
            .await
            .unwrap();
        assert_eq!((moved.week, moved.day, moved.position), (2, 3, 0));
        let remaining = programs.get_program_workout(&second.id).await.unwrap();
        assert_eq!(remaining.position, 0);

        programs.remove_workout(&second.id).await.unwrap();
        programs.remove_workout(&first.id).await.unwrap();
        assert!(db.workouts().get(&first.workout_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_shares_workouts() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let programs = db.programs();
        let program = programs.create(&program_input("Starter", 1)).await.unwrap();
        let slot = programs
            .add_workout(
                &program.id,
                &AddProgramWorkout {
                    workout_id: None,
                    new_workout: Some(new_workout("Day A")),
                    week: 1,
                    day: 2,
                },
            )
            .await
            .unwrap();

        let copy = programs.duplicate(&program.id).await.unwrap();
        assert_eq!(copy.program.slug, "starter-copy");
        assert!(!copy.program.is_published);
        assert_eq!(copy.program_workouts.len(), 1);
        assert_eq!(copy.program_workouts[0].workout_id, slot.workout_id);

        let again = programs.duplicate(&program.id).await.unwrap();
        assert_eq!(again.program.slug, "starter-copy-2");

        let workout = db.workouts().get(&slot.workout_id).await.unwrap();
        assert_eq!(workout.program_workout_count, 3);
    }
}
