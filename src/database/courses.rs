// ABOUTME: Course and lesson catalog operations plus per-user lesson progress
// ABOUTME: Keeps lesson positions dense and reports course completion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

use chrono::{DateTime, Utc};
use fithub_core::pagination::{Page, PageParams};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use super::filters::Filters;
use super::positions::{ensure_same_members, LESSONS};
use super::{new_id, now_timestamp, parse_db_timestamp, to_u32, to_u64, Database};
use crate::enums::Difficulty;
use crate::errors::{AppError, AppResult};
use crate::utils::slug::{is_valid_slug, slugify};
use crate::utils::validation::{in_range, optional_url, require_title, text};

/// An educational course
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Course {
    /// Unique identifier
    pub id: String,
    /// Title
    pub title: String,
    /// Unique URL slug
    pub slug: String,
    /// Description
    pub description: String,
    /// Skill level
    pub level: Difficulty,
    /// Cover image
    pub cover_image_url: Option<String>,
    /// Visible on the dashboard
    pub is_published: bool,
    /// Number of lessons
    pub lesson_count: u32,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// A lesson within a course
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Lesson {
    /// Unique identifier
    pub id: String,
    /// Owning course
    pub course_id: String,
    /// Title
    pub title: String,
    /// Body (markdown)
    pub content: String,
    /// Optional video
    pub video_url: Option<String>,
    /// Estimated duration
    pub duration_minutes: u32,
    /// Zero-based order within the course
    pub position: u32,
}

/// Admin form for a course
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseInput {
    /// Title
    pub title: String,
    /// Slug; derived from the title when absent
    #[serde(default)]
    pub slug: Option<String>,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Skill level
    pub level: Difficulty,
    /// Cover image
    #[serde(default)]
    pub cover_image_url: Option<String>,
    /// Visible on the dashboard
    #[serde(default)]
    pub is_published: bool,
}

/// Admin form for a lesson
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonInput {
    /// Title
    pub title: String,
    /// Body
    #[serde(default)]
    pub content: Option<String>,
    /// Optional video
    #[serde(default)]
    pub video_url: Option<String>,
    /// Estimated duration
    #[serde(default)]
    pub duration_minutes: u32,
    /// Target position; appended when absent
    #[serde(default)]
    pub position: Option<u32>,
}

/// Course list filter
#[derive(Debug, Clone, Default)]
pub struct CourseFilter {
    /// Only published courses
    pub published_only: bool,
    /// Skill level
    pub level: Option<Difficulty>,
    /// Title or description search
    pub q: Option<String>,
}

/// A user's completion of one course
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CourseProgress {
    /// Lessons completed
    pub completed: u32,
    /// Lessons in the course
    pub total: u32,
    /// Whole-number percentage
    pub percent: u32,
    /// Every lesson completed
    pub course_completed: bool,
}

impl CourseProgress {
    fn new(completed: u32, total: u32) -> Self {
        let percent = if total == 0 {
            0
        } else {
            (completed * 100 + total / 2) / total
        };
        Self {
            completed,
            total,
            percent,
            course_completed: total > 0 && completed >= total,
        }
    }
}

struct ValidCourse {
    title: String,
    slug: String,
    description: String,
    level: Difficulty,
    cover_image_url: Option<String>,
    is_published: bool,
}

impl CourseInput {
    fn validate(&self) -> AppResult<ValidCourse> {
        let title = require_title("title", &self.title)?;
        let slug = match self.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(slug) if is_valid_slug(slug) => slug.to_owned(),
            Some(slug) => {
                return Err(AppError::invalid_input(format!(
                    "slug must be lowercase words joined by hyphens, got {slug}"
                )))
            }
            None => slugify(&title),
        };
        if slug.is_empty() {
            return Err(AppError::invalid_input("title must contain letters or digits"));
        }
        Ok(ValidCourse {
            title,
            slug,
            description: text("description", self.description.as_deref())?,
            level: self.level,
            cover_image_url: optional_url("cover_image_url", self.cover_image_url.as_deref())?,
            is_published: self.is_published,
        })
    }
}

struct ValidLesson {
    title: String,
    content: String,
    video_url: Option<String>,
    duration_minutes: u32,
}

impl LessonInput {
    fn validate(&self) -> AppResult<ValidLesson> {
        Ok(ValidLesson {
            title: require_title("title", &self.title)?,
            content: text("content", self.content.as_deref())?,
            video_url: optional_url("video_url", self.video_url.as_deref())?,
            duration_minutes: in_range("duration_minutes", self.duration_minutes, 0, 600)?,
        })
    }
}

impl Database {
    pub(super) async fn migrate_courses(&self) -> AppResult<()> {
        self.execute_all(&[
            r"
            CREATE TABLE IF NOT EXISTS courses (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                slug TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL DEFAULT '',
                level TEXT NOT NULL,
                cover_image_url TEXT,
                is_published INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
            r"
            CREATE TABLE IF NOT EXISTS lessons (
                id TEXT PRIMARY KEY,
                course_id TEXT NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                content TEXT NOT NULL DEFAULT '',
                video_url TEXT,
                duration_minutes INTEGER NOT NULL DEFAULT 0,
                position INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_lessons_course ON lessons(course_id, position)",
            r"
            CREATE TABLE IF NOT EXISTS lesson_progress (
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                lesson_id TEXT NOT NULL REFERENCES lessons(id) ON DELETE CASCADE,
                course_id TEXT NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
                completed_at TEXT NOT NULL,
                PRIMARY KEY (user_id, lesson_id)
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_lesson_progress_course ON lesson_progress(user_id, course_id)",
        ])
        .await
    }
}

const COURSE_COLUMNS: &str = r"
    c.id, c.title, c.slug, c.description, c.level, c.cover_image_url, c.is_published,
    c.created_at, c.updated_at,
    (SELECT COUNT(*) FROM lessons l WHERE l.course_id = c.id) AS lesson_count
";

/// Course database operations
pub struct CoursesManager {
    pool: SqlitePool,
}

impl CoursesManager {
    /// Create a new courses manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a course
    ///
    /// # Errors
    ///
    /// Returns invalid input for bad fields and a conflict for a taken slug
    pub async fn create(&self, input: &CourseInput) -> AppResult<Course> {
        let course = input.validate()?;
        let id = new_id();
        let now = now_timestamp();
        sqlx::query(
            r"
            INSERT INTO courses (id, title, slug, description, level, cover_image_url,
                                 is_published, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            ",
        )
        .bind(&id)
        .bind(&course.title)
        .bind(&course.slug)
        .bind(&course.description)
        .bind(course.level.as_str())
        .bind(&course.cover_image_url)
        .bind(course.is_published)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        self.require(&id).await
    }

    /// Get a course by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get(&self, id: &str) -> AppResult<Option<Course>> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses c WHERE c.id = $1");
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(row_to_course).transpose()
    }

    /// Get a course by id or fail with not found
    ///
    /// # Errors
    ///
    /// Returns not found when the course does not exist
    pub async fn require(&self, id: &str) -> AppResult<Course> {
        self.get(id).await?.ok_or_else(|| AppError::not_found("Course"))
    }

    /// Get a published course by slug
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_published_by_slug(&self, slug: &str) -> AppResult<Option<Course>> {
        let sql = format!(
            "SELECT {COURSE_COLUMNS} FROM courses c WHERE c.slug = $1 AND c.is_published = 1"
        );
        let row = sqlx::query(&sql).bind(slug).fetch_optional(&self.pool).await?;
        row.as_ref().map(row_to_course).transpose()
    }

    /// List courses, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list(&self, filter: &CourseFilter, page: &PageParams) -> AppResult<Page<Course>> {
        let mut filters = Filters::new();
        if filter.published_only {
            filters.push("c.is_published = 1");
        }
        if let Some(level) = filter.level {
            filters.push_text("c.level = ?", level.as_str());
        }
        filters.push_search(&["c.title", "c.description"], filter.q.as_deref());
        let where_clause = filters.where_clause();

        let count_sql = format!("SELECT COUNT(*) FROM courses c {where_clause}");
        let total: i64 = filters
            .bind_as(sqlx::query_as::<_, (i64,)>(&count_sql))
            .fetch_one(&self.pool)
            .await?
            .0;

        let list_sql = format!(
            "SELECT {COURSE_COLUMNS} FROM courses c {where_clause} ORDER BY c.created_at DESC, c.id LIMIT ? OFFSET ?"
        );
        let rows = filters
            .bind(sqlx::query(&list_sql))
            .bind(i64::from(page.limit()))
            .bind(i64::from(page.offset()))
            .fetch_all(&self.pool)
            .await?;
        let items = rows.iter().map(row_to_course).collect::<AppResult<Vec<_>>>()?;
        Ok(Page::new(items, to_u64(total), page))
    }

    /// Replace a course's fields
    ///
    /// # Errors
    ///
    /// Returns not found, invalid input or a slug conflict
    pub async fn update(&self, id: &str, input: &CourseInput) -> AppResult<Course> {
        let course = input.validate()?;
        let result = sqlx::query(
            r"
            UPDATE courses SET title = $1, slug = $2, description = $3, level = $4,
                cover_image_url = $5, is_published = $6, updated_at = $7
            WHERE id = $8
            ",
        )
        .bind(&course.title)
        .bind(&course.slug)
        .bind(&course.description)
        .bind(course.level.as_str())
        .bind(&course.cover_image_url)
        .bind(course.is_published)
        .bind(now_timestamp())
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Course"));
        }
        self.require(id).await
    }

    /// Delete a course with its lessons and progress
    ///
    /// # Errors
    ///
    /// Returns not found when the course does not exist
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Course"));
        }
        Ok(())
    }

    /// Lessons of a course in position order
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_lessons(&self, course_id: &str) -> AppResult<Vec<Lesson>> {
        let rows = sqlx::query(
            "SELECT * FROM lessons WHERE course_id = $1 ORDER BY position ASC, id ASC",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_lesson).collect())
    }

    /// Get a lesson by id
    ///
    /// # Errors
    ///
    /// Returns not found when the lesson does not exist
    pub async fn get_lesson(&self, id: &str) -> AppResult<Lesson> {
        sqlx::query("SELECT * FROM lessons WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(row_to_lesson)
            .ok_or_else(|| AppError::not_found("Lesson"))
    }

    /// Add a lesson, shifting later lessons when a position is given
    ///
    /// # Errors
    ///
    /// Returns not found for an unknown course or invalid input for bad fields
    pub async fn add_lesson(&self, course_id: &str, input: &LessonInput) -> AppResult<Lesson> {
        let lesson = input.validate()?;
        self.require(course_id).await?;

        let id = new_id();
        let now = now_timestamp();
        let mut tx = self.pool.begin().await?;
        let position = LESSONS.insert_slot(&mut tx, course_id, input.position).await?;
        LESSONS.open_gap(&mut tx, course_id, position).await?;
        sqlx::query(
            r"
            INSERT INTO lessons (id, course_id, title, content, video_url, duration_minutes,
                                 position, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            ",
        )
        .bind(&id)
        .bind(course_id)
        .bind(&lesson.title)
        .bind(&lesson.content)
        .bind(&lesson.video_url)
        .bind(i64::from(lesson.duration_minutes))
        .bind(position)
        .bind(&now)
        .execute(&mut *tx)
        .await?;
        touch_course(&mut tx, course_id).await?;
        tx.commit().await?;

        self.get_lesson(&id).await
    }

    /// Update a lesson; a new position moves it within the course
    ///
    /// # Errors
    ///
    /// Returns not found or invalid input
    pub async fn update_lesson(&self, id: &str, input: &LessonInput) -> AppResult<Lesson> {
        let lesson = input.validate()?;
        let existing = self.get_lesson(id).await?;

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r"
            UPDATE lessons SET title = $1, content = $2, video_url = $3,
                duration_minutes = $4, updated_at = $5
            WHERE id = $6
            ",
        )
        .bind(&lesson.title)
        .bind(&lesson.content)
        .bind(&lesson.video_url)
        .bind(i64::from(lesson.duration_minutes))
        .bind(now_timestamp())
        .bind(id)
        .execute(&mut *tx)
        .await?;
        if let Some(position) = input.position.filter(|p| *p != existing.position) {
            LESSONS
                .move_to(&mut tx, &existing.course_id, id, position as usize)
                .await?;
        }
        touch_course(&mut tx, &existing.course_id).await?;
        tx.commit().await?;

        self.get_lesson(id).await
    }

    /// Delete a lesson and close the gap it leaves
    ///
    /// # Errors
    ///
    /// Returns not found when the lesson does not exist
    pub async fn delete_lesson(&self, id: &str) -> AppResult<()> {
        let existing = self.get_lesson(id).await?;
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM lessons WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        LESSONS.compact(&mut tx, &existing.course_id).await?;
        touch_course(&mut tx, &existing.course_id).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Reorder all lessons of a course
    ///
    /// # Errors
    ///
    /// Returns invalid input unless `lesson_ids` lists exactly the course's lessons
    pub async fn reorder_lessons(&self, course_id: &str, lesson_ids: &[String]) -> AppResult<Vec<Lesson>> {
        self.require(course_id).await?;
        let mut tx = self.pool.begin().await?;
        let current = LESSONS.ids(&mut tx, course_id).await?;
        ensure_same_members(&current, lesson_ids)?;
        LESSONS.renumber(&mut tx, course_id, lesson_ids).await?;
        touch_course(&mut tx, course_id).await?;
        tx.commit().await?;
        self.list_lessons(course_id).await
    }

    /// Record a lesson as completed; repeated calls keep the first timestamp
    ///
    /// # Errors
    ///
    /// Returns not found when the lesson is not part of the course
    pub async fn complete_lesson(
        &self,
        user_id: &str,
        course_id: &str,
        lesson_id: &str,
    ) -> AppResult<CourseProgress> {
        let lesson = self.get_lesson(lesson_id).await?;
        if lesson.course_id != course_id {
            return Err(AppError::not_found("Lesson"));
        }
        sqlx::query(
            r"
            INSERT OR IGNORE INTO lesson_progress (user_id, lesson_id, course_id, completed_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(user_id)
        .bind(lesson_id)
        .bind(course_id)
        .bind(now_timestamp())
        .execute(&self.pool)
        .await?;
        self.progress(user_id, course_id).await
    }

    /// A user's progress through a course
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn progress(&self, user_id: &str, course_id: &str) -> AppResult<CourseProgress> {
        let (completed, total): (i64, i64) = sqlx::query_as(
            r"
            SELECT
                (SELECT COUNT(*) FROM lesson_progress p
                 JOIN lessons l ON l.id = p.lesson_id
                 WHERE p.user_id = $1 AND l.course_id = $2),
                (SELECT COUNT(*) FROM lessons WHERE course_id = $2)
            ",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(CourseProgress::new(to_u32(completed), to_u32(total)))
    }

    /// Ids of the lessons a user completed in a course
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn completed_lesson_ids(&self, user_id: &str, course_id: &str) -> AppResult<Vec<String>> {
        let rows = sqlx::query(
            "SELECT lesson_id FROM lesson_progress WHERE user_id = $1 AND course_id = $2",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(|r| r.get("lesson_id")).collect())
    }
}

async fn touch_course(conn: &mut sqlx::SqliteConnection, course_id: &str) -> AppResult<()> {
    sqlx::query("UPDATE courses SET updated_at = $1 WHERE id = $2")
        .bind(now_timestamp())
        .bind(course_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

fn row_to_course(row: &SqliteRow) -> AppResult<Course> {
    let level: String = row.get("level");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");
    let lesson_count: i64 = row.get("lesson_count");

    Ok(Course {
        id: row.get("id"),
        title: row.get("title"),
        slug: row.get("slug"),
        description: row.get("description"),
        level: Difficulty::from_db(&level)?,
        cover_image_url: row.get("cover_image_url"),
        is_published: row.get("is_published"),
        lesson_count: to_u32(lesson_count),
        created_at: parse_db_timestamp(&created_at)?,
        updated_at: parse_db_timestamp(&updated_at)?,
    })
}

fn row_to_lesson(row: &SqliteRow) -> Lesson {
    let duration: i64 = row.get("duration_minutes");
    let position: i64 = row.get("position");
    Lesson {
        id: row.get("id"),
        course_id: row.get("course_id"),
        title: row.get("title"),
        content: row.get("content"),
        video_url: row.get("video_url"),
        duration_minutes: to_u32(duration),
        position: to_u32(position),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percent() {
        assert_eq!(CourseProgress::new(0, 0).percent, 0);
        assert!(!CourseProgress::new(0, 0).course_completed);
        assert_eq!(CourseProgress::new(1, 3).percent, 33);
        assert_eq!(CourseProgress::new(2, 3).percent, 67);
        assert!(CourseProgress::new(3, 3).course_completed);
    }

    #[test]
    fn test_course_input_slug() {
        let input = CourseInput {
            title: "Mobility Basics 101".into(),
            slug: None,
            description: None,
            level: Difficulty::Beginner,
            cover_image_url: None,
            is_published: false,
        };
        assert_eq!(input.validate().unwrap().slug, "mobility-basics-101");

        let bad = CourseInput {
            slug: Some("Not A Slug".into()),
            ..input
        };
        assert!(bad.validate().is_err());
    }
}
