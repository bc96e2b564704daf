// ABOUTME: Dense ordering helpers for child rows kept at positions 0..n-1
// ABOUTME: Shared by lessons within a course and exercises within a workout

use sqlx::{Row, SqliteConnection};

use crate::errors::{AppError, AppResult};

/// A child table ordered by an integer `position` within a parent
#[derive(Debug, Clone, Copy)]
pub struct OrderedTable {
    /// Child table name
    pub table: &'static str,
    /// Column referencing the parent
    pub parent_column: &'static str,
}

/// Lessons within a course
pub const LESSONS: OrderedTable = OrderedTable {
    table: "lessons",
    parent_column: "course_id",
};

/// Exercises within a workout
pub const WORKOUT_EXERCISES: OrderedTable = OrderedTable {
    table: "workout_exercises",
    parent_column: "workout_id",
};

impl OrderedTable {
    /// Child ids in position order
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn ids(&self, conn: &mut SqliteConnection, parent_id: &str) -> AppResult<Vec<String>> {
        let sql = format!(
            "SELECT id FROM {} WHERE {} = $1 ORDER BY position ASC, id ASC",
            self.table, self.parent_column
        );
        let rows = sqlx::query(&sql).bind(parent_id).fetch_all(&mut *conn).await?;
        Ok(rows.iter().map(|r| r.get("id")).collect())
    }

    /// Shift rows at or after `at` one slot down to make room for an insert
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn open_gap(&self, conn: &mut SqliteConnection, parent_id: &str, at: i64) -> AppResult<()> {
        let sql = format!(
            "UPDATE {} SET position = position + 1 WHERE {} = $1 AND position >= $2",
            self.table, self.parent_column
        );
        sqlx::query(&sql).bind(parent_id).bind(at).execute(&mut *conn).await?;
        Ok(())
    }

    /// Assign positions 0..n-1 following `ordered_ids`
    ///
    /// # Errors
    ///
    /// Returns an error if an update fails
    pub async fn renumber(
        &self,
        conn: &mut SqliteConnection,
        parent_id: &str,
        ordered_ids: &[String],
    ) -> AppResult<()> {
        let sql = format!(
            "UPDATE {} SET position = $1 WHERE id = $2 AND {} = $3",
            self.table, self.parent_column
        );
        for (position, id) in (0_i64..).zip(ordered_ids) {
            sqlx::query(&sql)
                .bind(position)
                .bind(id)
                .bind(parent_id)
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    /// Close any gaps left by a delete
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails
    pub async fn compact(&self, conn: &mut SqliteConnection, parent_id: &str) -> AppResult<()> {
        let ids = self.ids(conn, parent_id).await?;
        self.renumber(conn, parent_id, &ids).await
    }

    /// Move one child to `to` (clamped) and renumber the rest
    ///
    /// # Errors
    ///
    /// Returns not found when `id` is not a child of `parent_id`
    pub async fn move_to(
        &self,
        conn: &mut SqliteConnection,
        parent_id: &str,
        id: &str,
        to: usize,
    ) -> AppResult<()> {
        let mut ids = self.ids(conn, parent_id).await?;
        let from = ids
            .iter()
            .position(|existing| existing == id)
            .ok_or_else(|| AppError::not_found(format!("{} row {id}", self.table)))?;
        let moved = ids.remove(from);
        ids.insert(to.min(ids.len()), moved);
        self.renumber(conn, parent_id, &ids).await
    }

    /// Position for an insert: the requested slot clamped to the end
    ///
    /// # Errors
    ///
    /// Returns an error if the count query fails
    pub async fn insert_slot(
        &self,
        conn: &mut SqliteConnection,
        parent_id: &str,
        requested: Option<u32>,
    ) -> AppResult<i64> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {} = $1",
            self.table, self.parent_column
        );
        let count: i64 = sqlx::query_scalar(&sql).bind(parent_id).fetch_one(&mut *conn).await?;
        Ok(requested.map_or(count, |p| i64::from(p).min(count)))
    }
}

/// Check that a requested order names exactly the current children
///
/// # Errors
///
/// Returns an invalid input error for missing, unknown or duplicate ids
pub fn ensure_same_members(current: &[String], requested: &[String]) -> AppResult<()> {
    let mut current_sorted = current.to_vec();
    let mut requested_sorted = requested.to_vec();
    current_sorted.sort_unstable();
    requested_sorted.sort_unstable();
    if current_sorted != requested_sorted {
        return Err(AppError::invalid_input(
            "Order must list every existing item exactly once",
        ));
    }
    Ok(())
}
