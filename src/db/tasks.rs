//! Task CRUD operations.
//!
//! Each method runs exactly one statement against the `tasks` table. Methods
//! targeting an id return `Ok(None)` / `Ok(false)` when no row matched so the
//! caller can decide how to report it.

use super::{Database, now_ms};
use crate::types::Task;
use anyhow::Result;
use rusqlite::{OptionalExtension, Row, params};

const TASK_COLUMNS: &str = "id, title, description, completed, created_at";

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let id: i64 = row.get("id")?;
    let title: String = row.get("title")?;
    let description: Option<String> = row.get("description")?;
    let completed: bool = row.get("completed")?;
    let created_at: i64 = row.get("created_at")?;

    Ok(Task {
        id,
        title,
        description,
        completed,
        created_at,
    })
}

/// Collapse an empty description to absent. Any other text is kept as given.
fn normalize_description(description: Option<&str>) -> Option<&str> {
    description.filter(|d| !d.is_empty())
}

impl Database {
    /// List all tasks, most recently created first.
    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks ORDER BY created_at DESC, id DESC"
            ))?;
            let tasks = stmt
                .query_map([], parse_task_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tasks)
        })
    }

    /// Get a task by id.
    pub fn get_task(&self, id: i64) -> Result<Option<Task>> {
        self.with_conn(|conn| {
            let task = conn
                .query_row(
                    &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
                    params![id],
                    parse_task_row,
                )
                .optional()?;
            Ok(task)
        })
    }

    /// Insert a new, incomplete task and return the stored row.
    pub fn insert_task(&self, title: &str, description: Option<&str>) -> Result<Task> {
        let now = now_ms();
        let description = normalize_description(description);

        self.with_conn(|conn| {
            let task = conn.query_row(
                &format!(
                    "INSERT INTO tasks (title, description, completed, created_at)
                     VALUES (?1, ?2, 0, ?3)
                     RETURNING {TASK_COLUMNS}"
                ),
                params![title, description, now],
                parse_task_row,
            )?;
            Ok(task)
        })
    }

    /// Flip `completed` on a task in a single statement.
    pub fn toggle_task(&self, id: i64) -> Result<Option<Task>> {
        self.with_conn(|conn| {
            let task = conn
                .query_row(
                    &format!(
                        "UPDATE tasks SET completed = NOT completed
                         WHERE id = ?1
                         RETURNING {TASK_COLUMNS}"
                    ),
                    params![id],
                    parse_task_row,
                )
                .optional()?;
            Ok(task)
        })
    }

    /// Overwrite title and description.
    pub fn update_task(&self, id: i64, title: &str, description: &str) -> Result<Option<Task>> {
        let description = normalize_description(Some(description));

        self.with_conn(|conn| {
            let task = conn
                .query_row(
                    &format!(
                        "UPDATE tasks SET title = ?2, description = ?3
                         WHERE id = ?1
                         RETURNING {TASK_COLUMNS}"
                    ),
                    params![id, title, description],
                    parse_task_row,
                )
                .optional()?;
            Ok(task)
        })
    }

    /// Permanently remove a task. Returns whether a row was deleted.
    pub fn delete_task(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
            Ok(deleted > 0)
        })
    }

    /// Number of stored tasks.
    pub fn count_tasks(&self) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))?;
            Ok(count)
        })
    }
}
