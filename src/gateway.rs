//! Task store gateway: the five operations clients call.
//!
//! [`TaskService`] is the in-process implementation. It validates input,
//! runs one database statement per call, classifies failures into
//! [`ErrorCode`](crate::error::ErrorCode)s, logs them with the operation and
//! task id, and reports every successful write to the cache invalidator.

use crate::cache::{CacheInvalidator, MutationKind, NoopInvalidator};
use crate::db::Database;
use crate::error::{TaskError, TaskResult};
use crate::types::{NewTask, Task, TaskEdit};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Operations over the persisted task collection.
#[async_trait]
pub trait TaskGateway: Send + Sync {
    /// All tasks, newest first.
    async fn list(&self) -> TaskResult<Vec<Task>>;

    /// Create an incomplete task and return it as stored.
    async fn create(&self, task: NewTask) -> TaskResult<Task>;

    /// Flip `completed` and return the updated task.
    async fn toggle_completion(&self, id: i64) -> TaskResult<Task>;

    /// Overwrite title and description and return the updated task.
    async fn update(&self, id: i64, edit: TaskEdit) -> TaskResult<Task>;

    /// Permanently remove a task.
    async fn delete(&self, id: i64) -> TaskResult<()>;
}

#[async_trait]
impl<G: TaskGateway + ?Sized> TaskGateway for Arc<G> {
    async fn list(&self) -> TaskResult<Vec<Task>> {
        (**self).list().await
    }

    async fn create(&self, task: NewTask) -> TaskResult<Task> {
        (**self).create(task).await
    }

    async fn toggle_completion(&self, id: i64) -> TaskResult<Task> {
        (**self).toggle_completion(id).await
    }

    async fn update(&self, id: i64, edit: TaskEdit) -> TaskResult<Task> {
        (**self).update(id, edit).await
    }

    async fn delete(&self, id: i64) -> TaskResult<()> {
        (**self).delete(id).await
    }
}

/// Gateway backed by the SQLite [`Database`].
#[derive(Clone)]
pub struct TaskService {
    db: Arc<Database>,
    invalidator: Arc<dyn CacheInvalidator>,
}

impl TaskService {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            invalidator: Arc::new(NoopInvalidator),
        }
    }

    /// Report successful writes to `invalidator`.
    pub fn with_invalidator(mut self, invalidator: Arc<dyn CacheInvalidator>) -> Self {
        self.invalidator = invalidator;
        self
    }

    fn written(&self, kind: MutationKind, id: i64) {
        debug!(task_id = id, mutation = kind.as_str(), "Task written");
        self.invalidator.invalidate(kind);
    }
}

fn require_title(title: &str) -> TaskResult<()> {
    if title.trim().is_empty() {
        return Err(TaskError::missing_field("title"));
    }
    Ok(())
}

#[async_trait]
impl TaskGateway for TaskService {
    async fn list(&self) -> TaskResult<Vec<Task>> {
        self.db.list_tasks().map_err(|e| {
            error!(operation = "list", error = %e, "Error fetching tasks");
            TaskError::store_unavailable()
        })
    }

    async fn create(&self, task: NewTask) -> TaskResult<Task> {
        if let Err(e) = require_title(&task.title) {
            warn!(operation = "create", "Rejected task with empty title");
            return Err(e);
        }

        let created = self
            .db
            .insert_task(&task.title, task.description.as_deref())
            .map_err(|e| {
                error!(operation = "create", error = %e, "Error adding task");
                TaskError::write_failed("add")
            })?;

        info!(task_id = created.id, "Task created");
        self.written(MutationKind::TaskCreated, created.id);
        Ok(created)
    }

    async fn toggle_completion(&self, id: i64) -> TaskResult<Task> {
        match self.db.toggle_task(id) {
            Ok(Some(task)) => {
                self.written(MutationKind::TaskToggled, id);
                Ok(task)
            }
            Ok(None) => {
                warn!(operation = "toggle", task_id = id, "Task not found");
                Err(TaskError::not_found(id))
            }
            Err(e) => {
                error!(operation = "toggle", task_id = id, error = %e, "Error toggling task");
                Err(TaskError::write_failed("toggle"))
            }
        }
    }

    async fn update(&self, id: i64, edit: TaskEdit) -> TaskResult<Task> {
        if let Err(e) = require_title(&edit.title) {
            warn!(operation = "update", task_id = id, "Rejected empty title");
            return Err(e);
        }

        match self.db.update_task(id, &edit.title, &edit.description) {
            Ok(Some(task)) => {
                self.written(MutationKind::TaskUpdated, id);
                Ok(task)
            }
            Ok(None) => {
                warn!(operation = "update", task_id = id, "Task not found");
                Err(TaskError::not_found(id))
            }
            Err(e) => {
                error!(operation = "update", task_id = id, error = %e, "Error updating task");
                Err(TaskError::write_failed("update"))
            }
        }
    }

    async fn delete(&self, id: i64) -> TaskResult<()> {
        match self.db.delete_task(id) {
            Ok(true) => {
                info!(task_id = id, "Task deleted");
                self.written(MutationKind::TaskDeleted, id);
                Ok(())
            }
            Ok(false) => {
                warn!(operation = "delete", task_id = id, "Task not found");
                Err(TaskError::not_found(id))
            }
            Err(e) => {
                error!(operation = "delete", task_id = id, error = %e, "Error deleting task");
                Err(TaskError::write_failed("delete"))
            }
        }
    }
}
