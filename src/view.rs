//! Task list view state.
//!
//! Holds the client's replica of the task collection plus the transient UI
//! state around it: the active filter, the new-task form buffers and per-item
//! edit buffers. Every write goes through a [`TaskGateway`] first and the
//! replica is only changed from the gateway's acknowledgement. When a write
//! fails the replica is re-synced from a fresh `list()` instead of guessing.

use crate::error::TaskResult;
use crate::gateway::TaskGateway;
use crate::types::{Filter, NewTask, Task, TaskEdit};
use std::collections::HashMap;
use tracing::{debug, warn};

/// State of the add-task form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitState {
    #[default]
    Idle,
    Submitting,
}

/// Edit buffers for one task in edit mode.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditBuffer {
    pub title: String,
    pub description: String,
}

pub struct TaskListView<G> {
    gateway: G,
    tasks: Vec<Task>,
    filter: Filter,
    new_title: String,
    new_description: String,
    submit_state: SubmitState,
    editing: HashMap<i64, EditBuffer>,
}

impl<G: TaskGateway> TaskListView<G> {
    /// Create a view with an empty replica. Call [`load`](Self::load) to fill it.
    pub fn new(gateway: G) -> Self {
        Self::with_tasks(gateway, Vec::new())
    }

    /// Create a view seeded with an already-fetched task list.
    pub fn with_tasks(gateway: G, tasks: Vec<Task>) -> Self {
        Self {
            gateway,
            tasks,
            filter: Filter::default(),
            new_title: String::new(),
            new_description: String::new(),
            submit_state: SubmitState::Idle,
            editing: HashMap::new(),
        }
    }

    /// Replace the replica with the gateway's current list.
    pub async fn load(&mut self) -> TaskResult<()> {
        let tasks = self.gateway.list().await.inspect_err(|e| {
            warn!(error = %e, "Failed to load tasks");
        })?;
        self.replace_all(tasks);
        Ok(())
    }

    /// The full replica, newest first.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: i64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    /// Change the filter. Purely local.
    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    /// Tasks visible under the current filter, in replica order.
    pub fn visible(&self) -> Vec<&Task> {
        self.filter.apply(&self.tasks)
    }

    pub fn new_title(&self) -> &str {
        &self.new_title
    }

    pub fn new_description(&self) -> &str {
        &self.new_description
    }

    pub fn set_new_title(&mut self, title: impl Into<String>) {
        self.new_title = title.into();
    }

    pub fn set_new_description(&mut self, description: impl Into<String>) {
        self.new_description = description.into();
    }

    pub fn submit_state(&self) -> SubmitState {
        self.submit_state
    }

    /// Submit the add-task form.
    ///
    /// Returns `Ok(None)` without calling the gateway when the trimmed title
    /// is empty. On success the created task is prepended and the buffers
    /// are cleared; on failure the buffers are kept.
    pub async fn submit(&mut self) -> TaskResult<Option<Task>> {
        if self.new_title.trim().is_empty() || self.submit_state == SubmitState::Submitting {
            return Ok(None);
        }

        let description = Some(self.new_description.clone()).filter(|d| !d.is_empty());
        let input = NewTask {
            title: self.new_title.clone(),
            description,
        };

        self.submit_state = SubmitState::Submitting;
        let result = self.gateway.create(input).await;
        self.submit_state = SubmitState::Idle;

        match result {
            Ok(task) => {
                self.tasks.insert(0, task.clone());
                self.new_title.clear();
                self.new_description.clear();
                Ok(Some(task))
            }
            Err(e) => {
                warn!(error = %e, "Failed to add task");
                self.resync().await;
                Err(e)
            }
        }
    }

    /// Toggle a task's completion and return the task as stored.
    pub async fn toggle(&mut self, id: i64) -> TaskResult<Task> {
        match self.gateway.toggle_completion(id).await {
            Ok(task) => {
                self.replace_task(task.clone());
                Ok(task)
            }
            Err(e) => {
                warn!(task_id = id, error = %e, "Failed to toggle task");
                self.resync().await;
                Err(e)
            }
        }
    }

    /// Delete a task.
    pub async fn delete(&mut self, id: i64) -> TaskResult<()> {
        match self.gateway.delete(id).await {
            Ok(()) => {
                self.tasks.retain(|t| t.id != id);
                self.editing.remove(&id);
                Ok(())
            }
            Err(e) => {
                warn!(task_id = id, error = %e, "Failed to delete task");
                self.resync().await;
                Err(e)
            }
        }
    }

    /// Enter edit mode for a task, seeding buffers from the replica.
    ///
    /// Returns `false` if the task is not in the replica. Re-entering edit
    /// mode reseeds the buffers.
    pub fn begin_edit(&mut self, id: i64) -> bool {
        let Some(task) = self.task(id) else {
            return false;
        };
        let buffer = EditBuffer {
            title: task.title.clone(),
            description: task.description_or_empty().to_string(),
        };
        self.editing.insert(id, buffer);
        true
    }

    pub fn is_editing(&self, id: i64) -> bool {
        self.editing.contains_key(&id)
    }

    pub fn edit_buffer(&self, id: i64) -> Option<&EditBuffer> {
        self.editing.get(&id)
    }

    pub fn edit_buffer_mut(&mut self, id: i64) -> Option<&mut EditBuffer> {
        self.editing.get_mut(&id)
    }

    /// Leave edit mode and discard the buffers. No gateway call.
    pub fn cancel_edit(&mut self, id: i64) -> bool {
        self.editing.remove(&id).is_some()
    }

    /// Save the edit buffers for a task.
    ///
    /// Returns `Ok(None)` when the task is not in edit mode or the trimmed
    /// title is empty. Edit mode is left only after the gateway accepts the
    /// update; on failure the buffers stay so the user can retry.
    pub async fn save_edit(&mut self, id: i64) -> TaskResult<Option<Task>> {
        let Some(buffer) = self.editing.get(&id) else {
            return Ok(None);
        };
        if buffer.title.trim().is_empty() {
            debug!(task_id = id, "Ignoring save with empty title");
            return Ok(None);
        }

        let edit = TaskEdit {
            title: buffer.title.clone(),
            description: buffer.description.clone(),
        };

        match self.gateway.update(id, edit).await {
            Ok(task) => {
                self.editing.remove(&id);
                self.replace_task(task.clone());
                Ok(Some(task))
            }
            Err(e) => {
                warn!(task_id = id, error = %e, "Failed to update task");
                self.resync().await;
                Err(e)
            }
        }
    }

    fn replace_task(&mut self, task: Task) {
        if let Some(slot) = self.tasks.iter_mut().find(|t| t.id == task.id) {
            *slot = task;
        }
    }

    fn replace_all(&mut self, tasks: Vec<Task>) {
        // Drop edit state for tasks that no longer exist
        self.editing
            .retain(|id, _| tasks.iter().any(|t| t.id == *id));
        self.tasks = tasks;
    }

    /// Refresh the replica after a failed write. Keeps the old replica if
    /// the store cannot be read either.
    async fn resync(&mut self) {
        match self.gateway.list().await {
            Ok(tasks) => {
                debug!(count = tasks.len(), "Re-synced task list after failed write");
                self.replace_all(tasks);
            }
            Err(e) => {
                warn!(error = %e, "Re-sync failed; keeping local task list");
            }
        }
    }
}
