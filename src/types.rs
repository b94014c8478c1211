//! Core types for the task list.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single to-do item.
///
/// `id` and `created_at` are assigned by the store and never change;
/// `title`, `description` and `completed` are the only mutable fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub completed: bool,
    /// Creation time in milliseconds since the Unix epoch.
    pub created_at: i64,
}

impl Task {
    /// Description text, or an empty string when absent.
    pub fn description_or_empty(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}

/// Input for creating a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Input for overwriting a task's title and description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskEdit {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Client-side view filter over a task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Active => "active",
            Filter::Completed => "completed",
        }
    }

    /// Whether a task is visible under this filter.
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Filter::All => true,
            Filter::Active => !task.completed,
            Filter::Completed => task.completed,
        }
    }

    /// Select the visible tasks, preserving the input order.
    pub fn apply<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        tasks.iter().filter(|t| self.matches(t)).collect()
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Filter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" => Ok(Filter::All),
            "active" => Ok(Filter::Active),
            "completed" | "done" => Ok(Filter::Completed),
            other => Err(format!(
                "Unknown filter '{}': expected all, active, or completed",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: i64, completed: bool) -> Task {
        Task {
            id,
            title: format!("task {}", id),
            description: None,
            completed,
            created_at: id,
        }
    }

    #[test]
    fn filter_selects_by_completion() {
        let tasks = vec![task(1, false), task(2, true)];

        let active: Vec<i64> = Filter::Active.apply(&tasks).iter().map(|t| t.id).collect();
        let completed: Vec<i64> = Filter::Completed.apply(&tasks).iter().map(|t| t.id).collect();
        let all: Vec<i64> = Filter::All.apply(&tasks).iter().map(|t| t.id).collect();

        assert_eq!(active, vec![1]);
        assert_eq!(completed, vec![2]);
        assert_eq!(all, vec![1, 2]);
    }

    #[test]
    fn filter_parses_case_insensitively() {
        assert_eq!("Active".parse::<Filter>().unwrap(), Filter::Active);
        assert_eq!("COMPLETED".parse::<Filter>().unwrap(), Filter::Completed);
        assert_eq!("".parse::<Filter>().unwrap(), Filter::All);
        assert!("archived".parse::<Filter>().is_err());
    }

    #[test]
    fn filter_serializes_lowercase() {
        let json = serde_json::to_string(&Filter::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
    }

    #[test]
    fn task_round_trips_without_description() {
        let json = r#"{"id":3,"title":"Buy milk","completed":false,"created_at":10}"#;
        let t: Task = serde_json::from_str(json).unwrap();
        assert_eq!(t.description, None);
        assert_eq!(t.description_or_empty(), "");
    }
}
