//! Structured error types for gateway responses.

use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// A required field was empty.
    InvalidInput,
    /// The operation targeted an id with no task.
    NotFound,
    /// A write against the store did not complete.
    WriteFailed,
    /// The store could not be read.
    StoreUnavailable,
}

/// Structured error returned by gateway operations.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TaskError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl TaskError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    // Convenience constructors

    pub fn missing_field(field: &str) -> Self {
        Self::new(ErrorCode::InvalidInput, format!("{} is required", field)).with_field(field)
    }

    pub fn not_found(id: i64) -> Self {
        Self::new(ErrorCode::NotFound, format!("Task not found: {}", id))
    }

    /// Generic failure for a write operation, e.g. `write_failed("toggle")`.
    pub fn write_failed(operation: &str) -> Self {
        Self::new(
            ErrorCode::WriteFailed,
            format!("Failed to {} task", operation),
        )
    }

    pub fn store_unavailable() -> Self {
        Self::new(ErrorCode::StoreUnavailable, "Failed to fetch tasks")
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TaskError {}

/// Result type for gateway operations.
pub type TaskResult<T> = std::result::Result<T, TaskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_code_and_skips_empty_field() {
        let json = serde_json::to_value(TaskError::not_found(7)).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Task not found: 7");
        assert!(json.get("field").is_none());
    }

    #[test]
    fn missing_field_carries_field_name() {
        let err = TaskError::missing_field("title");
        assert_eq!(err.code, ErrorCode::InvalidInput);
        assert_eq!(err.field.as_deref(), Some("title"));
        assert_eq!(err.to_string(), "title is required");
    }

    #[test]
    fn write_failed_names_the_operation() {
        assert_eq!(
            TaskError::write_failed("delete").to_string(),
            "Failed to delete task"
        );
    }
}
