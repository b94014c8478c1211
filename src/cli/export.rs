//! Export subcommand
//!
//! Writes the task store as a JSON snapshot that can be version-controlled
//! or inspected.

use crate::types::{Filter, Task};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Arguments for the export subcommand
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output file path (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Only export tasks matching this filter: all, active, completed
    #[arg(long, default_value = "all")]
    pub filter: Filter,
}

/// Exported view of the store.
#[derive(Debug, Serialize)]
pub struct Snapshot {
    pub schema_version: u32,
    /// RFC 3339 export time.
    pub exported_at: String,
    pub tasks: Vec<Task>,
}

impl Snapshot {
    /// Build a snapshot from a newest-first task list.
    pub fn new(tasks: Vec<Task>, filter: Filter) -> Self {
        Self {
            schema_version: SNAPSHOT_VERSION,
            exported_at: chrono::Utc::now().to_rfc3339(),
            tasks: tasks.into_iter().filter(|t| filter.matches(t)).collect(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: i64, completed: bool) -> Task {
        Task {
            id,
            title: format!("t{}", id),
            description: None,
            completed,
            created_at: id,
        }
    }

    #[test]
    fn test_snapshot_applies_filter() {
        let snapshot = Snapshot::new(vec![task(2, true), task(1, false)], Filter::Completed);
        assert_eq!(snapshot.tasks.len(), 1);
        assert_eq!(snapshot.tasks[0].id, 2);
        assert_eq!(snapshot.schema_version, SNAPSHOT_VERSION);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let snapshot = Snapshot::new(vec![task(1, false)], Filter::All);
        let json: serde_json::Value =
            serde_json::from_str(&snapshot.to_json_pretty().unwrap()).unwrap();
        assert_eq!(json["schema_version"], 1);
        assert_eq!(json["tasks"][0]["title"], "t1");
        assert!(json["exported_at"].is_string());
    }
}
