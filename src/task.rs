//! Wire types for the Yarimausu REST service.
//!
//! This module defines the `Task`, `TaskList` and `Comment` records exactly as
//! the service serialises them (camelCase JSON, UUID string ids for lists and
//! tasks, serial integer ids for comments), plus the snapshot normalisation
//! applied to every fetched task set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fields::Status;

/// Priority applied when the service returns none. Rows created before the
/// priority column existed come back null.
pub const DEFAULT_PRIORITY: f64 = 1.0;

/// A single task within a shared list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub list_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: Status,
    /// Name of the last actor to change status/progress/completion.
    /// Empty means unassigned.
    #[serde(default)]
    pub assigned_to: String,
    pub completed: bool,
    #[serde(default)]
    pub progress_percentage: u8,
    /// Sort/display hint only; never drives `position`.
    #[serde(default)]
    pub priority: Option<f64>,
    /// Dense per-status ordering key, assigned by drag-and-drop reordering.
    #[serde(default)]
    pub position: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Effective priority for ordering: the stored value, or the default
    /// when the service returned null.
    pub fn effective_priority(&self) -> f64 {
        self.priority.unwrap_or(DEFAULT_PRIORITY)
    }
}

/// A shareable task list. One URL per list; holders of the link may edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskList {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Append-only comment on a task. No edit or delete exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub task_id: String,
    #[serde(default)]
    pub user_name: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Full list-plus-tasks snapshot as returned by the fetch endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSnapshot {
    pub task_list: TaskList,
    pub tasks: Vec<Task>,
}

impl ListSnapshot {
    /// Normalise a freshly fetched snapshot: null priorities become the
    /// default, and tasks that all share the column default position are
    /// renumbered by their fetch order so the visual order is well defined.
    pub fn normalise(mut self) -> Self {
        for task in &mut self.tasks {
            if task.priority.is_none() {
                task.priority = Some(DEFAULT_PRIORITY);
            }
        }
        // Pre-migration rows all carry position 0; fetch order is creation
        // order, so index assignment preserves it.
        if self.tasks.len() > 1 && self.tasks.iter().all(|t| t.position == 0) {
            for (i, task) in self.tasks.iter_mut().enumerate() {
                task.position = i as i64;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn stamp(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    fn bare_task(id: &str) -> Task {
        Task {
            id: id.into(),
            list_id: "l1".into(),
            title: format!("task {id}"),
            description: None,
            status: Status::NotStarted,
            assigned_to: String::new(),
            completed: false,
            progress_percentage: 0,
            priority: None,
            position: 0,
            created_at: stamp(0),
            updated_at: stamp(0),
        }
    }

    #[test]
    fn normalise_defaults_priority_and_position() {
        let snapshot = ListSnapshot {
            task_list: TaskList {
                id: "l1".into(),
                title: "Groceries".into(),
                description: None,
                created_at: stamp(0),
                updated_at: stamp(0),
            },
            tasks: vec![bare_task("a"), bare_task("b"), bare_task("c")],
        }
        .normalise();

        for (i, task) in snapshot.tasks.iter().enumerate() {
            assert_eq!(task.priority, Some(DEFAULT_PRIORITY));
            assert_eq!(task.position, i as i64);
        }
    }

    #[test]
    fn normalise_keeps_assigned_positions() {
        let mut a = bare_task("a");
        let mut b = bare_task("b");
        a.position = 3;
        b.position = 0;
        b.priority = Some(7.5);
        let snapshot = ListSnapshot {
            task_list: TaskList {
                id: "l1".into(),
                title: "t".into(),
                description: None,
                created_at: stamp(0),
                updated_at: stamp(0),
            },
            tasks: vec![a, b],
        }
        .normalise();

        assert_eq!(snapshot.tasks[0].position, 3);
        assert_eq!(snapshot.tasks[1].position, 0);
        assert_eq!(snapshot.tasks[1].priority, Some(7.5));
    }

    #[test]
    fn task_round_trips_service_json() {
        let json = r#"{
            "id": "6f2d",
            "listId": "l9",
            "title": "Buy milk",
            "description": null,
            "status": "not-started",
            "assignedTo": "",
            "completed": false,
            "progressPercentage": 0,
            "priority": null,
            "position": 2,
            "createdAt": "2025-06-01T09:00:00Z",
            "updatedAt": "2025-06-01T09:00:00Z"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.status, Status::NotStarted);
        assert_eq!(task.position, 2);
        assert_eq!(task.effective_priority(), DEFAULT_PRIORITY);
    }
}
