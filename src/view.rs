//! Pure derivation of the rendered task list.
//!
//! Filtering and ordering are recomputed from scratch whenever any input
//! changes; the underlying task set is never mutated.

use crate::fields::{SortSpec, Status};
use crate::ordering::sort_for_display;
use crate::task::Task;

/// Current filter inputs. `status: None` means "all".
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Case-insensitive substring match on title or description.
    pub search: String,
    /// Substring match on the raw task id.
    pub id_query: String,
    pub status: Option<Status>,
}

impl TaskFilter {
    fn matches(&self, task: &Task) -> bool {
        if !self.search.is_empty() {
            let query = self.search.to_lowercase();
            let in_title = task.title.to_lowercase().contains(&query);
            let in_description = task
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&query));
            if !in_title && !in_description {
                return false;
            }
        }
        if !self.id_query.is_empty() && !task.id.contains(&self.id_query) {
            return false;
        }
        if let Some(status) = self.status {
            if task.status != status {
                return false;
            }
        }
        true
    }

    /// Reset every filter input to its default.
    pub fn clear(&mut self) {
        self.search.clear();
        self.id_query.clear();
        self.status = None;
    }
}

/// Filtered, sorted sequence the UI renders.
pub fn project(tasks: &[Task], filter: &TaskFilter, spec: &SortSpec) -> Vec<Task> {
    let matching: Vec<Task> = tasks.iter().filter(|t| filter.matches(t)).cloned().collect();
    sort_for_display(&matching, spec)
}

/// Whether a reset affordance should show: any filter or sort field is set.
pub fn has_active_filters(filter: &TaskFilter, spec: &SortSpec) -> bool {
    !filter.search.is_empty()
        || !filter.id_query.is_empty()
        || filter.status.is_some()
        || spec.is_active()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::PrioritySort;
    use chrono::{TimeZone, Utc};

    fn task(id: &str, title: &str, description: Option<&str>, status: Status) -> Task {
        Task {
            id: id.into(),
            list_id: "l1".into(),
            title: title.into(),
            description: description.map(Into::into),
            status,
            assigned_to: String::new(),
            completed: false,
            progress_percentage: 0,
            priority: Some(1.0),
            position: 0,
            created_at: Utc.timestamp_opt(0, 0).single().unwrap(),
            updated_at: Utc.timestamp_opt(0, 0).single().unwrap(),
        }
    }

    #[test]
    fn status_filter_is_exact() {
        let tasks = vec![
            task("a", "ship release", None, Status::Done),
            task("b", "write notes", None, Status::NotStarted),
        ];
        let filter = TaskFilter {
            status: Some(Status::Done),
            ..TaskFilter::default()
        };
        let out = project(&tasks, &filter, &SortSpec::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "a");
    }

    #[test]
    fn search_matches_title_or_description_case_insensitively() {
        let tasks = vec![
            task("a", "Buy Milk", None, Status::NotStarted),
            task("b", "clean", Some("the MILK spill"), Status::NotStarted),
            task("c", "unrelated", None, Status::NotStarted),
        ];
        let filter = TaskFilter {
            search: "milk".into(),
            ..TaskFilter::default()
        };
        let out = project(&tasks, &filter, &SortSpec::default());
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn filters_combine_with_and() {
        let tasks = vec![
            task("abc123", "buy milk", None, Status::Done),
            task("abc456", "buy milk", None, Status::NotStarted),
            task("xyz789", "buy milk", None, Status::Done),
        ];
        let filter = TaskFilter {
            search: "milk".into(),
            id_query: "abc".into(),
            status: Some(Status::Done),
        };
        let out = project(&tasks, &filter, &SortSpec::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "abc123");
    }

    #[test]
    fn projection_does_not_mutate_input() {
        let tasks = vec![
            task("b", "two", None, Status::NotStarted),
            task("a", "one", None, Status::NotStarted),
        ];
        let before = tasks.clone();
        let _ = project(
            &tasks,
            &TaskFilter::default(),
            &SortSpec {
                priority: PrioritySort::Ascending,
                ..SortSpec::default()
            },
        );
        assert_eq!(tasks, before);
    }

    #[test]
    fn active_filters_include_sort_state() {
        let filter = TaskFilter::default();
        let mut spec = SortSpec::default();
        assert!(!has_active_filters(&filter, &spec));

        spec.priority = PrioritySort::Descending;
        assert!(has_active_filters(&filter, &spec));

        let mut filter = TaskFilter::default();
        filter.id_query = "6f".into();
        assert!(has_active_filters(&filter, &SortSpec::default()));
    }
}
