//! Position assignment and display ordering.
//!
//! Every operation here is a pure transform over an in-memory task set:
//! identical inputs produce identical outputs, and nothing touches the
//! network or any shared state. The coordinator applies these results
//! optimistically and ships the positions to the service afterwards.

use std::cmp::Ordering;

use crate::api::PositionUpdate;
use crate::fields::{format_status, PrioritySort, SortDirection, SortField, SortSpec, Status};
use crate::task::Task;

/// Visual order within one status column: position, ties broken by creation
/// time.
fn column_order(a: &Task, b: &Task) -> Ordering {
    a.position
        .cmp(&b.position)
        .then_with(|| a.created_at.cmp(&b.created_at))
}

/// Case-folded lexicographic comparison with a raw tiebreak.
fn fold_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Move the task at visual index `from` of the given status column to index
/// `to`, then renumber that column's positions densely from 0. Tasks of other
/// statuses are returned unchanged, positions included.
///
/// `from` and `to` must be valid indices into the column; anything else is a
/// caller bug and panics rather than clamping.
pub fn reorder_within_status(tasks: &[Task], status: Status, from: usize, to: usize) -> Vec<Task> {
    let mut column: Vec<usize> = (0..tasks.len())
        .filter(|&i| tasks[i].status == status)
        .collect();
    column.sort_by(|&a, &b| column_order(&tasks[a], &tasks[b]));

    assert!(
        from < column.len() && to < column.len(),
        "reorder index out of bounds: from={from} to={to} column_len={}",
        column.len()
    );

    let moved = column.remove(from);
    column.insert(to, moved);

    let mut out = tasks.to_vec();
    for (pos, &idx) in column.iter().enumerate() {
        out[idx].position = pos as i64;
    }
    out
}

/// Flip a task's status without touching any position. The moved task keeps
/// its old position value; its new column renumbers on the next in-column
/// reorder.
pub fn move_across_status(tasks: &[Task], task_id: &str, new_status: Status) -> Vec<Task> {
    let mut out = tasks.to_vec();
    if let Some(task) = out.iter_mut().find(|t| t.id == task_id) {
        task.status = new_status;
    }
    out
}

/// Stable, non-mutating display sort.
///
/// Comparator chain: priority (when the tri-state is set), then position
/// ascending, then any secondary sort fields in supplied order, then creation
/// time; equal tasks keep their input order.
pub fn sort_for_display(tasks: &[Task], spec: &SortSpec) -> Vec<Task> {
    let mut out = tasks.to_vec();
    out.sort_by(|a, b| compare_for_display(a, b, spec));
    out
}

fn compare_for_display(a: &Task, b: &Task, spec: &SortSpec) -> Ordering {
    if spec.priority.is_set() {
        let ord = a
            .effective_priority()
            .partial_cmp(&b.effective_priority())
            .unwrap_or(Ordering::Equal);
        let ord = match spec.priority {
            PrioritySort::Descending => ord.reverse(),
            _ => ord,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    let ord = a.position.cmp(&b.position);
    if ord != Ordering::Equal {
        return ord;
    }

    for (field, direction) in &spec.fields {
        let ord = match field {
            SortField::Title => fold_cmp(&a.title, &b.title),
            SortField::Status => fold_cmp(format_status(a.status), format_status(b.status)),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortField::AssignedTo => fold_cmp(&a.assigned_to, &b.assigned_to),
        };
        let ord = match direction {
            SortDirection::Desc => ord.reverse(),
            SortDirection::Asc => ord,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    a.created_at.cmp(&b.created_at)
}

/// `{id, position}` pairs for the batch reorder endpoint, covering every task
/// in the set.
pub fn reorder_payload(tasks: &[Task]) -> Vec<PositionUpdate> {
    tasks
        .iter()
        .map(|t| PositionUpdate {
            id: t.id.clone(),
            position: t.position,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use std::collections::BTreeSet;

    fn stamp(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    fn task(id: &str, status: Status, position: i64, created: i64) -> Task {
        Task {
            id: id.into(),
            list_id: "l1".into(),
            title: id.to_uppercase(),
            description: None,
            status,
            assigned_to: String::new(),
            completed: false,
            progress_percentage: 0,
            priority: Some(1.0),
            position,
            created_at: stamp(created),
            updated_at: stamp(created),
        }
    }

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn reorder_renumbers_column_densely() {
        let tasks = vec![
            task("a", Status::NotStarted, 0, 0),
            task("b", Status::NotStarted, 1, 1),
            task("c", Status::NotStarted, 2, 2),
            task("x", Status::Done, 5, 3),
        ];
        let out = reorder_within_status(&tasks, Status::NotStarted, 2, 0);

        let positions: Vec<(&str, i64)> = out
            .iter()
            .filter(|t| t.status == Status::NotStarted)
            .map(|t| (t.id.as_str(), t.position))
            .collect();
        assert_eq!(positions, vec![("a", 1), ("b", 2), ("c", 0)]);

        // same ids, other statuses byte-identical
        let before: BTreeSet<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
        let after: BTreeSet<&str> = out.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(before, after);
        assert_eq!(tasks[3], out[3]);
    }

    #[test]
    fn reorder_drag_below_swaps_positions() {
        // "Buy milk" at 0 dragged below "Buy eggs" at 1.
        let tasks = vec![
            task("milk", Status::NotStarted, 0, 0),
            task("eggs", Status::NotStarted, 1, 1),
        ];
        let out = reorder_within_status(&tasks, Status::NotStarted, 0, 1);
        let eggs = out.iter().find(|t| t.id == "eggs").unwrap();
        let milk = out.iter().find(|t| t.id == "milk").unwrap();
        assert_eq!(eggs.position, 0);
        assert_eq!(milk.position, 1);
    }

    #[test]
    #[should_panic(expected = "reorder index out of bounds")]
    fn reorder_rejects_invalid_index() {
        let tasks = vec![task("a", Status::NotStarted, 0, 0)];
        reorder_within_status(&tasks, Status::NotStarted, 0, 1);
    }

    #[test]
    fn move_across_status_keeps_positions() {
        let tasks = vec![
            task("a", Status::NotStarted, 3, 0),
            task("b", Status::InProgress, 1, 1),
        ];
        let out = move_across_status(&tasks, "a", Status::Done);
        assert_eq!(out[0].status, Status::Done);
        assert_eq!(out[0].position, 3);
        assert_eq!(out[1], tasks[1]);
    }

    #[test]
    fn default_sort_is_position_then_created() {
        let tasks = vec![
            task("late", Status::NotStarted, 1, 5),
            task("tie_young", Status::NotStarted, 0, 9),
            task("tie_old", Status::NotStarted, 0, 2),
        ];
        let out = sort_for_display(&tasks, &SortSpec::default());
        assert_eq!(ids(&out), vec!["tie_old", "tie_young", "late"]);
    }

    #[test]
    fn sort_is_idempotent() {
        let spec = SortSpec {
            priority: PrioritySort::Descending,
            fields: vec![(SortField::Title, SortDirection::Asc)],
        };
        let tasks = vec![
            task("a", Status::NotStarted, 2, 0),
            task("b", Status::Done, 0, 1),
            task("c", Status::NotStarted, 1, 2),
        ];
        let once = sort_for_display(&tasks, &spec);
        let twice = sort_for_display(&once, &spec);
        assert_eq!(once, twice);
    }

    #[test]
    fn priority_sort_overrides_position_without_mutating_it() {
        let mut low = task("low", Status::NotStarted, 0, 0);
        let mut high = task("high", Status::NotStarted, 1, 1);
        low.priority = Some(1.0);
        high.priority = Some(9.0);
        let tasks = vec![low, high];

        let spec = SortSpec {
            priority: PrioritySort::Descending,
            ..SortSpec::default()
        };
        let out = sort_for_display(&tasks, &spec);
        assert_eq!(ids(&out), vec!["high", "low"]);
        // positions untouched
        assert_eq!(out.iter().find(|t| t.id == "high").unwrap().position, 1);
    }

    #[test]
    fn null_priority_sorts_as_default() {
        let mut unset = task("unset", Status::NotStarted, 0, 0);
        unset.priority = None;
        let mut half = task("half", Status::NotStarted, 1, 1);
        half.priority = Some(0.5);
        let tasks = vec![unset, half];

        let spec = SortSpec {
            priority: PrioritySort::Ascending,
            ..SortSpec::default()
        };
        let out = sort_for_display(&tasks, &spec);
        // 0.5 < default 1.0
        assert_eq!(ids(&out), vec!["half", "unset"]);
    }

    #[test]
    fn triple_toggle_returns_to_unset() {
        let mut sort = PrioritySort::Unset;
        for _ in 0..3 {
            sort = sort.toggle();
        }
        assert_eq!(sort, PrioritySort::Unset);

        // equivalent to never having toggled
        let tasks = vec![
            task("b", Status::NotStarted, 1, 1),
            task("a", Status::NotStarted, 0, 0),
        ];
        let spec = SortSpec {
            priority: sort,
            ..SortSpec::default()
        };
        assert_eq!(
            sort_for_display(&tasks, &spec),
            sort_for_display(&tasks, &SortSpec::default())
        );
    }

    #[test]
    fn payload_covers_every_task() {
        let tasks = vec![
            task("a", Status::NotStarted, 0, 0),
            task("b", Status::Done, 4, 1),
        ];
        let payload = reorder_payload(&tasks);
        assert_eq!(
            payload,
            vec![
                PositionUpdate {
                    id: "a".into(),
                    position: 0
                },
                PositionUpdate {
                    id: "b".into(),
                    position: 4
                },
            ]
        );
    }
}
