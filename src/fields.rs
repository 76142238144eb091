//! Enumerations and field types shared across the client.
//!
//! This module defines the closed status set used by the Yarimausu service,
//! plus the sort-order types that drive display ordering in the CLI and TUI.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Task status. The service stores exactly these five values; each kanban
/// column corresponds to one status and owns its own position ordering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    NotStarted,
    InProgress,
    PlannedByMe,
    Done,
    Archived,
}

/// Column order used by the kanban board and by status cycling.
pub const ALL_STATUSES: [Status; 5] = [
    Status::NotStarted,
    Status::InProgress,
    Status::PlannedByMe,
    Status::Done,
    Status::Archived,
];

/// Format a status for display.
pub fn format_status(s: Status) -> &'static str {
    match s {
        Status::NotStarted => "Not started",
        Status::InProgress => "In progress",
        Status::PlannedByMe => "Planned by me",
        Status::Done => "Done",
        Status::Archived => "Archived",
    }
}

/// Sort direction for a single sort field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Secondary sort fields selectable after the priority/position comparators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortField {
    Title,
    Status,
    CreatedAt,
    UpdatedAt,
    AssignedTo,
}

/// Tri-state priority sort. A single affordance cycles through the three
/// states; `Unset` falls back to position-based ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrioritySort {
    #[default]
    Unset,
    Descending,
    Ascending,
}

impl PrioritySort {
    /// Advance the toggle: unset -> descending -> ascending -> unset.
    pub fn toggle(self) -> Self {
        match self {
            PrioritySort::Unset => PrioritySort::Descending,
            PrioritySort::Descending => PrioritySort::Ascending,
            PrioritySort::Ascending => PrioritySort::Unset,
        }
    }

    pub fn is_set(self) -> bool {
        self != PrioritySort::Unset
    }
}

/// Complete sort specification for display ordering: the distinguished
/// priority toggle, then any number of secondary `(field, direction)` pairs
/// applied in order when earlier comparators tie.
#[derive(Debug, Clone, Default)]
pub struct SortSpec {
    pub priority: PrioritySort,
    pub fields: Vec<(SortField, SortDirection)>,
}

impl SortSpec {
    /// True when any part of the spec deviates from the default ordering.
    pub fn is_active(&self) -> bool {
        self.priority.is_set() || !self.fields.is_empty()
    }
}
