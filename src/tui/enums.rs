//! Enumerations for TUI state management.

/// Top-level screen state.
#[derive(Clone, Copy, PartialEq)]
pub enum AppState {
    Board,
    TaskDetail,
    AddTask,
    EditTask,
    EditAssignee,
    NamePrompt,
    ConfirmDelete,
    NotFound,
    Help,
}

/// Which projection of the list is on screen. Filters apply to the flat list;
/// the kanban board always shows every task grouped by status.
#[derive(Clone, Copy, PartialEq)]
pub enum ViewMode {
    List,
    Kanban,
}

/// Where typed characters go while on the board.
#[derive(Clone, Copy, PartialEq)]
pub enum InputMode {
    None,
    Search,
    IdSearch,
}
