//! Board application for one open list.
//!
//! Renders the session's in-memory replica as either a flat filtered list or
//! a five-column kanban board, and routes every mutation through the
//! coordinator so optimistic updates and rollbacks land on screen
//! immediately. Rollback errors surface in the status bar.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};

use crate::api::ApiError;
use crate::debounce::{Debouncer, PROGRESS_COMMIT_DELAY, SEARCH_DELAY};
use crate::fields::{format_status, PrioritySort, SortSpec, Status, ALL_STATUSES};
use crate::ordering::sort_for_display;
use crate::session::{Gated, Session};
use crate::task::{Comment, Task};
use crate::tui::colors::status_color;
use crate::tui::enums::{AppState, InputMode, ViewMode};
use crate::tui::input::InputField;
use crate::view::{self, TaskFilter};

/// Add/edit form fields.
struct TaskForm {
    title: InputField,
    description: InputField,
    priority: InputField,
    focus: usize,
    /// Task id when editing; `None` when adding.
    editing: Option<String>,
}

impl TaskForm {
    fn empty() -> Self {
        TaskForm {
            title: InputField::new(),
            description: InputField::new(),
            priority: InputField::new(),
            focus: 0,
            editing: None,
        }
    }

    fn for_task(task: &Task) -> Self {
        TaskForm {
            title: InputField::with_value(&task.title),
            description: InputField::with_value(task.description.as_deref().unwrap_or("")),
            priority: InputField::with_value(&task.effective_priority().to_string()),
            focus: 0,
            editing: Some(task.id.clone()),
        }
    }

    fn focused(&mut self) -> &mut InputField {
        match self.focus {
            0 => &mut self.title,
            1 => &mut self.description,
            _ => &mut self.priority,
        }
    }
}

/// Board TUI state.
pub struct App {
    session: Session,
    state: AppState,
    view_mode: ViewMode,
    input_mode: InputMode,
    should_exit: bool,

    filter: TaskFilter,
    sort: SortSpec,
    search_input: InputField,
    id_input: InputField,
    search_debounce: Debouncer,
    id_debounce: Debouncer,

    /// Filtered+sorted projection for the list view.
    visible: Vec<Task>,
    /// Per-status columns for the kanban view, in `ALL_STATUSES` order.
    columns: Vec<Vec<Task>>,
    list_state: TableState,
    kanban_col: usize,
    kanban_row: usize,

    /// Locally scrubbed progress value awaiting its debounced commit.
    pending_progress: Option<(String, u8)>,
    progress_debounce: Debouncer,

    form: TaskForm,
    name_input: InputField,
    assignee_input: InputField,
    assignee_task: Option<String>,
    comment_input: InputField,
    commenting: bool,
    comments: Vec<Comment>,
    detail_task: Option<String>,
    pending_delete: Option<String>,

    status_message: String,
}

impl App {
    pub fn new(session: Session) -> Self {
        let mut app = App {
            session,
            state: AppState::Board,
            view_mode: ViewMode::Kanban,
            input_mode: InputMode::None,
            should_exit: false,
            filter: TaskFilter::default(),
            sort: SortSpec::default(),
            search_input: InputField::new(),
            id_input: InputField::new(),
            search_debounce: Debouncer::new(SEARCH_DELAY),
            id_debounce: Debouncer::new(SEARCH_DELAY),
            visible: Vec::new(),
            columns: Vec::new(),
            list_state: TableState::default(),
            kanban_col: 0,
            kanban_row: 0,
            pending_progress: None,
            progress_debounce: Debouncer::new(PROGRESS_COMMIT_DELAY),
            form: TaskForm::empty(),
            name_input: InputField::new(),
            assignee_input: InputField::new(),
            assignee_task: None,
            comment_input: InputField::new(),
            commenting: false,
            comments: Vec::new(),
            detail_task: None,
            pending_delete: None,
            status_message: String::new(),
        };
        app.update_projection();
        app
    }

    /// Main event loop: draw, poll input with a short timeout, then service
    /// debounce deadlines.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key);
                }
            }
            self.on_tick();

            if self.should_exit {
                break;
            }
        }
        Ok(())
    }

    // --- projection bookkeeping -------------------------------------------

    /// Recompute both projections from the session replica and clamp
    /// selections. Called after every mutation or filter/sort change.
    fn update_projection(&mut self) {
        self.visible = view::project(&self.session.tasks, &self.filter, &self.sort);
        self.columns = ALL_STATUSES
            .iter()
            .map(|&status| {
                let column: Vec<Task> = self
                    .session
                    .tasks
                    .iter()
                    .filter(|t| t.status == status)
                    .cloned()
                    .collect();
                sort_for_display(&column, &self.sort)
            })
            .collect();

        if self.visible.is_empty() {
            self.list_state.select(None);
        } else {
            let idx = self.list_state.selected().unwrap_or(0);
            self.list_state.select(Some(idx.min(self.visible.len() - 1)));
        }
        self.kanban_col = self.kanban_col.min(ALL_STATUSES.len() - 1);
        let column_len = self.columns[self.kanban_col].len();
        self.kanban_row = self.kanban_row.min(column_len.saturating_sub(1));
    }

    fn selected_task(&self) -> Option<&Task> {
        match self.view_mode {
            ViewMode::List => self.list_state.selected().and_then(|i| self.visible.get(i)),
            ViewMode::Kanban => self
                .columns
                .get(self.kanban_col)
                .and_then(|c| c.get(self.kanban_row)),
        }
    }

    // --- tick-driven work -------------------------------------------------

    fn on_tick(&mut self) {
        let mut changed = false;
        if self.search_debounce.fire_if_due() {
            self.filter.search = self.search_input.value.trim().to_string();
            changed = true;
        }
        if self.id_debounce.fire_if_due() {
            self.filter.id_query = self.id_input.value.trim().to_string();
            changed = true;
        }
        if changed {
            self.update_projection();
        }
        if self.progress_debounce.fire_if_due() {
            self.commit_pending_progress();
        }
    }

    fn commit_pending_progress(&mut self) {
        if let Some((task_id, percent)) = self.pending_progress.take() {
            self.run_gated(|s| s.set_progress(&task_id, percent));
        }
    }

    /// Commit a scrubbed value right away (selection change, quit).
    fn commit_progress_now(&mut self) {
        if self.progress_debounce.flush() {
            self.commit_pending_progress();
        }
    }

    /// Run a gated mutation; a parked action raises the name prompt.
    fn run_gated<F>(&mut self, op: F)
    where
        F: FnOnce(&mut Session) -> Result<Gated, ApiError>,
    {
        match op(&mut self.session) {
            Ok(Gated::Done) => {}
            Ok(Gated::NeedsName) => {
                self.name_input.clear();
                self.state = AppState::NamePrompt;
            }
            Err(e) => self.status_message = e.to_string(),
        }
        self.update_projection();
    }

    // --- key dispatch -----------------------------------------------------

    fn handle_key(&mut self, key: KeyEvent) {
        self.status_message.clear();
        match self.state {
            AppState::Board => self.handle_board_key(key),
            AppState::TaskDetail => self.handle_detail_key(key),
            AppState::AddTask | AppState::EditTask => self.handle_form_key(key),
            AppState::EditAssignee => self.handle_assignee_key(key),
            AppState::NamePrompt => self.handle_name_key(key),
            AppState::ConfirmDelete => self.handle_confirm_key(key),
            AppState::NotFound => {
                if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                    self.should_exit = true;
                }
            }
            AppState::Help => self.state = AppState::Board,
        }
    }

    fn handle_board_key(&mut self, key: KeyEvent) {
        if self.input_mode != InputMode::None {
            self.handle_filter_key(key);
            return;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.commit_progress_now();
                self.should_exit = true;
            }
            KeyCode::Tab => {
                self.commit_progress_now();
                self.view_mode = match self.view_mode {
                    ViewMode::List => ViewMode::Kanban,
                    ViewMode::Kanban => ViewMode::List,
                };
                self.update_projection();
            }
            KeyCode::Char('?') => self.state = AppState::Help,

            // filters and sorting
            KeyCode::Char('/') => self.input_mode = InputMode::Search,
            KeyCode::Char('i') => self.input_mode = InputMode::IdSearch,
            KeyCode::Char('f') => {
                self.filter.status = next_status_filter(self.filter.status);
                self.update_projection();
            }
            KeyCode::Char('F') => {
                self.filter.clear();
                self.search_input.clear();
                self.id_input.clear();
                self.search_debounce.cancel();
                self.id_debounce.cancel();
                self.sort = SortSpec::default();
                self.update_projection();
            }
            KeyCode::Char('p') => {
                self.sort.priority = self.sort.priority.toggle();
                self.update_projection();
            }
            KeyCode::Char('r') => self.refresh(),

            // selection
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::Left | KeyCode::Char('h') => self.move_column(-1),
            KeyCode::Right | KeyCode::Char('l') => self.move_column(1),

            // mutations
            KeyCode::Char('J') => self.reorder_selected(1),
            KeyCode::Char('K') => self.reorder_selected(-1),
            KeyCode::Char('H') => self.move_selected_across(-1),
            KeyCode::Char('L') => self.move_selected_across(1),
            KeyCode::Char('c') => self.toggle_completed(),
            KeyCode::Char('+') | KeyCode::Char('=') => self.nudge_progress(5),
            KeyCode::Char('-') => self.nudge_progress(-5),
            KeyCode::Char('>') => self.nudge_priority(1.0),
            KeyCode::Char('<') => self.nudge_priority(-1.0),
            KeyCode::Char('a') => {
                self.form = TaskForm::empty();
                self.state = AppState::AddTask;
            }
            KeyCode::Char('e') => {
                if let Some(task) = self.selected_task().cloned() {
                    self.form = TaskForm::for_task(&task);
                    self.state = AppState::EditTask;
                }
            }
            KeyCode::Char('A') => self.open_assignee_editor(),
            KeyCode::Char('d') => {
                if let Some(task_id) = self.selected_task().map(|t| t.id.clone()) {
                    self.pending_delete = Some(task_id);
                    self.state = AppState::ConfirmDelete;
                }
            }
            KeyCode::Char('n') => {
                self.name_input = InputField::with_value(self.session.user_name());
                self.state = AppState::NamePrompt;
            }
            KeyCode::Enter => self.open_detail(),
            _ => {}
        }
    }

    fn handle_filter_key(&mut self, key: KeyEvent) {
        let (field, debounce) = match self.input_mode {
            InputMode::Search => (&mut self.search_input, &mut self.search_debounce),
            InputMode::IdSearch => (&mut self.id_input, &mut self.id_debounce),
            InputMode::None => return,
        };
        match key.code {
            KeyCode::Esc | KeyCode::Enter => self.input_mode = InputMode::None,
            KeyCode::Backspace => {
                field.backspace();
                debounce.trigger();
            }
            KeyCode::Left => field.left(),
            KeyCode::Right => field.right(),
            KeyCode::Char(c) => {
                field.insert(c);
                debounce.trigger();
            }
            _ => {}
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.state = AppState::Board,
            KeyCode::Tab | KeyCode::Down => self.form.focus = (self.form.focus + 1) % 3,
            KeyCode::BackTab | KeyCode::Up => self.form.focus = (self.form.focus + 2) % 3,
            KeyCode::Enter => self.submit_form(),
            KeyCode::Backspace => self.form.focused().backspace(),
            KeyCode::Left => self.form.focused().left(),
            KeyCode::Right => self.form.focused().right(),
            KeyCode::Char(c) => self.form.focused().insert(c),
            _ => {}
        }
    }

    fn handle_assignee_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.assignee_task = None;
                self.state = AppState::Board;
            }
            KeyCode::Enter => {
                let assignee = self.assignee_input.take();
                if let Some(task_id) = self.assignee_task.take() {
                    if let Err(e) = self.session.set_assignee(&task_id, &assignee) {
                        self.status_message = e.to_string();
                    }
                    self.update_projection();
                }
                self.state = AppState::Board;
            }
            KeyCode::Backspace => self.assignee_input.backspace(),
            KeyCode::Left => self.assignee_input.left(),
            KeyCode::Right => self.assignee_input.right(),
            KeyCode::Char(c) => self.assignee_input.insert(c),
            _ => {}
        }
    }

    fn handle_name_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.state = AppState::Board,
            KeyCode::Enter => {
                let name = self.name_input.take();
                if name.is_empty() {
                    self.status_message = "Name must not be empty".into();
                    return;
                }
                match self.session.resume_with_name(&name) {
                    Ok(()) => self.status_message = format!("Acting as {name}"),
                    Err(e) => self.status_message = e.to_string(),
                }
                self.state = AppState::Board;
                self.update_projection();
            }
            KeyCode::Backspace => self.name_input.backspace(),
            KeyCode::Left => self.name_input.left(),
            KeyCode::Right => self.name_input.right(),
            KeyCode::Char(c) => self.name_input.insert(c),
            _ => {}
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                if let Some(task_id) = self.pending_delete.take() {
                    if let Err(e) = self.session.delete_task(&task_id) {
                        self.status_message = e.to_string();
                    } else {
                        self.status_message = "Task deleted".into();
                    }
                    self.update_projection();
                }
                self.state = AppState::Board;
            }
            _ => {
                self.pending_delete = None;
                self.state = AppState::Board;
            }
        }
    }

    fn handle_detail_key(&mut self, key: KeyEvent) {
        if self.commenting {
            match key.code {
                KeyCode::Esc => {
                    self.commenting = false;
                    self.comment_input.clear();
                }
                KeyCode::Enter => {
                    let content = self.comment_input.take();
                    self.commenting = false;
                    if let Some(task_id) = self.detail_task.clone() {
                        match self.session.add_comment(&task_id, &content) {
                            Ok(_) => self.load_comments(&task_id),
                            Err(e) => self.status_message = e.to_string(),
                        }
                    }
                }
                KeyCode::Backspace => self.comment_input.backspace(),
                KeyCode::Left => self.comment_input.left(),
                KeyCode::Right => self.comment_input.right(),
                KeyCode::Char(c) => self.comment_input.insert(c),
                _ => {}
            }
            return;
        }
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter => {
                self.detail_task = None;
                self.state = AppState::Board;
            }
            KeyCode::Char('m') => {
                self.comment_input.clear();
                self.commenting = true;
            }
            _ => {}
        }
    }

    // --- board actions ----------------------------------------------------

    fn move_selection(&mut self, delta: isize) {
        self.commit_progress_now();
        match self.view_mode {
            ViewMode::List => {
                if self.visible.is_empty() {
                    return;
                }
                let current = self.list_state.selected().unwrap_or(0) as isize;
                let next = (current + delta).clamp(0, self.visible.len() as isize - 1);
                self.list_state.select(Some(next as usize));
            }
            ViewMode::Kanban => {
                let len = self.columns[self.kanban_col].len();
                if len == 0 {
                    return;
                }
                let next = (self.kanban_row as isize + delta).clamp(0, len as isize - 1);
                self.kanban_row = next as usize;
            }
        }
    }

    fn move_column(&mut self, delta: isize) {
        if self.view_mode != ViewMode::Kanban {
            return;
        }
        self.commit_progress_now();
        let next =
            (self.kanban_col as isize + delta).clamp(0, ALL_STATUSES.len() as isize - 1) as usize;
        self.kanban_col = next;
        let len = self.columns[self.kanban_col].len();
        self.kanban_row = self.kanban_row.min(len.saturating_sub(1));
    }

    /// Shift the selected task one slot within its column: the ordering
    /// engine renumbers the column and one batched request carries it.
    fn reorder_selected(&mut self, delta: isize) {
        if self.view_mode != ViewMode::Kanban {
            self.status_message = "Reorder from the kanban view (Tab)".into();
            return;
        }
        if self.sort.priority.is_set() {
            self.status_message = "Turn off priority sort (p) to reorder by hand".into();
            return;
        }
        let status = ALL_STATUSES[self.kanban_col];
        let len = self.columns[self.kanban_col].len();
        let from = self.kanban_row;
        let to = from as isize + delta;
        if len == 0 || to < 0 || to >= len as isize {
            return;
        }
        self.commit_progress_now();
        match self.session.reorder(status, from, to as usize) {
            Ok(()) => self.kanban_row = to as usize,
            Err(e) => self.status_message = e.to_string(),
        }
        self.update_projection();
    }

    /// Move the selected task to the adjacent status column (a drag across
    /// columns). Keeps the selection with the task.
    fn move_selected_across(&mut self, delta: isize) {
        let Some(task) = self.selected_task() else {
            return;
        };
        let task_id = task.id.clone();
        let current = ALL_STATUSES
            .iter()
            .position(|&s| s == task.status)
            .unwrap_or(0);
        let next = current as isize + delta;
        if next < 0 || next >= ALL_STATUSES.len() as isize {
            return;
        }
        let status = ALL_STATUSES[next as usize];
        self.commit_progress_now();
        let id_for_op = task_id.clone();
        self.run_gated(move |s| s.set_status(&id_for_op, status));
        if self.view_mode == ViewMode::Kanban {
            self.kanban_col = next as usize;
            self.kanban_row = self.columns[self.kanban_col]
                .iter()
                .position(|t| t.id == task_id)
                .unwrap_or(0);
        }
    }

    fn toggle_completed(&mut self) {
        let Some(task) = self.selected_task() else {
            return;
        };
        let task_id = task.id.clone();
        let next = !task.completed;
        self.commit_progress_now();
        self.run_gated(|s| s.set_completed(&task_id, next));
    }

    /// Scrub the progress value locally; the commit is debounced so rapid
    /// nudging settles into one request carrying the final value.
    fn nudge_progress(&mut self, delta: i16) {
        let Some(task) = self.selected_task() else {
            return;
        };
        if task.status != Status::InProgress {
            self.status_message = "Progress applies to in-progress tasks".into();
            return;
        }
        let task_id = task.id.clone();
        let current = match &self.pending_progress {
            Some((id, value)) if *id == task_id => *value,
            _ => task.progress_percentage,
        };
        let next = (current as i16 + delta).clamp(0, 100) as u8;
        self.pending_progress = Some((task_id, next));
        self.progress_debounce.trigger();
    }

    fn nudge_priority(&mut self, delta: f64) {
        let Some(task) = self.selected_task() else {
            return;
        };
        let task_id = task.id.clone();
        let next = (task.effective_priority() + delta).max(0.0);
        if let Err(e) = self.session.set_priority(&task_id, next) {
            self.status_message = e.to_string();
        }
        self.update_projection();
    }

    fn open_assignee_editor(&mut self) {
        let Some((task_id, status, assigned_to)) = self
            .selected_task()
            .map(|t| (t.id.clone(), t.status, t.assigned_to.clone()))
        else {
            return;
        };
        if status != Status::NotStarted {
            self.status_message = "Assignee is editable only for not-started tasks".into();
            return;
        }
        self.assignee_task = Some(task_id);
        self.assignee_input = InputField::with_value(&assigned_to);
        self.state = AppState::EditAssignee;
    }

    fn open_detail(&mut self) {
        let Some(task) = self.selected_task() else {
            return;
        };
        let task_id = task.id.clone();
        self.detail_task = Some(task_id.clone());
        self.commenting = false;
        self.load_comments(&task_id);
        self.state = AppState::TaskDetail;
    }

    fn load_comments(&mut self, task_id: &str) {
        match self.session.comments(task_id) {
            Ok(comments) => self.comments = comments,
            Err(e) => {
                self.comments = Vec::new();
                self.status_message = e.to_string();
            }
        }
    }

    fn refresh(&mut self) {
        self.commit_progress_now();
        match self.session.refresh() {
            Ok(()) => self.status_message = "Refreshed".into(),
            Err(ApiError::NotFound) => self.state = AppState::NotFound,
            Err(e) => self.status_message = e.to_string(),
        }
        self.update_projection();
    }

    fn submit_form(&mut self) {
        let title = self.form.title.value.trim().to_string();
        let description = self.form.description.value.trim().to_string();
        let priority_text = self.form.priority.value.trim().to_string();
        let priority = if priority_text.is_empty() {
            None
        } else {
            match priority_text.parse::<f64>() {
                Ok(value) => Some(value),
                Err(_) => {
                    self.status_message = "Priority must be a number".into();
                    return;
                }
            }
        };

        match self.form.editing.clone() {
            None => match self.session.add_task(&title, &description, priority) {
                Ok(task) => {
                    self.status_message = format!("Added {}", task.title);
                    self.state = AppState::Board;
                }
                Err(e) => self.status_message = e.to_string(),
            },
            Some(task_id) => {
                if title.is_empty() {
                    self.status_message = "task title must not be empty".into();
                    return;
                }
                match self.session.edit_task(&task_id, &title, &description) {
                    Ok(()) => {
                        if let Some(priority) = priority {
                            if let Err(e) = self.session.set_priority(&task_id, priority) {
                                self.status_message = e.to_string();
                            }
                        }
                        self.state = AppState::Board;
                    }
                    Err(e) => self.status_message = e.to_string(),
                }
            }
        }
        self.update_projection();
    }

    // --- rendering --------------------------------------------------------

    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(5),
                Constraint::Length(1),
            ])
            .split(f.area());

        self.render_header(f, chunks[0]);

        match self.state {
            AppState::NotFound => self.render_not_found(f, chunks[1]),
            AppState::TaskDetail => self.render_detail(f, chunks[1]),
            _ => match self.view_mode {
                ViewMode::List => self.render_list(f, chunks[1]),
                ViewMode::Kanban => self.render_kanban(f, chunks[1]),
            },
        }

        self.render_status_bar(f, chunks[2]);

        match self.state {
            AppState::AddTask | AppState::EditTask => self.render_form(f),
            AppState::EditAssignee => self.render_prompt(f, "Assignee", &self.assignee_input),
            AppState::NamePrompt => self.render_prompt(f, "Your name", &self.name_input),
            AppState::ConfirmDelete => self.render_confirm(f),
            AppState::Help => self.render_help(f),
            _ => {}
        }
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let mode = match self.view_mode {
            ViewMode::List => "list",
            ViewMode::Kanban => "kanban",
        };
        let actor = if self.session.user_name().is_empty() {
            "anonymous".to_string()
        } else {
            self.session.user_name().to_string()
        };
        let mut filter_parts = Vec::new();
        if !self.search_input.value.is_empty() {
            filter_parts.push(format!("search:{}", self.search_input.value));
        }
        if !self.id_input.value.is_empty() {
            filter_parts.push(format!("id:{}", self.id_input.value));
        }
        if let Some(status) = self.filter.status {
            filter_parts.push(format!("status:{}", format_status(status)));
        }
        match self.sort.priority {
            PrioritySort::Descending => filter_parts.push("sort:priority desc".into()),
            PrioritySort::Ascending => filter_parts.push("sort:priority asc".into()),
            PrioritySort::Unset => {}
        }
        let filter_line = if filter_parts.is_empty() {
            String::new()
        } else {
            format!(
                "{}  ({} of {} shown, F to clear)",
                filter_parts.join("  "),
                self.visible.len(),
                self.session.tasks.len()
            )
        };

        let header = Paragraph::new(vec![
            Line::from(vec![
                Span::styled(
                    self.session.list.title.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!("  [{mode}]  acting as {actor}")),
            ]),
            Line::from(filter_line),
        ])
        .block(Block::default().borders(Borders::ALL));
        f.render_widget(header, area);
    }

    fn render_list(&mut self, f: &mut Frame, area: Rect) {
        if self.visible.is_empty() {
            let empty = if view::has_active_filters(&self.filter, &self.sort) {
                "No tasks match the current filters."
            } else {
                "No tasks yet. Press a to add one."
            };
            f.render_widget(
                Paragraph::new(empty)
                    .alignment(Alignment::Center)
                    .block(Block::default().borders(Borders::ALL)),
                area,
            );
            return;
        }

        let rows: Vec<Row> = self
            .visible
            .iter()
            .map(|task| {
                let progress = match (task.status, &self.pending_progress) {
                    (Status::InProgress, Some((id, value))) if *id == task.id => {
                        format!("{value}%*")
                    }
                    (Status::InProgress, _) => format!("{}%", task.progress_percentage),
                    _ => "-".into(),
                };
                let assignee = if task.assigned_to.is_empty() {
                    "-"
                } else {
                    &task.assigned_to
                };
                let style = if task.completed {
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::CROSSED_OUT)
                } else {
                    Style::default()
                };
                Row::new(vec![
                    if task.completed { "x" } else { " " }.to_string(),
                    task.title.clone(),
                    format_status(task.status).to_string(),
                    progress,
                    format!("{}", task.effective_priority()),
                    assignee.to_string(),
                ])
                .style(style)
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(1),
                Constraint::Min(24),
                Constraint::Length(14),
                Constraint::Length(5),
                Constraint::Length(5),
                Constraint::Length(14),
            ],
        )
        .header(
            Row::new(vec!["", "Title", "Status", "Prog", "Pri", "Assigned"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL))
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

        f.render_stateful_widget(table, area, &mut self.list_state);
    }

    fn render_kanban(&self, f: &mut Frame, area: Rect) {
        let constraints = vec![Constraint::Percentage(20); ALL_STATUSES.len()];
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(area);

        for (col_idx, (&status, column_area)) in
            ALL_STATUSES.iter().zip(columns.iter()).enumerate()
        {
            let tasks = &self.columns[col_idx];
            let selected_col = col_idx == self.kanban_col;
            let mut lines = Vec::new();
            for (row_idx, task) in tasks.iter().enumerate() {
                let marker = if task.completed { "x" } else { " " };
                let mut text = format!("[{marker}] {}", task.title);
                if task.status == Status::InProgress {
                    let percent = match &self.pending_progress {
                        Some((id, value)) if *id == task.id => *value,
                        _ => task.progress_percentage,
                    };
                    text.push_str(&format!(" {percent}%"));
                }
                let style = if selected_col && row_idx == self.kanban_row {
                    Style::default().add_modifier(Modifier::REVERSED)
                } else if task.completed {
                    Style::default().fg(Color::DarkGray)
                } else {
                    Style::default()
                };
                lines.push(Line::from(Span::styled(text, style)));
                if !task.assigned_to.is_empty() {
                    lines.push(Line::from(Span::styled(
                        format!("    {}", task.assigned_to),
                        Style::default().fg(Color::DarkGray),
                    )));
                }
            }

            let border_style = if selected_col {
                Style::default().fg(status_color(status))
            } else {
                Style::default().fg(Color::DarkGray)
            };
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(format!("{} ({})", format_status(status), tasks.len()));
            f.render_widget(
                Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
                *column_area,
            );
        }
    }

    fn render_detail(&self, f: &mut Frame, area: Rect) {
        let Some(task) = self
            .detail_task
            .as_ref()
            .and_then(|id| self.session.tasks.iter().find(|t| t.id == *id))
        else {
            return;
        };

        let mut lines = vec![
            Line::from(Span::styled(
                task.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(format!(
                "id {}   {}   {}   progress {}%   priority {}",
                task.id,
                format_status(task.status),
                if task.completed { "completed" } else { "open" },
                task.progress_percentage,
                task.effective_priority(),
            )),
            Line::from(if task.assigned_to.is_empty() {
                "unassigned".to_string()
            } else {
                format!("last updated by {}", task.assigned_to)
            }),
            Line::from(""),
        ];
        match &task.description {
            Some(description) => {
                for text_line in description.lines() {
                    lines.push(Line::from(text_line.to_string()));
                }
            }
            None => lines.push(Line::from(Span::styled(
                "no description",
                Style::default().fg(Color::DarkGray),
            ))),
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Comments ({})", self.comments.len()),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for comment in &self.comments {
            lines.push(Line::from(format!(
                "{}: {}",
                comment.user_name.as_deref().unwrap_or("anonymous"),
                comment.content
            )));
        }
        if self.commenting {
            lines.push(Line::from(""));
            lines.push(Line::from(format!("> {}", self.comment_input.value)));
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .title("Task  (m: comment, Esc: back)");
        f.render_widget(
            Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
            area,
        );
    }

    fn render_not_found(&self, f: &mut Frame, area: Rect) {
        let message = Paragraph::new(vec![
            Line::from(""),
            Line::from("This list no longer exists."),
            Line::from(""),
            Line::from("Press q to quit."),
        ])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        );
        f.render_widget(message, area);
    }

    fn render_form(&self, f: &mut Frame) {
        let area = centered_rect(60, 9, f.area());
        f.render_widget(Clear, area);
        let title = if self.form.editing.is_some() {
            "Edit task"
        } else {
            "New task"
        };
        let field_line = |label: &str, field: &InputField, focused: bool| {
            let style = if focused {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::from(Span::styled(format!("{label}: {}", field.value), style))
        };
        let lines = vec![
            field_line("Title", &self.form.title, self.form.focus == 0),
            field_line("Details", &self.form.description, self.form.focus == 1),
            field_line("Priority", &self.form.priority, self.form.focus == 2),
            Line::from(""),
            Line::from("Tab: next field   Enter: save   Esc: cancel"),
        ];
        f.render_widget(
            Paragraph::new(lines)
                .block(Block::default().borders(Borders::ALL).title(title))
                .wrap(Wrap { trim: false }),
            area,
        );
    }

    fn render_prompt(&self, f: &mut Frame, title: &str, field: &InputField) {
        let area = centered_rect(50, 5, f.area());
        f.render_widget(Clear, area);
        let lines = vec![
            Line::from(field.value.clone()),
            Line::from(""),
            Line::from("Enter: save   Esc: cancel"),
        ];
        f.render_widget(
            Paragraph::new(lines)
                .block(Block::default().borders(Borders::ALL).title(title.to_string())),
            area,
        );
    }

    fn render_confirm(&self, f: &mut Frame) {
        let area = centered_rect(44, 5, f.area());
        f.render_widget(Clear, area);
        let message = Paragraph::new(vec![
            Line::from("Delete this task?"),
            Line::from(""),
            Line::from("y: delete   any other key: cancel"),
        ])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Delete")
                .border_style(Style::default().fg(Color::Red)),
        );
        f.render_widget(message, area);
    }

    fn render_help(&self, f: &mut Frame) {
        let area = centered_rect(62, 18, f.area());
        f.render_widget(Clear, area);
        let lines = vec![
            Line::from("Tab        switch list/kanban view"),
            Line::from("j/k h/l    move selection / switch column"),
            Line::from("J/K        move task within its column"),
            Line::from("H/L        move task across status columns"),
            Line::from("c          toggle completed"),
            Line::from("+/-        nudge progress (commits after a pause)"),
            Line::from("</>        nudge priority"),
            Line::from("p          cycle priority sort (desc/asc/off)"),
            Line::from("/  i  f    search / id search / status filter"),
            Line::from("F          clear filters and sort"),
            Line::from("a e d      add / edit / delete task"),
            Line::from("A          edit assignee (not-started only)"),
            Line::from("n          set your name"),
            Line::from("Enter      task detail and comments"),
            Line::from("r          refresh from the server"),
            Line::from("q          quit"),
        ];
        f.render_widget(
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Keys")),
            area,
        );
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            match self.input_mode {
                InputMode::Search => format!("search: {}", self.search_input.value),
                InputMode::IdSearch => format!("id search: {}", self.id_input.value),
                InputMode::None => {
                    "?: help   Tab: view   a: add   Enter: detail   q: quit".to_string()
                }
            }
        };
        let status = Paragraph::new(text)
            .style(Style::default().bg(Color::Blue).fg(Color::White))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }
}

fn next_status_filter(current: Option<Status>) -> Option<Status> {
    match current {
        None => Some(ALL_STATUSES[0]),
        Some(status) => {
            let idx = ALL_STATUSES.iter().position(|&s| s == status).unwrap_or(0);
            if idx + 1 < ALL_STATUSES.len() {
                Some(ALL_STATUSES[idx + 1])
            } else {
                None
            }
        }
    }
}

/// Centered overlay rectangle of fixed character size, clamped to the frame.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
