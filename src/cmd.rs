//! Command implementations for the CLI interface.
//!
//! Every handler builds the HTTP boundary and client state, opens a session
//! for the target list, performs the requested mutation through the
//! coordinator, and reports the outcome. Gated actions prompt for the actor
//! name on stdin and resume.

use std::io::{self, Write};
use std::path::PathBuf;

use chrono::{DateTime, Local, Utc};
use clap::{CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use crate::api::{ApiError, HttpRemote, NewTask, Remote};
use crate::bridge::sink_from_env;
use crate::cli::Cli;
use crate::fields::{
    format_status, PrioritySort, SortDirection, SortField, SortSpec, Status,
};
use crate::session::{Gated, Session};
use crate::state::ClientState;
use crate::task::Task;
use crate::tui::run::run_tui;
use crate::view::{self, TaskFilter};

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive board for a list.
    Ui {
        /// List id. Defaults to the most recently opened list.
        list: Option<String>,
        /// Bypass the snapshot cache on load.
        #[arg(long)]
        refresh: bool,
    },

    /// Create a new shared list.
    New {
        /// List title.
        title: String,
        /// Optional longer description (markdown on the web side).
        #[arg(long)]
        desc: Option<String>,
        /// Initial task title. May be repeated; at least one is required.
        #[arg(long = "task", required = true)]
        tasks: Vec<String>,
    },

    /// Show a list and its tasks.
    Show {
        /// List id.
        list: String,
        /// Filter by status.
        #[arg(long, value_enum)]
        status: Option<Status>,
        /// Case-insensitive text search over title and description.
        #[arg(long, default_value = "")]
        search: String,
        /// Substring match on task ids.
        #[arg(long, default_value = "")]
        id_query: String,
        /// Sort by priority instead of position.
        #[arg(long, value_enum)]
        sort_priority: Option<SortDirection>,
        /// Additional sort field, applied on ties. May be repeated.
        #[arg(long = "sort-by", value_enum)]
        sort_by: Vec<SortField>,
        /// Bypass the snapshot cache.
        #[arg(long)]
        refresh: bool,
    },

    /// Add a task to a list.
    Add {
        list: String,
        /// Task title.
        title: String,
        #[arg(long)]
        desc: Option<String>,
        /// Priority hint (suggested range 0-100, default 1).
        #[arg(long)]
        priority: Option<f64>,
    },

    /// Update fields on a task.
    Update {
        list: String,
        task: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long, value_enum)]
        status: Option<Status>,
        /// Progress percentage (0-100); meaningful while in progress.
        #[arg(long)]
        progress: Option<u8>,
        #[arg(long)]
        priority: Option<f64>,
        #[arg(long)]
        assignee: Option<String>,
    },

    /// Mark a task completed (progress becomes 100).
    Complete { list: String, task: String },

    /// Clear a task's completed flag.
    Reopen { list: String, task: String },

    /// Move a task to another status column.
    Move {
        list: String,
        task: String,
        #[arg(value_enum)]
        status: Status,
    },

    /// Reorder a task within its status column by visual index.
    Reorder {
        list: String,
        #[arg(value_enum)]
        status: Status,
        /// Current index within the column (top is 0).
        from: usize,
        /// Target index within the column.
        to: usize,
    },

    /// Delete a task.
    Delete { list: String, task: String },

    /// Edit list title/description.
    EditList {
        list: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        desc: Option<String>,
    },

    /// Show the comments on a task, oldest first.
    Comments { task: String },

    /// Add a comment to a task.
    Comment { task: String, content: String },

    /// Show recently opened lists.
    Recent {
        /// Remove one entry by list id.
        #[arg(long)]
        remove: Option<String>,
        /// Clear the whole history.
        #[arg(long)]
        clear: bool,
    },

    /// Show or set the actor name recorded on status/progress changes.
    Name { name: Option<String> },

    /// Print the share link and QR code URL for a list.
    Share { list: String },

    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Build the HTTP boundary or exit.
fn remote_or_exit(api: &str) -> HttpRemote {
    match HttpRemote::new(api) {
        Ok(remote) => remote,
        Err(e) => {
            eprintln!("Failed to initialise HTTP client: {e}");
            std::process::exit(1);
        }
    }
}

/// Open the client state directory or exit.
fn state_or_exit(dir: Option<PathBuf>) -> ClientState {
    let dir = dir.unwrap_or_else(ClientState::default_dir);
    match ClientState::new(dir) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("Failed to open state directory: {e}");
            std::process::exit(1);
        }
    }
}

fn session_or_exit(list_id: &str, api: &str, state_dir: Option<PathBuf>, refresh: bool) -> Session {
    let remote = remote_or_exit(api);
    let state = state_or_exit(state_dir);
    match Session::open(list_id, Box::new(remote), state, sink_from_env(), refresh) {
        Ok(session) => session,
        Err(ApiError::NotFound) => {
            eprintln!("List {list_id} not found. It may have been deleted.");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Failed to load list: {e}");
            std::process::exit(1);
        }
    }
}

fn fail(e: ApiError) -> ! {
    eprintln!("{e}");
    std::process::exit(1);
}

/// Prompt for the actor name on stdin and resume the parked action.
fn resume_with_prompt(session: &mut Session) {
    print!("Your name (recorded on status/progress changes): ");
    let _ = io::stdout().flush();
    let mut line = String::new();
    if io::stdin().read_line(&mut line).is_err() || line.trim().is_empty() {
        eprintln!("A name is required for this action.");
        std::process::exit(1);
    }
    if let Err(e) = session.resume_with_name(line.trim()) {
        fail(e);
    }
}

fn run_gated(session: &mut Session, op: impl Fn(&mut Session) -> Result<Gated, ApiError>) {
    match op(session) {
        Ok(Gated::Done) => {}
        Ok(Gated::NeedsName) => resume_with_prompt(session),
        Err(e) => fail(e),
    }
}

/// Launch the interactive board.
pub fn cmd_ui(list: Option<String>, api: &str, state_dir: Option<PathBuf>, refresh: bool) {
    let state = state_or_exit(state_dir.clone());
    let list_id = match list {
        Some(id) => id,
        None => match state.history().first() {
            Some(entry) => {
                println!("Opening recent list: {}", entry.title);
                entry.id.clone()
            }
            None => {
                eprintln!("No recent lists. Pass a list id: yam ui <LIST>");
                std::process::exit(1);
            }
        },
    };
    let session = session_or_exit(&list_id, api, state_dir, refresh);
    if let Err(e) = run_tui(session) {
        eprintln!("UI error: {e}");
        std::process::exit(1);
    }
}

/// Create a new list with its initial tasks and print the share link.
pub fn cmd_new(
    api: &str,
    state_dir: Option<PathBuf>,
    title: String,
    desc: Option<String>,
    tasks: Vec<String>,
) {
    if title.trim().is_empty() {
        eprintln!("List title must not be empty.");
        std::process::exit(1);
    }
    let initial: Vec<NewTask> = tasks
        .iter()
        .filter(|t| !t.trim().is_empty())
        .map(|t| NewTask {
            title: t.trim().to_string(),
            description: String::new(),
        })
        .collect();
    if initial.is_empty() {
        eprintln!("At least one task is required.");
        std::process::exit(1);
    }

    let remote = remote_or_exit(api);
    let state = state_or_exit(state_dir);
    match remote.create_list(&title, desc.as_deref().unwrap_or(""), &initial) {
        Ok(id) => {
            state.touch_history(&id, &title);
            sink_from_env().notify(&id, crate::bridge::TaskAction::Created);
            println!("Created list {id}");
            println!("Share: {}", share_url(api, &id));
        }
        Err(e) => fail(e),
    }
}

/// Print a list with filtering and sorting applied.
#[allow(clippy::too_many_arguments)]
pub fn cmd_show(
    list: String,
    api: &str,
    state_dir: Option<PathBuf>,
    status: Option<Status>,
    search: String,
    id_query: String,
    sort_priority: Option<SortDirection>,
    sort_by: Vec<SortField>,
    refresh: bool,
) {
    let session = session_or_exit(&list, api, state_dir, refresh);

    let filter = TaskFilter {
        search,
        id_query,
        status,
    };
    let spec = SortSpec {
        priority: match sort_priority {
            Some(SortDirection::Asc) => PrioritySort::Ascending,
            Some(SortDirection::Desc) => PrioritySort::Descending,
            None => PrioritySort::Unset,
        },
        fields: sort_by.into_iter().map(|f| (f, SortDirection::Asc)).collect(),
    };
    let rows = view::project(&session.tasks, &filter, &spec);

    println!("{}", session.list.title);
    if let Some(desc) = &session.list.description {
        println!("{desc}");
    }
    println!();
    if rows.is_empty() {
        if view::has_active_filters(&filter, &spec) {
            println!("No tasks match the current filters.");
        } else {
            println!("No tasks yet.");
        }
        return;
    }
    print_table(&rows);
    if view::has_active_filters(&filter, &spec) {
        println!("\n{} of {} tasks shown", rows.len(), session.tasks.len());
    }
}

pub fn cmd_add(
    list: String,
    api: &str,
    state_dir: Option<PathBuf>,
    title: String,
    desc: Option<String>,
    priority: Option<f64>,
) {
    let mut session = session_or_exit(&list, api, state_dir, false);
    match session.add_task(&title, desc.as_deref().unwrap_or(""), priority) {
        Ok(task) => println!("Added task {}", task.id),
        Err(e) => fail(e),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_update(
    list: String,
    task_id: String,
    api: &str,
    state_dir: Option<PathBuf>,
    title: Option<String>,
    desc: Option<String>,
    status: Option<Status>,
    progress: Option<u8>,
    priority: Option<f64>,
    assignee: Option<String>,
) {
    let mut session = session_or_exit(&list, api, state_dir, false);
    let Some(current) = session.tasks.iter().find(|t| t.id == task_id).cloned() else {
        eprintln!("Task {task_id} not found in list {list}.");
        std::process::exit(1);
    };

    if title.is_some() || desc.is_some() {
        let new_title = title.unwrap_or_else(|| current.title.clone());
        let new_desc = desc.unwrap_or_else(|| current.description.clone().unwrap_or_default());
        if let Err(e) = session.edit_task(&task_id, &new_title, &new_desc) {
            fail(e);
        }
    }
    if let Some(status) = status {
        run_gated(&mut session, |s| s.set_status(&task_id, status));
    }
    if let Some(percent) = progress {
        run_gated(&mut session, |s| s.set_progress(&task_id, percent));
    }
    if let Some(priority) = priority {
        if let Err(e) = session.set_priority(&task_id, priority) {
            fail(e);
        }
    }
    if let Some(assignee) = assignee {
        if let Err(e) = session.set_assignee(&task_id, &assignee) {
            fail(e);
        }
    }
    println!("Updated task {task_id}");
}

pub fn cmd_complete(list: String, task: String, api: &str, state_dir: Option<PathBuf>, completed: bool) {
    let mut session = session_or_exit(&list, api, state_dir, false);
    run_gated(&mut session, |s| s.set_completed(&task, completed));
    println!(
        "Task {task} {}",
        if completed { "completed" } else { "reopened" }
    );
}

pub fn cmd_move(list: String, task: String, status: Status, api: &str, state_dir: Option<PathBuf>) {
    let mut session = session_or_exit(&list, api, state_dir, false);
    run_gated(&mut session, |s| s.set_status(&task, status));
    println!("Moved task {task} to {}", format_status(status));
}

pub fn cmd_reorder(
    list: String,
    status: Status,
    from: usize,
    to: usize,
    api: &str,
    state_dir: Option<PathBuf>,
) {
    let mut session = session_or_exit(&list, api, state_dir, false);
    let column_len = session.tasks.iter().filter(|t| t.status == status).count();
    if from >= column_len || to >= column_len {
        eprintln!(
            "Index out of range: the {} column has {column_len} task(s).",
            format_status(status)
        );
        std::process::exit(1);
    }
    match session.reorder(status, from, to) {
        Ok(()) => println!("Reordered {} column", format_status(status)),
        Err(e) => fail(e),
    }
}

pub fn cmd_delete(list: String, task: String, api: &str, state_dir: Option<PathBuf>) {
    let mut session = session_or_exit(&list, api, state_dir, false);
    match session.delete_task(&task) {
        Ok(()) => println!("Deleted task {task}"),
        Err(e) => fail(e),
    }
}

pub fn cmd_edit_list(
    list: String,
    api: &str,
    state_dir: Option<PathBuf>,
    title: Option<String>,
    desc: Option<String>,
) {
    let mut session = session_or_exit(&list, api, state_dir, false);
    let new_title = title.unwrap_or_else(|| session.list.title.clone());
    let new_desc = desc.unwrap_or_else(|| session.list.description.clone().unwrap_or_default());
    match session.update_list(&new_title, &new_desc) {
        Ok(()) => println!("Updated list {list}"),
        Err(e) => fail(e),
    }
}

pub fn cmd_comments(task: String, api: &str) {
    let remote = remote_or_exit(api);
    match remote.comments(&task) {
        Ok(comments) if comments.is_empty() => println!("No comments."),
        Ok(comments) => {
            for comment in comments {
                println!(
                    "[{}] {}: {}",
                    format_local(comment.created_at),
                    comment.user_name.as_deref().unwrap_or("anonymous"),
                    comment.content
                );
            }
        }
        Err(e) => fail(e),
    }
}

pub fn cmd_comment(task: String, content: String, api: &str, state_dir: Option<PathBuf>) {
    if content.trim().is_empty() {
        eprintln!("Comment must not be empty.");
        std::process::exit(1);
    }
    let remote = remote_or_exit(api);
    let state = state_or_exit(state_dir);
    let name = state.user_name();
    let name = (!name.is_empty()).then_some(name);
    match remote.add_comment(&task, &content, name.as_deref()) {
        Ok(_) => println!("Comment added."),
        Err(e) => fail(e),
    }
}

pub fn cmd_recent(state_dir: Option<PathBuf>, remove: Option<String>, clear: bool) {
    let state = state_or_exit(state_dir);
    if clear {
        state.clear_history();
        println!("History cleared.");
        return;
    }
    if let Some(id) = remove {
        state.remove_history(&id);
        println!("Removed {id} from history.");
        return;
    }
    let entries = state.history();
    if entries.is_empty() {
        println!("No recently opened lists.");
        return;
    }
    println!("{:<38} {:<18} Title", "ID", "Last opened");
    for entry in entries {
        println!(
            "{:<38} {:<18} {}",
            entry.id,
            format_local(entry.last_accessed),
            entry.title
        );
    }
}

pub fn cmd_name(state_dir: Option<PathBuf>, name: Option<String>) {
    let state = state_or_exit(state_dir);
    match name {
        Some(name) if !name.trim().is_empty() => {
            if let Err(e) = state.set_user_name(&name) {
                eprintln!("Failed to save name: {e}");
                std::process::exit(1);
            }
            println!("Name set to {}", name.trim());
        }
        Some(_) => {
            eprintln!("Name must not be empty.");
            std::process::exit(1);
        }
        None => {
            let current = state.user_name();
            if current.is_empty() {
                println!("No name set. Gated actions will prompt for one.");
            } else {
                println!("{current}");
            }
        }
    }
}

pub fn cmd_share(list: String, api: &str) {
    let url = share_url(api, &list);
    println!("Share link: {url}");
    println!("QR code:    {}", qr_code_url(&url));
}

pub fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}

/// Web URL a holder of the link opens in a browser.
fn share_url(api: &str, list_id: &str) -> String {
    format!("{}/tasks/{list_id}", api.trim_end_matches('/'))
}

/// QR code image for a share link.
fn qr_code_url(url: &str) -> String {
    format!(
        "https://api.qrserver.com/v1/create-qr-code/?size=200x200&data={}",
        percent_encode(url)
    )
}

/// Minimal query-component encoding, enough for URLs.
fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

fn format_local(when: DateTime<Utc>) -> String {
    when.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// Print tasks in a fixed-width table.
fn print_table(tasks: &[Task]) {
    println!(
        "{:<10} {:<14} {:<4} {:<5} {:<5} {:<4} {:<12} Title",
        "ID", "Status", "Done", "Prog", "Pri", "Pos", "Assigned"
    );
    for task in tasks {
        println!(
            "{:<10} {:<14} {:<4} {:<5} {:<5} {:<4} {:<12} {}",
            clip(&task.id, 10),
            format_status(task.status),
            if task.completed { "x" } else { "-" },
            format!("{}%", task.progress_percentage),
            task.effective_priority(),
            task.position,
            clip(
                if task.assigned_to.is_empty() {
                    "-"
                } else {
                    &task.assigned_to
                },
                12
            ),
            task.title
        );
    }
}

/// Clip to `width` characters, ending with an ellipsis when shortened.
fn clip(s: &str, width: usize) -> String {
    let count = s.chars().count();
    if count <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_url_strips_trailing_slash() {
        assert_eq!(
            share_url("https://example.app/", "abc"),
            "https://example.app/tasks/abc"
        );
    }

    #[test]
    fn qr_url_percent_encodes_the_link() {
        let url = qr_code_url("https://example.app/tasks/abc");
        assert!(url.ends_with("data=https%3A%2F%2Fexample.app%2Ftasks%2Fabc"));
    }

    #[test]
    fn clip_appends_ellipsis() {
        assert_eq!(clip("short", 10), "short");
        assert_eq!(clip("a-very-long-identifier", 8), "a-very-…");
    }
}
