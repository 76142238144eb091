//! # yam - Yarimausu task-list client
//!
//! A command-line client for Yarimausu, the login-free, link-shared task-list
//! service: anyone holding a list's URL can view, add, edit, reorder, comment
//! on, and track progress of its tasks. Identity is just a display name,
//! recorded on status and progress changes for attribution.
//!
//! ## Key Features
//!
//! - **Kanban TUI**: five status columns with keyboard drag-and-drop
//!   reordering, cross-column moves, progress nudging, and live filtering
//! - **Optimistic updates**: every mutation renders immediately and rolls
//!   back with a message if the service rejects it
//! - **Snapshot cache**: recently fetched lists render instantly and refresh
//!   on demand
//! - **Scriptable CLI**: every board action is also a subcommand for
//!   automation
//!
//! ## Quick Start
//!
//! ```bash
//! # Point the client at your deployment
//! export YARIMAUSU_API=https://yarimausu.example.app
//!
//! # Create a list and share it
//! yam new "Groceries" --task "Buy milk" --task "Buy eggs"
//! yam share <LIST>
//!
//! # Open the board for the most recent list
//! yam ui
//!
//! # Scriptable equivalents
//! yam show <LIST> --status in-progress
//! yam add <LIST> "Restock coffee"
//! yam complete <LIST> <TASK>
//! ```
//!
//! Client-side state (snapshot cache, your display name, recently opened
//! lists) lives in `~/.yarimausu`; the service remains the source of truth.

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub mod api;
pub mod bridge;
pub mod cli;
pub mod cmd;
pub mod debounce;
pub mod fields;
pub mod ordering;
pub mod session;
pub mod state;
pub mod task;
pub mod view;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod enums;
    pub mod input;
    pub mod run;
}

use cli::Cli;
use cmd::*;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let api = cli.api.clone();
    let state_dir = cli.state_dir.clone();

    match cli.command {
        Commands::Ui { list, refresh } => cmd_ui(list, &api, state_dir, refresh),

        Commands::New { title, desc, tasks } => cmd_new(&api, state_dir, title, desc, tasks),

        Commands::Show {
            list,
            status,
            search,
            id_query,
            sort_priority,
            sort_by,
            refresh,
        } => cmd_show(
            list, &api, state_dir, status, search, id_query, sort_priority, sort_by, refresh,
        ),

        Commands::Add {
            list,
            title,
            desc,
            priority,
        } => cmd_add(list, &api, state_dir, title, desc, priority),

        Commands::Update {
            list,
            task,
            title,
            desc,
            status,
            progress,
            priority,
            assignee,
        } => cmd_update(
            list, task, &api, state_dir, title, desc, status, progress, priority, assignee,
        ),

        Commands::Complete { list, task } => cmd_complete(list, task, &api, state_dir, true),

        Commands::Reopen { list, task } => cmd_complete(list, task, &api, state_dir, false),

        Commands::Move { list, task, status } => cmd_move(list, task, status, &api, state_dir),

        Commands::Reorder {
            list,
            status,
            from,
            to,
        } => cmd_reorder(list, status, from, to, &api, state_dir),

        Commands::Delete { list, task } => cmd_delete(list, task, &api, state_dir),

        Commands::EditList { list, title, desc } => {
            cmd_edit_list(list, &api, state_dir, title, desc)
        }

        Commands::Comments { task } => cmd_comments(task, &api),

        Commands::Comment { task, content } => cmd_comment(task, content, &api, state_dir),

        Commands::Recent { remove, clear } => cmd_recent(state_dir, remove, clear),

        Commands::Name { name } => cmd_name(state_dir, name),

        Commands::Share { list } => cmd_share(list, &api),

        Commands::Completions { shell } => cmd_completions(shell),
    }
}
