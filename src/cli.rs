use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Client for Yarimausu shared task lists.
/// The service base URL comes from --api or YARIMAUSU_API.
#[derive(Parser)]
#[command(name = "yam", version, about = "Anonymous shared task lists from the terminal")]
pub struct Cli {
    /// Base URL of the Yarimausu service.
    #[arg(
        long,
        global = true,
        env = "YARIMAUSU_API",
        default_value = "http://localhost:3000"
    )]
    pub api: String,

    /// Client state directory (snapshot cache, actor name, history).
    /// Defaults to ~/.yarimausu.
    #[arg(long, global = true)]
    pub state_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}
