pub mod create;
pub mod schema;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "actplan")]
#[command(
    author,
    version,
    about = "Create action plans from answered diagnostics"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose/debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an action plan against a store snapshot
    Create(CreateArgs),

    /// Print JSON Schema for config (or payload) validation
    Schema(SchemaArgs),
}

#[derive(Parser, Clone)]
pub struct CreateArgs {
    /// Path to config file (defaults apply when omitted)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Store snapshot (JSON), updated in place
    #[arg(long)]
    pub store: PathBuf,

    /// Action plan payload (JSON)
    #[arg(long)]
    pub payload: PathBuf,

    /// Diagnostic the plan is created for
    #[arg(long)]
    pub diagnostic: String,

    /// Partner of the acting user
    #[arg(long, env = "ACTPLAN_PARTNER")]
    pub partner: String,

    /// Acting user id
    #[arg(long, env = "ACTPLAN_USER")]
    pub user: String,

    /// Override report directory
    #[arg(long)]
    pub report_dir: Option<PathBuf>,

    /// Show the tier plan without writing
    #[arg(long)]
    pub dry_run: bool,

    /// Fail when an association insert reports fewer rows than submitted
    #[arg(long)]
    pub strict: bool,
}

#[derive(Parser, Clone)]
pub struct SchemaArgs {
    /// Print the action plan payload schema instead of the config schema
    #[arg(long)]
    pub payload: bool,
}
