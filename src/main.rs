use actplan::cli::{self, Cli, Commands};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing - only show logs with --verbose
    let filter = if cli.verbose {
        EnvFilter::new("actplan=debug")
    } else {
        EnvFilter::new("actplan=warn")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Commands::Create(args) => cli::create::execute(args).await,
        Commands::Schema(args) => cli::schema::execute(args),
    }
}
