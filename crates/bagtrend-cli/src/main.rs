use clap::{Parser, Subcommand};

mod collect;
mod keywords;

#[derive(Debug, Parser)]
#[command(name = "bagtrend")]
#[command(about = "Vintage bag market-interest collector")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the collection pipeline against the remote store
    #[command(subcommand)]
    Collect(collect::CollectCommands),
    /// Inspect or sync the keyword configuration
    #[command(subcommand)]
    Keywords(keywords::KeywordCommands),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = bagtrend_core::load_app_config()?;
    init_tracing(&config.log_level);
    tracing::debug!(env = %config.env, "configuration loaded");

    let cli = Cli::parse();
    match cli.command {
        Commands::Collect(cmd) => collect::handle(cmd, &config).await,
        Commands::Keywords(cmd) => keywords::handle(cmd, &config).await,
    }
}

fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
