// Brandloom brand-narrative service
// Main entry point for the brandloom binary

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use brandloom_engine::api::{self, AppState};
use brandloom_engine::chat::Orchestrator;
use brandloom_engine::config::Config;
use brandloom_engine::db::{AccountRepository, Database, TurnRepository};
use brandloom_engine::llm::GroqProvider;
use brandloom_engine::telemetry::init_logging;

/// Brandloom narrative service
#[derive(Debug, Parser)]
#[command(name = "brandloom", version)]
struct Cli {
    /// Path to a config file (default: ~/.brandloom/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Bind address override (default from config)
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    init_logging(&config.core.log_level);

    tracing::info!("Brandloom v{}", env!("CARGO_PKG_VERSION"));

    let db = Database::new(&config.db_path()).await?;
    let pool = db.pool().clone();

    let turns = Arc::new(TurnRepository::new(pool.clone()));
    let accounts = Arc::new(AccountRepository::new(pool));
    let provider = Arc::new(GroqProvider::new(config.llm.clone()));

    let orchestrator = Orchestrator::new(turns, accounts, provider);

    let addr = cli.bind.unwrap_or(config.server.bind_addr);
    api::serve(&addr, AppState { orchestrator }).await?;

    // Checkpoint the WAL so all writes reach the main database file.
    db.close().await;
    Ok(())
}
