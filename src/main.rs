use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use local_accounts::config::load_config;
use local_accounts::{run, AccountStore, AuthEngine, Command, FileStore};

/// Local account registration and sign-in.
#[derive(Parser, Debug)]
#[command(name = "local-accounts", version)]
struct Cli {
    /// Config file path (toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the data directory.
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Log level override.
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_app(Cli::parse()).await {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}

async fn run_app(cli: Cli) -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.storage.data_dir = dir;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    init_tracing(&config.logging.level);

    let engine = AuthEngine::new(AccountStore::new(FileStore::new(
        config.storage.data_dir,
    )));
    run(&engine, cli.command, std::io::stdout()).await
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
