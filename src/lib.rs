pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use anyhow::Result;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Run today's cycle.
    Run,
    /// Run the cycle for a given midnight UTC timestamp.
    RunAt(i64),
    /// Show a stored ledger, defaulting to today's.
    Summary { date: Option<String> },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("coindca starting...");

    let config = match config_path {
        Some(path) => crate::core::config::AppConfig::load_from_path(path)?,
        None => crate::core::config::AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let snapshot_dir = config.snapshot_dir()?;
    debug!("Using snapshot directory {}", snapshot_dir.display());
    let store = store::DiskStore::new(snapshot_dir);

    match command {
        AppCommand::Run => {
            let midnight = crate::core::snapshot::midnight_timestamp(chrono::Utc::now());
            run_cycle(&config, &store, midnight).await
        }
        AppCommand::RunAt(midnight) => run_cycle(&config, &store, midnight).await,
        AppCommand::Summary { date } => cli::summary::run(&store, date.as_deref()).await,
    }
}

async fn run_cycle(
    config: &crate::core::config::AppConfig,
    store: &store::DiskStore,
    midnight: i64,
) -> Result<()> {
    let provider = providers::CryptoCompareProvider::new(config.cryptocompare_url())?;
    cli::run::run(config, &provider, store, midnight).await
}
