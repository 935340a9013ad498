use anyhow::Result;
use clap::{Parser, Subcommand};
use coindca::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Fetch today's prices, buy today's allocation and record the ledger
    Run,
    /// Display the recorded ledger for a day
    Summary {
        /// Day to show as YYYYMMDD, defaults to today
        #[arg(short, long)]
        date: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => coindca::cli::setup::setup(),
        Some(Commands::Summary { date }) => {
            coindca::run_command(
                coindca::AppCommand::Summary { date },
                cli.config_path.as_deref(),
            )
            .await
        }
        Some(Commands::Run) | None => {
            coindca::run_command(coindca::AppCommand::Run, cli.config_path.as_deref()).await
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
