use super::ui;
use crate::core::config::AppConfig;
use crate::core::{PriceProvider, SnapshotStore, run_daily_cycle};
use anyhow::Result;

/// Runs the daily cycle for `midnight_ts` and prints the resulting ledger.
pub async fn run(
    config: &AppConfig,
    provider: &(dyn PriceProvider + Send + Sync),
    store: &dyn SnapshotStore,
    midnight_ts: i64,
) -> Result<()> {
    let pb = ui::new_progress_bar(config.coins.len() as u64);
    pb.set_message("Fetching prices...");

    let result = run_daily_cycle(config, provider, store, midnight_ts, &|| pb.inc(1)).await;
    pb.finish_and_clear();

    let report = result?;
    println!(
        "{}",
        report
            .ledger
            .display_as_table(Some(&report.prices), Some(&report.purchases))
    );
    Ok(())
}
