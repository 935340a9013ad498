//! One day of the dollar-cost-averaging simulation.
use super::allocation::{Purchases, apply_purchases, plan_purchases};
use super::analytics::{calculate_portfolio_value, yield_rate};
use super::config::AppConfig;
use super::ledger::{Holdings, LedgerSnapshot, reconcile};
use super::price::{PriceBook, PriceProvider, fetch_prices};
use super::snapshot::{
    SnapshotStore, date_string, load_ledger, load_prices, previous_date_string, save_ledger,
    save_prices,
};
use anyhow::Result;
use tracing::{debug, info};

/// Everything produced by a daily run.
#[derive(Debug, Clone)]
pub struct DailyReport {
    pub prices: PriceBook,
    pub purchases: Purchases,
    pub ledger: LedgerSnapshot,
}

/// Runs the cycle for the day starting at `midnight_ts`: prices are fetched
/// and saved, yesterday's ledger is carried forward, today's allocation is
/// bought and the new ledger is saved.
pub async fn run_daily_cycle(
    config: &AppConfig,
    provider: &(dyn PriceProvider + Send + Sync),
    store: &dyn SnapshotStore,
    midnight_ts: i64,
    update_callback: &(dyn Fn() + Sync),
) -> Result<DailyReport> {
    let date = date_string(midnight_ts)?;
    let previous_date = previous_date_string(midnight_ts)?;
    info!(date = %date, coins = config.coins.len(), "Starting daily cycle");

    let previous_prices = load_prices(store, &previous_date).await?;
    let prices = fetch_prices(
        provider,
        config.coins.keys(),
        midnight_ts,
        &previous_prices,
        update_callback,
    )
    .await;
    save_prices(store, &date, &prices.snapshot()).await?;

    let (previous_holdings, previous_investment) =
        match load_ledger(store, &previous_date, &previous_prices).await? {
            Some(ledger) => (ledger.quantities, ledger.total_investment),
            None => {
                info!(date = %previous_date, "No previous ledger, starting fresh");
                (Holdings::new(), 0.0)
            }
        };

    let mut holdings = reconcile(&previous_holdings, &config.coins, &prices);
    let purchases = plan_purchases(&prices, config.daily_investment, &config.coins);
    debug!(?purchases, "Planned purchases");
    apply_purchases(&mut holdings, &purchases);

    let total_investment = previous_investment + config.daily_investment;
    let portfolio_value = calculate_portfolio_value(&prices, &holdings);
    let ledger = LedgerSnapshot {
        date,
        portfolio_value,
        total_investment,
        quantities: holdings,
        yield_rate: yield_rate(portfolio_value, total_investment),
    };
    save_ledger(store, &ledger).await?;

    info!(
        date = %ledger.date,
        portfolio_value = ledger.portfolio_value,
        total_investment = ledger.total_investment,
        yield_rate = ledger.yield_rate,
        "Daily cycle complete"
    );

    Ok(DailyReport {
        prices,
        purchases,
        ledger,
    })
}
