use super::config::CoinAllocation;
use super::ledger::Holdings;
use super::price::PriceBook;
use std::collections::BTreeMap;
use tracing::debug;

/// Coin quantities bought in a single run.
pub type Purchases = BTreeMap<String, f64>;

/// Splits `investment` dollars by percentage and converts each share into a
/// coin quantity. Coins without a price today are skipped.
pub fn plan_purchases(prices: &PriceBook, investment: f64, allocation: &CoinAllocation) -> Purchases {
    allocation
        .iter()
        .filter_map(|(coin, percentage)| {
            let Some(price) = prices.price(coin) else {
                debug!(coin = %coin, "No price today, skipping purchase");
                return None;
            };
            let amount = investment * (percentage / 100.0);
            Some((coin.clone(), amount / price))
        })
        .collect()
}

/// Adds the purchased quantities onto active holdings. Inactive or unknown
/// coins never receive anything.
pub fn apply_purchases(holdings: &mut Holdings, purchases: &Purchases) {
    for (coin, quantity) in purchases {
        match holdings.get_mut(coin) {
            Some(record) if record.active => record.quantity += quantity,
            Some(_) => debug!(coin = %coin, "Holding inactive, purchase dropped"),
            None => debug!(coin = %coin, "No holding for purchase"),
        }
    }
}
