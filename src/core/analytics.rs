//! Portfolio valuation and yield.
use super::ledger::Holdings;
use super::price::PriceBook;
use tracing::debug;

/// Price a holding is valued at today. Active coins use today's quote and
/// are worth nothing without one. Inactive coins use their frozen price.
pub fn applicable_price(coin: &str, active: bool, last_price: f64, prices: &PriceBook) -> Option<f64> {
    if active {
        prices.price(coin)
    } else {
        Some(last_price)
    }
}

pub fn calculate_portfolio_value(prices: &PriceBook, holdings: &Holdings) -> f64 {
    holdings
        .iter()
        .map(
            |(coin, record)| match applicable_price(coin, record.active, record.last_price, prices) {
                Some(price) => record.quantity * price,
                None => {
                    debug!(coin = %coin, "Active coin has no price today, valued at zero");
                    0.0
                }
            },
        )
        .sum()
}

/// `portfolio_value / total_investment`, or zero when nothing has been invested.
pub fn yield_rate(portfolio_value: f64, total_investment: f64) -> f64 {
    if total_investment == 0.0 {
        return 0.0;
    }
    round_to(portfolio_value / total_investment, 4)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
