//! Pricing abstractions and core types

use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Coin symbol mapped to its USD price, as persisted in `<date>.price.json`.
pub type PriceSnapshot = BTreeMap<String, f64>;

/// Outcome of looking up one coin's price for a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Quote {
    /// Close fetched from the upstream API for the run's timestamp.
    Live(f64),
    /// Upstream failed; previous day's price is substituted.
    Stale(f64),
    /// Upstream failed and no previous price exists.
    Unavailable,
}

impl Quote {
    pub fn price(&self) -> Option<f64> {
        match self {
            Quote::Live(p) | Quote::Stale(p) => Some(*p),
            Quote::Unavailable => None,
        }
    }
}

/// Quotes for every coin of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceBook {
    quotes: BTreeMap<String, Quote>,
}

impl PriceBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, coin: impl Into<String>, quote: Quote) {
        self.quotes.insert(coin.into(), quote);
    }

    pub fn quote(&self, coin: &str) -> Quote {
        self.quotes.get(coin).copied().unwrap_or(Quote::Unavailable)
    }

    pub fn price(&self, coin: &str) -> Option<f64> {
        self.quote(coin).price()
    }

    /// Prices worth persisting; unavailable coins are left out.
    pub fn snapshot(&self) -> PriceSnapshot {
        self.quotes
            .iter()
            .filter_map(|(coin, quote)| quote.price().map(|p| (coin.clone(), p)))
            .collect()
    }
}

impl FromIterator<(String, Quote)> for PriceBook {
    fn from_iter<I: IntoIterator<Item = (String, Quote)>>(iter: I) -> Self {
        Self {
            quotes: iter.into_iter().collect(),
        }
    }
}

#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Most recent minute close in USD at or before the `to_ts` UNIX timestamp.
    async fn fetch_close(&self, symbol: &str, to_ts: i64) -> Result<f64>;
}

/// Looks up each coin one after the other. A failed lookup falls back to
/// `previous` for that coin, or becomes [`Quote::Unavailable`] when there is
/// no usable previous price.
pub async fn fetch_prices<'a, I>(
    provider: &(dyn PriceProvider + Send + Sync),
    coins: I,
    to_ts: i64,
    previous: &PriceSnapshot,
    update_callback: &(dyn Fn() + Sync),
) -> PriceBook
where
    I: IntoIterator<Item = &'a String>,
{
    let mut book = PriceBook::new();
    for coin in coins {
        let quote = match provider.fetch_close(coin, to_ts).await {
            Ok(price) => {
                debug!(coin = %coin, price, "Fetched close");
                Quote::Live(price)
            }
            Err(e) => match previous.get(coin) {
                Some(&stale) if stale.is_finite() && stale > 0.0 => {
                    warn!(coin = %coin, error = %e, stale, "Failed to fetch price, using previous day's");
                    Quote::Stale(stale)
                }
                Some(&stale) => {
                    warn!(coin = %coin, error = %e, stale, "Failed to fetch price, previous day's price is not usable");
                    Quote::Unavailable
                }
                None => {
                    warn!(coin = %coin, error = %e, "Failed to fetch price, no previous price available");
                    Quote::Unavailable
                }
            },
        };
        book.insert(coin.clone(), quote);
        update_callback();
    }
    book
}
