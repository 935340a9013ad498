//! Day-over-day holdings ledger.
//!
//! Yesterday's records are upgraded once at load time ([`upgrade_holdings`])
//! and then carried into today's coin universe by [`reconcile`].

use super::config::CoinAllocation;
use super::price::{PriceBook, PriceSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoldingRecord {
    pub quantity: f64,
    pub active: bool,
    pub last_price: f64,
}

pub type Holdings = BTreeMap<String, HoldingRecord>;

/// A holding as it may appear on disk. Early ledgers stored the bare quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredHolding {
    Record(HoldingRecord),
    Legacy(f64),
}

impl StoredHolding {
    pub fn upgrade(self, coin: &str, prices: &PriceSnapshot) -> HoldingRecord {
        match self {
            StoredHolding::Record(record) => record,
            StoredHolding::Legacy(quantity) => {
                let last_price = prices.get(coin).copied().unwrap_or(0.0);
                debug!(coin, quantity, last_price, "Upgrading legacy holding");
                HoldingRecord {
                    quantity,
                    active: true,
                    last_price,
                }
            }
        }
    }
}

impl From<HoldingRecord> for StoredHolding {
    fn from(record: HoldingRecord) -> Self {
        StoredHolding::Record(record)
    }
}

/// Ledger file contents for one day, `<date>.yield.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot<H = HoldingRecord> {
    pub date: String,
    pub portfolio_value: f64,
    pub total_investment: f64,
    pub quantities: BTreeMap<String, H>,
    pub yield_rate: f64,
}

/// A ledger exactly as read from disk, before legacy holdings are upgraded.
pub type StoredLedger = LedgerSnapshot<StoredHolding>;

impl StoredLedger {
    pub fn upgrade(self, prices: &PriceSnapshot) -> LedgerSnapshot {
        LedgerSnapshot {
            quantities: upgrade_holdings(self.quantities, prices),
            date: self.date,
            portfolio_value: self.portfolio_value,
            total_investment: self.total_investment,
            yield_rate: self.yield_rate,
        }
    }
}

/// Turns every stored holding into a structured record. Legacy entries take
/// their last price from `prices` (the snapshot of the ledger's own day).
pub fn upgrade_holdings(
    stored: BTreeMap<String, StoredHolding>,
    prices: &PriceSnapshot,
) -> Holdings {
    stored
        .into_iter()
        .map(|(coin, holding)| {
            let record = holding.upgrade(&coin, prices);
            (coin, record)
        })
        .collect()
}

/// Carries `previous` holdings into the universe defined by `allocation`.
///
/// Coins kept from yesterday stay active and refresh their last price when
/// today has one. Coins dropped from the allocation go inactive with their
/// last price frozen. New coins start empty.
pub fn reconcile(previous: &Holdings, allocation: &CoinAllocation, prices: &PriceBook) -> Holdings {
    let mut holdings = Holdings::new();

    for (coin, prior) in previous {
        let record = if allocation.contains_key(coin) {
            HoldingRecord {
                quantity: prior.quantity,
                active: true,
                last_price: prices.price(coin).unwrap_or(prior.last_price),
            }
        } else {
            if prior.active {
                debug!(coin = %coin, last_price = prior.last_price, "Coin left the allocation");
            }
            HoldingRecord {
                quantity: prior.quantity,
                active: false,
                last_price: prior.last_price,
            }
        };
        holdings.insert(coin.clone(), record);
    }

    for coin in allocation.keys() {
        if !holdings.contains_key(coin) {
            debug!(coin = %coin, "Coin joined the allocation");
            holdings.insert(
                coin.clone(),
                HoldingRecord {
                    quantity: 0.0,
                    active: true,
                    last_price: prices.price(coin).unwrap_or(0.0),
                },
            );
        }
    }

    holdings
}
