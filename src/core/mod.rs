//! Core business logic abstractions

pub mod allocation;
pub mod analytics;
pub mod config;
pub mod cycle;
pub mod ledger;
pub mod log;
pub mod price;
pub mod snapshot;

// Re-export main types for cleaner imports
pub use cycle::{DailyReport, run_daily_cycle};
pub use ledger::{HoldingRecord, Holdings, LedgerSnapshot};
pub use price::{PriceBook, PriceProvider, PriceSnapshot, Quote};
pub use snapshot::SnapshotStore;
