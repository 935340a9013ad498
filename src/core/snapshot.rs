//! Dated snapshot persistence.
//!
//! Snapshots are opaque blobs in a [`SnapshotStore`], keyed by
//! `<YYYYMMDD>.price.json` and `<YYYYMMDD>.yield.json`.

use super::ledger::{LedgerSnapshot, StoredLedger};
use super::price::PriceSnapshot;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::ser::PrettyFormatter;
use tracing::debug;

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Returns `None` when nothing is stored under `key`.
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn write(&self, key: &str, data: &[u8]) -> Result<()>;
}

pub fn price_key(date: &str) -> String {
    format!("{date}.price.json")
}

pub fn ledger_key(date: &str) -> String {
    format!("{date}.yield.json")
}

/// UNIX timestamp of 00:00 UTC on the day of `now`.
pub fn midnight_timestamp(now: DateTime<Utc>) -> i64 {
    now.date_naive().and_time(NaiveTime::MIN).and_utc().timestamp()
}

/// `YYYYMMDD` for a UNIX timestamp.
pub fn date_string(timestamp: i64) -> Result<String> {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y%m%d").to_string())
        .ok_or_else(|| anyhow!("Timestamp out of range: {timestamp}"))
}

/// Midnight timestamp for a `YYYYMMDD` date string.
pub fn parse_date(date: &str) -> Result<i64> {
    let day = NaiveDate::parse_from_str(date, "%Y%m%d")
        .with_context(|| format!("Invalid date, expected YYYYMMDD: {date}"))?;
    Ok(day.and_time(NaiveTime::MIN).and_utc().timestamp())
}

/// Date string of the day before `timestamp`.
pub fn previous_date_string(timestamp: i64) -> Result<String> {
    date_string(timestamp - Duration::days(1).num_seconds())
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(buf)
}

async fn read_json<T: DeserializeOwned>(store: &dyn SnapshotStore, key: &str) -> Result<Option<T>> {
    match store.read(key).await? {
        Some(bytes) => {
            let value = serde_json::from_slice(&bytes)
                .with_context(|| format!("Failed to parse snapshot: {key}"))?;
            debug!(key, "Loaded snapshot");
            Ok(Some(value))
        }
        None => {
            debug!(key, "No snapshot found");
            Ok(None)
        }
    }
}

async fn write_json<T: Serialize>(store: &dyn SnapshotStore, key: &str, value: &T) -> Result<()> {
    let bytes = to_pretty_json(value).with_context(|| format!("Failed to encode snapshot: {key}"))?;
    store.write(key, &bytes).await?;
    debug!(key, "Saved snapshot");
    Ok(())
}

/// Prices stored for `date`; empty when that day was never run.
pub async fn load_prices(store: &dyn SnapshotStore, date: &str) -> Result<PriceSnapshot> {
    Ok(read_json(store, &price_key(date)).await?.unwrap_or_default())
}

pub async fn save_prices(store: &dyn SnapshotStore, date: &str, prices: &PriceSnapshot) -> Result<()> {
    write_json(store, &price_key(date), prices).await
}

/// Ledger stored for `date`, with legacy holdings upgraded using `prices`.
pub async fn load_ledger(
    store: &dyn SnapshotStore,
    date: &str,
    prices: &PriceSnapshot,
) -> Result<Option<LedgerSnapshot>> {
    let stored: Option<StoredLedger> = read_json(store, &ledger_key(date)).await?;
    Ok(stored.map(|ledger| ledger.upgrade(prices)))
}

pub async fn save_ledger(store: &dyn SnapshotStore, ledger: &LedgerSnapshot) -> Result<()> {
    write_json(store, &ledger_key(&ledger.date), ledger).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ledger::HoldingRecord;
    use crate::store::memory::MemoryStore;
    use chrono::TimeZone;

    #[test]
    fn test_date_helpers() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 17, 45, 12).unwrap();
        let midnight = midnight_timestamp(now);
        assert_eq!(midnight, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap().timestamp());
        assert_eq!(date_string(midnight).unwrap(), "20240301");
        assert_eq!(previous_date_string(midnight).unwrap(), "20240229");
        assert_eq!(parse_date("20240301").unwrap(), midnight);
        assert!(parse_date("2024-03-01").is_err());
    }

    #[test]
    fn test_keys() {
        assert_eq!(price_key("20240101"), "20240101.price.json");
        assert_eq!(ledger_key("20240101"), "20240101.yield.json");
    }

    #[tokio::test]
    async fn test_missing_snapshots_read_as_empty() {
        let store = MemoryStore::new();
        assert!(load_prices(&store, "20240101").await.unwrap().is_empty());
        assert!(
            load_ledger(&store, "20240101", &PriceSnapshot::new())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_ledger_is_written_with_four_space_indent() {
        let store = MemoryStore::new();
        let ledger = LedgerSnapshot {
            date: "20240102".to_string(),
            portfolio_value: 100.0,
            total_investment: 100.0,
            quantities: [(
                "BTC".to_string(),
                HoldingRecord {
                    quantity: 0.002,
                    active: true,
                    last_price: 50000.0,
                },
            )]
            .into_iter()
            .collect(),
            yield_rate: 1.0,
        };
        save_ledger(&store, &ledger).await.unwrap();

        let raw = store.read("20240102.yield.json").await.unwrap().unwrap();
        let text = String::from_utf8(raw).unwrap();
        assert!(text.contains("\n    \"date\": \"20240102\""));
        assert!(text.contains("\"last_price\": 50000.0"));

        let loaded = load_ledger(&store, "20240102", &PriceSnapshot::new())
            .await
            .unwrap();
        assert_eq!(loaded, Some(ledger));
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_an_error() {
        let store = MemoryStore::new();
        store.write("20240101.price.json", b"not json").await.unwrap();

        let err = load_prices(&store, "20240101").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to parse snapshot: 20240101.price.json");
    }
}
