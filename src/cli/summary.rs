use super::ui;
use crate::core::LedgerSnapshot;
use crate::core::allocation::Purchases;
use crate::core::analytics::applicable_price;
use crate::core::price::{PriceBook, Quote};
use crate::core::snapshot::{
    SnapshotStore, date_string, load_ledger, load_prices, midnight_timestamp,
};
use anyhow::{Result, bail};
use comfy_table::{Cell, CellAlignment};

impl LedgerSnapshot {
    /// Renders the holdings. With `prices` the value column uses that day's
    /// quotes, otherwise each holding's recorded last price.
    pub fn display_as_table(
        &self,
        prices: Option<&PriceBook>,
        purchases: Option<&Purchases>,
    ) -> String {
        let mut table = ui::new_styled_table();

        let mut header = vec![
            ui::header_cell("Coin"),
            ui::header_cell("Status"),
            ui::header_cell("Quantity"),
            ui::header_cell("Price (USD)"),
            ui::header_cell("Value (USD)"),
        ];
        if purchases.is_some() {
            header.push(ui::header_cell("Bought"));
        }
        table.set_header(header);

        for (coin, record) in &self.quantities {
            let (price, stale) = match prices {
                Some(book) => (
                    applicable_price(coin, record.active, record.last_price, book),
                    record.active && matches!(book.quote(coin), Quote::Stale(_)),
                ),
                None => (Some(record.last_price), false),
            };

            let price_cell = ui::format_optional_cell(price, |p| {
                if stale {
                    format!("{p:.2} (stale)")
                } else {
                    format!("{p:.2}")
                }
            });
            let value_cell = ui::format_optional_cell(price.map(|p| p * record.quantity), |v| {
                format!("{v:.2}")
            });

            let mut row = vec![
                Cell::new(coin),
                ui::status_cell(record.active),
                Cell::new(format!("{:.8}", record.quantity)).set_alignment(CellAlignment::Right),
                price_cell,
                value_cell,
            ];
            if let Some(purchases) = purchases {
                row.push(ui::format_optional_cell(purchases.get(coin).copied(), |q| {
                    format!("{q:.8}")
                }));
            }
            table.add_row(row);
        }

        let mut output = format!(
            "Ledger: {}\n\n",
            ui::style_text(&self.date, ui::StyleType::Title)
        );
        output.push_str(&table.to_string());

        let mut totals = ui::new_styled_table();
        totals.add_row(vec![
            Cell::new(ui::style_text("Total Invested (USD)", ui::StyleType::TotalLabel)),
            Cell::new(format!("{:.2}", self.total_investment)).set_alignment(CellAlignment::Right),
        ]);
        totals.add_row(vec![
            Cell::new(ui::style_text("Portfolio Value (USD)", ui::StyleType::TotalLabel)),
            Cell::new(ui::style_text(
                &format!("{:.2}", self.portfolio_value),
                ui::StyleType::TotalValue,
            ))
            .set_alignment(CellAlignment::Right),
        ]);
        totals.add_row(vec![
            Cell::new(ui::style_text("Yield", ui::StyleType::TotalLabel)),
            if self.total_investment > 0.0 {
                ui::change_cell((self.yield_rate - 1.0) * 100.0)
            } else {
                Cell::new(ui::style_text("N/A", ui::StyleType::Subtle))
            },
        ]);
        output.push_str("\n\n");
        output.push_str(&totals.to_string());

        output
    }
}

/// Prints the stored ledger for `date` (`YYYYMMDD`), defaulting to today.
pub async fn run(store: &dyn SnapshotStore, date: Option<&str>) -> Result<()> {
    let date = match date {
        Some(d) => d.to_string(),
        None => date_string(midnight_timestamp(chrono::Utc::now()))?,
    };
    let ledger = load_ledger_for(store, &date).await?;
    println!("{}", ledger.display_as_table(None, None));
    Ok(())
}

pub async fn load_ledger_for(store: &dyn SnapshotStore, date: &str) -> Result<LedgerSnapshot> {
    let prices = load_prices(store, date).await?;
    match load_ledger(store, date, &prices).await? {
        Some(ledger) => Ok(ledger),
        None => bail!("No ledger found for {date}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ledger::HoldingRecord;
    use crate::core::snapshot::save_ledger;
    use crate::store::memory::MemoryStore;

    fn ledger() -> LedgerSnapshot {
        LedgerSnapshot {
            date: "20240102".to_string(),
            portfolio_value: 210.0,
            total_investment: 200.0,
            quantities: [
                (
                    "BTC".to_string(),
                    HoldingRecord {
                        quantity: 0.002,
                        active: true,
                        last_price: 55000.0,
                    },
                ),
                (
                    "ETH".to_string(),
                    HoldingRecord {
                        quantity: 0.04,
                        active: false,
                        last_price: 2500.0,
                    },
                ),
            ]
            .into_iter()
            .collect(),
            yield_rate: 1.05,
        }
    }

    #[test]
    fn test_display_from_recorded_prices() {
        console::set_colors_enabled(false);
        let output = ledger().display_as_table(None, None);

        assert!(output.contains("20240102"));
        assert!(output.contains("BTC"));
        assert!(output.contains("inactive"));
        assert!(output.contains("110.00"));
        assert!(output.contains("100.00"));
        assert!(output.contains("+5.00%"));
        assert!(!output.contains("Bought"));
    }

    #[test]
    fn test_display_with_todays_quotes() {
        console::set_colors_enabled(false);
        let prices: PriceBook = [("BTC".to_string(), Quote::Stale(50000.0))]
            .into_iter()
            .collect();
        let purchases = Purchases::from([("BTC".to_string(), 0.001)]);

        let output = ledger().display_as_table(Some(&prices), Some(&purchases));
        assert!(output.contains("50000.00 (stale)"));
        assert!(output.contains("Bought"));
        assert!(output.contains("0.00100000"));
    }

    #[tokio::test]
    async fn test_load_ledger_for_missing_date() {
        let store = MemoryStore::new();
        let result = load_ledger_for(&store, "20240102").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "No ledger found for 20240102"
        );

        save_ledger(&store, &ledger()).await.unwrap();
        assert_eq!(load_ledger_for(&store, "20240102").await.unwrap(), ledger());
    }
}
