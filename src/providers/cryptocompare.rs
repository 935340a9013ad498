use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::core::price::PriceProvider;

pub const QUOTE_CURRENCY: &str = "USD";

/// Minute bars from the CryptoCompare `histominute` endpoint.
pub struct CryptoCompareProvider {
    base_url: String,
    client: reqwest::Client,
}

impl CryptoCompareProvider {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent("coindca/0.1").build()?;
        Ok(CryptoCompareProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[derive(Deserialize, Debug)]
struct HistoMinuteResponse {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Message", default)]
    message: String,
    #[serde(rename = "Data")]
    data: Option<HistoMinuteData>,
}

#[derive(Deserialize, Debug)]
struct HistoMinuteData {
    #[serde(rename = "Data", default)]
    bars: Vec<MinuteBar>,
}

#[derive(Deserialize, Debug)]
struct MinuteBar {
    time: i64,
    close: f64,
}

/// Latest bar at or before `to_ts`, or the last bar when none qualifies.
fn closest_close(bars: &[MinuteBar], to_ts: i64) -> Option<f64> {
    bars.iter()
        .filter(|bar| bar.time <= to_ts)
        .max_by_key(|bar| bar.time)
        .or_else(|| bars.last())
        .map(|bar| bar.close)
}

#[async_trait]
impl PriceProvider for CryptoCompareProvider {
    #[instrument(
        name = "CryptoComparePriceFetch",
        skip(self),
        fields(symbol = %symbol)
    )]
    async fn fetch_close(&self, symbol: &str, to_ts: i64) -> Result<f64> {
        let url = format!("{}/data/v2/histominute", self.base_url);
        debug!("Requesting price data from {} for {}", url, symbol);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("fsym", symbol.to_string()),
                ("tsym", QUOTE_CURRENCY.to_string()),
                ("limit", "1".to_string()),
                ("toTs", to_ts.to_string()),
            ])
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for symbol: {}", e, symbol))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for symbol: {}",
                response.status(),
                symbol
            ));
        }

        let text = response.text().await?;
        let data: HistoMinuteResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", symbol, e))?;

        if data.response != "Success" {
            return Err(anyhow!("{}", data.message));
        }

        let bars = data.data.map(|d| d.bars).unwrap_or_default();
        let close = closest_close(&bars, to_ts)
            .ok_or_else(|| anyhow!("No price data found for symbol: {}", symbol))?;
        if !(close.is_finite() && close > 0.0) {
            return Err(anyhow!("Invalid close {} for symbol: {}", close, symbol));
        }
        Ok(close)
    }
}
