use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{error, info};

mod test_utils {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub fn success_body(to_ts: i64, close: f64) -> String {
        format!(
            r#"{{
                "Response": "Success",
                "Message": "",
                "Data": {{
                    "TimeFrom": {from},
                    "TimeTo": {to_ts},
                    "Data": [
                        {{"time": {from}, "close": {early}}},
                        {{"time": {to_ts}, "close": {close}}}
                    ]
                }}
            }}"#,
            from = to_ts - 60,
            early = close - 1.0,
        )
    }

    pub fn error_body(symbol: &str) -> String {
        format!(
            r#"{{"Response": "Error", "Message": "There is no data for the symbol {symbol} .", "Data": {{}}}}"#
        )
    }

    pub async fn mount_quote(server: &MockServer, symbol: &str, to_ts: i64, body: String) {
        Mock::given(method("GET"))
            .and(path("/data/v2/histominute"))
            .and(query_param("fsym", symbol))
            .and(query_param("toTs", to_ts.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }
}

fn write_config(path: &Path, coins: &str, base_url: &str, data_path: &Path) {
    let config_content = format!(
        r#"
coins:
{coins}
daily_investment: 100
data_path: "{}"
providers:
  cryptocompare:
    base_url: {base_url}
"#,
        data_path.display()
    );
    fs::write(path, config_content).expect("Failed to write config file");
}

fn read_json(path: &Path) -> Value {
    let text = fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {e}", path.display()));
    serde_json::from_str(&text).expect("Snapshot is not valid JSON")
}

fn assert_close(actual: &Value, expected: f64) {
    let actual = actual.as_f64().expect("Expected a number");
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[test_log::test(tokio::test)]
async fn test_two_day_flow_with_mock() {
    let day1 = coindca::core::snapshot::parse_date("20240101").unwrap();
    let day2 = coindca::core::snapshot::parse_date("20240102").unwrap();

    let mock_server = wiremock::MockServer::start().await;
    test_utils::mount_quote(&mock_server, "BTC", day1, test_utils::success_body(day1, 50000.0)).await;
    test_utils::mount_quote(&mock_server, "ETH", day1, test_utils::success_body(day1, 2500.0)).await;
    test_utils::mount_quote(&mock_server, "BTC", day2, test_utils::success_body(day2, 55000.0)).await;
    test_utils::mount_quote(&mock_server, "SOL", day2, test_utils::success_body(day2, 100.0)).await;

    let data_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let config_path = config_file.path();

    write_config(
        config_path,
        "  BTC: 50\n  ETH: 50",
        &mock_server.uri(),
        data_dir.path(),
    );
    let result =
        coindca::run_command(coindca::AppCommand::RunAt(day1), config_path.to_str()).await;
    assert!(result.is_ok(), "Day one failed with: {:?}", result.err());

    let prices = read_json(&data_dir.path().join("20240101.price.json"));
    assert_eq!(prices, serde_json::json!({"BTC": 50000.0, "ETH": 2500.0}));

    let ledger = read_json(&data_dir.path().join("20240101.yield.json"));
    assert_eq!(ledger["date"], "20240101");
    assert_close(&ledger["quantities"]["BTC"]["quantity"], 0.001);
    assert_close(&ledger["quantities"]["ETH"]["quantity"], 0.02);
    assert_close(&ledger["total_investment"], 100.0);
    assert_close(&ledger["portfolio_value"], 100.0);
    assert_close(&ledger["yield_rate"], 1.0);

    // ETH is swapped out for SOL
    write_config(
        config_path,
        "  BTC: 50\n  SOL: 50",
        &mock_server.uri(),
        data_dir.path(),
    );
    let result =
        coindca::run_command(coindca::AppCommand::RunAt(day2), config_path.to_str()).await;
    assert!(result.is_ok(), "Day two failed with: {:?}", result.err());

    let ledger = read_json(&data_dir.path().join("20240102.yield.json"));
    let eth = &ledger["quantities"]["ETH"];
    assert_eq!(eth["active"], false);
    assert_close(&eth["quantity"], 0.02);
    assert_close(&eth["last_price"], 2500.0);

    let sol = &ledger["quantities"]["SOL"];
    assert_eq!(sol["active"], true);
    assert_close(&sol["quantity"], 0.5);

    let btc_quantity = 0.001 + 50.0 / 55000.0;
    assert_close(&ledger["quantities"]["BTC"]["quantity"], btc_quantity);
    assert_close(&ledger["total_investment"], 200.0);
    assert_close(
        &ledger["portfolio_value"],
        btc_quantity * 55000.0 + 0.5 * 100.0 + 0.02 * 2500.0,
    );

    let result = coindca::run_command(
        coindca::AppCommand::Summary {
            date: Some("20240102".to_string()),
        },
        config_path.to_str(),
    )
    .await;
    assert!(result.is_ok(), "Summary failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_failed_quote_falls_back_to_previous_day() {
    let day1 = coindca::core::snapshot::parse_date("20240301").unwrap();
    let day2 = coindca::core::snapshot::parse_date("20240302").unwrap();

    let mock_server = wiremock::MockServer::start().await;
    test_utils::mount_quote(&mock_server, "BTC", day1, test_utils::success_body(day1, 60000.0)).await;
    test_utils::mount_quote(&mock_server, "BTC", day2, test_utils::error_body("BTC")).await;
    test_utils::mount_quote(&mock_server, "DOGE", day2, test_utils::error_body("DOGE")).await;

    let data_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let config_path = config_file.path();

    write_config(config_path, "  BTC: 100", &mock_server.uri(), data_dir.path());
    coindca::run_command(coindca::AppCommand::RunAt(day1), config_path.to_str())
        .await
        .expect("Day one failed");

    write_config(
        config_path,
        "  BTC: 50\n  DOGE: 50",
        &mock_server.uri(),
        data_dir.path(),
    );
    coindca::run_command(coindca::AppCommand::RunAt(day2), config_path.to_str())
        .await
        .expect("Day two failed");

    // BTC reuses yesterday's price, DOGE has none and is left out
    let prices = read_json(&data_dir.path().join("20240302.price.json"));
    assert_eq!(prices, serde_json::json!({"BTC": 60000.0}));

    let ledger = read_json(&data_dir.path().join("20240302.yield.json"));
    assert_close(
        &ledger["quantities"]["BTC"]["quantity"],
        100.0 / 60000.0 + 50.0 / 60000.0,
    );
    assert_close(&ledger["quantities"]["DOGE"]["quantity"], 0.0);
    assert_close(&ledger["quantities"]["DOGE"]["last_price"], 0.0);
    assert_close(&ledger["portfolio_value"], 150.0);
    assert_close(&ledger["yield_rate"], 0.75);
}

#[test_log::test(tokio::test)]
async fn test_summary_for_missing_day_fails() {
    let data_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    write_config(
        config_file.path(),
        "  BTC: 100",
        "http://127.0.0.1:9",
        data_dir.path(),
    );

    let result = coindca::run_command(
        coindca::AppCommand::Summary {
            date: Some("19990101".to_string()),
        },
        config_file.path().to_str(),
    )
    .await;
    assert_eq!(
        result.unwrap_err().to_string(),
        "No ledger found for 19990101"
    );
}

#[test_log::test(tokio::test)]
#[ignore = "hits the live CryptoCompare API"]
async fn test_real_cryptocompare_api() {
    use coindca::core::PriceProvider;
    use coindca::providers::CryptoCompareProvider;

    let provider = CryptoCompareProvider::new("https://min-api.cryptocompare.com").unwrap();
    let midnight = coindca::core::snapshot::midnight_timestamp(chrono::Utc::now());

    let symbol = "BTC";
    info!(?symbol, midnight, "Fetching close from CryptoCompare");

    match provider.fetch_close(symbol, midnight).await {
        Ok(close) => {
            info!(?close, "Received successful price response");
            assert!(close > 0.0, "Price should be positive");
        }
        Err(e) => {
            error!("API request failed: {e}\n{e:?}");
            panic!("API request failed: {e}");
        }
    }
}
