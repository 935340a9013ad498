use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{fs, path::PathBuf};
use tracing::{debug, warn};

pub const DEFAULT_DAILY_INVESTMENT: f64 = 100.0;
pub const DEFAULT_CRYPTOCOMPARE_URL: &str = "https://min-api.cryptocompare.com";

/// Coin symbol mapped to the percentage of each day's investment it receives.
///
/// The keys double as the coin universe: a coin is active exactly when it
/// appears here.
pub type CoinAllocation = BTreeMap<String, f64>;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CryptoCompareProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub cryptocompare: Option<CryptoCompareProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            cryptocompare: Some(CryptoCompareProviderConfig {
                base_url: DEFAULT_CRYPTOCOMPARE_URL.to_string(),
            }),
        }
    }
}

fn default_daily_investment() -> f64 {
    DEFAULT_DAILY_INVESTMENT
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub coins: CoinAllocation,
    #[serde(default = "default_daily_investment")]
    pub daily_investment: f64,
    #[serde(default)]
    pub providers: ProvidersConfig,
    pub data_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "coindca", "coindca")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    /// Directory holding the dated price and yield snapshots.
    pub fn snapshot_dir(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("io", "coindca", "coindca")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn cryptocompare_url(&self) -> &str {
        self.providers
            .cryptocompare
            .as_ref()
            .map_or(DEFAULT_CRYPTOCOMPARE_URL, |p| &p.base_url)
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config.validate()?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Rejects allocations that cannot produce a purchase plan. Weights that do
    /// not add up to 100 are only reported.
    pub fn validate(&self) -> Result<()> {
        if self.coins.is_empty() {
            bail!("No coins configured");
        }
        if let Some((coin, pct)) = self.coins.iter().find(|(_, pct)| !pct.is_finite() || **pct < 0.0) {
            bail!("Invalid allocation percentage for {coin}: {pct}");
        }
        if !self.daily_investment.is_finite() || self.daily_investment < 0.0 {
            bail!("Invalid daily investment: {}", self.daily_investment);
        }

        let total: f64 = self.coins.values().sum();
        if (total - 100.0).abs() > 1e-6 {
            warn!(total, "Allocation percentages do not sum to 100");
        }
        Ok(())
    }
}
