use crate::core::rates::is_valid_code;
use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const ENV_BASE_CURRENCY: &str = "FXDASH_BASE_CURRENCY";
pub const ENV_FIAT_URL: &str = "FXDASH_FIAT_URL";
pub const ENV_FALLBACK_URL: &str = "FXDASH_FALLBACK_URL";
pub const ENV_FALLBACK_API_KEY: &str = "FXDASH_FALLBACK_API_KEY";
pub const ENV_CRYPTO_URL: &str = "FXDASH_CRYPTO_URL";
pub const ENV_CMC_URL: &str = "FXDASH_CMC_URL";
pub const ENV_CMC_API_KEY: &str = "FXDASH_CMC_API_KEY";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CoinConfig {
    /// Ticker shown to users and used as the rate map key, e.g. `BTC`.
    pub symbol: String,
    /// CoinGecko coin id, e.g. `bitcoin`.
    pub id: String,
}

impl CoinConfig {
    fn new(symbol: &str, id: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            id: id.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct FiatConfig {
    pub symbols: Vec<String>,
    pub refresh_secs: u64,
}

impl Default for FiatConfig {
    fn default() -> Self {
        FiatConfig {
            symbols: ["USD", "GBP", "CNY", "AED", "GHS", "CAD", "ZAR"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            refresh_secs: 60,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct CryptoConfig {
    pub coins: Vec<CoinConfig>,
    pub refresh_secs: u64,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        CryptoConfig {
            coins: vec![
                CoinConfig::new("BTC", "bitcoin"),
                CoinConfig::new("ETH", "ethereum"),
                CoinConfig::new("BNB", "binancecoin"),
                CoinConfig::new("USDC", "usd-coin"),
                CoinConfig::new("XRP", "ripple"),
                CoinConfig::new("ADA", "cardano"),
                CoinConfig::new("USDT", "tether"),
                CoinConfig::new("SOL", "solana"),
            ],
            refresh_secs: 60,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct KeyedProviderConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ProvidersConfig {
    pub exchange_rate: ProviderConfig,
    pub exchange_rate_keyed: KeyedProviderConfig,
    pub coingecko: ProviderConfig,
    pub coinmarketcap: KeyedProviderConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            exchange_rate: ProviderConfig {
                base_url: "https://api.exchangerate-api.com/v4".to_string(),
            },
            exchange_rate_keyed: KeyedProviderConfig {
                base_url: "https://v6.exchangerate-api.com/v6".to_string(),
                api_key: None,
            },
            coingecko: ProviderConfig {
                base_url: "https://api.coingecko.com/api/v3".to_string(),
            },
            coinmarketcap: KeyedProviderConfig {
                base_url: "https://pro-api.coinmarketcap.com".to_string(),
                api_key: None,
            },
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub base_currency: String,
    pub fiat: FiatConfig,
    pub crypto: CryptoConfig,
    pub stale_after_secs: u64,
    pub request_timeout_secs: u64,
    pub retries: usize,
    pub retry_delay_ms: u64,
    pub providers: ProvidersConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            base_currency: "NGN".to_string(),
            fiat: FiatConfig::default(),
            crypto: CryptoConfig::default(),
            stale_after_secs: 120,
            request_timeout_secs: 10,
            retries: 2,
            retry_delay_ms: 500,
            providers: ProvidersConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location. A missing file yields the
    /// defaults; environment overrides apply either way.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        let config = if config_path.exists() {
            Self::parse_file(&config_path)?
        } else {
            debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            Self::default()
        };
        config.with_env_overrides(|key| std::env::var(key).ok())
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "fxdash", "fxdash")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        Self::parse_file(path.as_ref())?.with_env_overrides(|key| std::env::var(key).ok())
    }

    fn parse_file(path: &std::path::Path) -> Result<Self> {
        let config_str = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Applies `FXDASH_*` overrides read through `lookup`, then validates.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(base) = non_empty(ENV_BASE_CURRENCY) {
            self.base_currency = base.trim().to_uppercase();
        }
        if let Some(url) = non_empty(ENV_FIAT_URL) {
            self.providers.exchange_rate.base_url = url;
        }
        if let Some(url) = non_empty(ENV_FALLBACK_URL) {
            self.providers.exchange_rate_keyed.base_url = url;
        }
        if let Some(key) = non_empty(ENV_FALLBACK_API_KEY) {
            self.providers.exchange_rate_keyed.api_key = Some(key);
        }
        if let Some(url) = non_empty(ENV_CRYPTO_URL) {
            self.providers.coingecko.base_url = url;
        }
        if let Some(url) = non_empty(ENV_CMC_URL) {
            self.providers.coinmarketcap.base_url = url;
        }
        if let Some(key) = non_empty(ENV_CMC_API_KEY) {
            self.providers.coinmarketcap.api_key = Some(key);
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if !is_valid_code(&self.base_currency) {
            bail!("Invalid base currency: {}", self.base_currency);
        }
        if let Some(bad) = self.fiat.symbols.iter().find(|s| !is_valid_code(s)) {
            bail!("Invalid fiat symbol: {}", bad);
        }
        if let Some(bad) = self.crypto.coins.iter().find(|c| !is_valid_code(&c.symbol)) {
            bail!("Invalid crypto symbol: {}", bad.symbol);
        }
        if self.fiat.refresh_secs == 0 || self.crypto.refresh_secs == 0 {
            bail!("Refresh intervals must be at least one second");
        }
        if self.request_timeout_secs == 0 {
            bail!("Request timeout must be at least one second");
        }
        Ok(())
    }

    pub fn fiat_refresh(&self) -> Duration {
        Duration::from_secs(self.fiat.refresh_secs)
    }

    pub fn crypto_refresh(&self) -> Duration {
        Duration::from_secs(self.crypto.refresh_secs)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}
