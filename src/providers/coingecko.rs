use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

use super::util::{build_client, fetch_json};
use crate::core::config::CoinConfig;
use crate::core::error::SourceError;
use crate::core::rates::{Quotes, RateKind};
use crate::core::source::PriceSource;

/// CoinGecko simple price endpoint. Coins are requested by id and reported
/// back keyed by symbol.
pub struct CoinGeckoSource {
    base_url: String,
    coins: Vec<CoinConfig>,
    client: reqwest::Client,
}

impl CoinGeckoSource {
    pub const ID: &'static str = "coingecko";

    pub fn new(base_url: &str, coins: &[CoinConfig], timeout: Duration) -> Result<Self> {
        Ok(CoinGeckoSource {
            base_url: base_url.trim_end_matches('/').to_string(),
            coins: coins.to_vec(),
            client: build_client(timeout)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SimplePrice {
    usd: Option<f64>,
}

#[async_trait]
impl PriceSource for CoinGeckoSource {
    fn id(&self) -> &str {
        Self::ID
    }

    fn kind(&self) -> RateKind {
        RateKind::Crypto
    }

    #[instrument(name = "CoinGeckoFetch", skip(self), fields(coins = self.coins.len()))]
    async fn fetch(&self) -> Result<Quotes, SourceError> {
        let ids = self
            .coins
            .iter()
            .map(|c| c.id.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let url = format!(
            "{}/simple/price?ids={}&vs_currencies=usd",
            self.base_url, ids
        );
        debug!("Requesting crypto prices from {}", url);

        let data: HashMap<String, SimplePrice> = fetch_json(self.client.get(&url), &url).await?;

        let prices: HashMap<String, f64> = self
            .coins
            .iter()
            .filter_map(|coin| {
                data.get(&coin.id)
                    .map(|p| (coin.symbol.clone(), p.usd.unwrap_or(f64::NAN)))
            })
            .collect();
        debug!(
            requested = self.coins.len(),
            returned = prices.len(),
            "Received crypto prices"
        );
        Ok(Quotes::UsdPrices(prices))
    }
}
