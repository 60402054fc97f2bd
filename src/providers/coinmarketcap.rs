use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

use super::util::{build_client, fetch_json};
use crate::core::error::SourceError;
use crate::core::rates::{Quotes, RateKind};
use crate::core::source::PriceSource;

const API_KEY_HEADER: &str = "X-CMC_PRO_API_KEY";

/// CoinMarketCap latest quotes, only available with an API key.
pub struct CoinMarketCapSource {
    base_url: String,
    api_key: String,
    symbols: Vec<String>,
    client: reqwest::Client,
}

impl CoinMarketCapSource {
    pub const ID: &'static str = "coinmarketcap";

    pub fn new(
        base_url: &str,
        api_key: &str,
        symbols: &[String],
        timeout: Duration,
    ) -> Result<Self> {
        Ok(CoinMarketCapSource {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            symbols: symbols.to_vec(),
            client: build_client(timeout)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct QuotesResponse {
    data: HashMap<String, CoinEntry>,
}

#[derive(Debug, Deserialize)]
struct CoinEntry {
    quote: CoinQuote,
}

#[derive(Debug, Deserialize)]
struct CoinQuote {
    #[serde(rename = "USD")]
    usd: Option<UsdQuote>,
}

#[derive(Debug, Deserialize)]
struct UsdQuote {
    price: Option<f64>,
}

#[async_trait]
impl PriceSource for CoinMarketCapSource {
    fn id(&self) -> &str {
        Self::ID
    }

    fn kind(&self) -> RateKind {
        RateKind::Crypto
    }

    #[instrument(name = "CoinMarketCapFetch", skip(self), fields(symbols = self.symbols.len()))]
    async fn fetch(&self) -> Result<Quotes, SourceError> {
        let url = format!(
            "{}/v1/cryptocurrency/quotes/latest?symbol={}&convert=USD",
            self.base_url,
            self.symbols.join(",")
        );
        debug!("Requesting crypto quotes from {}", url);

        let request = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json");
        let data: QuotesResponse = fetch_json(request, &url).await?;

        let prices: HashMap<String, f64> = data
            .data
            .into_iter()
            .filter(|(symbol, _)| self.symbols.contains(symbol))
            .map(|(symbol, entry)| {
                let price = entry.quote.usd.and_then(|q| q.price).unwrap_or(f64::NAN);
                (symbol, price)
            })
            .collect();
        Ok(Quotes::UsdPrices(prices))
    }
}
