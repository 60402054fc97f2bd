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

/// Open exchangerate-api endpoint, quoting every currency against USD.
pub struct ExchangeRateSource {
    base_url: String,
    client: reqwest::Client,
}

impl ExchangeRateSource {
    pub const ID: &'static str = "exchangerate-api";

    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(ExchangeRateSource {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: build_client(timeout)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    rates: HashMap<String, f64>,
}

#[async_trait]
impl PriceSource for ExchangeRateSource {
    fn id(&self) -> &str {
        Self::ID
    }

    fn kind(&self) -> RateKind {
        RateKind::Fiat
    }

    #[instrument(name = "ExchangeRateFetch", skip(self))]
    async fn fetch(&self) -> Result<Quotes, SourceError> {
        let url = format!("{}/latest/USD", self.base_url);
        debug!("Requesting fiat rates from {}", url);

        let data: LatestResponse = fetch_json(self.client.get(&url), &url).await?;
        debug!(count = data.rates.len(), "Received fiat rates");
        Ok(Quotes::Fiat(data.rates))
    }
}

/// Keyed v6 exchangerate-api endpoint, quoted directly against the base.
pub struct KeyedExchangeRateSource {
    base_url: String,
    api_key: String,
    base_currency: String,
    client: reqwest::Client,
}

impl KeyedExchangeRateSource {
    pub const ID: &'static str = "exchangerate-api-keyed";

    pub fn new(
        base_url: &str,
        api_key: &str,
        base_currency: &str,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(KeyedExchangeRateSource {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            base_currency: base_currency.to_string(),
            client: build_client(timeout)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct KeyedLatestResponse {
    conversion_rates: HashMap<String, f64>,
}

#[async_trait]
impl PriceSource for KeyedExchangeRateSource {
    fn id(&self) -> &str {
        Self::ID
    }

    fn kind(&self) -> RateKind {
        RateKind::Fiat
    }

    #[instrument(
        name = "KeyedExchangeRateFetch",
        skip(self),
        fields(base = %self.base_currency)
    )]
    async fn fetch(&self) -> Result<Quotes, SourceError> {
        let url = format!(
            "{}/{}/latest/{}",
            self.base_url, self.api_key, self.base_currency
        );
        // The key is part of the path, keep it out of the logs
        let redacted = format!("{}/***/latest/{}", self.base_url, self.base_currency);
        debug!("Requesting fiat rates from {}", redacted);

        let data: KeyedLatestResponse = fetch_json(self.client.get(&url), &redacted).await?;
        Ok(Quotes::Fiat(data.conversion_rates))
    }
}
