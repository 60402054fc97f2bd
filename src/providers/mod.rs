pub mod coingecko;
pub mod coinmarketcap;
pub mod exchange_rate;
pub mod util;

use crate::core::config::AppConfig;
use crate::core::pipeline::{Resolver, RetryPolicy};
use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

use coingecko::CoinGeckoSource;
use coinmarketcap::CoinMarketCapSource;
use exchange_rate::{ExchangeRateSource, KeyedExchangeRateSource};

/// Builds the resolver with every source the config enables, in priority
/// order: open exchangerate-api, then the keyed one; CoinGecko, then
/// CoinMarketCap. Keyed sources are skipped without a key.
pub fn build_resolver(config: &AppConfig) -> Result<Resolver> {
    let timeout = config.request_timeout();
    let providers = &config.providers;
    let crypto_symbols: Vec<String> = config
        .crypto
        .coins
        .iter()
        .map(|c| c.symbol.clone())
        .collect();

    let mut resolver = Resolver::new(&config.base_currency, &config.fiat.symbols, &crypto_symbols)
        .with_retry(RetryPolicy {
            retries: config.retries,
            delay: config.retry_delay(),
        })
        .with_source(Arc::new(ExchangeRateSource::new(
            &providers.exchange_rate.base_url,
            timeout,
        )?));

    if let Some(key) = &providers.exchange_rate_keyed.api_key {
        resolver = resolver.with_source(Arc::new(KeyedExchangeRateSource::new(
            &providers.exchange_rate_keyed.base_url,
            key,
            &config.base_currency,
            timeout,
        )?));
    } else {
        debug!("No fallback fiat API key, keyed source disabled");
    }

    resolver = resolver.with_source(Arc::new(CoinGeckoSource::new(
        &providers.coingecko.base_url,
        &config.crypto.coins,
        timeout,
    )?));

    if let Some(key) = &providers.coinmarketcap.api_key {
        resolver = resolver.with_source(Arc::new(CoinMarketCapSource::new(
            &providers.coinmarketcap.base_url,
            key,
            &crypto_symbols,
            timeout,
        )?));
    } else {
        debug!("No CoinMarketCap API key, source disabled");
    }

    Ok(resolver)
}
