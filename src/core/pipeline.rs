//! Resolves a rate kind by walking its sources in priority order.
//!
//! Fiat quotes are re-based so that `map[C] = quote[C] / quote[base]`, i.e.
//! how many units of `C` one unit of base buys. Crypto prices are scaled into
//! base units, `map[K] = usd_price[K] * usd_to_base`, i.e. how many units of
//! base one coin costs. Callers divide by fiat rates and multiply by crypto
//! rates.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::core::error::{ResolveError, SourceError, SourceFailure};
use crate::core::fallback::fallback_usd_price;
use crate::core::rates::{Quotes, RateKind, RateMap};
use crate::core::source::PriceSource;
use crate::providers::util::with_retry;

const USD: &str = "USD";

/// A successful resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub rates: RateMap,
    pub source: String,
    pub fetched_at: DateTime<Utc>,
    /// Symbols whose value came from the static fallback table.
    pub filled: Vec<String>,
}

pub type ResolutionResult = Result<Resolved, ResolveError>;

/// Normalized fiat quotes plus the USD to base factor when derivable.
#[derive(Debug, Clone, PartialEq)]
pub struct FiatRates {
    pub rates: RateMap,
    pub usd_to_base: Option<f64>,
}

/// Re-bases raw fiat quotes onto `base`, keeping only `allow` (plus base and
/// USD). An empty allow-list keeps everything.
pub fn normalize_fiat(
    quotes: &HashMap<String, f64>,
    base: &str,
    allow: &[String],
) -> Result<FiatRates, SourceError> {
    let base_rate = quotes
        .get(base)
        .copied()
        .ok_or_else(|| SourceError::MalformedResponse(format!("No rate for base {base}")))?;
    if !base_rate.is_finite() || base_rate <= 0.0 {
        return Err(SourceError::MalformedResponse(format!(
            "Invalid rate {base_rate} for base {base}"
        )));
    }

    let keep = |code: &str| {
        allow.is_empty() || code == base || code == USD || allow.iter().any(|a| a == code)
    };
    let entries = quotes
        .iter()
        .filter(|(code, _)| keep(code))
        .map(|(code, rate)| (code.clone(), rate / base_rate));
    let (rates, rejected) = RateMap::from_entries(base, entries);
    if !rejected.is_empty() {
        warn!(?rejected, "Dropped invalid fiat rates");
    }

    let missing: Vec<&String> = allow.iter().filter(|c| !rates.contains(c)).collect();
    if !missing.is_empty() {
        debug!(?missing, "Fiat source did not cover all symbols");
    }

    let usd_to_base = quotes
        .get(USD)
        .filter(|r| r.is_finite() && **r > 0.0)
        .map(|usd_rate| base_rate / usd_rate);

    Ok(FiatRates { rates, usd_to_base })
}

/// Fails with `PartialCoverage` when none of `symbols` has a usable price.
pub fn check_coverage(prices: &HashMap<String, f64>, symbols: &[String]) -> Result<(), SourceError> {
    let priced = |s: &String| prices.get(s).is_some_and(|p| p.is_finite() && *p > 0.0);
    if !symbols.is_empty() && !symbols.iter().any(priced) {
        return Err(SourceError::PartialCoverage {
            missing: symbols.to_vec(),
        });
    }
    Ok(())
}

/// Converts USD coin prices into base units. Symbols the source did not
/// return are filled from the static fallback table; symbols it did return
/// are never replaced, and are dropped when their price is unusable (`NaN`,
/// zero or negative). Returns the map and the filled symbols.
pub fn normalize_crypto(
    prices: &HashMap<String, f64>,
    usd_to_base: f64,
    base: &str,
    symbols: &[String],
) -> (RateMap, Vec<String>) {
    let mut filled = Vec::new();
    let mut entries = Vec::with_capacity(symbols.len());

    for symbol in symbols {
        match prices.get(symbol) {
            Some(usd) => entries.push((symbol.clone(), usd * usd_to_base)),
            None => match fallback_usd_price(symbol) {
                Some(usd) => {
                    filled.push(symbol.clone());
                    entries.push((symbol.clone(), usd * usd_to_base));
                }
                None => warn!(%symbol, "No price and no fallback constant"),
            },
        }
    }

    let (rates, rejected) = RateMap::from_entries(base, entries);
    if !rejected.is_empty() {
        warn!(?rejected, "Dropped invalid crypto prices");
    }
    if !filled.is_empty() {
        info!(?filled, "Filled missing crypto prices from fallback constants");
    }
    (rates, filled)
}

/// Retry behaviour applied to each source before falling back to the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub retries: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            retries: 0,
            delay: Duration::from_millis(500),
        }
    }
}

/// Ordered source lists per kind plus the normalization settings.
pub struct Resolver {
    base: String,
    fiat_symbols: Vec<String>,
    crypto_symbols: Vec<String>,
    fiat_sources: Vec<Arc<dyn PriceSource>>,
    crypto_sources: Vec<Arc<dyn PriceSource>>,
    retry: RetryPolicy,
}

impl Resolver {
    pub fn new(base: &str, fiat_symbols: &[String], crypto_symbols: &[String]) -> Self {
        Resolver {
            base: base.to_string(),
            fiat_symbols: fiat_symbols.to_vec(),
            crypto_symbols: crypto_symbols.to_vec(),
            fiat_sources: Vec::new(),
            crypto_sources: Vec::new(),
            retry: RetryPolicy::default(),
        }
    }

    /// Appends a source at the lowest priority for its kind.
    pub fn with_source(mut self, source: Arc<dyn PriceSource>) -> Self {
        match source.kind() {
            RateKind::Fiat => self.fiat_sources.push(source),
            RateKind::Crypto => self.crypto_sources.push(source),
        }
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn source_ids(&self, kind: RateKind) -> Vec<&str> {
        self.sources(kind).iter().map(|s| s.id()).collect()
    }

    fn sources(&self, kind: RateKind) -> &[Arc<dyn PriceSource>] {
        match kind {
            RateKind::Fiat => &self.fiat_sources,
            RateKind::Crypto => &self.crypto_sources,
        }
    }

    #[instrument(name = "Resolve", skip(self), fields(base = %self.base))]
    pub async fn resolve(&self, kind: RateKind) -> ResolutionResult {
        let result = match kind {
            RateKind::Fiat => self.resolve_fiat().await,
            RateKind::Crypto => self.resolve_crypto().await,
        };
        match &result {
            Ok(resolved) => info!(
                source = %resolved.source,
                entries = resolved.rates.len(),
                "Resolved rates"
            ),
            Err(e) => warn!(error = %e, "Resolution failed"),
        }
        result
    }

    async fn resolve_fiat(&self) -> ResolutionResult {
        let (fiat, source) = self
            .first_success(RateKind::Fiat, |quotes| self.accept_fiat(quotes))
            .await?;
        Ok(Resolved {
            rates: fiat.rates,
            source,
            fetched_at: Utc::now(),
            filled: Vec::new(),
        })
    }

    async fn resolve_crypto(&self) -> ResolutionResult {
        let (prices, source) = self
            .first_success(RateKind::Crypto, |quotes| match quotes {
                Quotes::UsdPrices(prices) => {
                    check_coverage(&prices, &self.crypto_symbols)?;
                    Ok(prices)
                }
                Quotes::Fiat(_) => Err(unexpected_shape()),
            })
            .await?;

        // The USD rate is resolved afresh on every crypto refresh
        let usd_to_base = match self.usd_to_base().await {
            Ok(usd_to_base) => usd_to_base,
            Err(ResolveError::AllSourcesExhausted { causes, .. }) => {
                return Err(ResolveError::AllSourcesExhausted {
                    kind: RateKind::Crypto,
                    causes,
                });
            }
        };
        debug!(usd_to_base, "Converting crypto prices");

        let (rates, filled) =
            normalize_crypto(&prices, usd_to_base, &self.base, &self.crypto_symbols);
        Ok(Resolved {
            rates,
            source,
            fetched_at: Utc::now(),
            filled,
        })
    }

    fn accept_fiat(&self, quotes: Quotes) -> Result<FiatRates, SourceError> {
        match quotes {
            Quotes::Fiat(raw) => normalize_fiat(&raw, &self.base, &self.fiat_symbols),
            Quotes::UsdPrices(_) => Err(unexpected_shape()),
        }
    }

    /// Base units per USD, from the first fiat source that quotes USD.
    async fn usd_to_base(&self) -> Result<f64, ResolveError> {
        let (usd_to_base, _) = self
            .first_success(RateKind::Fiat, |quotes| {
                self.accept_fiat(quotes)?.usd_to_base.ok_or_else(|| {
                    SourceError::MalformedResponse(format!(
                        "No {USD} rate to convert crypto prices"
                    ))
                })
            })
            .await?;
        Ok(usd_to_base)
    }

    /// Walks the sources of `kind` in order and returns the first output
    /// `accept` agrees with. A source whose output is rejected counts as
    /// failed, so nothing from it leaks into the result.
    async fn first_success<T, F>(
        &self,
        kind: RateKind,
        mut accept: F,
    ) -> Result<(T, String), ResolveError>
    where
        F: FnMut(Quotes) -> Result<T, SourceError>,
    {
        let mut causes = Vec::new();

        for source in self.sources(kind) {
            let outcome = with_retry(|| source.fetch(), self.retry.retries, self.retry.delay)
                .await
                .and_then(&mut accept);

            match outcome {
                Ok(value) => {
                    if !causes.is_empty() {
                        info!(source = source.id(), failed = causes.len(), "Used fallback source");
                    }
                    return Ok((value, source.id().to_string()));
                }
                Err(error) => {
                    warn!(source = source.id(), %error, "Source failed");
                    causes.push(SourceFailure {
                        source: source.id().to_string(),
                        error,
                    });
                }
            }
        }

        Err(ResolveError::AllSourcesExhausted { kind, causes })
    }
}

fn unexpected_shape() -> SourceError {
    SourceError::MalformedResponse("Quotes do not match the source kind".to_string())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Source returning a fixed outcome, optionally changeable between calls.
    pub(crate) struct MockSource {
        id: String,
        kind: RateKind,
        outcome: Mutex<Result<Quotes, SourceError>>,
        pub(crate) calls: AtomicUsize,
    }

    impl MockSource {
        pub(crate) fn new(id: &str, kind: RateKind, outcome: Result<Quotes, SourceError>) -> Self {
            Self {
                id: id.to_string(),
                kind,
                outcome: Mutex::new(outcome),
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn fiat(id: &str, rates: &[(&str, f64)]) -> Self {
            Self::new(id, RateKind::Fiat, Ok(Quotes::Fiat(to_map(rates))))
        }

        pub(crate) fn crypto(id: &str, prices: &[(&str, f64)]) -> Self {
            Self::new(id, RateKind::Crypto, Ok(Quotes::UsdPrices(to_map(prices))))
        }

        pub(crate) fn failing(id: &str, kind: RateKind, error: SourceError) -> Self {
            Self::new(id, kind, Err(error))
        }

        pub(crate) fn set_outcome(&self, outcome: Result<Quotes, SourceError>) {
            *self.outcome.lock().unwrap() = outcome;
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PriceSource for MockSource {
        fn id(&self) -> &str {
            &self.id
        }

        fn kind(&self) -> RateKind {
            self.kind
        }

        async fn fetch(&self) -> Result<Quotes, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.lock().unwrap().clone()
        }
    }

    pub(crate) fn to_map(entries: &[(&str, f64)]) -> HashMap<String, f64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    pub(crate) fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn resolver() -> Resolver {
        Resolver::new(
            "NGN",
            &strings(&["USD", "GBP"]),
            &strings(&["BTC", "ETH"]),
        )
    }

    fn network_error() -> SourceError {
        SourceError::NetworkError("HTTP error: 500".into())
    }

    #[test]
    fn test_fiat_normalization_scenario() {
        let quotes = to_map(&[("USD", 1.0), ("NGN", 1500.0), ("GBP", 0.8)]);
        let fiat = normalize_fiat(&quotes, "NGN", &strings(&["USD", "GBP"])).unwrap();

        assert_eq!(fiat.rates.get("NGN"), Some(1.0));
        assert_eq!(fiat.rates.get("USD"), Some(1.0 / 1500.0));
        assert_eq!(fiat.rates.get("GBP"), Some(0.8 / 1500.0));
        assert_eq!(fiat.rates.len(), 3);
        assert_eq!(fiat.usd_to_base, Some(1500.0));
    }

    #[test]
    fn test_fiat_normalization_filters_to_allow_list() {
        let quotes = to_map(&[("USD", 1.0), ("NGN", 1500.0), ("EUR", 0.9), ("GBP", 0.8)]);
        let fiat = normalize_fiat(&quotes, "NGN", &strings(&["GBP"])).unwrap();
        assert!(!fiat.rates.contains("EUR"));
        // USD is always kept for crypto conversion
        assert!(fiat.rates.contains("USD"));

        let everything = normalize_fiat(&quotes, "NGN", &[]).unwrap();
        assert_eq!(everything.rates.len(), 4);
    }

    #[test]
    fn test_fiat_normalization_requires_base() {
        let quotes = to_map(&[("USD", 1.0), ("GBP", 0.8)]);
        let err = normalize_fiat(&quotes, "NGN", &[]).unwrap_err();
        assert_eq!(
            err,
            SourceError::MalformedResponse("No rate for base NGN".into())
        );

        let zero_base = to_map(&[("USD", 1.0), ("NGN", 0.0)]);
        assert!(normalize_fiat(&zero_base, "NGN", &[]).is_err());
    }

    #[test]
    fn test_fiat_normalization_of_base_relative_quotes() {
        let quotes = to_map(&[("NGN", 1.0), ("USD", 0.0008), ("GBP", 0.0005)]);
        let fiat = normalize_fiat(&quotes, "NGN", &[]).unwrap();
        assert_eq!(fiat.rates.get("USD"), Some(0.0008));
        assert_eq!(fiat.rates.get("NGN"), Some(1.0));
        assert_eq!(fiat.usd_to_base, Some(1.0 / 0.0008));
    }

    #[test]
    fn test_crypto_normalization_scenario() {
        let prices = to_map(&[("BTC", 45000.0)]);
        let (rates, filled) = normalize_crypto(&prices, 1500.0, "NGN", &strings(&["BTC"]));
        assert_eq!(rates.get("BTC"), Some(67_500_000.0));
        assert_eq!(rates.get("NGN"), Some(1.0));
        assert!(filled.is_empty());
    }

    #[test]
    fn test_crypto_normalization_fills_only_missing_symbols() {
        let prices = to_map(&[("BTC", 50000.0), ("ETH", -3.0), ("SOL", f64::NAN)]);
        let (rates, filled) = normalize_crypto(
            &prices,
            2.0,
            "NGN",
            &strings(&["BTC", "ETH", "SOL", "USDT", "NOPE"]),
        );
        assert_eq!(rates.get("BTC"), Some(100_000.0));
        // Returned by the source but invalid, so not replaced with a constant
        assert!(!rates.contains("ETH"));
        assert!(!rates.contains("SOL"));
        assert_eq!(rates.get("USDT"), Some(2.0));
        assert!(!rates.contains("NOPE"));
        assert_eq!(filled, strings(&["USDT"]));
    }

    #[test]
    fn test_coverage_check() {
        let symbols = strings(&["BTC", "ETH"]);
        assert!(check_coverage(&to_map(&[("ETH", 1.0)]), &symbols).is_ok());
        assert_eq!(
            check_coverage(&to_map(&[("DOGE", 1.0)]), &symbols).unwrap_err(),
            SourceError::PartialCoverage { missing: symbols.clone() }
        );
        assert!(check_coverage(&HashMap::new(), &[]).is_ok());
        // Listed without a usable price does not count as covered
        assert!(check_coverage(&to_map(&[("BTC", f64::NAN), ("ETH", 0.0)]), &symbols).is_err());
    }

    #[tokio::test]
    async fn test_resolve_fiat_from_primary() {
        let primary = Arc::new(MockSource::fiat(
            "primary",
            &[("USD", 1.0), ("NGN", 1500.0), ("GBP", 0.8)],
        ));
        let fallback = Arc::new(MockSource::fiat("fallback", &[("NGN", 1.0)]));
        let resolver = resolver()
            .with_source(primary.clone())
            .with_source(fallback.clone());

        let resolved = resolver.resolve(RateKind::Fiat).await.unwrap();
        assert_eq!(resolved.source, "primary");
        assert_eq!(resolved.rates.get("NGN"), Some(1.0));
        assert_eq!(resolved.rates.get("GBP"), Some(0.8 / 1500.0));
        assert_eq!(primary.call_count(), 1);
        assert_eq!(fallback.call_count(), 0);
    }

    #[tokio::test]
    async fn test_fallback_result_equals_fallback_alone() {
        let fallback_rates = [("NGN", 1.0), ("USD", 0.0007), ("GBP", 0.0005)];

        let chained = resolver()
            .with_source(Arc::new(MockSource::failing(
                "primary",
                RateKind::Fiat,
                network_error(),
            )))
            .with_source(Arc::new(MockSource::fiat("fallback", &fallback_rates)));
        let alone = resolver().with_source(Arc::new(MockSource::fiat("fallback", &fallback_rates)));

        let from_chain = chained.resolve(RateKind::Fiat).await.unwrap();
        let from_alone = alone.resolve(RateKind::Fiat).await.unwrap();
        assert_eq!(from_chain.source, "fallback");
        assert_eq!(from_chain.rates, from_alone.rates);
    }

    #[tokio::test]
    async fn test_primary_without_base_is_not_merged() {
        // Primary answers but cannot be normalized: its GBP must not leak
        let primary = MockSource::fiat("primary", &[("USD", 1.0), ("GBP", 0.8)]);
        let fallback = MockSource::fiat("fallback", &[("NGN", 1.0), ("USD", 0.0007)]);
        let resolver = resolver()
            .with_source(Arc::new(primary))
            .with_source(Arc::new(fallback));

        let resolved = resolver.resolve(RateKind::Fiat).await.unwrap();
        assert_eq!(resolved.source, "fallback");
        assert!(!resolved.rates.contains("GBP"));
    }

    #[tokio::test]
    async fn test_all_sources_fail() {
        let resolver = resolver()
            .with_source(Arc::new(MockSource::failing(
                "primary",
                RateKind::Fiat,
                network_error(),
            )))
            .with_source(Arc::new(MockSource::failing(
                "fallback",
                RateKind::Fiat,
                SourceError::NetworkTimeout("slow".into()),
            )));

        let err = resolver.resolve(RateKind::Fiat).await.unwrap_err();
        let ResolveError::AllSourcesExhausted { kind, causes } = err;
        assert_eq!(kind, RateKind::Fiat);
        assert_eq!(
            causes,
            vec![
                SourceFailure {
                    source: "primary".into(),
                    error: network_error(),
                },
                SourceFailure {
                    source: "fallback".into(),
                    error: SourceError::NetworkTimeout("slow".into()),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_no_sources_configured() {
        let err = resolver().resolve(RateKind::Crypto).await.unwrap_err();
        assert!(err.causes().is_empty());
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried_before_fallback() {
        let primary = Arc::new(MockSource::failing("primary", RateKind::Fiat, network_error()));
        let broken = Arc::new(MockSource::failing(
            "broken",
            RateKind::Fiat,
            SourceError::MalformedResponse("bad".into()),
        ));
        let resolver = resolver()
            .with_source(primary.clone())
            .with_source(broken.clone())
            .with_retry(RetryPolicy {
                retries: 2,
                delay: Duration::from_millis(1),
            });

        assert!(resolver.resolve(RateKind::Fiat).await.is_err());
        assert_eq!(primary.call_count(), 3);
        assert_eq!(broken.call_count(), 1);
    }

    #[tokio::test]
    async fn test_resolve_is_idempotent_for_stable_upstream() {
        let resolver = resolver().with_source(Arc::new(MockSource::fiat(
            "primary",
            &[("USD", 1.0), ("NGN", 1530.25), ("GBP", 0.79)],
        )));

        let first = resolver.resolve(RateKind::Fiat).await.unwrap();
        let second = resolver.resolve(RateKind::Fiat).await.unwrap();
        assert_eq!(first.rates, second.rates);
    }

    #[tokio::test]
    async fn test_resolve_crypto_scenario() {
        let resolver = Resolver::new("NGN", &strings(&["USD"]), &strings(&["BTC"]))
            .with_source(Arc::new(MockSource::fiat(
                "fiat",
                &[("USD", 1.0), ("NGN", 1500.0)],
            )))
            .with_source(Arc::new(MockSource::crypto("coins", &[("BTC", 45000.0)])));

        let resolved = resolver.resolve(RateKind::Crypto).await.unwrap();
        assert_eq!(resolved.source, "coins");
        assert_eq!(resolved.rates.get("BTC"), Some(67_500_000.0));
        assert!(resolved.filled.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_crypto_fills_partial_coverage() {
        let resolver = resolver()
            .with_source(Arc::new(MockSource::fiat(
                "fiat",
                &[("USD", 1.0), ("NGN", 1500.0)],
            )))
            .with_source(Arc::new(MockSource::crypto("coins", &[("BTC", 45000.0)])));

        let resolved = resolver.resolve(RateKind::Crypto).await.unwrap();
        assert_eq!(resolved.filled, strings(&["ETH"]));
        assert_eq!(
            resolved.rates.get("ETH"),
            Some(fallback_usd_price("ETH").unwrap() * 1500.0)
        );
        assert_eq!(resolved.rates.get("BTC"), Some(67_500_000.0));
    }

    #[tokio::test]
    async fn test_resolve_crypto_drops_listed_coin_without_price() {
        let resolver = resolver()
            .with_source(Arc::new(MockSource::fiat(
                "fiat",
                &[("USD", 1.0), ("NGN", 1500.0)],
            )))
            .with_source(Arc::new(MockSource::crypto(
                "coins",
                &[("BTC", 45000.0), ("ETH", f64::NAN)],
            )));

        let resolved = resolver.resolve(RateKind::Crypto).await.unwrap();
        assert_eq!(resolved.rates.get("BTC"), Some(67_500_000.0));
        assert!(!resolved.rates.contains("ETH"));
        assert!(resolved.filled.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_crypto_skips_source_without_coverage() {
        let empty = Arc::new(MockSource::crypto("empty", &[("DOGE", 0.1)]));
        let backup = Arc::new(MockSource::crypto("backup", &[("BTC", 40000.0), ("ETH", 2000.0)]));
        let resolver = resolver()
            .with_source(Arc::new(MockSource::fiat(
                "fiat",
                &[("USD", 1.0), ("NGN", 1000.0)],
            )))
            .with_source(empty.clone())
            .with_source(backup.clone());

        let resolved = resolver.resolve(RateKind::Crypto).await.unwrap();
        assert_eq!(resolved.source, "backup");
        assert_eq!(resolved.rates.get("BTC"), Some(40_000_000.0));
        assert_eq!(resolved.rates.get("ETH"), Some(2_000_000.0));
        assert!(!resolved.rates.contains("DOGE"));
    }

    #[tokio::test]
    async fn test_resolve_crypto_fails_without_usd_rate() {
        let resolver = resolver()
            .with_source(Arc::new(MockSource::failing(
                "fiat",
                RateKind::Fiat,
                network_error(),
            )))
            .with_source(Arc::new(MockSource::crypto("coins", &[("BTC", 45000.0)])));

        let err = resolver.resolve(RateKind::Crypto).await.unwrap_err();
        let ResolveError::AllSourcesExhausted { kind, causes } = err;
        assert_eq!(kind, RateKind::Crypto);
        assert_eq!(causes[0].source, "fiat");
    }

    #[tokio::test]
    async fn test_resolve_crypto_skips_fiat_source_without_usd() {
        let resolver = resolver()
            .with_source(Arc::new(MockSource::fiat("no-usd", &[("NGN", 1.0), ("GBP", 0.0005)])))
            .with_source(Arc::new(MockSource::fiat(
                "with-usd",
                &[("USD", 1.0), ("NGN", 1600.0)],
            )))
            .with_source(Arc::new(MockSource::crypto(
                "coins",
                &[("BTC", 1.0), ("ETH", 2.0)],
            )));

        let resolved = resolver.resolve(RateKind::Crypto).await.unwrap();
        assert_eq!(resolved.rates.get("BTC"), Some(1600.0));
        assert_eq!(resolved.rates.get("ETH"), Some(3200.0));
    }

    #[tokio::test]
    async fn test_resolve_crypto_without_any_usd_quote_fails() {
        let resolver = resolver()
            .with_source(Arc::new(MockSource::fiat("no-usd", &[("NGN", 1.0), ("GBP", 0.0005)])))
            .with_source(Arc::new(MockSource::crypto("coins", &[("BTC", 45000.0)])));

        // Fiat alone still resolves from the same source
        assert!(resolver.resolve(RateKind::Fiat).await.is_ok());

        let err = resolver.resolve(RateKind::Crypto).await.unwrap_err();
        assert_eq!(err.causes().len(), 1);
        assert_eq!(err.causes()[0].source, "no-usd");
        assert!(matches!(
            err.causes()[0].error,
            SourceError::MalformedResponse(_)
        ));
    }

    #[tokio::test]
    async fn test_mismatched_quotes_are_rejected() {
        let confused = MockSource::new(
            "confused",
            RateKind::Fiat,
            Ok(Quotes::UsdPrices(to_map(&[("BTC", 1.0)]))),
        );
        let resolver = resolver().with_source(Arc::new(confused));
        let err = resolver.resolve(RateKind::Fiat).await.unwrap_err();
        assert!(matches!(
            err.causes()[0].error,
            SourceError::MalformedResponse(_)
        ));
    }

    #[test]
    fn test_sources_keep_priority_order() {
        let resolver = resolver()
            .with_source(Arc::new(MockSource::fiat("a", &[])))
            .with_source(Arc::new(MockSource::crypto("c", &[])))
            .with_source(Arc::new(MockSource::fiat("b", &[])));
        assert_eq!(resolver.source_ids(RateKind::Fiat), vec!["a", "b"]);
        assert_eq!(resolver.source_ids(RateKind::Crypto), vec!["c"]);
    }
}
