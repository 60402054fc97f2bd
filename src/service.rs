//! The rate service: resolver, cache and refresh schedule behind one handle.

use anyhow::Result;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

use crate::core::cache::{CacheView, RateCache};
use crate::core::config::AppConfig;
use crate::core::convert::{Amount, convert, format_for_kind};
use crate::core::pipeline::Resolver;
use crate::core::rates::{RateKind, RateMap};
use crate::core::schedule::ScheduledTask;
use crate::providers::build_resolver;

/// Keeps the fiat and crypto caches fresh in the background.
///
/// Nothing runs until [`RateService::start`]; [`RateService::stop`] (or
/// dropping the service) tears the refresh tasks down. The two kinds refresh
/// on independent tasks, so a slow crypto source never holds up fiat.
pub struct RateService {
    resolver: Arc<Resolver>,
    cache: Arc<RateCache>,
    fiat_every: Duration,
    crypto_every: Duration,
    tasks: Mutex<Vec<ScheduledTask>>,
}

impl RateService {
    pub fn new(
        resolver: Resolver,
        stale_after: Duration,
        fiat_every: Duration,
        crypto_every: Duration,
    ) -> Self {
        Self {
            resolver: Arc::new(resolver),
            cache: Arc::new(RateCache::new(stale_after)),
            fiat_every,
            crypto_every,
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self::new(
            build_resolver(config)?,
            config.stale_after(),
            config.fiat_refresh(),
            config.crypto_refresh(),
        ))
    }

    pub fn base_currency(&self) -> &str {
        self.resolver.base()
    }

    fn interval(&self, kind: RateKind) -> Duration {
        match kind {
            RateKind::Fiat => self.fiat_every,
            RateKind::Crypto => self.crypto_every,
        }
    }

    /// Spawns one refresh task per kind. Each refreshes immediately and then
    /// on its interval. Calling `start` on a running service does nothing.
    pub fn start(&self) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        if !tasks.is_empty() {
            debug!("Rate service already running");
            return;
        }

        for kind in RateKind::ALL {
            let resolver = Arc::clone(&self.resolver);
            let cache = Arc::clone(&self.cache);
            let every = self.interval(kind);
            info!(%kind, ?every, "Starting refresh task");
            tasks.push(ScheduledTask::every(
                &format!("{kind}-refresh"),
                every,
                move || {
                    let resolver = Arc::clone(&resolver);
                    let cache = Arc::clone(&cache);
                    async move {
                        let result = resolver.resolve(kind).await;
                        cache.commit(kind, result);
                    }
                },
            ));
        }
    }

    pub fn stop(&self) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        if !tasks.is_empty() {
            info!("Stopping refresh tasks");
        }
        // Dropping a task aborts it
        tasks.clear();
    }

    pub fn is_running(&self) -> bool {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(ScheduledTask::is_running)
    }

    /// Resolves `kind` now and commits the outcome. Returns whether fresh
    /// data was stored.
    pub async fn refresh(&self, kind: RateKind) -> bool {
        let result = self.resolver.resolve(kind).await;
        self.cache.commit(kind, result)
    }

    pub fn get(&self, kind: RateKind) -> CacheView {
        self.cache.get(kind)
    }

    /// The latest map for `kind`, or `None` when no refresh has succeeded yet.
    pub fn get_rates(&self, kind: RateKind) -> Option<Arc<RateMap>> {
        self.cache.get(kind).data
    }

    /// Converts `amount` of `currency` into the base currency, formatted for
    /// display. Without data the result is zero.
    pub fn convert(&self, amount: Amount, currency: &str, mode: RateKind) -> String {
        let value = self
            .get_rates(mode)
            .map(|rates| convert(amount.value(), currency, &rates, mode))
            .unwrap_or(0.0);
        format_for_kind(value, mode)
    }
}

impl Drop for RateService {
    fn drop(&mut self) {
        self.stop();
    }
}
