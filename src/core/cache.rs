use chrono::{DateTime, Utc};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::core::pipeline::ResolutionResult;
use crate::core::rates::{RateKind, RateMap};

/// The last good resolution for one kind.
#[derive(Debug)]
pub struct CachedSnapshot {
    pub rates: Arc<RateMap>,
    pub source: String,
    pub fetched_at: DateTime<Utc>,
    pub filled: Vec<String>,
    committed_at: Instant,
}

impl CachedSnapshot {
    pub fn age(&self) -> Duration {
        self.committed_at.elapsed()
    }
}

/// What readers see for one kind.
#[derive(Debug, Clone, Default)]
pub struct CacheView {
    /// `None` until the first successful refresh.
    pub data: Option<Arc<RateMap>>,
    pub is_stale: bool,
    /// Set by the latest refresh if it failed, cleared by the next success.
    pub error: Option<String>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub source: Option<String>,
    pub filled: Vec<String>,
}

#[derive(Default)]
struct Slot {
    snapshot: Option<Arc<CachedSnapshot>>,
    error: Option<String>,
}

/// Last known-good rate maps per kind.
///
/// A failed refresh never replaces the snapshot (stale-but-available), it
/// only records the error. Writers swap a whole `Arc` under a short lock so
/// readers always observe a complete map.
pub struct RateCache {
    stale_after: Duration,
    fiat: RwLock<Slot>,
    crypto: RwLock<Slot>,
}

impl RateCache {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            stale_after,
            fiat: RwLock::new(Slot::default()),
            crypto: RwLock::new(Slot::default()),
        }
    }

    fn slot(&self, kind: RateKind) -> &RwLock<Slot> {
        match kind {
            RateKind::Fiat => &self.fiat,
            RateKind::Crypto => &self.crypto,
        }
    }

    pub fn get(&self, kind: RateKind) -> CacheView {
        let slot = self
            .slot(kind)
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        match &slot.snapshot {
            Some(snapshot) => CacheView {
                data: Some(Arc::clone(&snapshot.rates)),
                is_stale: snapshot.age() > self.stale_after,
                error: slot.error.clone(),
                fetched_at: Some(snapshot.fetched_at),
                source: Some(snapshot.source.clone()),
                filled: snapshot.filled.clone(),
            },
            None => CacheView {
                error: slot.error.clone(),
                ..CacheView::default()
            },
        }
    }

    pub fn snapshot(&self, kind: RateKind) -> Option<Arc<CachedSnapshot>> {
        self.slot(kind)
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot
            .clone()
    }

    /// Records a resolution outcome. Returns whether the snapshot was replaced.
    pub fn commit(&self, kind: RateKind, result: ResolutionResult) -> bool {
        // Build the new snapshot before taking the lock
        let next = result.map(|resolved| {
            Arc::new(CachedSnapshot {
                rates: Arc::new(resolved.rates),
                source: resolved.source,
                fetched_at: resolved.fetched_at,
                filled: resolved.filled,
                committed_at: Instant::now(),
            })
        });

        let mut slot = self
            .slot(kind)
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match next {
            Ok(snapshot) => {
                debug!(%kind, source = %snapshot.source, "Cache PUT");
                slot.snapshot = Some(snapshot);
                slot.error = None;
                true
            }
            Err(e) => {
                warn!(%kind, error = %e, "Refresh failed, keeping previous snapshot");
                slot.error = Some(e.to_string());
                false
            }
        }
    }
}
