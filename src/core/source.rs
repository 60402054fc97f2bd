//! Price source abstractions

use crate::core::error::SourceError;
use crate::core::rates::{Quotes, RateKind};
use async_trait::async_trait;

/// One upstream provider of rates or prices.
///
/// A fetch performs exactly one outbound request and never retries; the
/// resolution pipeline owns fallback and retry decisions.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Stable identifier used in logs and failure chains.
    fn id(&self) -> &str;

    fn kind(&self) -> RateKind;

    async fn fetch(&self) -> Result<Quotes, SourceError>;
}
