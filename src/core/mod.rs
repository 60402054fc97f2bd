//! Rate acquisition, normalization, caching and conversion

pub mod cache;
pub mod config;
pub mod convert;
pub mod error;
pub mod fallback;
pub mod log;
pub mod pipeline;
pub mod rates;
pub mod schedule;
pub mod source;

// Re-export main types for cleaner imports
pub use cache::{CacheView, RateCache};
pub use convert::{Amount, convert};
pub use error::{ResolveError, SourceError};
pub use pipeline::{ResolutionResult, Resolved, Resolver};
pub use rates::{Quotes, RateKind, RateMap};
pub use source::PriceSource;
