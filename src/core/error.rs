//! Rate acquisition error types.

use crate::core::rates::RateKind;
use std::fmt::Display;
use thiserror::Error;

/// Errors a single source can report for one fetch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    /// The request did not complete within the configured timeout.
    #[error("Request timed out: {0}")]
    NetworkTimeout(String),

    /// Connection failure or non-2xx response.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The body was not the expected shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The response carried none or only some of the requested symbols.
    #[error("Missing symbols: {}", .missing.join(", "))]
    PartialCoverage { missing: Vec<String> },
}

impl SourceError {
    /// Whether a retry of the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SourceError::NetworkTimeout(_) | SourceError::NetworkError(_)
        )
    }

    pub(crate) fn from_reqwest(err: reqwest::Error, url: &str) -> Self {
        if err.is_timeout() {
            SourceError::NetworkTimeout(url.to_string())
        } else {
            SourceError::NetworkError(format!("{} for URL: {}", err.without_url(), url))
        }
    }
}

/// One link in a failed resolution chain.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFailure {
    pub source: String,
    pub error: SourceError,
}

impl Display for SourceFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.source, self.error)
    }
}

/// Errors from resolving a rate kind end to end.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    /// Every configured source for the kind failed.
    #[error("All {kind} sources exhausted: [{}]", format_causes(.causes))]
    AllSourcesExhausted {
        kind: RateKind,
        causes: Vec<SourceFailure>,
    },
}

impl ResolveError {
    pub fn causes(&self) -> &[SourceFailure] {
        match self {
            ResolveError::AllSourcesExhausted { causes, .. } => causes,
        }
    }
}

fn format_causes(causes: &[SourceFailure]) -> String {
    if causes.is_empty() {
        return "no sources configured".to_string();
    }
    causes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
