//! Error taxonomy for the search core.
//!
//! Provider failures are recoverable: the aggregator collects them and only
//! surfaces [`SearchError::AllProvidersFailed`] when nothing succeeded.

use std::time::Duration;
use thiserror::Error;

use crate::sources::Platform;

/// Why a single provider call failed.
#[derive(Debug, Error)]
pub enum ProviderErrorKind {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("token exchange failed: {0}")]
    Token(#[from] TokenError),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("cancelled by caller")]
    Cancelled,
}

/// A failed search against one platform.
#[derive(Debug, Error)]
#[error("{platform} search failed: {cause}")]
pub struct ProviderError {
    pub platform: Platform,
    #[source]
    pub cause: ProviderErrorKind,
}

impl ProviderError {
    pub fn new(platform: Platform, cause: impl Into<ProviderErrorKind>) -> Self {
        Self {
            platform,
            cause: cause.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.cause, ProviderErrorKind::Timeout(_))
    }
}

/// Failure of a client-credentials exchange.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("token endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed token response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Errors reported to the caller of the aggregator.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("query must not be empty")]
    InvalidQuery,

    #[error("none of the requested platforms is enabled")]
    NoPlatformsEnabled,

    #[error("all {} providers failed", .failures.len())]
    AllProvidersFailed { failures: Vec<ProviderError> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_names_platform_and_cause() {
        let err = ProviderError::new(
            Platform::Spotify,
            ProviderErrorKind::Status {
                status: 500,
                body: "boom".to_string(),
            },
        );
        assert_eq!(err.to_string(), "spotify search failed: upstream returned 500: boom");
        assert!(!err.is_timeout());
    }

    #[test]
    fn token_errors_convert_into_provider_errors() {
        let token = TokenError::Status {
            status: 401,
            body: "invalid_client".to_string(),
        };
        let err = ProviderError::new(Platform::Spotify, token);
        assert!(matches!(err.cause, ProviderErrorKind::Token(TokenError::Status { status: 401, .. })));
    }

    #[test]
    fn all_failed_reports_count() {
        let err = SearchError::AllProvidersFailed {
            failures: vec![
                ProviderError::new(Platform::YouTube, ProviderErrorKind::Cancelled),
                ProviderError::new(Platform::JioSaavn, ProviderErrorKind::Timeout(Duration::from_secs(8))),
            ],
        };
        assert_eq!(err.to_string(), "all 2 providers failed");
    }
}
