//! Error types.
//!
//! `ProviderError` represents failures when talking to the generative-language
//! service. It lives in `mathdrill-core` so the session controller can
//! downcast and classify provider failures without string matching.

use thiserror::Error;

/// Errors that can occur when interacting with an LLM provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid or missing API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested model was not found.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),

    /// A successful reply did not carry the candidate/content/part path.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ProviderError {
    /// Returns `true` for network and HTTP level failures, as opposed to a
    /// reply that arrived but could not be understood.
    pub fn is_transport(&self) -> bool {
        !matches!(self, ProviderError::MalformedResponse(_))
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            ProviderError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}

/// Errors from decoding the grader's `{isCorrect, explanation}` payload.
#[derive(Debug, Error)]
pub enum EvaluationParseError {
    /// The reply carried no text at all.
    #[error("evaluation payload is empty")]
    Empty,

    /// The reply was not the expected JSON object.
    #[error("invalid evaluation JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_is_not_transport() {
        assert!(!ProviderError::MalformedResponse("no candidates".into()).is_transport());
        assert!(ProviderError::NetworkError("refused".into()).is_transport());
        assert!(ProviderError::Timeout(120).is_transport());
        assert!(ProviderError::ApiError {
            status: 500,
            message: "boom".into()
        }
        .is_transport());
    }

    #[test]
    fn retry_after_only_for_rate_limit() {
        assert_eq!(
            ProviderError::RateLimited {
                retry_after_ms: 5000
            }
            .retry_after_ms(),
            Some(5000)
        );
        assert_eq!(ProviderError::Timeout(1).retry_after_ms(), None);
    }
}
