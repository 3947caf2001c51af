//! Error types for token validation

use thiserror::Error;

use crate::context::ContextError;
use crate::retry::Retryable;

/// Result type alias for validation operations
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Reason a token was rejected.
///
/// Every variant is terminal for the request that produced it. Callers facing
/// the network should map all of them to the same rejection and keep the
/// variant for diagnostics only.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("malformed token: {message}")]
    MalformedToken { message: String },

    #[error("malformed token header: {message}")]
    MalformedHeader { message: String },

    #[error("unsupported algorithm: {alg}")]
    UnsupportedAlgorithm { alg: String },

    #[error("unsupported signer partition: {partition}")]
    UnsupportedPartition { partition: String },

    #[error("failed to fetch public key from {url} after {attempts} attempt(s): {source}")]
    KeyFetchFailed {
        url: String,
        attempts: u32,
        #[source]
        source: FetchError,
    },

    #[error("invalid signature")]
    InvalidSignature,

    #[error("token is expired")]
    Expired,
}

impl ValidationError {
    pub fn malformed_token(message: impl Into<String>) -> Self {
        Self::MalformedToken {
            message: message.into(),
        }
    }

    pub fn malformed_header(message: impl Into<String>) -> Self {
        Self::MalformedHeader {
            message: message.into(),
        }
    }

    pub fn unsupported_algorithm(alg: impl Into<String>) -> Self {
        Self::UnsupportedAlgorithm { alg: alg.into() }
    }

    pub fn unsupported_partition(partition: impl Into<String>) -> Self {
        Self::UnsupportedPartition {
            partition: partition.into(),
        }
    }

    pub fn key_fetch_failed(url: impl Into<String>, attempts: u32, source: FetchError) -> Self {
        Self::KeyFetchFailed {
            url: url.into(),
            attempts,
            source,
        }
    }

    /// HTTP status for a rejected request. Uniform across kinds.
    pub fn status_code(&self) -> u16 {
        403
    }

    /// Stable name of the error kind, for log lines
    pub fn error_key(&self) -> &'static str {
        match self {
            Self::MalformedToken { .. } => "malformed_token",
            Self::MalformedHeader { .. } => "malformed_header",
            Self::UnsupportedAlgorithm { .. } => "unsupported_algorithm",
            Self::UnsupportedPartition { .. } => "unsupported_partition",
            Self::KeyFetchFailed { .. } => "key_fetch_failed",
            Self::InvalidSignature => "invalid_signature",
            Self::Expired => "expired",
        }
    }
}

/// Failure of a single public key fetch attempt
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("invalid public key: {0}")]
    InvalidKey(String),

    #[error(transparent)]
    Context(#[from] ContextError),
}

impl FetchError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey(message.into())
    }
}

impl Retryable for FetchError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Status(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_is_uniform() {
        let errors = [
            ValidationError::malformed_token("x"),
            ValidationError::malformed_header("x"),
            ValidationError::unsupported_algorithm("RS256"),
            ValidationError::unsupported_partition("aws-cn"),
            ValidationError::key_fetch_failed("https://example.com/k", 10, FetchError::Status(500)),
            ValidationError::InvalidSignature,
            ValidationError::Expired,
        ];
        for e in &errors {
            assert_eq!(e.status_code(), 403, "{}", e.error_key());
        }
    }

    #[test]
    fn test_key_fetch_failed_wraps_source() {
        use std::error::Error as _;

        let err = ValidationError::key_fetch_failed(
            "https://example.com/k",
            3,
            FetchError::transport("connection refused"),
        );
        assert_eq!(
            err.to_string(),
            "failed to fetch public key from https://example.com/k after 3 attempt(s): request failed: connection refused"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn test_fetch_error_retryable() {
        assert!(FetchError::transport("reset").is_retryable());
        assert!(FetchError::Status(503).is_retryable());
        assert!(!FetchError::invalid_key("not PEM").is_retryable());
        assert!(!FetchError::Context(ContextError::Cancelled).is_retryable());
    }
}
