//! # Error Handling Module
//!
//! ## Purpose
//! Centralized error handling for the decision search proxy, covering caller
//! input validation, upstream transport failures and retry exhaustion.
//!
//! ## Input/Output Specification
//! - **Input**: Error conditions from normalization, upstream calls, retries
//! - **Output**: Structured error types with context and error chains
//! - **Error Categories**: Parameter, Upstream, Retry, Configuration
//!
//! ## Key Features
//! - Transient/permanent classification driving the retry policy
//! - User-friendly error messages for API responses
//! - Structured logging integration
//! - Automatic conversion from transport-level errors

use thiserror::Error;

/// Result type used throughout the application
pub type Result<T> = std::result::Result<T, SearchError>;

/// Error types for the decision search proxy
#[derive(Debug, Error)]
pub enum SearchError {
    /// Caller-supplied parameter is missing or malformed
    #[error("Invalid parameter '{field}': {reason}")]
    InvalidParameter { field: String, reason: String },

    /// Upstream could not be reached (connect failure, timeout, 5xx)
    #[error("Upstream service unavailable: {details}")]
    UpstreamUnavailable { details: String },

    /// Upstream answered with an HTTP 429 or equivalent throttle response
    #[error("Upstream rate limit hit")]
    UpstreamRateLimited { retry_after_seconds: Option<u64> },

    /// Upstream response did not match the expected schema
    #[error("Malformed upstream response: {details}")]
    UpstreamMalformed { details: String },

    /// Upstream reports the requested document id does not exist
    #[error("Document content not found for decision '{decision_id}'")]
    ContentNotFound { decision_id: String },

    /// Retry budget exceeded; wraps the last transient failure
    #[error("Retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Internal system errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl SearchError {
    /// Check whether the error is transient (worth retrying with backoff)
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SearchError::UpstreamUnavailable { .. } | SearchError::UpstreamRateLimited { .. }
        )
    }

    /// Get error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            SearchError::InvalidParameter { .. } => "parameter",
            SearchError::UpstreamUnavailable { .. }
            | SearchError::UpstreamRateLimited { .. }
            | SearchError::UpstreamMalformed { .. }
            | SearchError::ContentNotFound { .. } => "upstream",
            SearchError::RetriesExhausted { .. } => "retry",
            SearchError::Config { .. } => "configuration",
            SearchError::Internal { .. } => "internal",
        }
    }
}

// Conversion from common error types
impl From<std::io::Error> for SearchError {
    fn from(err: std::io::Error) -> Self {
        SearchError::Internal {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SearchError::UpstreamMalformed {
                details: err.to_string(),
            }
        } else {
            SearchError::UpstreamUnavailable {
                details: err.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        SearchError::UpstreamMalformed {
            details: format!("JSON error: {}", err),
        }
    }
}
