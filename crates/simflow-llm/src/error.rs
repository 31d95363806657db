//! Failures of the text-transform boundary.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LlmError>;

/// Why a transform call produced no text.
///
/// Only [`Network`](LlmError::Network) and [`RateLimit`](LlmError::RateLimit)
/// are worth another attempt; see [`LlmError::is_retryable`].
#[derive(Debug, Error)]
pub enum LlmError {
    /// The service answered with an error status.
    #[error("service error: {0}")]
    Backend(String),

    /// The service could not be reached, or the call timed out.
    #[error("service unreachable: {0}")]
    Network(String),

    /// The client itself is misconfigured.
    #[error("transform misconfigured: {0}")]
    Config(String),

    /// A body could not be encoded or decoded.
    #[error("malformed payload: {0}")]
    Serialization(String),

    /// The request could not be rendered, e.g. a placeholder has no value.
    #[error("bad transform request: {0}")]
    InvalidRequest(String),

    /// A well-formed answer with no usable text in it.
    #[error("unusable answer: {0}")]
    InvalidResponse(String),

    /// Quota or rate limit hit.
    #[error("rate limited: {0}")]
    RateLimit(String),

    /// Credentials were rejected.
    #[error("not authorized: {0}")]
    Auth(String),
}

impl LlmError {
    /// Transient failures that a backoff loop should retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LlmError::Network(_) | LlmError::RateLimit(_))
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        let what = match (err.is_timeout(), err.is_connect()) {
            (true, _) => "timed out",
            (_, true) => "connection failed",
            _ => "request failed",
        };
        LlmError::Network(format!("{what}: {err}"))
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::Serialization(err.to_string())
    }
}
