//! Error types for catalog translation
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MtError {
    /// Invalid or missing configuration (empty API key, bad language code)
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// Transport-level failure talking to the backend
    #[error("Network error: {0}")]
    NetworkError(String),
    /// Backend rejected the credentials (HTTP 403)
    #[error("Authentication failed: {0}")]
    AuthError(String),
    /// Backend asked us to slow down (HTTP 429)
    #[error("Rate limited: {0}")]
    RateLimited(String),
    /// Any other non-success status, with the raw response body
    #[error("API error ({status}): {body}")]
    ApiError { status: u16, body: String },
    /// Malformed, empty or misaligned translation response
    #[error("Translation error: {0}")]
    TranslationError(String),
    /// Reading or writing catalog files failed
    #[error("I/O error: {0}")]
    IoError(String),
    /// Source catalog is not valid JSON
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl MtError {
    /// Only rate limiting is worth retrying; everything else fails the batch.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MtError::RateLimited(_))
    }
}

impl From<reqwest::Error> for MtError {
    fn from(err: reqwest::Error) -> Self {
        MtError::NetworkError(err.to_string())
    }
}

/// Result type for MT operations
pub type MtResult<T> = Result<T, MtError>;
