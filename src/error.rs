//! Error types for the jobflow pipeline
//!
//! Each stage has its own domain error, wrapped by a unified [`Error`] enum
//! for use across module boundaries. Failures are contained at the smallest
//! unit (one card, one url, one job); nothing here is fatal to the process
//! except setup failures surfaced from the binary.

use std::io;
use thiserror::Error;

/// Errors that can occur during HTTP fetching operations
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server error with status code
    #[error("Server error: {0}")]
    ServerError(u16),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Maximum retry attempts exceeded
    #[error("Maximum retry attempts exceeded")]
    MaxRetriesExceeded,

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Errors that can occur while extracting fields from listing cards
///
/// Only the url is load-bearing; every other missing field degrades to an
/// empty string instead of an error.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Card has no anchor to derive the posting url from
    #[error("Job card has no posting link")]
    UrlNotFound,

    /// The href could not be joined against the site root
    #[error("Unresolvable posting link: {0}")]
    BadLink(String),
}

/// Errors from normalizing scraped text into index fields
#[derive(Error, Debug)]
pub enum NormalizeError {
    /// Creation-date phrase matched none of the known unit keywords.
    /// Guessing would corrupt `created_at`, so the single job fails loudly.
    #[error("Could not parse creation date: {0:?}")]
    UnparseableDate(String),
}

/// Errors from the remote index and text-parsing APIs
#[derive(Error, Debug)]
pub enum IndexError {
    /// HTTP transport error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the API
    #[error("API returned status {status} for {endpoint}")]
    Api { endpoint: &'static str, status: u16 },

    /// Response body did not match the expected shape
    #[error("Malformed API response: {0}")]
    MalformedResponse(String),

    /// Endpoint URL could not be built
    #[error("Invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Unified error type for the jobflow crate
#[derive(Error, Debug)]
pub enum Error {
    /// Fetch-specific errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Listing-card extraction errors
    #[error("Extract error: {0}")]
    Extract(#[from] ExtractError),

    /// Normalization errors
    #[error("Normalize error: {0}")]
    Normalize(#[from] NormalizeError),

    /// Remote index / parsing API errors
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let fetch_err = FetchError::Timeout;
        let unified: Error = fetch_err.into();
        assert!(matches!(unified, Error::Fetch(FetchError::Timeout)));
    }

    #[test]
    fn test_unparseable_date_message() {
        let err = NormalizeError::UnparseableDate("Just posted".to_string());
        assert!(err.to_string().contains("Just posted"));
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("missing board key");
        assert!(matches!(err, Error::Config(_)));
    }
}
