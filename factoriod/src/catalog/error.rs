//! Error types for catalog queries.

use thiserror::Error;

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors from querying the version or updater APIs.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The HTTP request itself failed (connect, timeout, non-success status).
    #[error("request to {url} failed: {reason}")]
    Http { url: String, reason: String },

    /// The response body did not match the expected shape.
    #[error("malformed response from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },

    /// The API answered but contained no usable entry.
    #[error("no matching release published upstream")]
    NotFound,
}

impl CatalogError {
    pub(crate) fn http(url: &str, error: reqwest::Error) -> Self {
        Self::Http {
            url: url.to_string(),
            reason: error.to_string(),
        }
    }

    pub(crate) fn malformed(url: &str, reason: impl ToString) -> Self {
        Self::MalformedResponse {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}
