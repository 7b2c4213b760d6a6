//! Error types for talking to the conversation backend.

use thiserror::Error;

/// Client error type.
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Backend returned a non-success response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, if any.
        message: String,
    },

    /// The configured base URL cannot carry path segments.
    #[error("Base URL cannot be used for API paths: {0}")]
    BaseUrl(String),

    /// The answer stream could not be opened or broke off.
    #[error("Stream error: {0}")]
    Stream(String),
}

/// Result type alias for backend operations.
pub type Result<T> = std::result::Result<T, ClientError>;
