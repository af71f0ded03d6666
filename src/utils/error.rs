//! Error types for upstream fetching
//!
//! This module defines the errors raised while talking to the video and
//! live-streaming platforms and while decoding their responses.

use thiserror::Error;

/// Errors that can occur while fetching from an upstream platform
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status code
    #[error("Server error: {0}")]
    ServerError(u16),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Upstream answered successfully but had nothing to return
    #[error("Empty result: {0}")]
    Empty(String),

    /// Upstream rejected the credentials for a single request
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Every login attempt (or every API key) was rejected
    #[error("Authentication exhausted after {attempts} attempts: {reason}")]
    AuthExhausted {
        /// Number of attempts made before giving up
        attempts: u32,
        /// Last failure reason
        reason: String,
    },

    /// Response payload could not be decoded
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

impl FetchError {
    /// Build a fetch error from a reqwest error, separating timeouts
    pub fn from_request(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }

    /// Check if this error is recoverable (next tick may succeed)
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::AuthExhausted { .. })
    }
}

/// Errors that can occur while decoding upstream payloads
#[derive(Error, Debug)]
pub enum ParseError {
    /// Payload did not match the expected shape
    #[error("Malformed {what} payload: {source}")]
    Malformed {
        /// Which payload was being decoded
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl ParseError {
    /// Decode a JSON body into `T`, tagging failures with the payload name
    pub fn decode<T: serde::de::DeserializeOwned>(
        what: &'static str,
        body: &str,
    ) -> Result<T, ParseError> {
        serde_json::from_str(body).map_err(|source| ParseError::Malformed { what, source })
    }
}
