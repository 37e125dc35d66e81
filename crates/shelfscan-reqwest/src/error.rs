//! Internal error types for shelfscan-reqwest.

use thiserror::Error;

/// Internal error type for HTTP-layer failures.
///
/// Converted into the domain error before leaving this crate.
#[derive(Debug, Error)]
pub(crate) enum HttpError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl From<HttpError> for shelfscan_core::Error {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Reqwest(e) => {
                if e.is_timeout() {
                    shelfscan_core::Error::transport(format!("request timed out: {}", e))
                } else if e.is_connect() {
                    shelfscan_core::Error::transport(format!("connection failed: {}", e))
                } else {
                    shelfscan_core::Error::transport(e.to_string())
                }
            }
        }
    }
}
