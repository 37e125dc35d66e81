//! Error types shared across the shelfscan workspace.
//!
//! The polling state machine publishes terminal errors through a watch
//! channel, so every variant carries owned data and the enum stays
//! `Clone + PartialEq`.

/// Result type for all shelfscan operations in this crate.
///
/// This is a convenience type alias that defaults to using [`Error`] as the error type.
/// Most functions in this crate return this type for consistent error handling.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Unified error type for recognition API operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Invalid input data (missing identifiers, empty payloads)
    #[error("Invalid request: {reason}")]
    Validation {
        /// Description of what's invalid
        reason: String,
    },

    /// Configuration errors (bad base URL, missing API key)
    #[error("Configuration error: {reason}")]
    Config {
        /// Description of the configuration problem
        reason: String,
    },

    /// The API rejected the credentials (HTTP 401)
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Error message from the API
        message: String,
    },

    /// The requested resource does not exist yet (HTTP 404)
    #[error("Not found: {message}")]
    NotFound {
        /// Error message from the API
        message: String,
    },

    /// The status endpoint kept returning 404 until the retry budget ran out
    #[error("Status not found after {attempts} attempts")]
    RetriesExhausted {
        /// Number of consecutive not-found responses observed
        attempts: u32,
    },

    /// Any other API error response
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network-level failures (connect errors, timeouts)
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the transport failure
        message: String,
    },

    /// Invalid or malformed response body
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the decode failure
        message: String,
    },
}

impl Error {
    /// Create a validation error.
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Create an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a retries-exhausted error.
    pub fn retries_exhausted(attempts: u32) -> Self {
        Self::RetriesExhausted { attempts }
    }

    /// Create a generic API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Classify a non-2xx response by status code.
    ///
    /// 401 and 404 get dedicated variants because the poller treats them
    /// differently from every other upstream failure.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            401 => Self::unauthorized(message),
            404 => Self::not_found(message),
            _ => Self::api(status, message),
        }
    }

    /// Check if the poll loop may retry after this error.
    ///
    /// Only "not found yet" is retryable; everything else terminates the
    /// polling session.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Get the HTTP status code if this error maps to one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Unauthorized { .. } => Some(401),
            Error::NotFound { .. } => Some(404),
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Get a user-friendly error message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation { reason } => format!("Invalid input: {}", reason),
            Error::Config { reason } => format!("Configuration error: {}", reason),
            Error::Unauthorized { .. } => {
                "Authentication failed. Please check your API key.".to_string()
            }
            Error::NotFound { .. } => {
                "The submission is not registered yet. Please try again shortly.".to_string()
            }
            Error::RetriesExhausted { attempts } => {
                format!("The submission was not found after {} attempts.", attempts)
            }
            Error::Api { status, message } => {
                format!("Recognition service error ({}): {}", status, message)
            }
            Error::Transport { .. } => {
                "Network error occurred. Please check your connection.".to_string()
            }
            Error::Serialization { .. } => {
                "The service returned an unexpected response.".to_string()
            }
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}
