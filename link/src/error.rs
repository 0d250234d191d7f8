//! Error types for the warden-link library.
//!
//! A single error enum covers the session taxonomy (invalid credentials,
//! expired token, invalid session, failed refresh) together with the
//! transport and storage failures underneath it. The enum is `Clone`:
//! when a refresh call fails, every request queued behind it is settled
//! with the same error value.

use thiserror::Error;

/// Result type for warden-link operations
pub type Result<T> = std::result::Result<T, WardenLinkError>;

/// Errors that can occur in the warden-link library
#[derive(Debug, Clone, Error)]
pub enum WardenLinkError {
    /// Sign-in rejected by the server. Surfaced to the caller; no session
    /// state is touched.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The access token expired and could not be recovered by a refresh
    /// retry. Callers normally never see this: an expired token is
    /// refreshed and the request replayed transparently.
    #[error("Access token expired")]
    TokenExpired,

    /// A 401 that is not a token expiry. Fatal to the session.
    #[error("Invalid session: {0}")]
    InvalidSession(String),

    /// The single-flight refresh call itself failed. Every queued request
    /// is settled with a clone of this value.
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    /// Network-level failure (connect, timeout, protocol)
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Client construction / configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// JSON encoding or decoding failure
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Token store read or write failure
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Non-success HTTP response outside the session taxonomy
    #[error("Server error ({status_code}): {message}")]
    ServerError { status_code: u16, message: String },

    /// Invariant violation inside the library
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<reqwest::Error> for WardenLinkError {
    fn from(err: reqwest::Error) -> Self {
        WardenLinkError::NetworkError(err.to_string())
    }
}

impl From<serde_json::Error> for WardenLinkError {
    fn from(err: serde_json::Error) -> Self {
        WardenLinkError::SerializationError(err.to_string())
    }
}
