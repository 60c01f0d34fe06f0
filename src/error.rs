//! Error type shared by every layer of the crate.
//!
//! Remote failures are split into transient ones (rate limit, server errors,
//! network) which the gateway retries, and permanent ones which surface to the
//! calling step. Integrity failures only ever abort the single deletion that
//! raised them.

use thiserror::Error;

/// A `Result` alias using the crate [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("spotify api returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The remote rejected the payload (HTTP 400), e.g. a malformed description.
    #[error("request rejected by spotify: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("giving up after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Tracks of a deletion target are missing from its successor.
    #[error("integrity check failed: {0}")]
    Integrity(String),

    #[error("interrupted")]
    Interrupted,
}

impl Error {
    /// Whether a retry of the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(err) => {
                err.is_timeout()
                    || err.is_connect()
                    || err.is_request()
                    || err.status().is_some_and(|s| s.is_server_error() || s.as_u16() == 429)
            }
            Error::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
