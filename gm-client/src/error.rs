//! Error types for the gm client
//!
//! [`ClientError`] covers building a client. Failures of an individual fetch
//! are reported as the domain's [`FetchError`] so the monitor can record them
//! per repository.

use gm_core::domain::error::FetchError;
use thiserror::Error;

/// Result type alias for client construction
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when setting up the client
#[derive(Debug, Error)]
pub enum ClientError {
    /// The underlying HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),

    /// The base URL is not an http(s) URL
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

/// Classifies a transport-level failure
pub(crate) fn transport_error(err: &reqwest::Error) -> FetchError {
    if is_timeout(err) {
        FetchError::timeout(describe(err))
    } else {
        FetchError::network(describe(err))
    }
}

fn is_timeout(err: &reqwest::Error) -> bool {
    if err.is_timeout() {
        return true;
    }

    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::TimedOut {
                return true;
            }
        }
        source = cause.source();
    }
    false
}

/// Error message with its full cause chain, e.g. "error sending request: connection refused"
fn describe(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
