//! Fetch error types
//!
//! Every way a single repository poll can fail. Errors are recovered at the
//! granularity of one watch target and rendered inline by the dashboard.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of body characters kept in an error detail
const BODY_PREFIX_CHARS: usize = 200;

/// Category of a failed fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FetchErrorKind {
    /// Transport failure or an unexpected HTTP status
    Network,

    /// The provider rejected the credential (401/403)
    AuthFailure,

    /// The provider asked us to slow down (429)
    RateLimited,

    /// The response could not be parsed into runs
    Malformed,

    /// The request or the poll cycle ran out of time
    Timeout,
}

impl std::fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchErrorKind::Network => write!(f, "network error"),
            FetchErrorKind::AuthFailure => write!(f, "authentication failed"),
            FetchErrorKind::RateLimited => write!(f, "rate limited"),
            FetchErrorKind::Malformed => write!(f, "malformed response"),
            FetchErrorKind::Timeout => write!(f, "timed out"),
        }
    }
}

/// A failed fetch for one watch target
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {detail}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub detail: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn network(detail: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Network, detail)
    }

    pub fn auth_failure(detail: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::AuthFailure, detail)
    }

    pub fn rate_limited(detail: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::RateLimited, detail)
    }

    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Malformed, detail)
    }

    pub fn timeout(detail: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Timeout, detail)
    }

    /// Classifies a non-success HTTP response
    ///
    /// 401/403 become `AuthFailure`, 429 becomes `RateLimited`, anything else
    /// is a `Network` error carrying the status and the start of the body.
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = format!("status {}: {}", status, body_prefix(body.trim()));
        match status {
            401 | 403 => Self::auth_failure(detail),
            429 => Self::rate_limited(detail),
            _ => Self::network(detail),
        }
    }

    /// Check if this error came from the provider rejecting the credential
    pub fn is_auth_failure(&self) -> bool {
        self.kind == FetchErrorKind::AuthFailure
    }

    /// Check if this error is a timeout (request-level or cycle-level)
    pub fn is_timeout(&self) -> bool {
        self.kind == FetchErrorKind::Timeout
    }
}

fn body_prefix(body: &str) -> &str {
    match body.char_indices().nth(BODY_PREFIX_CHARS) {
        Some((end, _)) => &body[..end],
        None => body,
    }
}
