//! Status normalization
//!
//! Maps a provider's raw `(state, outcome)` pair and timestamp into the
//! canonical [`RunStatus`] and a UTC instant. The status mapping is pure and
//! total; only the timestamp can be rejected, and callers surface that as a
//! malformed response rather than substituting a clock reading.

use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;

use crate::domain::run::RunStatus;

/// Exact timestamp layout accepted from providers
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// A provider timestamp that does not match [`TIMESTAMP_FORMAT`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed timestamp {raw:?}, expected YYYY-MM-DDTHH:MM:SSZ")]
pub struct MalformedTimestamp {
    pub raw: String,
}

/// Maps a raw state and optional outcome to a [`RunStatus`]
///
/// Unrecognized terminal outcomes fail closed: anything that is not an
/// explicit success or cancellation is reported as a failure.
pub fn normalize_status(raw_state: &str, raw_outcome: Option<&str>) -> RunStatus {
    match raw_state {
        "queued" | "waiting" | "pending" => RunStatus::Pending,
        "in_progress" => RunStatus::Running,
        _ => match raw_outcome {
            Some("success") => RunStatus::Success,
            Some("cancelled") => RunStatus::Cancelled,
            _ => RunStatus::Failure,
        },
    }
}

/// Parses a provider timestamp as a UTC instant
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, MalformedTimestamp> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| MalformedTimestamp {
            raw: raw.to_string(),
        })
}

/// Normalizes one raw run record into a status and an instant
pub fn normalize(
    raw_state: &str,
    raw_outcome: Option<&str>,
    raw_timestamp: &str,
) -> Result<(RunStatus, DateTime<Utc>), MalformedTimestamp> {
    let updated_at = parse_timestamp(raw_timestamp)?;
    Ok((normalize_status(raw_state, raw_outcome), updated_at))
}
