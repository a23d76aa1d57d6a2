//! Human duration strings ("10s", "500ms", "2m", bare seconds).

use std::time::Duration;
use thiserror::Error;

/// Errors from parsing a human duration string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DurationError {
    #[error("invalid duration: {0:?}")]
    Invalid(String),
}

/// Parse a duration string like "10s", "500ms", "2m", or a bare number
/// of seconds.
///
/// A zero value parses successfully; callers that require a positive
/// duration reject it at validation time.
pub fn parse_duration(s: &str) -> Result<Duration, DurationError> {
    let s = s.trim();

    let parsed = if let Some(ms) = s.strip_suffix("ms") {
        ms.trim().parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.trim().parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.trim().parse::<u64>().ok().map(|m| Duration::from_secs(m * 60))
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    };

    parsed.ok_or_else(|| DurationError::Invalid(s.to_string()))
}
