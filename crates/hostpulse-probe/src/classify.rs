//! Pure outcome classification.
//!
//! Maps a raw [`ProbeOutcome`] plus the endpoint's expectations to a
//! [`Verdict`]. No I/O, no hidden state: the same inputs always produce
//! the same verdict.

use crate::endpoint::EndpointSpec;
use crate::probe::{ProbeOutcome, ProbeStatus};
use crate::report::{HealthState, Verdict};

/// Detail string for probes cut off by the run-level deadline.
pub(crate) const CANCELLED_DETAIL: &str = "cancelled: global timeout exceeded";

/// Classify one probe outcome against its endpoint's expectations.
///
/// - 2xx with a matching (or absent) body expectation → healthy.
/// - 2xx with an unmatched expectation, or any non-2xx response → degraded.
/// - Timeout, connection failure, or cancellation → unreachable.
///
/// The detail string always carries the discriminating fact: status code,
/// matched/missing expectation, or failure cause.
pub fn classify(spec: &EndpointSpec, outcome: ProbeOutcome) -> Verdict {
    let (state, detail) = match &outcome.status {
        ProbeStatus::Responded { code, body } => {
            if (200..300).contains(code) {
                match &spec.expected {
                    None => (HealthState::Healthy, format!("status {code}")),
                    Some(want) if body.contains(want.as_str()) => (
                        HealthState::Healthy,
                        format!("status {code}, body matched {want:?}"),
                    ),
                    Some(want) => (
                        HealthState::Degraded,
                        format!("status {code}, body missing {want:?}"),
                    ),
                }
            } else {
                (HealthState::Degraded, format!("status {code}"))
            }
        }
        ProbeStatus::TimedOut => (
            HealthState::Unreachable,
            format!("timeout after {:?}", outcome.elapsed),
        ),
        ProbeStatus::ConnectionFailed(cause) => (HealthState::Unreachable, cause.to_string()),
        ProbeStatus::Cancelled => (HealthState::Unreachable, CANCELLED_DETAIL.to_string()),
    };

    Verdict {
        endpoint: spec.name.clone(),
        state,
        detail,
        elapsed: outcome.elapsed,
    }
}
