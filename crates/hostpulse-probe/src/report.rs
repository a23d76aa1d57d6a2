//! Verdicts and the assembled audit report.

use std::fmt;
use std::time::Duration;

use serde::{Serialize, Serializer};

/// Classified health state for one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Healthy,
    Degraded,
    Unreachable,
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HealthState::Healthy => "healthy",
            HealthState::Degraded => "degraded",
            HealthState::Unreachable => "unreachable",
        };
        f.write_str(s)
    }
}

/// The classifier's judgment for one endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub endpoint: String,
    pub state: HealthState,
    /// Human-readable discriminating fact: status code, expectation
    /// match, or failure cause.
    pub detail: String,
    #[serde(rename = "elapsed_ms", serialize_with = "ser_millis")]
    pub elapsed: Duration,
}

/// Aggregate result of one audit run: exactly one verdict per configured
/// endpoint, in configuration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub verdicts: Vec<Verdict>,
    /// True only if every verdict is healthy (degraded counts as failure;
    /// callers wanting a softer policy can inspect the states themselves).
    pub overall: bool,
}

impl Report {
    /// Assemble a report from verdicts tagged with their configuration
    /// index, restoring configuration order regardless of completion order.
    pub fn assemble(mut indexed: Vec<(usize, Verdict)>) -> Report {
        indexed.sort_by_key(|(idx, _)| *idx);
        let verdicts: Vec<Verdict> = indexed.into_iter().map(|(_, v)| v).collect();
        let overall = verdicts.iter().all(|v| v.state == HealthState::Healthy);
        Report { verdicts, overall }
    }

    /// Number of verdicts in the given state.
    pub fn count(&self, state: HealthState) -> usize {
        self.verdicts.iter().filter(|v| v.state == state).count()
    }
}

fn ser_millis<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}
