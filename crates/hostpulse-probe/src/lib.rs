//! hostpulse-probe — the service health probe engine.
//!
//! Given an ordered list of named HTTP(S) endpoints, probes them all
//! concurrently under a run-level deadline and classifies each as healthy,
//! degraded, or unreachable.
//!
//! # Architecture
//!
//! ```text
//! validate_endpoints()          fail-fast batch validation
//!   └── run_audit()             one tokio task per endpoint
//!         ├── probe_endpoint()  single bounded GET round trip → ProbeOutcome
//!         ├── classify()        pure (spec, outcome) → Verdict
//!         └── Report::assemble  configuration-order report + overall flag
//! ```
//!
//! # Failure model
//!
//! Endpoint-level problems (DNS, refused connections, TLS failures, stalled
//! reads, timeouts, run-level cancellation) never escape the engine; each
//! becomes an `unreachable` verdict with the cause in its detail string.
//! Only batch-level configuration errors are returned to the caller, before
//! any probe is launched.

pub mod classify;
pub mod endpoint;
pub mod probe;
pub mod report;
pub mod runner;

pub use classify::classify;
pub use endpoint::{EndpointSpec, Scheme, Target, ValidateError, validate_endpoints};
pub use probe::{FailureCause, ProbeOutcome, ProbeStatus, probe_endpoint};
pub use report::{HealthState, Report, Verdict};
pub use runner::run_audit;
