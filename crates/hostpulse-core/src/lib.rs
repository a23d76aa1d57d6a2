//! hostpulse-core — configuration and shared domain plumbing for hostpulse.
//!
//! Parses the `hostpulse.toml` audit configuration (global timeout plus the
//! ordered `[[endpoints]]` list) and provides human-duration parsing used
//! throughout the workspace. Endpoint entries are kept raw here; the probe
//! engine validates them into fixed-shape specs at its boundary.

pub mod config;
pub mod duration;

pub use config::{AuditConfig, EndpointEntry};
pub use duration::{DurationError, parse_duration};
