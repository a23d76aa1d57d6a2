//! hostpulse.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::duration::{DurationError, parse_duration};

/// Top-level audit configuration.
///
/// The endpoint list order is significant: the final report preserves it
/// regardless of probe completion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Run-level timeout, also the default per-endpoint timeout
    /// (e.g. "10s").
    #[serde(default = "default_api_test_timeout")]
    pub api_test_timeout: String,
    /// Ordered endpoint definitions.
    #[serde(default)]
    pub endpoints: Vec<EndpointEntry>,
}

/// One raw endpoint definition, as written in hostpulse.toml.
///
/// Either `url` or `host` must be present; everything else is optional.
/// These entries are normalized into `EndpointSpec`s by the probe engine
/// before any probing starts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndpointEntry {
    /// Unique name, used as the report key.
    pub name: String,
    /// Full target URL (http:// or https://).
    pub url: Option<String>,
    /// Bare hostname or address; combined with `port` and `path`.
    pub host: Option<String>,
    /// Port override; defaults to the scheme port.
    pub port: Option<u16>,
    /// HTTP path to request (default "/").
    #[serde(alias = "endpoint")]
    pub path: Option<String>,
    /// Substring a successful response body must contain.
    #[serde(alias = "expected_result")]
    pub expected: Option<String>,
    /// Per-endpoint timeout override (e.g. "2s").
    pub timeout: Option<String>,
}

fn default_api_test_timeout() -> String {
    "10s".to_string()
}

impl AuditConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AuditConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Parse the run-level timeout string.
    pub fn global_timeout(&self) -> Result<Duration, DurationError> {
        parse_duration(&self.api_test_timeout)
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        AuditConfig {
            api_test_timeout: default_api_test_timeout(),
            endpoints: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parse_minimal() {
        let toml_str = r#"
[[endpoints]]
name = "gateway"
url = "http://10.0.0.5:8080/healthz"
"#;
        let config: AuditConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api_test_timeout, "10s");
        assert_eq!(config.endpoints.len(), 1);
        assert_eq!(config.endpoints[0].name, "gateway");
        assert_eq!(
            config.endpoints[0].url.as_deref(),
            Some("http://10.0.0.5:8080/healthz")
        );
    }

    #[test]
    fn parse_full_entry_with_aliases() {
        let toml_str = r#"
api_test_timeout = "5s"

[[endpoints]]
name = "registry"
host = "registry.internal"
port = 5000
endpoint = "/v2/"
expected_result = "{}"
timeout = "2s"
"#;
        let config: AuditConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.global_timeout(), Ok(Duration::from_secs(5)));
        let entry = &config.endpoints[0];
        assert_eq!(entry.host.as_deref(), Some("registry.internal"));
        assert_eq!(entry.port, Some(5000));
        assert_eq!(entry.path.as_deref(), Some("/v2/"));
        assert_eq!(entry.expected.as_deref(), Some("{}"));
        assert_eq!(entry.timeout.as_deref(), Some("2s"));
    }

    #[test]
    fn endpoint_order_is_preserved() {
        let toml_str = r#"
[[endpoints]]
name = "a"
url = "http://a/"

[[endpoints]]
name = "b"
url = "http://b/"

[[endpoints]]
name = "c"
url = "http://c/"
"#;
        let config: AuditConfig = toml::from_str(toml_str).unwrap();
        let names: Vec<&str> = config.endpoints.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn from_file_roundtrip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_test_timeout = \"3s\"").unwrap();
        let config = AuditConfig::from_file(file.path()).unwrap();
        assert_eq!(config.global_timeout(), Ok(Duration::from_secs(3)));
        assert!(config.endpoints.is_empty());
    }

    #[test]
    fn from_file_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "endpoints = \"not a table\"").unwrap();
        assert!(AuditConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn missing_name_is_a_parse_error() {
        let toml_str = r#"
[[endpoints]]
url = "http://a/"
"#;
        assert!(toml::from_str::<AuditConfig>(toml_str).is_err());
    }
}
