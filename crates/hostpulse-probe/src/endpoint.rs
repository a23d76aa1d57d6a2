//! Endpoint specification and batch validation.
//!
//! Raw `[[endpoints]]` entries from the configuration are normalized here
//! into immutable, fixed-shape [`EndpointSpec`]s before any probing starts.
//! Validation is fail-fast for the whole batch: one bad or duplicated entry
//! rejects the run with zero probes executed.

use std::collections::HashSet;
use std::time::Duration;

use thiserror::Error;

use hostpulse_core::{EndpointEntry, parse_duration};

/// URL scheme of a probe target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }
}

/// Fully resolved probe target: scheme + host + port + path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl Target {
    /// The `host:port` pair for the Host header. IPv6 hosts are bracketed.
    pub fn authority(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// The full URL, for log and detail output.
    pub fn url(&self) -> String {
        format!("{}://{}{}", self.scheme.as_str(), self.authority(), self.path)
    }
}

/// One validated, immutable endpoint definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSpec {
    /// Unique name within the probe run; the report key.
    pub name: String,
    pub target: Target,
    /// Substring a successful response body must contain. Absent means
    /// any 2xx response is success.
    pub expected: Option<String>,
    /// Per-endpoint probe timeout, always positive.
    pub timeout: Duration,
}

/// Batch validation errors. All fail the entire run before any probing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidateError {
    #[error("invalid endpoint config for {name:?}: {reason}")]
    InvalidConfig { name: String, reason: String },

    #[error("duplicate endpoint name: {0:?}")]
    DuplicateName(String),

    #[error("default timeout must be positive")]
    InvalidDefaultTimeout,
}

impl ValidateError {
    fn invalid(name: &str, reason: impl Into<String>) -> Self {
        ValidateError::InvalidConfig {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Validate a batch of raw endpoint entries into probe-ready specs.
///
/// `default_timeout` applies to entries without their own `timeout` and
/// must be positive.
pub fn validate_endpoints(
    entries: &[EndpointEntry],
    default_timeout: Duration,
) -> Result<Vec<EndpointSpec>, ValidateError> {
    if default_timeout.is_zero() {
        return Err(ValidateError::InvalidDefaultTimeout);
    }

    let mut seen = HashSet::new();
    let mut specs = Vec::with_capacity(entries.len());

    for entry in entries {
        if entry.name.trim().is_empty() {
            return Err(ValidateError::invalid(&entry.name, "name must not be empty"));
        }
        if !seen.insert(entry.name.as_str()) {
            return Err(ValidateError::DuplicateName(entry.name.clone()));
        }

        let target = resolve_target(entry)?;

        let timeout = match &entry.timeout {
            Some(s) => parse_duration(s)
                .map_err(|e| ValidateError::invalid(&entry.name, e.to_string()))?,
            None => default_timeout,
        };
        if timeout.is_zero() {
            return Err(ValidateError::invalid(&entry.name, "timeout must be positive"));
        }

        specs.push(EndpointSpec {
            name: entry.name.clone(),
            target,
            expected: entry.expected.clone(),
            timeout,
        });
    }

    Ok(specs)
}

/// Resolve the url/host/port/path fields into one addressable target.
///
/// `url` takes precedence for scheme and host; an explicit `port` or `path`
/// field overrides the corresponding URL component.
fn resolve_target(entry: &EndpointEntry) -> Result<Target, ValidateError> {
    let (scheme, host, url_port, url_path) = match (&entry.url, &entry.host) {
        (Some(url), _) => parse_url(&entry.name, url)?,
        (None, Some(host)) => (Scheme::Http, host.clone(), None, None),
        (None, None) => {
            return Err(ValidateError::invalid(
                &entry.name,
                "either url or host is required",
            ));
        }
    };

    if host.trim().is_empty() {
        return Err(ValidateError::invalid(&entry.name, "host must not be empty"));
    }
    if host.contains(char::is_whitespace) || host.contains('/') {
        return Err(ValidateError::invalid(
            &entry.name,
            format!("invalid host: {host:?}"),
        ));
    }

    let port = match entry.port.or(url_port) {
        Some(0) => {
            return Err(ValidateError::invalid(&entry.name, "port must be positive"));
        }
        Some(p) => p,
        None => scheme.default_port(),
    };

    let mut path = entry
        .path
        .clone()
        .or(url_path)
        .unwrap_or_else(|| "/".to_string());
    if !path.starts_with('/') {
        path.insert(0, '/');
    }
    if path.contains(char::is_whitespace) {
        return Err(ValidateError::invalid(
            &entry.name,
            format!("invalid path: {path:?}"),
        ));
    }

    Ok(Target {
        scheme,
        host,
        port,
        path,
    })
}

/// Split an http:// or https:// URL into scheme, host, and optional
/// port/path components.
fn parse_url(
    name: &str,
    url: &str,
) -> Result<(Scheme, String, Option<u16>, Option<String>), ValidateError> {
    let (scheme, rest) = if let Some(rest) = url.strip_prefix("http://") {
        (Scheme::Http, rest)
    } else if let Some(rest) = url.strip_prefix("https://") {
        (Scheme::Https, rest)
    } else {
        return Err(ValidateError::invalid(
            name,
            format!("unsupported url scheme: {url:?}"),
        ));
    };

    let (authority, path) = match rest.split_once('/') {
        Some((authority, path)) => (authority, Some(format!("/{path}"))),
        None => (rest, None),
    };

    // Bracketed IPv6 authorities keep their colons inside the brackets;
    // only a colon after the closing bracket introduces a port.
    let (host, port) = if let Some(bracketed) = authority.strip_prefix('[') {
        let (host, after) = bracketed.split_once(']').ok_or_else(|| {
            ValidateError::invalid(name, format!("unclosed ipv6 bracket in url: {authority:?}"))
        })?;
        let port = match after.strip_prefix(':') {
            Some(port) => Some(parse_port(name, port)?),
            None if after.is_empty() => None,
            None => {
                return Err(ValidateError::invalid(
                    name,
                    format!("invalid authority in url: {authority:?}"),
                ));
            }
        };
        (host.to_string(), port)
    } else {
        match authority.rsplit_once(':') {
            Some((host, _)) if host.contains(':') => {
                return Err(ValidateError::invalid(
                    name,
                    format!("ipv6 hosts must be bracketed: {authority:?}"),
                ));
            }
            Some((host, port)) => (host.to_string(), Some(parse_port(name, port)?)),
            None => (authority.to_string(), None),
        }
    };

    Ok((scheme, host, port, path))
}

fn parse_port(name: &str, port: &str) -> Result<u16, ValidateError> {
    port.parse::<u16>()
        .map_err(|_| ValidateError::invalid(name, format!("invalid port in url: {port:?}")))
}
