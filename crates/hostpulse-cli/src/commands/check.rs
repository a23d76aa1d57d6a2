use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use tracing::info;

use hostpulse_core::{AuditConfig, parse_duration};
use hostpulse_probe::{Report, run_audit, validate_endpoints};

pub async fn run(
    config_path: &str,
    format: &str,
    timeout_override: Option<&str>,
) -> anyhow::Result<ExitCode> {
    let config = AuditConfig::from_file(Path::new(config_path))
        .with_context(|| format!("failed to load {config_path}"))?;

    let global_timeout = resolve_timeout(&config, timeout_override)?;
    let specs = validate_endpoints(&config.endpoints, global_timeout)?;
    info!(
        config = config_path,
        endpoints = specs.len(),
        timeout = ?global_timeout,
        "starting audit"
    );

    let report = run_audit(specs, global_timeout).await;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "text" => print_text(&report),
        other => anyhow::bail!("unknown output format: {other:?} (expected text or json)"),
    }

    Ok(if report.overall {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// The run-level timeout, which also serves as the default per-endpoint
/// timeout: CLI override first, then `api_test_timeout` from the config.
fn resolve_timeout(
    config: &AuditConfig,
    timeout_override: Option<&str>,
) -> anyhow::Result<Duration> {
    let timeout = match timeout_override {
        Some(s) => parse_duration(s)?,
        None => config.global_timeout()?,
    };
    anyhow::ensure!(!timeout.is_zero(), "timeout must be positive");
    Ok(timeout)
}

fn print_text(report: &Report) {
    for v in &report.verdicts {
        println!(
            "{:<24} {:<12} {:>6}ms  {}",
            v.endpoint,
            v.state,
            v.elapsed.as_millis(),
            v.detail
        );
    }
    println!(
        "overall: {}",
        if report.overall { "healthy" } else { "unhealthy" }
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn timeout_override_beats_config() {
        let config = AuditConfig {
            api_test_timeout: "10s".to_string(),
            endpoints: Vec::new(),
        };
        assert_eq!(
            resolve_timeout(&config, Some("2s")).unwrap(),
            Duration::from_secs(2)
        );
        assert_eq!(
            resolve_timeout(&config, None).unwrap(),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = AuditConfig::default();
        assert!(resolve_timeout(&config, Some("0s")).is_err());
    }

    #[tokio::test]
    async fn missing_config_file_fails() {
        let result = run("/nonexistent/hostpulse.toml", "text", None).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn invalid_endpoint_fails_before_probing() {
        let file = write_config(
            r#"
[[endpoints]]
name = "broken"
"#,
        );
        let result = run(file.path().to_str().unwrap(), "text", None).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn unknown_format_is_rejected() {
        let file = write_config("api_test_timeout = \"1s\"\n");
        let result = run(file.path().to_str().unwrap(), "yaml", None).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn empty_config_reports_healthy() {
        let file = write_config("api_test_timeout = \"1s\"\n");
        let result = run(file.path().to_str().unwrap(), "json", None).await;
        assert!(result.is_ok());
    }
}
