//! Fan-out probe coordination.
//!
//! Runs one probe task per endpoint, enforces the run-level deadline, and
//! always produces exactly one verdict per configured endpoint. Probes own
//! their spec and connection exclusively; results flow back through the
//! join set, never through shared mutable state.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::classify::{CANCELLED_DETAIL, classify};
use crate::endpoint::EndpointSpec;
use crate::probe::probe_endpoint;
use crate::report::{HealthState, Report, Verdict};

/// How long after cancellation probes get to report back before being
/// aborted and force-classified.
const CANCEL_GRACE: Duration = Duration::from_millis(250);

/// Probe every endpoint concurrently and assemble the report.
///
/// Never blocks past `global_timeout` plus a short grace period: when the
/// deadline fires, still-pending probes are cancelled, and any that fail
/// to wind down within the grace are aborted and reported as unreachable.
/// Verdict order is configuration order, independent of completion order.
pub async fn run_audit(specs: Vec<EndpointSpec>, global_timeout: Duration) -> Report {
    let started = Instant::now();
    let deadline = started + global_timeout;
    let grace_deadline = deadline + CANCEL_GRACE;

    info!(
        endpoints = specs.len(),
        timeout = ?global_timeout,
        "audit run starting"
    );

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let names: Vec<String> = specs.iter().map(|s| s.name.clone()).collect();

    let mut tasks = JoinSet::new();
    for (idx, spec) in specs.into_iter().enumerate() {
        let cancel = cancel_rx.clone();
        tasks.spawn(async move {
            let outcome = probe_endpoint(&spec, cancel).await;
            (idx, classify(&spec, outcome))
        });
    }
    drop(cancel_rx);

    let mut collected: Vec<(usize, Verdict)> = Vec::with_capacity(names.len());
    let mut resolved = vec![false; names.len()];
    let mut cancelled = false;
    let mut aborted = false;

    while !tasks.is_empty() {
        tokio::select! {
            joined = tasks.join_next() => {
                match joined {
                    Some(Ok((idx, verdict))) => {
                        resolved[idx] = true;
                        collected.push((idx, verdict));
                    }
                    Some(Err(e)) if e.is_cancelled() => {}
                    Some(Err(e)) => warn!(error = %e, "probe task panicked"),
                    None => break,
                }
            }
            _ = tokio::time::sleep_until(deadline), if !cancelled => {
                debug!(outstanding = tasks.len(), "global deadline reached, cancelling pending probes");
                let _ = cancel_tx.send(true);
                cancelled = true;
            }
            _ = tokio::time::sleep_until(grace_deadline), if cancelled && !aborted => {
                warn!(outstanding = tasks.len(), "probes unresponsive after cancellation grace, aborting");
                tasks.abort_all();
                aborted = true;
            }
        }
    }

    // Any probe that never reported back is force-classified as cancelled.
    for (idx, resolved) in resolved.into_iter().enumerate() {
        if !resolved {
            collected.push((
                idx,
                Verdict {
                    endpoint: names[idx].clone(),
                    state: HealthState::Unreachable,
                    detail: CANCELLED_DETAIL.to_string(),
                    elapsed: global_timeout,
                },
            ));
        }
    }

    let report = Report::assemble(collected);
    info!(
        healthy = report.count(HealthState::Healthy),
        degraded = report.count(HealthState::Degraded),
        unreachable = report.count(HealthState::Unreachable),
        overall = report.overall,
        elapsed = ?started.elapsed(),
        "audit run finished"
    );
    report
}
