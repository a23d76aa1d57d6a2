//! Single-endpoint probe execution.
//!
//! One probe is exactly one GET round trip against the resolved target,
//! bounded by the endpoint's timeout and by the coordinator's cancellation
//! signal. The executor never returns an error past this boundary: every
//! failure mode collapses into a [`ProbeOutcome`] for the classifier.
//!
//! The attempt runs in explicit stages — DNS lookup, TCP connect, TLS
//! handshake (https only), HTTP/1.1 exchange, bounded body read — so each
//! failure maps to a distinct [`FailureCause`] for diagnosis.

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_rustls::TlsConnector;
use tracing::debug;

use crate::endpoint::{EndpointSpec, Scheme};

/// Response bodies are read up to this many bytes and then truncated.
pub const BODY_CAP: usize = 64 * 1024;

/// Margin reserved from the endpoint deadline for the body read budget,
/// so a stalled body read resolves as `ReadTimeout` instead of racing the
/// attempt-level deadline.
const BODY_READ_MARGIN: Duration = Duration::from_millis(10);

/// Why a probe failed before a complete response was received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    /// DNS resolution failed or returned no addresses.
    Dns(String),
    /// TCP connect failed (refused, unreachable, reset).
    Refused(String),
    /// TLS handshake failed.
    Tls(String),
    /// The response started but the body stalled past the deadline.
    ReadTimeout,
    /// The peer closed the connection mid-exchange.
    UnexpectedEof,
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::Dns(e) => write!(f, "dns resolution failed: {e}"),
            FailureCause::Refused(e) => write!(f, "connection refused: {e}"),
            FailureCause::Tls(e) => write!(f, "tls handshake failed: {e}"),
            FailureCause::ReadTimeout => write!(f, "read timeout"),
            FailureCause::UnexpectedEof => write!(f, "unexpected eof"),
        }
    }
}

/// Terminal state of one probe attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStatus {
    /// A complete response arrived within the timeout.
    Responded { code: u16, body: String },
    /// No complete response within the endpoint timeout.
    TimedOut,
    /// The attempt failed before or during the exchange.
    ConnectionFailed(FailureCause),
    /// The coordinator's run-level deadline fired first.
    Cancelled,
}

/// Raw outcome of one probe attempt, consumed by the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub elapsed: Duration,
    pub status: ProbeStatus,
}

/// Probe one endpoint: a single bounded GET round trip.
///
/// Returns when the attempt completes, the endpoint timeout elapses, or
/// `cancel` flips to true — whichever happens first. Dropping the attempt
/// future tears down its connection, so no network resource outlives this
/// call.
pub async fn probe_endpoint(
    spec: &EndpointSpec,
    cancel: watch::Receiver<bool>,
) -> ProbeOutcome {
    let started = Instant::now();
    let deadline = started + spec.timeout;

    let status = tokio::select! {
        status = attempt(spec, deadline) => status,
        _ = tokio::time::sleep_until(deadline) => {
            debug!(endpoint = %spec.name, timeout = ?spec.timeout, "probe timed out");
            ProbeStatus::TimedOut
        }
        _ = wait_cancelled(cancel) => {
            debug!(endpoint = %spec.name, "probe cancelled");
            ProbeStatus::Cancelled
        }
    };

    ProbeOutcome {
        elapsed: started.elapsed(),
        status,
    }
}

/// Resolve when the cancellation flag flips to true. If the sender is
/// dropped without cancelling, stay pending so the select resolves via the
/// attempt or its timeout.
async fn wait_cancelled(mut cancel: watch::Receiver<bool>) {
    loop {
        if *cancel.borrow() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// The staged probe attempt: DNS → connect → (TLS) → HTTP exchange.
async fn attempt(spec: &EndpointSpec, deadline: Instant) -> ProbeStatus {
    let target = &spec.target;

    let addr = match tokio::net::lookup_host((target.host.as_str(), target.port)).await {
        Ok(mut addrs) => match addrs.next() {
            Some(addr) => addr,
            None => {
                debug!(endpoint = %spec.name, host = %target.host, "no addresses resolved");
                return ProbeStatus::ConnectionFailed(FailureCause::Dns(format!(
                    "no addresses for {}",
                    target.host
                )));
            }
        },
        Err(e) => {
            debug!(endpoint = %spec.name, host = %target.host, error = %e, "dns lookup failed");
            return ProbeStatus::ConnectionFailed(FailureCause::Dns(e.to_string()));
        }
    };

    let stream = match TcpStream::connect(addr).await {
        Ok(s) => s,
        Err(e) => {
            debug!(endpoint = %spec.name, %addr, error = %e, "tcp connect failed");
            return ProbeStatus::ConnectionFailed(FailureCause::Refused(e.to_string()));
        }
    };

    let exchanged = match target.scheme {
        Scheme::Http => exchange(stream, spec, deadline).await,
        Scheme::Https => {
            let server_name =
                match rustls::pki_types::ServerName::try_from(target.host.clone()) {
                    Ok(name) => name,
                    Err(e) => {
                        return ProbeStatus::ConnectionFailed(FailureCause::Tls(
                            e.to_string(),
                        ));
                    }
                };
            let connector = TlsConnector::from(tls_client_config());
            match connector.connect(server_name, stream).await {
                Ok(tls) => exchange(tls, spec, deadline).await,
                Err(e) => {
                    debug!(endpoint = %spec.name, error = %e, "tls handshake failed");
                    return ProbeStatus::ConnectionFailed(FailureCause::Tls(e.to_string()));
                }
            }
        }
    };

    match exchanged {
        Ok((code, body)) => {
            debug!(endpoint = %spec.name, code, "probe responded");
            ProbeStatus::Responded { code, body }
        }
        Err(cause) => {
            debug!(endpoint = %spec.name, %cause, "probe exchange failed");
            ProbeStatus::ConnectionFailed(cause)
        }
    }
}

/// Drive one HTTP/1.1 GET over an established stream and read the response
/// body up to [`BODY_CAP`].
async fn exchange<T>(
    stream: T,
    spec: &EndpointSpec,
    deadline: Instant,
) -> Result<(u16, String), FailureCause>
where
    T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let io = TokioIo::new(stream);
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(|_| FailureCause::UnexpectedEof)?;

    // Drive the connection in the background; it winds down when the
    // sender is dropped.
    tokio::spawn(async move {
        let _ = conn.await;
    });

    let req = http::Request::builder()
        .method(http::Method::GET)
        .uri(spec.target.path.as_str())
        .header(http::header::HOST, spec.target.authority())
        .header(
            http::header::USER_AGENT,
            concat!("hostpulse/", env!("CARGO_PKG_VERSION")),
        )
        .body(Empty::<Bytes>::new())
        .expect("request parts are validated at endpoint validation");

    let resp = sender
        .send_request(req)
        .await
        .map_err(|_| FailureCause::UnexpectedEof)?;
    let code = resp.status().as_u16();

    // Headers are in; the rest of the deadline (minus a small margin, so a
    // stall resolves here rather than racing the attempt deadline) becomes
    // the body read budget.
    let budget = deadline
        .saturating_duration_since(Instant::now())
        .saturating_sub(BODY_READ_MARGIN);

    let body = tokio::time::timeout(budget, read_capped(resp.into_body()))
        .await
        .map_err(|_| FailureCause::ReadTimeout)??;

    Ok((code, body))
}

/// Read body frames until EOF or the size cap, lossily decoding to UTF-8.
async fn read_capped(mut body: hyper::body::Incoming) -> Result<String, FailureCause> {
    let mut buf: Vec<u8> = Vec::new();

    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(|_| FailureCause::UnexpectedEof)?;
        if let Some(data) = frame.data_ref() {
            buf.extend_from_slice(data);
            if buf.len() >= BODY_CAP {
                buf.truncate(BODY_CAP);
                break;
            }
        }
    }

    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Shared rustls client configuration with the Mozilla root store.
fn tls_client_config() -> Arc<rustls::ClientConfig> {
    static CONFIG: OnceLock<Arc<rustls::ClientConfig>> = OnceLock::new();
    CONFIG
        .get_or_init(|| {
            let mut root_store = rustls::RootCertStore::empty();
            root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

            let config = rustls::ClientConfig::builder_with_provider(
                rustls::crypto::ring::default_provider().into(),
            )
            .with_safe_default_protocol_versions()
            .expect("ring provider supports the default protocol versions")
            .with_root_certificates(root_store)
            .with_no_client_auth();

            Arc::new(config)
        })
        .clone()
}
