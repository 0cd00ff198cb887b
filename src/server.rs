//! HTTP Surface
//!
//! Metrics, health checks and the usage-report ingress for a running
//! orchestrator.
//!
//! | Route | Method | Response |
//! |---|---|---|
//! | `/healthz`, `/livez` | any | `200 ok` |
//! | `/readyz` | any | `200` while monitoring, `503` when stopped |
//! | `/metrics` | any | Prometheus text exposition |
//! | `/stats` | any | JSON [`StatsSnapshot`](crate::StatsSnapshot) |
//! | `/warm` | any | JSON array of warm resource ids |
//! | `/usage?resource=<id>&task=<task_type>` | `POST` | `202`, or `400` on a bad report |

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode, Uri};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::domain::{ResourceId, TaskType};
use crate::error::{Error, Result};
use crate::metrics::PrewarmMetrics;
use crate::prewarm::Orchestrator;

// =============================================================================
// Usage Reports
// =============================================================================

/// A usage report decoded from a query string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageReport {
    pub resource: ResourceId,
    pub task_type: TaskType,
}

impl UsageReport {
    /// Parse `resource=<id>&task=<task_type>`. Unknown keys are ignored.
    pub fn from_query(query: &str) -> Result<Self> {
        let mut resource = None;
        let mut task_type = None;

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, raw) = pair.split_once('=').unwrap_or((pair, ""));
            let raw = raw.replace('+', " ");
            let value = urlencoding::decode(&raw)
                .map_err(|e| Error::InvalidRequest(format!("{} is not valid UTF-8: {}", key, e)))?;

            match key {
                "resource" => resource = Some(value.parse::<ResourceId>()?),
                "task" => task_type = Some(value.parse::<TaskType>()?),
                _ => {}
            }
        }

        Ok(Self {
            resource: resource
                .ok_or_else(|| Error::InvalidRequest("missing resource".to_string()))?,
            task_type: task_type
                .ok_or_else(|| Error::InvalidRequest("missing task".to_string()))?,
        })
    }
}

// =============================================================================
// Server
// =============================================================================

/// Serve the HTTP surface until the listener fails.
pub async fn serve(
    addr: &str,
    orchestrator: Arc<Orchestrator>,
    metrics: Arc<PrewarmMetrics>,
) -> Result<()> {
    let addr: SocketAddr = addr
        .parse()
        .map_err(|e| Error::Config(format!("Invalid metrics server address: {}", e)))?;

    let listener = TcpListener::bind(addr).await?;

    info!("Metrics server listening on {}", addr);

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let orchestrator = Arc::clone(&orchestrator);
        let metrics = Arc::clone(&metrics);

        tokio::spawn(async move {
            let service = service_fn(move |req: Request<Incoming>| {
                let response = route(req.method(), req.uri(), &orchestrator, &metrics);
                async move { Ok::<_, Infallible>(response) }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                error!("Metrics server connection error: {}", e);
            }
        });
    }
}

/// Dispatch a request by method and path
pub fn route(
    method: &Method,
    uri: &Uri,
    orchestrator: &Orchestrator,
    metrics: &PrewarmMetrics,
) -> Response<Full<Bytes>> {
    match uri.path() {
        "/healthz" | "/livez" => respond(StatusCode::OK, "text/plain", "ok"),
        "/readyz" => {
            if orchestrator.is_monitoring() {
                respond(StatusCode::OK, "text/plain", "ok")
            } else {
                respond(StatusCode::SERVICE_UNAVAILABLE, "text/plain", "stopped")
            }
        }
        "/metrics" => {
            metrics.update(
                &orchestrator.stats(),
                orchestrator.get_warm_resources().len(),
            );
            match metrics.encode() {
                Ok(body) => respond(StatusCode::OK, metrics.content_type(), body),
                Err(e) => {
                    error!("Failed to encode metrics: {}", e);
                    respond(StatusCode::INTERNAL_SERVER_ERROR, "text/plain", "error")
                }
            }
        }
        "/stats" => json(serde_json::to_vec(&orchestrator.stats())),
        "/warm" => json(serde_json::to_vec(&orchestrator.get_warm_resources())),
        "/usage" if *method == Method::POST => {
            match UsageReport::from_query(uri.query().unwrap_or_default()) {
                Ok(report) => {
                    orchestrator.record_usage(&report.resource, report.task_type);
                    respond(StatusCode::ACCEPTED, "text/plain", "recorded")
                }
                Err(e) => {
                    debug!("Rejected usage report: {}", e);
                    respond(StatusCode::BAD_REQUEST, "text/plain", e.to_string())
                }
            }
        }
        "/usage" => respond(StatusCode::METHOD_NOT_ALLOWED, "text/plain", "use POST"),
        _ => respond(StatusCode::NOT_FOUND, "text/plain", "not found"),
    }
}

fn json(body: serde_json::Result<Vec<u8>>) -> Response<Full<Bytes>> {
    match body {
        Ok(body) => respond(StatusCode::OK, "application/json", body),
        Err(e) => {
            error!("Failed to serialize response: {}", e);
            respond(StatusCode::INTERNAL_SERVER_ERROR, "text/plain", "error")
        }
    }
}

fn respond(
    status: StatusCode,
    content_type: &'static str,
    body: impl Into<Bytes>,
) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

// =============================================================================
// Tests
// =============================================================================
