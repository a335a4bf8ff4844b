//! HTTP status endpoint.
//!
//! Serves a small status page, the rendered chart artifact, a JSON status
//! snapshot, a health probe, and the Prometheus metrics text. The server
//! is peripheral: it only reads shared state and its failure never stops
//! the monitor loop.

use crate::models::RoundResult;
use crate::{Error, Result};
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tower_http::trace::TraceLayer;

/// Shared, concurrently readable view of the monitor's progress.
///
/// The monitor loop is the only writer; handler reads take the lock
/// briefly to clone a snapshot.
#[derive(Debug)]
pub struct StatusState {
    resource: String,
    labels: Vec<String>,
    inner: RwLock<Progress>,
}

#[derive(Debug, Default, Clone)]
struct Progress {
    rounds: u64,
    last_counts: Vec<u64>,
    last_listed: usize,
    last_skipped: usize,
    updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Serializable snapshot of [`StatusState`].
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    /// Monitored resource name.
    pub resource: String,
    /// Category labels, in lexicon order.
    pub labels: Vec<String>,
    /// Rounds completed since startup.
    pub rounds: u64,
    /// Last round's per-category counts (empty before the first round).
    pub last_counts: Vec<u64>,
    /// Items listed in the last round.
    pub last_listed: usize,
    /// Items skipped in the last round.
    pub last_skipped: usize,
    /// When the last round completed (RFC 3339), if any.
    pub updated_at: Option<String>,
}

impl StatusState {
    /// Creates fresh state for a resource and its category labels.
    #[must_use]
    pub fn new(resource: impl Into<String>, labels: Vec<String>) -> Self {
        Self {
            resource: resource.into(),
            labels,
            inner: RwLock::new(Progress::default()),
        }
    }

    /// Records one completed round.
    pub fn record_round(&self, result: &RoundResult) {
        let mut inner = self
            .inner
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.rounds += 1;
        inner.last_counts = result.counts.clone();
        inner.last_listed = result.items_listed;
        inner.last_skipped = result.items_skipped;
        inner.updated_at = Some(chrono::Utc::now());
    }

    /// Takes a point-in-time snapshot.
    #[must_use]
    pub fn snapshot(&self) -> StatusSnapshot {
        let inner = self
            .inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();
        StatusSnapshot {
            resource: self.resource.clone(),
            labels: self.labels.clone(),
            rounds: inner.rounds,
            last_counts: inner.last_counts,
            last_listed: inner.last_listed,
            last_skipped: inner.last_skipped,
            updated_at: inner.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Shared state handed to every handler.
struct ServerState {
    status: Arc<StatusState>,
    chart_path: PathBuf,
    metrics: Option<PrometheusHandle>,
}

/// The status HTTP server.
pub struct StatusServer {
    listen_addr: String,
    state: Arc<ServerState>,
}

impl StatusServer {
    /// Creates a server for the given listen address and shared state.
    #[must_use]
    pub fn new(
        listen_addr: impl Into<String>,
        status: Arc<StatusState>,
        chart_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            state: Arc::new(ServerState {
                status,
                chart_path: chart_path.into(),
                metrics: None,
            }),
        }
    }

    /// Attaches a Prometheus handle, enabling `GET /metrics`.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.state = Arc::new(ServerState {
            status: Arc::clone(&self.state.status),
            chart_path: self.state.chart_path.clone(),
            metrics: Some(handle),
        });
        self
    }

    /// Binds the listener and serves until the process exits.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot bind or the server fails.
    pub async fn serve(self) -> Result<()> {
        let app = router(self.state);

        let listener = tokio::net::TcpListener::bind(&self.listen_addr)
            .await
            .map_err(|e| Error::operation("bind_status_server", e))?;
        tracing::info!(addr = %self.listen_addr, "status server listening");

        axum::serve(listener, app)
            .await
            .map_err(|e| Error::operation("serve_status", e))
    }
}

fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/chart.svg", get(chart))
        .route("/status.json", get(status_json))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics_text))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index(State(state): State<Arc<ServerState>>) -> Html<String> {
    let snapshot = state.status.snapshot();

    let mut rows = String::new();
    for (index, label) in snapshot.labels.iter().enumerate() {
        let count = snapshot.last_counts.get(index).copied().unwrap_or(0);
        let _ = write!(rows, "<tr><td>{label}</td><td>{count}</td></tr>");
    }
    let updated = snapshot.updated_at.as_deref().unwrap_or("never");

    Html(format!(
        "<!DOCTYPE html><html><head><title>lexmon: {resource}</title></head><body>\
         <h1>lexmon: {resource}</h1>\
         <p>rounds: {rounds} | last round: {listed} items, {skipped} skipped | updated: {updated}</p>\
         <table border=\"1\"><tr><th>category</th><th>last count</th></tr>{rows}</table>\
         <p><img src=\"/chart.svg\" alt=\"trend chart\"/></p>\
         </body></html>",
        resource = snapshot.resource,
        rounds = snapshot.rounds,
        listed = snapshot.last_listed,
        skipped = snapshot.last_skipped,
    ))
}

async fn chart(State(state): State<Arc<ServerState>>) -> Response {
    match tokio::fs::read(&state.chart_path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "image/svg+xml")], bytes).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "chart not rendered yet").into_response(),
    }
}

async fn status_json(State(state): State<Arc<ServerState>>) -> Json<StatusSnapshot> {
    Json(state.status.snapshot())
}

async fn healthz() -> &'static str {
    "ok"
}

async fn metrics_text(State(state): State<Arc<ServerState>>) -> Response {
    state.metrics.as_ref().map_or_else(
        || (StatusCode::NOT_FOUND, "metrics not enabled").into_response(),
        |handle| handle.render().into_response(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_state(chart_path: PathBuf) -> Arc<ServerState> {
        let status = Arc::new(StatusState::new(
            "demo-page",
            vec!["A".to_string(), "B".to_string()],
        ));
        status.record_round(&RoundResult {
            counts: vec![1, 2],
            items_listed: 3,
            items_scored: 3,
            items_skipped: 0,
        });
        Arc::new(ServerState {
            status,
            chart_path,
            metrics: None,
        })
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_healthz() {
        let app = router(test_state(PathBuf::from("missing.svg")));
        let response = app
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "ok");
    }

    #[tokio::test]
    async fn test_index_shows_resource_and_counts() {
        let app = router(test_state(PathBuf::from("missing.svg")));
        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains("demo-page"));
        assert!(body.contains("<td>A</td><td>1</td>"));
        assert!(body.contains("<td>B</td><td>2</td>"));
    }

    #[tokio::test]
    async fn test_status_json_snapshot() {
        let app = router(test_state(PathBuf::from("missing.svg")));
        let response = app
            .oneshot(Request::get("/status.json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed["resource"], "demo-page");
        assert_eq!(parsed["rounds"], 1);
        assert_eq!(parsed["last_counts"][1], 2);
    }

    #[tokio::test]
    async fn test_chart_missing_is_404() {
        let app = router(test_state(PathBuf::from("definitely-missing.svg")));
        let response = app
            .oneshot(Request::get("/chart.svg").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_chart_served_with_svg_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.svg");
        std::fs::write(&path, "<svg></svg>").unwrap();

        let app = router(test_state(path));
        let response = app
            .oneshot(Request::get("/chart.svg").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "image/svg+xml"
        );
    }

    #[tokio::test]
    async fn test_metrics_disabled_is_404() {
        let app = router(test_state(PathBuf::from("missing.svg")));
        let response = app
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
