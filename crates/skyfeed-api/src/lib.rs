//! ---
//! sky_section: "03-networking-api"
//! sky_subsection: "module"
//! sky_type: "source"
//! sky_scope: "code"
//! sky_description: "REST surface for the SkyFeed telemetry stream."
//! sky_version: "v0.1.0"
//! sky_owner: "tbd"
//! ---

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use parking_lot::Mutex;
use prometheus::TextEncoder;
use skyfeed_common::metrics::{FeedMetrics, SharedRegistry};
use skyfeed_sim::{TelemetryEngine, TelemetryPoint};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared API state exposed to handlers.
///
/// The engine mutates cursor, backlog, and clock on every query, so it sits
/// behind a mutex; the HTTP layer is the single place that serializes
/// concurrent callers onto the one logical stream.
pub struct ApiState {
    engine: Mutex<TelemetryEngine>,
    metrics: Option<FeedMetrics>,
    registry: Option<SharedRegistry>,
    start: Instant,
}

impl ApiState {
    pub fn new(engine: TelemetryEngine, registry: Option<SharedRegistry>) -> Result<Self> {
        let metrics = registry
            .as_deref()
            .map(FeedMetrics::new)
            .transpose()
            .context("failed to register feed metrics")?;
        Ok(Self {
            engine: Mutex::new(engine),
            metrics,
            registry,
            start: Instant::now(),
        })
    }

    fn next_batch(&self) -> Vec<TelemetryPoint> {
        let mut engine = self.engine.lock();
        let batch = engine.next_batch();
        if let Some(metrics) = &self.metrics {
            metrics.observe_batch(batch.len());
            metrics.update_engine_state(
                engine.cursor(),
                engine.backlog_len(),
                engine.cycles_completed(),
            );
        }
        batch
    }

    fn status(&self) -> StatusResponse {
        let engine = self.engine.lock();
        StatusResponse {
            version: env!("CARGO_PKG_VERSION").to_owned(),
            uptime_seconds: self.start.elapsed().as_secs(),
            trajectory_len: engine.trajectory_len(),
            cursor: engine.cursor(),
            backlog_depth: engine.backlog_len(),
            cycles_completed: engine.cycles_completed(),
        }
    }
}

impl fmt::Debug for ApiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiState")
            .field("metrics_enabled", &self.metrics.is_some())
            .finish_non_exhaustive()
    }
}

/// Handle to the running API server.
#[derive(Debug)]
pub struct ApiServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<()>>,
}

impl ApiServer {
    /// Actual bound address, useful when listening on an ephemeral port.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        match self.task.await {
            Ok(result) => result,
            Err(err) => Err(err.into()),
        }
    }
}

/// Spawn the REST API. Cross-origin requests are allowed from any origin;
/// the feed is a public, read-only stream.
pub async fn spawn_api_server(state: Arc<ApiState>, addr: SocketAddr) -> Result<ApiServer> {
    let router = Router::new()
        .route("/api/telemetry", get(get_telemetry))
        .route("/api/health", get(get_health))
        .route("/api/status", get(get_status))
        .route("/metrics", get(get_metrics))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind API listener {addr}"))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve API listener address")?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let handle: JoinHandle<Result<()>> = tokio::spawn(async move {
        info!(address = %local_addr, "api server listening");
        if let Err(err) = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await
        {
            warn!(address = %local_addr, error = %err, "api server exited with error");
            return Err(err.into());
        }
        Ok(())
    });

    Ok(ApiServer {
        addr: local_addr,
        shutdown: Some(shutdown_tx),
        task: handle,
    })
}

#[derive(Debug, serde::Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, serde::Serialize)]
struct StatusResponse {
    version: String,
    uptime_seconds: u64,
    trajectory_len: usize,
    cursor: usize,
    backlog_depth: usize,
    cycles_completed: u64,
}

async fn get_telemetry(State(state): State<Arc<ApiState>>) -> Json<Vec<TelemetryPoint>> {
    Json(state.next_batch())
}

async fn get_health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn get_status(State(state): State<Arc<ApiState>>) -> Json<StatusResponse> {
    Json(state.status())
}

async fn get_metrics(State(state): State<Arc<ApiState>>) -> Response {
    let Some(registry) = &state.registry else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics registry unavailable",
        )
            .into_response();
    };

    let encoder = TextEncoder::new();
    let families = registry.gather();
    match encoder.encode_to_string(&families) {
        Ok(body) => (StatusCode::OK, body).into_response(),
        Err(err) => {
            warn!(error = %err, "failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Client;
    use serde_json::Value;
    use skyfeed_common::metrics::new_registry;
    use skyfeed_sim::{EngineSettings, Trajectory};

    fn test_engine(points: usize, settings: EngineSettings) -> TelemetryEngine {
        let pairs: Vec<[f64; 2]> = (0..points)
            .map(|index| [5.0 + index as f64 * 0.1, 60.0])
            .collect();
        let trajectory = Trajectory::from_pairs(pairs).expect("non-empty trajectory");
        TelemetryEngine::new(trajectory, settings, 42)
    }

    async fn spawn_test_server(state: ApiState) -> (ApiServer, String) {
        let server = spawn_api_server(Arc::new(state), "127.0.0.1:0".parse().unwrap())
            .await
            .expect("server spawns");
        let base = format!("http://{}", server.addr());
        (server, base)
    }

    #[tokio::test]
    async fn telemetry_endpoint_serves_json_batches() {
        let state = ApiState::new(test_engine(20, EngineSettings::default()), None).unwrap();
        let (server, base) = spawn_test_server(state).await;
        let client = Client::new();

        let batch: Value = client
            .get(format!("{base}/api/telemetry"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let points = batch.as_array().expect("response is a JSON array");
        assert!(points.len() <= 3);
        for point in points {
            assert!(point["longitude"].is_f64());
            assert!(point["latitude"].is_f64());
            assert!(point["altitude"].is_f64());
            assert!(point["timestamp"].is_string());
        }

        server.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn cross_origin_requests_are_allowed() {
        let state = ApiState::new(test_engine(5, EngineSettings::default()), None).unwrap();
        let (server, base) = spawn_test_server(state).await;
        let client = Client::new();

        let response = client
            .get(format!("{base}/api/telemetry"))
            .header("origin", "http://localhost:3000")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let allow_origin = response
            .headers()
            .get("access-control-allow-origin")
            .expect("cors header present");
        assert_eq!(allow_origin, "*");

        server.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn health_and_status_report_engine_state() {
        let state = ApiState::new(test_engine(12, EngineSettings::default()), None).unwrap();
        let (server, base) = spawn_test_server(state).await;
        let client = Client::new();

        let health: Value = client
            .get(format!("{base}/api/health"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "ok");

        client
            .get(format!("{base}/api/telemetry"))
            .send()
            .await
            .unwrap();

        let status: Value = client
            .get(format!("{base}/api/status"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(status["trajectory_len"], 12);
        assert!(status["cursor"].as_u64().unwrap() >= 1);

        server.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn metrics_route_exposes_feed_counters() {
        let registry = new_registry();
        let state = ApiState::new(
            test_engine(10, EngineSettings::default()),
            Some(registry.clone()),
        )
        .unwrap();
        let (server, base) = spawn_test_server(state).await;
        let client = Client::new();

        client
            .get(format!("{base}/api/telemetry"))
            .send()
            .await
            .unwrap();

        let body = client
            .get(format!("{base}/metrics"))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(body.contains("skyfeed_batches_total 1"));

        server.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn metrics_route_unavailable_when_disabled() {
        let state = ApiState::new(test_engine(10, EngineSettings::default()), None).unwrap();
        let (server, base) = spawn_test_server(state).await;
        let client = Client::new();

        let response = client
            .get(format!("{base}/metrics"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        server.shutdown().await.unwrap();
    }
}
