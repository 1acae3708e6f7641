//! HTTP telemetry server: a read-only JSON view of a running pipeline.
//!
//! Serves the latest published pipeline state over HTTP. The server never
//! mutates the pipeline; it holds a watch receiver and answers every
//! request from the most recent view.

use std::sync::Arc;

use axum::{Router, extract::State, response::Json, routing::get};
use serde::Serialize;
use tokio::sync::watch;

use loadlens_core::PipelineView;

/// Shared server state.
struct AppState {
    views: watch::Receiver<PipelineView>,
}

impl AppState {
    fn view(&self) -> PipelineView {
        self.views.borrow().clone()
    }
}

#[derive(Serialize)]
struct MetricsResponse {
    tick: u64,
    captured_unix_ms: u64,
    cpu: f64,
    ram: f64,
    disk: f64,
    network: f64,
    temperature: f64,
    power: f64,
}

#[derive(Serialize)]
struct HistoryResponse {
    points: Vec<loadlens_core::HistoryPoint>,
    count: usize,
}

#[derive(Serialize)]
struct SuggestionEntry {
    title: String,
    detail: String,
    priority: String,
}

#[derive(Serialize)]
struct SuggestionsResponse {
    suggestions: Vec<SuggestionEntry>,
    source: String,
    last_inference_unix_ms: u64,
    count: usize,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    tick: u64,
    model_source: String,
    awaiting_remote: bool,
    substitutions: usize,
}

async fn handle_state(State(state): State<Arc<AppState>>) -> Json<PipelineView> {
    Json(state.view())
}

async fn handle_metrics(State(state): State<Arc<AppState>>) -> Json<MetricsResponse> {
    let view = state.view();
    let snap = &view.snapshot;
    Json(MetricsResponse {
        tick: view.tick,
        captured_unix_ms: snap.captured_unix_ms,
        cpu: snap.cpu,
        ram: snap.ram,
        disk: snap.disk,
        network: snap.network,
        temperature: snap.temperature,
        power: snap.power,
    })
}

async fn handle_history(State(state): State<Arc<AppState>>) -> Json<HistoryResponse> {
    let view = state.view();
    let count = view.history.len();
    Json(HistoryResponse { points: view.history, count })
}

async fn handle_suggestions(State(state): State<Arc<AppState>>) -> Json<SuggestionsResponse> {
    let view = state.view();
    let suggestions: Vec<SuggestionEntry> = view
        .advice
        .suggestions
        .iter()
        .map(|s| SuggestionEntry {
            title: s.title.clone(),
            detail: s.detail.clone(),
            priority: s.priority.to_string(),
        })
        .collect();
    let count = suggestions.len();
    Json(SuggestionsResponse {
        suggestions,
        source: view.advice.source.to_string(),
        last_inference_unix_ms: view.advice.last_inference_unix_ms,
        count,
    })
}

async fn handle_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    // The sender side lives in the pipeline task; once it drops, the views
    // here are stale.
    let running = state.views.has_changed().is_ok();
    let view = state.view();
    Json(HealthResponse {
        status: if running { "healthy".to_string() } else { "stopped".to_string() },
        tick: view.tick,
        model_source: view.advice.source.to_string(),
        awaiting_remote: view.awaiting_remote,
        substitutions: view.substitutions.len(),
    })
}

async fn handle_index(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let view = state.view();
    Json(serde_json::json!({
        "name": "Loadlens Server",
        "version": loadlens_core::VERSION,
        "tick": view.tick,
        "model_source": view.advice.source.to_string(),
        "endpoints": {
            "/": "This API index",
            "/state": "Full pipeline view: snapshot, history, advice, substitutions",
            "/metrics": "Latest reading across all channels",
            "/history": "Retained history points, oldest first",
            "/suggestions": "Active suggestions with provenance",
            "/health": "Pipeline liveness and tick counter",
        },
    }))
}

/// Build the axum router.
fn build_router(views: watch::Receiver<PipelineView>) -> Router {
    let state = Arc::new(AppState { views });

    Router::new()
        .route("/", get(handle_index))
        .route("/state", get(handle_state))
        .route("/metrics", get(handle_metrics))
        .route("/history", get(handle_history))
        .route("/suggestions", get(handle_suggestions))
        .route("/health", get(handle_health))
        .with_state(state)
}

/// Run the HTTP telemetry server until the process exits.
pub async fn run_server(views: watch::Receiver<PipelineView>, host: &str, port: u16) {
    let app = build_router(views);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
