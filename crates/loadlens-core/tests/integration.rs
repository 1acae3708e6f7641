//! Integration tests for loadlens-core.
//!
//! These tests run the full pipeline against real HTTP fixtures on
//! ephemeral ports: inference endpoints that succeed, fail, or stall, and
//! a fake telemetry provider.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::sync::watch;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use loadlens_core::{
    ModelSource, Pipeline, PipelineConfig, PipelineView, RecorderConfig, RecordingMeta,
    RecordingWriter,
};

/// Serve a router on an ephemeral port, returning its base URL.
async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Wait until a published view satisfies the predicate, with a hard cap.
async fn wait_for<F>(rx: &mut watch::Receiver<PipelineView>, pred: F) -> PipelineView
where
    F: Fn(&PipelineView) -> bool,
{
    let fut = async {
        loop {
            {
                let view = rx.borrow_and_update();
                if pred(&view) {
                    return view.clone();
                }
            }
            rx.changed().await.expect("pipeline stopped early");
        }
    };
    timeout(Duration::from_secs(10), fut).await.expect("timed out waiting for pipeline state")
}

fn fast_config(period_ms: u64, every: u64) -> PipelineConfig {
    PipelineConfig {
        sample_period: Duration::from_millis(period_ms),
        inference_every: every,
        seed: Some(7),
        ..PipelineConfig::default()
    }
}

#[tokio::test]
async fn remote_success_flips_source_and_posts_metrics() {
    let seen: Arc<Mutex<Vec<Value>>> = Arc::new(Mutex::new(Vec::new()));
    let router = Router::new()
        .route(
            "/infer",
            post(
                |State(seen): State<Arc<Mutex<Vec<Value>>>>, Json(body): Json<Value>| async move {
                    seen.lock().unwrap().push(body);
                    Json(json!({
                        "suggestions": [
                            {"title": "T", "detail": "D", "priority": "High"}
                        ]
                    }))
                },
            ),
        )
        .with_state(seen.clone());
    let base = serve(router).await;

    let config = PipelineConfig {
        remote_url: Some(format!("{base}/infer")),
        ..fast_config(25, 2)
    };
    let pipeline = Pipeline::new(config).unwrap();
    let mut rx = pipeline.subscribe();
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(pipeline.run(cancel.clone()));

    let view = wait_for(&mut rx, |v| v.advice.source == ModelSource::Remote).await;
    assert_eq!(view.advice.suggestions.len(), 1);
    assert_eq!(view.advice.suggestions[0].title, "T");
    assert_eq!(view.advice.suggestions[0].detail, "D");

    // The endpoint received the snapshot wrapped as {"metrics": ...}.
    let bodies = seen.lock().unwrap();
    assert!(!bodies.is_empty(), "endpoint saw no request");
    let metrics = &bodies[0]["metrics"];
    assert!(metrics["cpu"].is_f64() || metrics["cpu"].is_u64(), "body missing cpu: {metrics}");
    assert!(metrics["power"].is_f64() || metrics["power"].is_u64());
    drop(bodies);

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn remote_timeout_substitutes_rules() {
    let router = Router::new().route(
        "/infer",
        post(|| async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Json(json!([{"title": "late", "detail": "never seen"}]))
        }),
    );
    let base = serve(router).await;

    let config = PipelineConfig {
        remote_url: Some(format!("{base}/infer")),
        remote_timeout: Duration::from_millis(100),
        ..fast_config(25, 1)
    };
    let pipeline = Pipeline::new(config).unwrap();
    let mut rx = pipeline.subscribe();
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(pipeline.run(cancel.clone()));

    let view = wait_for(&mut rx, |v| !v.substitutions.is_empty()).await;
    assert_eq!(view.advice.source, ModelSource::Fallback);
    assert!(!view.advice.suggestions.is_empty(), "fallback set must never be empty");
    assert!(
        view.substitutions[0].reason.contains("transport failure"),
        "unexpected reason: {}",
        view.substitutions[0].reason
    );

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn remote_error_status_substitutes_rules() {
    let router = Router::new().route(
        "/infer",
        post(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let base = serve(router).await;

    let config = PipelineConfig {
        remote_url: Some(format!("{base}/infer")),
        ..fast_config(25, 1)
    };
    let pipeline = Pipeline::new(config).unwrap();
    let mut rx = pipeline.subscribe();
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(pipeline.run(cancel.clone()));

    let view = wait_for(&mut rx, |v| !v.substitutions.is_empty()).await;
    assert_eq!(view.advice.source, ModelSource::Fallback);
    assert!(
        view.substitutions[0].reason.contains("status 500"),
        "unexpected reason: {}",
        view.substitutions[0].reason
    );

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn invalid_remote_payload_substitutes_rules() {
    let router = Router::new().route("/infer", post(|| async { Json(json!({"suggestions": []})) }));
    let base = serve(router).await;

    let config = PipelineConfig {
        remote_url: Some(format!("{base}/infer")),
        ..fast_config(25, 1)
    };
    let pipeline = Pipeline::new(config).unwrap();
    let mut rx = pipeline.subscribe();
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(pipeline.run(cancel.clone()));

    let view = wait_for(&mut rx, |v| !v.substitutions.is_empty()).await;
    assert_eq!(view.advice.source, ModelSource::Fallback);
    assert!(
        view.substitutions[0].reason.contains("unusable payload"),
        "unexpected reason: {}",
        view.substitutions[0].reason
    );

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn provider_mode_polls_metrics_and_prediction() {
    // The provider warms up for one poll, then reports data.
    let polls = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .route(
            "/client-system",
            get(|State(polls): State<Arc<AtomicUsize>>| async move {
                if polls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Json(json!({"status": "warming_up"}))
                } else {
                    Json(json!({"cpu_usage": 41.5, "memory_usage": 63.0, "battery_percent": 88.0}))
                }
            }),
        )
        .route(
            "/predicted",
            get(|| async {
                Json(json!({
                    "user_state": "active",
                    "confidence": "High",
                    "recommendations": ["Close idle tabs"]
                }))
            }),
        )
        .with_state(polls.clone());
    let base = serve(router).await;

    let config = PipelineConfig {
        sample_period: Duration::from_millis(40),
        ..PipelineConfig::for_provider(base)
    };
    assert_eq!(config.inference_every, 1);
    let pipeline = Pipeline::new(config).unwrap();
    let mut rx = pipeline.subscribe();
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(pipeline.run(cancel.clone()));

    let view = wait_for(&mut rx, |v| {
        v.snapshot.cpu == 41.5 && v.advice.source == ModelSource::Remote
    })
    .await;
    assert_eq!(view.snapshot.ram, 63.0);
    assert_eq!(view.snapshot.power, 88.0);
    assert_eq!(view.snapshot.disk, 0.0, "unreported channels read zero");
    assert_eq!(view.advice.suggestions[0].title, "Close idle tabs");
    assert_eq!(
        view.advice.suggestions[0].detail,
        "AI-generated optimization recommendation."
    );
    assert!(polls.load(Ordering::SeqCst) >= 2, "provider polled fewer than 2 times");

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn no_endpoint_mode_runs_rules_and_history() {
    let pipeline = Pipeline::new(fast_config(20, 5)).unwrap();
    let mut rx = pipeline.subscribe();
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(pipeline.run(cancel.clone()));

    let view = wait_for(&mut rx, |v| v.tick >= 5).await;
    assert_eq!(view.advice.source, ModelSource::Fallback);
    assert!(!view.advice.suggestions.is_empty());
    assert_eq!(view.history.len() as u64, view.tick);
    assert!(view.substitutions.is_empty(), "local mode never substitutes");

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn recorded_session_captures_pipeline_run() {
    let tmp = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(fast_config(20, 5)).unwrap();
    let mut rx = pipeline.subscribe();
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(pipeline.run(cancel.clone()));

    let config = RecorderConfig {
        output_dir: tmp.path().to_path_buf(),
        ..Default::default()
    };
    let mut writer = RecordingWriter::new(config).unwrap();
    while writer.ticks() < 5 {
        rx.changed().await.unwrap();
        let view = rx.borrow_and_update().clone();
        writer.write_view(&view).unwrap();
    }
    cancel.cancel();
    handle.await.unwrap();

    let dir = writer.finish().unwrap();
    assert!(dir.join("session.json").exists(), "session.json missing");
    assert!(dir.join("samples.csv").exists(), "samples.csv missing");

    let meta: RecordingMeta =
        serde_json::from_str(&std::fs::read_to_string(dir.join("session.json")).unwrap()).unwrap();
    assert_eq!(meta.version, 1);
    assert_eq!(meta.ticks, 5);
    assert_eq!(meta.fallback_ticks, 5);
    assert_eq!(meta.source, "synthetic_walk");

    let csv = std::fs::read_to_string(dir.join("samples.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 6, "CSV should have header + 5 rows");
    assert!(lines[1].contains("fallback"));
}
