//! Single-shot HTTP surface.
//!
//! An external trigger (a scheduler hitting a URL) runs one tick of every
//! configured recorder per request and gets the combined outcome back.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use tokio::sync::Mutex;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};

use crate::recorder::{Recorder, TickReport, TickStatus};

/// Shared application state.
///
/// The mutex serializes activations: two overlapping requests never run the
/// same recorder's tick concurrently. The recorder count is fixed at
/// construction so health checks never wait on a running activation.
#[derive(Clone)]
pub struct AppState {
    recorders: Arc<Mutex<Vec<Recorder>>>,
    recorder_count: usize,
}

impl AppState {
    pub fn new(recorders: Vec<Recorder>) -> Self {
        Self {
            recorder_count: recorders.len(),
            recorders: Arc::new(Mutex::new(recorders)),
        }
    }

    /// Release every recorder's target resources.
    pub async fn close(&self) {
        for recorder in self.recorders.lock().await.iter() {
            recorder.close().await;
        }
    }
}

/// Response of one activation.
#[derive(Debug, Serialize)]
pub struct ActivationResponse {
    pub status: TickStatus,
    pub result: Vec<TickReport>,
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    recorders: usize,
}

/// Run one tick of every recorder, in configuration order.
pub async fn activate(state: &AppState) -> ActivationResponse {
    let mut recorders = state.recorders.lock().await;
    let mut result = Vec::with_capacity(recorders.len());
    for recorder in recorders.iter_mut() {
        let report = recorder.run_once().await;
        tracing::info!(
            recorder = %report.recorder,
            status = %report.status(),
            "Single-shot tick complete"
        );
        result.push(report);
    }
    let status = TickStatus::combine(result.iter().map(TickReport::status));
    ActivationResponse { status, result }
}

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(activate_handler).post(activate_handler))
        .route("/healthz", get(healthz_handler))
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .with_state(state)
}

/// Activation handler.
///
/// 200 when every recorder fetched (even if some targets failed), 500 when
/// nothing could be fetched at all.
async fn activate_handler(State(state): State<AppState>) -> Response {
    let response = activate(&state).await;
    let code = match response.status {
        TickStatus::Failed => StatusCode::INTERNAL_SERVER_ERROR,
        TickStatus::Success | TickStatus::Partial => StatusCode::OK,
    };
    (code, Json(response)).into_response()
}

/// Liveness probe.
async fn healthz_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        recorders: state.recorder_count,
    })
}
