use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use coco_core::ChatReply;
use coco_observability::{AppMetrics, MetricsSnapshot};
use coco_responder::{load_rules, Responder};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct ApiState {
    pub responder: Arc<Responder>,
    pub metrics: Arc<AppMetrics>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
struct HomeResponse {
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    labels: Vec<String>,
    rules: usize,
    metrics: MetricsSnapshot,
}

/// Loads artifacts and the rule table once; every request shares them.
pub fn build_app(artifacts: impl AsRef<Path>, rules_path: Option<&Path>) -> Result<Router> {
    let artifacts = artifacts.as_ref();
    let metrics = AppMetrics::shared();

    let rules = load_rules(artifacts, rules_path).context("failed loading rules.json")?;
    let responder = Responder::from_artifacts(artifacts, rules, metrics.clone()).with_context(|| {
        format!(
            "failed loading artifacts from {} (run `cocobot train` first)",
            artifacts.display()
        )
    })?;

    Ok(build_router(ApiState {
        responder: Arc::new(responder),
        metrics,
    }))
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/chat", post(chat))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

async fn home() -> impl IntoResponse {
    Json(HomeResponse {
        message: "CocoBot API is running",
    })
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        labels: state.responder.labels().to_vec(),
        rules: state.responder.rules().rules.len(),
        metrics: state.metrics.snapshot(),
    };
    (StatusCode::OK, Json(payload))
}

async fn chat(State(state): State<ApiState>, Json(request): Json<ChatRequest>) -> Json<ChatReply> {
    Json(state.responder.respond(&request.message))
}
