//! Relay HTTP API.
//!
//! - GET /status
//! - POST /qwen, POST /mis
//! - POST /ask
//! - GET / (static page)
//! - GET /metrics

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use uuid::Uuid;

use crate::alert::{NoopNotifier, Notifier, WebhookNotifier};
use crate::config::Config;
use crate::metrics::Metrics;
use crate::relay::client::InferClient;
use crate::relay::selection::{ModelAlias, ModelSelection};
use crate::relay::Relay;
use crate::server::error::ApiError;

/// Application state shared across handlers.
#[derive(Debug)]
pub struct AppState {
    pub relay: Relay,
    pub metrics: Metrics,
    pub index_path: PathBuf,
}

impl AppState {
    /// Build state with an explicit notifier.
    pub fn new(config: &Config, notifier: Arc<dyn Notifier>) -> anyhow::Result<Self> {
        let metrics = Metrics::new()?;
        let client = InferClient::new(
            config.upstream.base_url(),
            Duration::from_secs(config.upstream.timeout_secs),
        )?;
        let selection = ModelSelection::new(&config.upstream);

        Ok(Self {
            relay: Relay::new(client, selection, notifier, metrics.clone()),
            metrics,
            index_path: config.server.index_path.clone(),
        })
    }

    /// Build state with the notifier described by `config.alert`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let notifier: Arc<dyn Notifier> = match &config.alert.webhook_url {
            Some(url) => {
                let webhook =
                    WebhookNotifier::new(url.clone(), Duration::from_secs(config.alert.timeout_secs))?;
                info!(host = webhook.host(), "Alert webhook enabled");
                Arc::new(webhook)
            }
            None => Arc::new(NoopNotifier),
        };
        Self::new(config, notifier)
    }
}

/// Build the axum router with all API routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/status", get(status))
        .route("/qwen", post(select_qwen))
        .route("/mis", post(select_mis))
        .route("/ask", post(ask))
        .route("/metrics", get(metrics))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─── Request/Response Types ────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
    pub current_model: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
    pub context: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub model_used: String,
}

// ─── Route Handlers ────────────────────────────────────────────────────────

async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
        message: "API server is running.".to_string(),
        current_model: state.relay.selection().current().await,
    })
}

async fn select_qwen(State(state): State<Arc<AppState>>) -> Json<MessageResponse> {
    select(&state, ModelAlias::Qwen).await
}

async fn select_mis(State(state): State<Arc<AppState>>) -> Json<MessageResponse> {
    select(&state, ModelAlias::Mis).await
}

async fn select(state: &AppState, alias: ModelAlias) -> Json<MessageResponse> {
    let model = state.relay.selection().select(alias).await;
    state.metrics.model_switches.with_label_values(&[model.as_str()]).inc();
    Json(MessageResponse {
        message: format!("Switched model to '{model}'."),
    })
}

async fn ask(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let request_id = Uuid::new_v4().to_string();

    info!(
        request_id,
        question_len = req.question.len(),
        context_len = req.context.len(),
        "Ask request"
    );

    let answer = state
        .relay
        .ask(&request_id, &req.question, &req.context)
        .await?;

    Ok(Json(AskResponse {
        answer: answer.text,
        model_used: answer.model,
    }))
}

async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    tokio::fs::read_to_string(&state.index_path)
        .await
        .map(Html)
        .map_err(|e| {
            error!(path = %state.index_path.display(), "Failed to read index page: {e}");
            ApiError::internal(format!("failed to read {}", state.index_path.display()))
        })
}

async fn metrics(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let body = state
        .metrics
        .render()
        .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}

async fn not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "route not found")
}
