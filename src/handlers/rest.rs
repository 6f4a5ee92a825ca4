//! REST API for payout triggers and operator reports.
//!
//! Endpoints:
//! - `GET /api/health`: health check
//! - `POST /api/roi/scheduled`: daily trigger, normally hit by an external cron
//! - `POST /api/roi/run`: manual run, same pipeline as the daily trigger
//! - `POST /api/roi/force-run`: run that bypasses the once-per-day guard
//! - `POST /api/roi/retry`: credit an explicit list of investments again
//! - `GET /api/roi/runs?limit=N`: recent run logs, newest first
//! - `GET /api/wallets/:user_id`: a user's wallet balances and totals

use std::future::Future;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::model::{RunLog, Wallet};
use crate::payout::{BatchDriver, PayoutError, RetryExecutor, RetryReport};
use crate::storage::{DirectoryStore, RunLogStore};

const DEFAULT_RUNS_LIMIT: u32 = 20;
const MAX_RUNS_LIMIT: u32 = 200;

/// Shared state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub batch: Arc<BatchDriver>,
    pub retry: Arc<RetryExecutor>,
    pub runs: Arc<dyn RunLogStore>,
    pub directory: Arc<dyn DirectoryStore>,
}

/// Start the REST server.
///
/// When the configured port is 0, the OS assigns an ephemeral port. The
/// actual bound port is always logged.
pub async fn serve(
    state: AppState,
    config: &ServerConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    let local = listener.local_addr()?;
    info!(address = %local, "REST API listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Build the axum router (separated for testing).
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/roi/scheduled", post(run_scheduled))
        .route("/api/roi/run", post(run_manual))
        .route("/api/roi/force-run", post(run_forced))
        .route("/api/roi/retry", post(retry))
        .route("/api/roi/runs", get(recent_runs))
        .route("/api/wallets/:user_id", get(wallet))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn run_scheduled(State(state): State<AppState>) -> Response {
    run_response(state.batch.run_scheduled().await)
}

async fn run_manual(State(state): State<AppState>) -> Response {
    run_response(state.batch.run_manual().await)
}

async fn run_forced(State(state): State<AppState>) -> Response {
    run_response(state.batch.run_forced().await)
}

async fn retry(
    State(state): State<AppState>,
    Json(request): Json<RetryRequest>,
) -> Json<RetryReport> {
    Json(state.retry.retry(&request.investment_ids).await)
}

async fn recent_runs(
    State(state): State<AppState>,
    Query(query): Query<RunsQuery>,
) -> Result<Json<Vec<RunLog>>, StatusCode> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_RUNS_LIMIT)
        .clamp(1, MAX_RUNS_LIMIT);

    let runs = state.runs.recent_runs(limit).await.map_err(|e| {
        error!(error = %e, "failed to list run logs");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(runs))
}

async fn wallet(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Wallet>, StatusCode> {
    let wallet = state.directory.wallet_for_user(user_id).await.map_err(|e| {
        error!(user_id = %user_id, error = %e, "failed to load wallet");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    wallet.map(Json).ok_or(StatusCode::NOT_FOUND)
}

fn run_response(result: Result<RunLog, PayoutError>) -> Response {
    match result {
        Ok(run) => Json(RunResponse::from(&run)).into_response(),
        Err(e) => {
            error!(error = %e, "payout run aborted");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    status: "error",
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RetryRequest {
    investment_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RunsQuery {
    limit: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunResponse {
    status: &'static str,
    run_id: Uuid,
    processed: u32,
    skipped: u32,
    failed: usize,
    total_roi_paid: Decimal,
    total_referral_paid: Decimal,
}

impl From<&RunLog> for RunResponse {
    fn from(run: &RunLog) -> Self {
        Self {
            status: "success",
            run_id: run.id,
            processed: run.processed,
            skipped: run.skipped,
            failed: run.failed.len(),
            total_roi_paid: run.total_roi_paid,
            total_referral_paid: run.total_referral_paid,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: &'static str,
    error: String,
}
