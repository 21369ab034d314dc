use crate::state::AppState;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub mode: &'static str,
    pub interval_s: u64,
    pub o2_monitoring: bool,
    pub prometheus_enabled: bool,
    pub slack_enabled: bool,
    pub last_cycle: Option<DateTime<Utc>>,
    pub coherence: Option<f64>,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.snapshot();
    Json(HealthResponse {
        status: "ok",
        mode: "production-edge",
        interval_s: state.interval_secs,
        o2_monitoring: state.o2_monitoring,
        prometheus_enabled: state.prometheus_enabled,
        slack_enabled: state.slack_enabled,
        last_cycle: snapshot.last_cycle,
        coherence: snapshot.coherence,
    })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(state)
}

/// Serves the health router on `0.0.0.0:<port>` until the task is dropped.
pub async fn serve(state: AppState, port: u16) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(addr = %listener.local_addr()?, "Health endpoint listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
