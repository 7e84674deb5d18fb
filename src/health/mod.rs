//! Liveness and build information endpoints.
//!
//! - `/health` pings the database and reports `up` or `down`
//! - `/status` reports the service name, version, environment and uptime

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::{db, AppState};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Up,
    Down,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct HealthInfo {
    pub status: HealthStatus,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub details: BTreeMap<String, HealthStatus>,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct StatusInfo {
    pub service: String,
    pub version: String,
    pub environment: String,
    pub uptime_seconds: u64,
}

/// Liveness probe with a database check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthInfo),
        (status = 503, description = "Database unreachable", body = HealthInfo)
    ),
    tag = "health"
)]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let database = match db::check_connection(&state.db).await {
        Ok(()) => HealthStatus::Up,
        Err(_) => HealthStatus::Down,
    };

    let info = HealthInfo {
        status: database,
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        uptime_seconds: state.uptime_seconds(),
        details: BTreeMap::from([("database".to_string(), database)]),
    };

    let code = match info.status {
        HealthStatus::Up => StatusCode::OK,
        HealthStatus::Down => StatusCode::SERVICE_UNAVAILABLE,
    };
    (code, Json(info))
}

/// Build and runtime information
#[utoipa::path(
    get,
    path = "/status",
    responses((status = 200, description = "Service status", body = StatusInfo)),
    tag = "health"
)]
pub async fn status(State(state): State<AppState>) -> Json<StatusInfo> {
    Json(StatusInfo {
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.config.environment.clone(),
        uptime_seconds: state.uptime_seconds(),
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
}
