//! Health Check Handlers
//!
//! - `GET /health`: process is up, with version and uptime
//! - `GET /health/live`: liveness probe
//! - `GET /health/ready`: storage and gateway readiness

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::startup::AppState;

static STARTED: Lazy<(Instant, DateTime<Utc>)> = Lazy::new(|| (Instant::now(), Utc::now()));

/// Pin the uptime origin; call once during startup
pub fn init_server_start() {
    Lazy::force(&STARTED);
}

/// Slower storage round-trips than this report `degraded`
const STORAGE_LATENCY_BUDGET_MS: u64 = 100;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: &'static str,
    pub uptime_seconds: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessResponse {
    pub status: HealthStatus,
    pub started_at: DateTime<Utc>,
    pub storage: StorageCheck,
    pub gateway: GatewayCheck,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageCheck {
    pub status: HealthStatus,
    pub backend: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayCheck {
    pub connections: usize,
    pub course_rooms: usize,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: STARTED.0.elapsed().as_secs(),
    })
}

pub async fn liveness() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// 503 only when storage cannot be reached
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let storage = check_storage(&state).await;
    let status = storage.status;
    let code = if status == HealthStatus::Unhealthy {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    let body = ReadinessResponse {
        status,
        started_at: STARTED.1,
        storage,
        gateway: GatewayCheck {
            connections: state.gateway.session_count(),
            course_rooms: state.gateway.room_count(),
        },
    };
    (code, Json(body))
}

async fn check_storage(state: &AppState) -> StorageCheck {
    let Some(db) = &state.db else {
        return StorageCheck {
            status: HealthStatus::Healthy,
            backend: "memory",
            latency_ms: None,
            error: None,
        };
    };

    let start = Instant::now();
    match sqlx::query("SELECT 1").execute(db).await {
        Ok(_) => {
            let latency = start.elapsed().as_millis() as u64;
            StorageCheck {
                status: storage_status(latency),
                backend: "postgres",
                latency_ms: Some(latency),
                error: None,
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StorageCheck {
                status: HealthStatus::Unhealthy,
                backend: "postgres",
                latency_ms: None,
                error: Some("database unreachable".into()),
            }
        }
    }
}

fn storage_status(latency_ms: u64) -> HealthStatus {
    if latency_ms < STORAGE_LATENCY_BUDGET_MS {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_status_by_latency() {
        assert_eq!(storage_status(5), HealthStatus::Healthy);
        assert_eq!(storage_status(250), HealthStatus::Degraded);
        assert_eq!(
            serde_json::to_string(&HealthStatus::Degraded).unwrap(),
            "\"degraded\""
        );
    }
}
