use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use tracing::{instrument, warn};

use crate::state::AppState;

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(check))
}

/// Component statuses reported by the health endpoint.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub redis: &'static str,
}

#[instrument(skip(state))]
pub async fn check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database_up = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => true,
        Err(e) => {
            warn!(error = %e, "database health check failed");
            false
        }
    };
    let redis_up = match state.cache.store().ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "cache health check failed");
            false
        }
    };

    let healthy = database_up && redis_up;
    let response = HealthResponse {
        status: if healthy { "ok" } else { "error" },
        database: if database_up { "up" } else { "down" },
        redis: if redis_up { "up" } else { "down" },
    };
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}
