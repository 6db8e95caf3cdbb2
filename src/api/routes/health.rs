//! Health check endpoints

use crate::aggregate::FeedRole;
use crate::api::AppState;
use crate::scheduler::ConnectionMode;
use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
struct FeedHealth {
    mode: ConnectionMode,
    stale: bool,
}

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    feeds: BTreeMap<FeedRole, FeedHealth>,
}

/// Degraded when any feed has stopped or its last refresh failed
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let feeds: BTreeMap<_, _> = state
        .prices
        .roles()
        .map(|role| {
            let feed = state.prices.state(role);
            let health = FeedHealth {
                mode: feed.mode,
                stale: feed.last_error.is_some(),
            };
            (role, health)
        })
        .collect();

    let healthy = feeds
        .values()
        .all(|f| !f.stale && f.mode != ConnectionMode::Terminated);

    let code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" },
        feeds,
    };

    (code, Json(response))
}

/// Simple liveness check (always returns OK if server is running)
async fn liveness() -> &'static str {
    "OK"
}

/// Create health routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness))
}
