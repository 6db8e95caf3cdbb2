//! API route definitions

mod alerts;
mod health;
mod onboarding;
mod prices;
mod session;

use super::AppState;
use axum::Router;

/// Create all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(prices::routes())
        .merge(onboarding::routes())
        .merge(alerts::routes())
        .merge(session::routes())
}
