//! JSON HTTP API
//!
//! Read-only price views plus the onboarding, alert and session boundaries.
//! Identity arrives in the `x-user-id` header, set by the authenticating
//! proxy in front of this service.

mod response;
mod routes;

pub use response::ApiResponse;

use crate::aggregate::PriceAggregator;
use crate::alerts::{AlertStore, InMemoryAlertStore};
use crate::onboarding::{InMemoryProfileStore, ProfileStore};
use crate::session::SessionRegistry;
use crate::error::SubmissionError;
use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use axum::{Json, Router};
use std::sync::Arc;

/// Header carrying the authenticated identity
pub const USER_ID_HEADER: &str = "x-user-id";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub prices: PriceAggregator,
    pub profiles: Arc<dyn ProfileStore>,
    pub alerts: Arc<dyn AlertStore>,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    /// State backed by in-memory stores
    pub fn new(prices: PriceAggregator) -> Self {
        Self {
            prices,
            profiles: Arc::new(InMemoryProfileStore::new()),
            alerts: Arc::new(InMemoryAlertStore::new()),
            sessions: Arc::new(SessionRegistry::new()),
        }
    }
}

/// Create the full router
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::api_routes())
        .with_state(state)
}

/// Identity from the request headers, if any
pub(crate) fn identity(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
}

/// Unwrap a JSON body, turning a rejection into a 400 envelope
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, SubmissionError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        tracing::debug!(error = %rejection.body_text(), "Rejected request body");
        SubmissionError::InvalidBody(rejection.body_text())
    })
}
