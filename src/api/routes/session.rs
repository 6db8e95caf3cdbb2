//! Session endpoints

use crate::api::{identity, ApiResponse, AppState};
use crate::error::SubmissionError;
use crate::session::SessionState;
use axum::{
    extract::State,
    http::HeaderMap,
    response::Json,
    routing::{get, post},
    Router,
};

/// First authenticated load; tells the client whether onboarding is done
///
/// A session that starts without the flag takes it from the profile store,
/// so a stored profile survives sign-out.
async fn current_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<SessionState>>, SubmissionError> {
    let user_id = identity(&headers).ok_or(SubmissionError::Auth)?;
    let mut session = state.sessions.begin(user_id).await;

    if !session.onboarding_completed {
        let profile = state.profiles.get(user_id).await.map_err(|e| {
            tracing::error!(user_id, error = %e, "Error reading onboarding profile");
            SubmissionError::Store(e.to_string())
        })?;
        if profile.is_some() {
            session = state.sessions.mark_onboarded(user_id).await;
        }
    }

    Ok(Json(ApiResponse::ok(session)))
}

async fn sign_out(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<()>>, SubmissionError> {
    let user_id = identity(&headers).ok_or(SubmissionError::Auth)?;
    state.sessions.sign_out(user_id).await;
    tracing::info!(user_id, "Signed out");
    Ok(Json(ApiResponse::message("Signed out")))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/session", get(current_session))
        .route("/session/sign-out", post(sign_out))
}
