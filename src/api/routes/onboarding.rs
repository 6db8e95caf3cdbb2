//! Onboarding submission

use crate::api::{identity, json_body, ApiResponse, AppState};
use crate::error::SubmissionError;
use crate::onboarding::{submit, OnboardingProfile, OnboardingRequest};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    response::Json,
    routing::post,
    Router,
};

async fn submit_onboarding(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<OnboardingRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<OnboardingProfile>>, SubmissionError> {
    let user_id = identity(&headers).ok_or(SubmissionError::Auth)?;
    let request = json_body(body)?;
    let profile = submit(Some(user_id), request, state.profiles.as_ref()).await?;
    state.sessions.mark_onboarded(&profile.user_id).await;

    tracing::info!(user_id = %profile.user_id, "Onboarding saved");
    Ok(Json(ApiResponse::ok(profile)))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/onboarding", post(submit_onboarding))
}
