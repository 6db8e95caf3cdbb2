//! Alert configuration endpoints

use crate::alerts::{submit_alert, AlertConfiguration, AlertRequest, AlertStatus};
use crate::api::{identity, json_body, ApiResponse, AppState};
use crate::error::SubmissionError;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{delete, post},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct ListQuery {
    status: Option<AlertStatus>,
}

async fn create_alert(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<AlertRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<AlertConfiguration>>, SubmissionError> {
    let user_id = identity(&headers).ok_or(SubmissionError::Auth)?;
    let request = json_body(body)?;
    let alert = submit_alert(Some(user_id), request, state.alerts.as_ref()).await?;
    Ok(Json(ApiResponse::ok(alert)))
}

async fn list_alerts(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<AlertConfiguration>>>, SubmissionError> {
    let user_id = identity(&headers).ok_or(SubmissionError::Auth)?;
    let mut alerts = state
        .alerts
        .list(user_id)
        .await
        .map_err(|e| SubmissionError::Store(e.to_string()))?;
    if let Some(status) = query.status {
        alerts.retain(|a| a.status == status);
    }
    Ok(Json(ApiResponse::ok(alerts)))
}

async fn delete_alert(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Response, SubmissionError> {
    let user_id = identity(&headers).ok_or(SubmissionError::Auth)?;
    let deleted = state
        .alerts
        .delete(user_id, id)
        .await
        .map_err(|e| SubmissionError::Store(e.to_string()))?;

    if deleted {
        Ok(Json(ApiResponse::message("Alert deleted")).into_response())
    } else {
        Ok((
            StatusCode::NOT_FOUND,
            Json(ApiResponse::failure("Alert not found")),
        )
            .into_response())
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/alerts", post(create_alert).get(list_alerts))
        .route("/alerts/{id}", delete(delete_alert))
}
