//! Response envelope

use crate::error::{SubmissionError, ValidationError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

/// `{ success, message?, missingFields?, fields?, data? }`
///
/// `fields` names every input to highlight for a validation error;
/// `missingFields` is set only when required inputs were absent.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_fields: Option<Vec<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            missing_fields: None,
            fields: None,
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            missing_fields: None,
            fields: None,
            data: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            missing_fields: None,
            fields: None,
            data: None,
        }
    }

    /// Failure that points at the offending inputs
    pub fn invalid(err: &ValidationError) -> Self {
        let missing_fields = match err {
            ValidationError::MissingFields(fields) => Some(fields.clone()),
            _ => None,
        };
        Self {
            success: false,
            message: Some(err.to_string()),
            missing_fields,
            fields: Some(err.fields()),
            data: None,
        }
    }
}

impl IntoResponse for SubmissionError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = match &self {
            SubmissionError::Validation(err) => ApiResponse::invalid(err),
            // Store details stay in the logs
            SubmissionError::Store(_) => ApiResponse::failure("Internal server error"),
            _ => ApiResponse::failure(self.to_string()),
        };

        (status, Json(body)).into_response()
    }
}
