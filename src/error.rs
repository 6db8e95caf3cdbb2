//! Error types for price feeds and the form submission boundary

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification of a failed refresh, as shown next to a stale price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Endpoint unreachable, timed out or answered non-2xx
    Network,
    /// Payload did not have the expected shape
    Parse,
}

/// Failure of a single fetch or stream message
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FeedError {
    /// Transport failure (connect, timeout, reset)
    #[error("network error: {0}")]
    Network(String),

    /// Endpoint answered with a non-success status
    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Endpoint answered 2xx but reported its own failure in the body
    #[error("upstream reported failure: {0}")]
    Upstream(String),

    /// Payload could not be decoded
    #[error("parse error: {0}")]
    Parse(String),
}

impl FeedError {
    /// Shorthand for a parse failure
    pub fn parse(msg: impl Into<String>) -> Self {
        FeedError::Parse(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FeedError::Parse(_) => ErrorKind::Parse,
            FeedError::Network(_) | FeedError::Status { .. } | FeedError::Upstream(_) => {
                ErrorKind::Network
            }
        }
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            FeedError::Parse(e.to_string())
        } else {
            FeedError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(e: serde_json::Error) -> Self {
        FeedError::Parse(e.to_string())
    }
}

/// A submitted form failed required-field or format checks
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required fields")]
    MissingFields(Vec<&'static str>),

    #[error("Please select at least one metal")]
    NoMetalsSelected,

    #[error("GSTIN must be 15 characters long")]
    InvalidGstin,

    #[error("Phone number must be at least 10 digits")]
    InvalidPhoneNumber,

    #[error("Target price must be greater than zero")]
    InvalidTargetPrice,

    #[error("Target percentage must be greater than zero")]
    InvalidTargetPercentage,

    #[error("Select at least one notification method")]
    NoNotificationMethod,
}

impl ValidationError {
    /// Field names to highlight inline, if the error is field-specific
    pub fn fields(&self) -> Vec<&'static str> {
        match self {
            ValidationError::MissingFields(fields) => fields.clone(),
            ValidationError::NoMetalsSelected => vec!["interestedMetals"],
            ValidationError::InvalidGstin => vec!["gstin"],
            ValidationError::InvalidPhoneNumber => vec!["phoneNumber"],
            ValidationError::InvalidTargetPrice => vec!["targetPrice"],
            ValidationError::InvalidTargetPercentage => vec!["targetPercentage"],
            ValidationError::NoNotificationMethod => vec!["notifications"],
        }
    }
}

/// Failure of a form submission, mapped one-to-one onto a response status
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// No identity accompanied the request
    #[error("Unauthorized")]
    Auth,

    /// The body was not JSON of the expected shape
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The backing store rejected the write
    #[error("Internal server error: {0}")]
    Store(String),
}

impl SubmissionError {
    pub fn status_code(&self) -> u16 {
        match self {
            SubmissionError::Auth => 401,
            SubmissionError::InvalidBody(_) | SubmissionError::Validation(_) => 400,
            SubmissionError::Store(_) => 500,
        }
    }
}
