//! Per-identity session state
//!
//! Tracks whether a signed-in identity has completed onboarding. Entries are
//! created on the first authenticated load and removed on sign-out.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub user_id: String,
    pub onboarding_completed: bool,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionState>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing session for `user_id`, or a new one
    pub async fn begin(&self, user_id: &str) -> SessionState {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(user_id.to_string())
            .or_insert_with(|| {
                tracing::debug!(user_id, "Session started");
                SessionState {
                    user_id: user_id.to_string(),
                    onboarding_completed: false,
                    started_at: Utc::now(),
                }
            })
            .clone()
    }

    /// Record a completed onboarding; returns the updated session
    pub async fn mark_onboarded(&self, user_id: &str) -> SessionState {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .entry(user_id.to_string())
            .or_insert_with(|| SessionState {
                user_id: user_id.to_string(),
                onboarding_completed: false,
                started_at: Utc::now(),
            });
        entry.onboarding_completed = true;
        entry.clone()
    }

    pub async fn is_onboarded(&self, user_id: &str) -> bool {
        self.sessions
            .read()
            .await
            .get(user_id)
            .map(|s| s.onboarding_completed)
            .unwrap_or(false)
    }

    /// Drop all state for `user_id`; `false` if there was none
    pub async fn sign_out(&self, user_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(user_id).is_some();
        if removed {
            tracing::debug!(user_id, "Session cleared");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
