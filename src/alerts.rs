//! Price alert configurations
//!
//! Alerts are validated at the boundary and kept in an `AlertStore`.
//! Evaluating and delivering them is out of scope.

use crate::error::{SubmissionError, ValidationError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertCategory {
    #[serde(rename = "MCX")]
    Mcx,
    #[serde(rename = "LME")]
    Lme,
    Suppliers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    #[serde(alias = "Price")]
    Price,
    #[serde(alias = "Percentage")]
    Percentage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Gain,
    Loss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Supplier {
    #[serde(rename = "NALCO")]
    Nalco,
    #[serde(rename = "HINDALCO")]
    Hindalco,
    Vedanta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    #[default]
    Active,
    Inactive,
}

/// Delivery channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationChannels {
    #[serde(alias = "webApp")]
    pub web: bool,
    #[serde(alias = "whatsApp")]
    pub whatsapp: bool,
    pub email: bool,
}

impl NotificationChannels {
    pub fn any(&self) -> bool {
        self.web || self.whatsapp || self.email
    }
}

/// Raw alert submission
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRequest {
    pub category: Option<AlertCategory>,
    pub alert_type: Option<AlertType>,
    pub target_price: Option<Decimal>,
    pub target_percentage: Option<Decimal>,
    pub direction: Option<Direction>,
    #[serde(default, alias = "selectedSuppliers")]
    pub suppliers: Vec<Supplier>,
    #[serde(default, alias = "notificationMethods")]
    pub notifications: NotificationChannels,
    pub custom_message: Option<String>,
}

/// Stored alert
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertConfiguration {
    pub id: Uuid,
    pub user_id: String,
    pub category: AlertCategory,
    pub alert_type: AlertType,
    pub target_price: Option<Decimal>,
    pub target_percentage: Option<Decimal>,
    pub direction: Option<Direction>,
    pub suppliers: Vec<Supplier>,
    pub notifications: NotificationChannels,
    pub custom_message: Option<String>,
    pub status: AlertStatus,
    pub created_at: DateTime<Utc>,
}

impl AlertRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut missing = Vec::new();
        if self.category.is_none() {
            missing.push("category");
        }
        if self.alert_type.is_none() {
            missing.push("alertType");
        }
        if self.category == Some(AlertCategory::Suppliers) && self.suppliers.is_empty() {
            missing.push("suppliers");
        }
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }

        match self.alert_type {
            Some(AlertType::Price) => {
                if !self.target_price.is_some_and(|p| p > Decimal::ZERO) {
                    return Err(ValidationError::InvalidTargetPrice);
                }
            }
            Some(AlertType::Percentage) => {
                if !self.target_percentage.is_some_and(|p| p > Decimal::ZERO) {
                    return Err(ValidationError::InvalidTargetPercentage);
                }
            }
            None => {}
        }

        if !self.notifications.any() {
            return Err(ValidationError::NoNotificationMethod);
        }

        Ok(())
    }

    /// Validated alert for `user_id` with a fresh identifier
    pub fn into_alert(self, user_id: &str) -> Result<AlertConfiguration, ValidationError> {
        self.validate()?;
        let (Some(category), Some(alert_type)) = (self.category, self.alert_type) else {
            return Err(ValidationError::MissingFields(vec!["category", "alertType"]));
        };

        let (target_price, target_percentage, direction) = match alert_type {
            AlertType::Price => (self.target_price, None, None),
            AlertType::Percentage => (
                None,
                self.target_percentage,
                Some(self.direction.unwrap_or_default()),
            ),
        };

        Ok(AlertConfiguration {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            category,
            alert_type,
            target_price,
            target_percentage,
            direction,
            suppliers: self.suppliers,
            notifications: self.notifications,
            custom_message: self
                .custom_message
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty()),
            status: AlertStatus::Active,
            created_at: Utc::now(),
        })
    }
}

/// Persistence for alerts
#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn insert(&self, alert: AlertConfiguration) -> anyhow::Result<AlertConfiguration>;

    /// Alerts for `user_id`, newest first
    async fn list(&self, user_id: &str) -> anyhow::Result<Vec<AlertConfiguration>>;

    /// `false` when no such alert belongs to `user_id`
    async fn delete(&self, user_id: &str, id: Uuid) -> anyhow::Result<bool>;
}

#[derive(Debug, Default)]
pub struct InMemoryAlertStore {
    alerts: RwLock<HashMap<Uuid, AlertConfiguration>>,
}

impl InMemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AlertStore for InMemoryAlertStore {
    async fn insert(&self, alert: AlertConfiguration) -> anyhow::Result<AlertConfiguration> {
        self.alerts.write().await.insert(alert.id, alert.clone());
        Ok(alert)
    }

    async fn list(&self, user_id: &str) -> anyhow::Result<Vec<AlertConfiguration>> {
        let mut alerts: Vec<_> = self
            .alerts
            .read()
            .await
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(alerts)
    }

    async fn delete(&self, user_id: &str, id: Uuid) -> anyhow::Result<bool> {
        let mut alerts = self.alerts.write().await;
        match alerts.get(&id) {
            Some(alert) if alert.user_id == user_id => {
                alerts.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Validate and store an alert for `identity`
pub async fn submit_alert(
    identity: Option<&str>,
    request: AlertRequest,
    store: &dyn AlertStore,
) -> Result<AlertConfiguration, SubmissionError> {
    let user_id = identity
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(SubmissionError::Auth)?;

    let alert = request.into_alert(user_id)?;
    tracing::info!(user_id, alert_id = %alert.id, category = ?alert.category, "Alert created");

    store.insert(alert).await.map_err(|e| {
        tracing::error!(user_id, error = %e, "Error saving alert");
        SubmissionError::Store(e.to_string())
    })
}
