//! Onboarding form boundary
//!
//! Validates a company profile submitted by a signed-in identity and upserts
//! it into a `ProfileStore`. Authentication happens upstream; this module only
//! checks that an identity was supplied.

use crate::error::{SubmissionError, ValidationError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// GSTIN length
const GSTIN_LEN: usize = 15;
const MIN_PHONE_LEN: usize = 10;

/// Raw submission; every field may be missing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingRequest {
    pub company_name: Option<String>,
    pub business_type: Option<String>,
    pub role: Option<String>,
    pub phone_number: Option<String>,
    pub pincode: Option<String>,
    pub gstin: Option<String>,
    #[serde(default)]
    pub interested_metals: Vec<String>,
}

/// Stored profile, one per identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingProfile {
    pub user_id: String,
    pub company_name: String,
    pub business_type: String,
    pub role: String,
    pub phone_number: String,
    pub pincode: String,
    pub gstin: String,
    pub interested_metals: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl OnboardingRequest {
    /// Check required fields, then formats, in that order
    ///
    /// All missing required fields are reported together.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let required = [
            ("companyName", &self.company_name),
            ("businessType", &self.business_type),
            ("role", &self.role),
            ("phoneNumber", &self.phone_number),
            ("pincode", &self.pincode),
            ("gstin", &self.gstin),
        ];
        let missing: Vec<&'static str> = required
            .iter()
            .filter(|(_, value)| present(value).is_none())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }

        if !self.interested_metals.iter().any(|m| !m.trim().is_empty()) {
            return Err(ValidationError::NoMetalsSelected);
        }

        let gstin = present(&self.gstin).unwrap_or_default();
        if gstin.chars().count() != GSTIN_LEN {
            return Err(ValidationError::InvalidGstin);
        }

        let phone = present(&self.phone_number).unwrap_or_default();
        if phone.chars().count() < MIN_PHONE_LEN {
            return Err(ValidationError::InvalidPhoneNumber);
        }

        Ok(())
    }

    /// Validated profile for `user_id`
    pub fn into_profile(self, user_id: &str) -> Result<OnboardingProfile, ValidationError> {
        self.validate()?;
        let field = |v: &Option<String>| present(v).unwrap_or_default().to_string();
        let now = Utc::now();

        Ok(OnboardingProfile {
            user_id: user_id.to_string(),
            company_name: field(&self.company_name),
            business_type: field(&self.business_type),
            role: field(&self.role),
            phone_number: field(&self.phone_number),
            pincode: field(&self.pincode),
            gstin: field(&self.gstin),
            interested_metals: self
                .interested_metals
                .into_iter()
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect(),
            created_at: now,
            updated_at: now,
        })
    }
}

/// Persistence for onboarding profiles
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Insert or replace the profile for its `user_id`
    async fn upsert(&self, profile: OnboardingProfile) -> anyhow::Result<OnboardingProfile>;

    async fn get(&self, user_id: &str) -> anyhow::Result<Option<OnboardingProfile>>;
}

#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<String, OnboardingProfile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn upsert(&self, mut profile: OnboardingProfile) -> anyhow::Result<OnboardingProfile> {
        let mut profiles = self.profiles.write().await;
        if let Some(existing) = profiles.get(&profile.user_id) {
            profile.created_at = existing.created_at;
        }
        profiles.insert(profile.user_id.clone(), profile.clone());
        Ok(profile)
    }

    async fn get(&self, user_id: &str) -> anyhow::Result<Option<OnboardingProfile>> {
        Ok(self.profiles.read().await.get(user_id).cloned())
    }
}

/// Validate and store a submission for `identity`
pub async fn submit(
    identity: Option<&str>,
    request: OnboardingRequest,
    store: &dyn ProfileStore,
) -> Result<OnboardingProfile, SubmissionError> {
    let user_id = identity
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(SubmissionError::Auth)?;

    let profile = request.into_profile(user_id)?;

    store.upsert(profile).await.map_err(|e| {
        tracing::error!(user_id, error = %e, "Error saving onboarding profile");
        SubmissionError::Store(e.to_string())
    })
}
