//! Organization domain models.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{Error, ValidationError};

/// The billing providers an organization can be connected to.
///
/// The two providers differ in their auth model: `TokenApi` authenticates
/// every request with an account-scoped API key, `SessionApi` exchanges the
/// API key for a short-lived session id first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingProvider {
    TokenApi,
    SessionApi,
}

impl BillingProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingProvider::TokenApi => "token_api",
            BillingProvider::SessionApi => "session_api",
        }
    }

    /// Whether requests need a session obtained through `authenticate`.
    pub fn requires_session(&self) -> bool {
        matches!(self, BillingProvider::SessionApi)
    }
}

impl fmt::Display for BillingProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "token_api" => Ok(BillingProvider::TokenApi),
            "session_api" => Ok(BillingProvider::SessionApi),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown billing provider '{}'",
                other
            )))),
        }
    }
}

/// Billing settings as stored on the organization row.
///
/// Every field is optional at rest; `CredentialResolver` decides which ones
/// are required for the selected provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingSettings {
    pub provider: Option<BillingProvider>,
    pub api_key: Option<String>,
    /// Account slug used by the token API to build the account host.
    pub account_name: Option<String>,
    /// Optional override of the provider base URL.
    pub base_url: Option<String>,
}

impl BillingSettings {
    /// True when a provider is selected and an API key is present.
    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
            && self
                .api_key
                .as_deref()
                .map(|k| !k.trim().is_empty())
                .unwrap_or(false)
    }
}

/// Cached session for providers that use session auth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSession {
    pub sid: String,
    pub expires_at: DateTime<Utc>,
}

impl ProviderSession {
    pub fn new(sid: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            sid: sid.into(),
            expires_at,
        }
    }

    /// A session is reusable only while more than `margin` of its lifetime remains.
    pub fn is_usable_at(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.expires_at > now + margin
    }
}

/// An organization (tenant) with its billing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub billing: BillingSettings,
    pub session: Option<ProviderSession>,
}

/// Membership of a user in an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub organization_id: String,
    pub user_id: String,
    pub role: String,
    pub status: String,
}

impl Membership {
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("active")
    }
}
