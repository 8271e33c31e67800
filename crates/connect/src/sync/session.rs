//! Provider session caching for session-auth providers.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use log::{debug, info};

use ledgerlink_core::errors::Result;
use ledgerlink_core::organizations::{OrganizationRepositoryTrait, ProviderSession};

use crate::provider::BillingApiClient;

/// Hands out a usable session id, re-authenticating when the cached one is
/// missing or close to expiry.
///
/// The session lives on the organization row. Two concurrent runs may both
/// refresh; the last write wins and both sessions stay valid upstream.
#[derive(Clone)]
pub struct SessionManager {
    organizations: Arc<dyn OrganizationRepositoryTrait>,
    ttl: Duration,
    refresh_margin: Duration,
}

impl SessionManager {
    pub fn new(
        organizations: Arc<dyn OrganizationRepositoryTrait>,
        ttl: Duration,
        refresh_margin: Duration,
    ) -> Self {
        Self {
            organizations,
            ttl,
            refresh_margin,
        }
    }

    /// Session to pass to `client`, or `None` when its provider has no sessions.
    pub async fn session_for(
        &self,
        organization_id: &str,
        client: &dyn BillingApiClient,
    ) -> Result<Option<String>> {
        if !client.provider().requires_session() {
            return Ok(None);
        }
        self.get_session_at(organization_id, client, Utc::now())
            .await
            .map(Some)
    }

    /// Returns the cached sid if more than the refresh margin remains at
    /// `now`, otherwise authenticates and persists the new session.
    pub async fn get_session_at(
        &self,
        organization_id: &str,
        client: &dyn BillingApiClient,
        now: DateTime<Utc>,
    ) -> Result<String> {
        if let Some(cached) = self.organizations.get_session(organization_id)? {
            if cached.is_usable_at(now, self.refresh_margin) {
                debug!("[Session] Reusing provider session for {}", organization_id);
                return Ok(cached.sid);
            }
            debug!(
                "[Session] Provider session for {} expires at {}, refreshing",
                organization_id, cached.expires_at
            );
        }

        let sid = client.authenticate().await?;
        let session = ProviderSession::new(sid.clone(), now + self.ttl);
        self.organizations
            .save_session(organization_id, session)
            .await?;
        info!("[Session] Issued new {} session for {}", client.provider(), organization_id);
        Ok(sid)
    }
}
