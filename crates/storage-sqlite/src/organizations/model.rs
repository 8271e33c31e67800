//! Database models for organizations and memberships.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use log::warn;

use ledgerlink_core::organizations::{
    BillingProvider, BillingSettings, Membership, Organization, ProviderSession,
};

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::organizations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OrganizationDB {
    pub id: String,
    pub name: String,
    pub billing_provider: Option<String>,
    pub api_key: Option<String>,
    pub account_name: Option<String>,
    pub base_url: Option<String>,
    pub session_sid: Option<String>,
    pub session_expires_at: Option<String>,
    #[diesel(skip_insertion)]
    pub created_at: String,
    #[diesel(skip_insertion)]
    pub updated_at: String,
}

impl OrganizationDB {
    // Unknown providers read as unconfigured so credential resolution reports them.
    fn provider(&self) -> Option<BillingProvider> {
        let raw = self.billing_provider.as_deref()?;
        match raw.parse() {
            Ok(provider) => Some(provider),
            Err(e) => {
                warn!("Organization {} has an invalid billing provider: {}", self.id, e);
                None
            }
        }
    }

    fn session(&self) -> Option<ProviderSession> {
        let sid = self.session_sid.as_deref().filter(|s| !s.is_empty())?;
        let expires_at = self.session_expires_at.as_deref()?;
        match DateTime::parse_from_rfc3339(expires_at) {
            Ok(ts) => Some(ProviderSession::new(sid, ts.with_timezone(&Utc))),
            Err(e) => {
                warn!("Ignoring session of {} with unreadable expiry: {}", self.id, e);
                None
            }
        }
    }
}

impl From<OrganizationDB> for Organization {
    fn from(db: OrganizationDB) -> Self {
        let provider = db.provider();
        let session = db.session();
        Self {
            billing: BillingSettings {
                provider,
                api_key: db.api_key,
                account_name: db.account_name,
                base_url: db.base_url,
            },
            session,
            id: db.id,
            name: db.name,
        }
    }
}

#[derive(Queryable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::memberships)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MembershipDB {
    pub organization_id: String,
    pub user_id: String,
    pub role: String,
    pub status: String,
}

impl From<MembershipDB> for Membership {
    fn from(db: MembershipDB) -> Self {
        Self {
            organization_id: db.organization_id,
            user_id: db.user_id,
            role: db.role,
            status: db.status,
        }
    }
}
