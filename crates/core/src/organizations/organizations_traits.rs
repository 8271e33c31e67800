//! Organization and membership repository traits.

use async_trait::async_trait;

use super::organizations_model::{Membership, Organization, ProviderSession};
use crate::errors::Result;

/// Read access to organizations plus read-modify-write of the cached session.
///
/// The session is read fresh from storage on every sync run; nothing keeps it
/// in process memory between runs.
#[async_trait]
pub trait OrganizationRepositoryTrait: Send + Sync {
    /// Retrieves an organization by its ID.
    fn get_by_id(&self, organization_id: &str) -> Result<Organization>;

    /// Lists organizations that have a billing provider and an API key stored.
    fn list_with_billing(&self) -> Result<Vec<Organization>>;

    /// Reads the cached provider session, if any.
    fn get_session(&self, organization_id: &str) -> Result<Option<ProviderSession>>;

    /// Persists a freshly issued session. Concurrent writers race; last write wins.
    async fn save_session(&self, organization_id: &str, session: ProviderSession) -> Result<()>;
}

/// Membership lookups used to authorize interactive callers.
pub trait MembershipRepositoryTrait: Send + Sync {
    fn get_membership(&self, organization_id: &str, user_id: &str) -> Result<Option<Membership>>;
}
