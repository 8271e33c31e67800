use log::warn;

use ledgerlink_core::errors::{Error, Result};
use ledgerlink_core::organizations::MembershipRepositoryTrait;

/// Fails with `Error::Authorization` unless `user_id` is an active member.
pub fn ensure_active_member(
    memberships: &dyn MembershipRepositoryTrait,
    organization_id: &str,
    user_id: &str,
) -> Result<()> {
    match memberships.get_membership(organization_id, user_id)? {
        Some(membership) if membership.is_active() => Ok(()),
        Some(membership) => {
            warn!(
                "[Access] User {} has a {} membership in {}",
                user_id, membership.status, organization_id
            );
            Err(Error::Authorization(format!(
                "membership in organization {} is not active",
                organization_id
            )))
        }
        None => Err(Error::Authorization(format!(
            "not a member of organization {}",
            organization_id
        ))),
    }
}
