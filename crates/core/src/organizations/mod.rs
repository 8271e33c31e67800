//! Organizations module - billing settings, provider sessions and memberships.

mod organizations_model;
mod organizations_traits;

pub use organizations_model::*;
pub use organizations_traits::{MembershipRepositoryTrait, OrganizationRepositoryTrait};
