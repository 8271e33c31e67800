mod model;
mod repository;

pub use model::{MembershipDB, OrganizationDB};
pub use repository::{MembershipRepository, OrganizationRepository};
