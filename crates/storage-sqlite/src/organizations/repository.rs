use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use ledgerlink_core::errors::{DatabaseError, Error, Result};
use ledgerlink_core::organizations::{
    Membership, MembershipRepositoryTrait, Organization, OrganizationRepositoryTrait,
    ProviderSession,
};

use super::model::{MembershipDB, OrganizationDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{memberships, organizations};

pub struct OrganizationRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl OrganizationRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }

    fn find(&self, organization_id: &str) -> Result<Option<OrganizationDB>> {
        let mut conn = get_connection(&self.pool)?;
        let row = organizations::table
            .find(organization_id)
            .select(OrganizationDB::as_select())
            .first::<OrganizationDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row)
    }
}

#[async_trait]
impl OrganizationRepositoryTrait for OrganizationRepository {
    fn get_by_id(&self, organization_id: &str) -> Result<Organization> {
        self.find(organization_id)?
            .map(Organization::from)
            .ok_or_else(|| {
                Error::Database(DatabaseError::NotFound(format!(
                    "Organization {} not found",
                    organization_id
                )))
            })
    }

    fn list_with_billing(&self) -> Result<Vec<Organization>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = organizations::table
            .filter(organizations::billing_provider.is_not_null())
            .filter(organizations::api_key.is_not_null())
            .filter(organizations::api_key.ne(""))
            .order(organizations::id.asc())
            .select(OrganizationDB::as_select())
            .load::<OrganizationDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Organization::from).collect())
    }

    fn get_session(&self, organization_id: &str) -> Result<Option<ProviderSession>> {
        Ok(self.get_by_id(organization_id)?.session)
    }

    async fn save_session(&self, organization_id: &str, session: ProviderSession) -> Result<()> {
        let organization_id = organization_id.to_string();
        self.writer
            .exec(move |conn| {
                let updated = diesel::update(organizations::table.find(&organization_id))
                    .set((
                        organizations::session_sid.eq(Some(session.sid)),
                        organizations::session_expires_at
                            .eq(Some(session.expires_at.to_rfc3339())),
                        organizations::updated_at.eq(Utc::now().to_rfc3339()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                if updated == 0 {
                    return Err(Error::Database(DatabaseError::NotFound(format!(
                        "Organization {} not found",
                        organization_id
                    ))));
                }
                Ok(())
            })
            .await
    }
}

pub struct MembershipRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
}

impl MembershipRepository {
    pub fn new(pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }
}

impl MembershipRepositoryTrait for MembershipRepository {
    fn get_membership(&self, organization_id: &str, user_id: &str) -> Result<Option<Membership>> {
        let mut conn = get_connection(&self.pool)?;
        let row = memberships::table
            .find((organization_id, user_id))
            .select(MembershipDB::as_select())
            .first::<MembershipDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(Membership::from))
    }
}
