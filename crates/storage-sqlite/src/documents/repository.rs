use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;
use uuid::Uuid;

use ledgerlink_core::documents::{
    BillingDocument, BillingDocumentRepositoryTrait, CreditNote, CreditNoteRepositoryTrait,
    NewBillingDocument, NewCreditNote, UpsertOutcome,
};
use ledgerlink_core::errors::Result;

use super::model::{BillingDocumentDB, CreditNoteDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{billing_documents, credit_notes};

/// Mirror of every fetched document, keyed by `(organization_id, external_id)`.
pub struct BillingDocumentRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl BillingDocumentRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl BillingDocumentRepositoryTrait for BillingDocumentRepository {
    fn get(&self, organization_id: &str, external_id: &str) -> Result<Option<BillingDocument>> {
        let mut conn = get_connection(&self.pool)?;
        let row = billing_documents::table
            .filter(billing_documents::organization_id.eq(organization_id))
            .filter(billing_documents::external_id.eq(external_id))
            .select(BillingDocumentDB::as_select())
            .first::<BillingDocumentDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(BillingDocument::try_from).transpose()?)
    }

    fn list_for_organization(&self, organization_id: &str) -> Result<Vec<BillingDocument>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = billing_documents::table
            .filter(billing_documents::organization_id.eq(organization_id))
            .order(billing_documents::external_id.asc())
            .select(BillingDocumentDB::as_select())
            .load::<BillingDocumentDB>(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter()
            .map(|row| BillingDocument::try_from(row).map_err(Into::into))
            .collect()
    }

    async fn upsert(&self, document: NewBillingDocument) -> Result<UpsertOutcome> {
        self.writer
            .exec(move |conn| {
                let existing_pdf = billing_documents::table
                    .filter(billing_documents::organization_id.eq(&document.organization_id))
                    .filter(billing_documents::external_id.eq(&document.external_id))
                    .select(billing_documents::pdf_path)
                    .first::<Option<String>>(conn)
                    .optional()
                    .map_err(StorageError::from)?;

                let now = Utc::now().to_rfc3339();
                let row = BillingDocumentDB::from_new(Uuid::new_v4().to_string(), document, &now)?;
                let changes = row.changeset(existing_pdf.clone().flatten());

                diesel::insert_into(billing_documents::table)
                    .values(&row)
                    .on_conflict((
                        billing_documents::organization_id,
                        billing_documents::external_id,
                    ))
                    .do_update()
                    .set(&changes)
                    .execute(conn)
                    .map_err(StorageError::from)?;

                Ok(if existing_pdf.is_some() {
                    UpsertOutcome::Updated
                } else {
                    UpsertOutcome::Inserted
                })
            })
            .await
    }
}

/// Credit-note mirror. Rows here exclude the same id from invoice processing.
pub struct CreditNoteRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl CreditNoteRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl CreditNoteRepositoryTrait for CreditNoteRepository {
    fn get(&self, organization_id: &str, external_id: &str) -> Result<Option<CreditNote>> {
        let mut conn = get_connection(&self.pool)?;
        let row = credit_notes::table
            .filter(credit_notes::organization_id.eq(organization_id))
            .filter(credit_notes::external_id.eq(external_id))
            .select(CreditNoteDB::as_select())
            .first::<CreditNoteDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(CreditNote::try_from).transpose()?)
    }

    fn exists(&self, organization_id: &str, external_id: &str) -> Result<bool> {
        let mut conn = get_connection(&self.pool)?;
        let count: i64 = credit_notes::table
            .filter(credit_notes::organization_id.eq(organization_id))
            .filter(credit_notes::external_id.eq(external_id))
            .count()
            .get_result(&mut conn)
            .map_err(StorageError::from)?;
        Ok(count > 0)
    }

    async fn upsert(&self, note: NewCreditNote) -> Result<UpsertOutcome> {
        self.writer
            .exec(move |conn| {
                let existing_pdf = credit_notes::table
                    .filter(credit_notes::organization_id.eq(&note.organization_id))
                    .filter(credit_notes::external_id.eq(&note.external_id))
                    .select(credit_notes::pdf_path)
                    .first::<Option<String>>(conn)
                    .optional()
                    .map_err(StorageError::from)?;

                let now = Utc::now().to_rfc3339();
                let row = CreditNoteDB::from_new(Uuid::new_v4().to_string(), note, &now)?;
                let changes = row.changeset(existing_pdf.clone().flatten());

                diesel::insert_into(credit_notes::table)
                    .values(&row)
                    .on_conflict((credit_notes::organization_id, credit_notes::external_id))
                    .do_update()
                    .set(&changes)
                    .execute(conn)
                    .map_err(StorageError::from)?;

                Ok(if existing_pdf.is_some() {
                    UpsertOutcome::Updated
                } else {
                    UpsertOutcome::Inserted
                })
            })
            .await
    }
}
