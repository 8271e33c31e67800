//! Database models for the document mirror tables.
//!
//! Totals and dates are stored as text: totals as the decimal's canonical
//! string, dates as `YYYY-MM-DD`, timestamps as RFC 3339.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use ledgerlink_core::documents::{
    BillingDocument, CreditNote, DocumentType, NewBillingDocument, NewCreditNote,
};

use crate::errors::StorageError;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::billing_documents)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BillingDocumentDB {
    pub id: String,
    pub organization_id: String,
    pub external_id: String,
    pub reference: Option<String>,
    pub document_type: String,
    pub status: Option<String>,
    pub client_name: Option<String>,
    pub total: Option<String>,
    pub date: Option<String>,
    pub due_date: Option<String>,
    pub sale_id: Option<String>,
    pub payment_id: Option<String>,
    pub pdf_path: Option<String>,
    pub raw_data: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Columns overwritten when an upsert hits an existing mirror row.
#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::billing_documents)]
#[diesel(treat_none_as_null = true)]
pub struct BillingDocumentChangeset {
    pub reference: Option<String>,
    pub document_type: String,
    pub status: Option<String>,
    pub client_name: Option<String>,
    pub total: Option<String>,
    pub date: Option<String>,
    pub due_date: Option<String>,
    pub sale_id: Option<String>,
    pub payment_id: Option<String>,
    pub pdf_path: Option<String>,
    pub raw_data: String,
    pub updated_at: String,
}

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::credit_notes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CreditNoteDB {
    pub id: String,
    pub organization_id: String,
    pub external_id: String,
    pub reference: Option<String>,
    pub status: Option<String>,
    pub client_name: Option<String>,
    pub total: Option<String>,
    pub date: Option<String>,
    pub due_date: Option<String>,
    pub related_external_id: Option<String>,
    pub sale_id: Option<String>,
    pub payment_id: Option<String>,
    pub pdf_path: Option<String>,
    pub raw_data: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::credit_notes)]
#[diesel(treat_none_as_null = true)]
pub struct CreditNoteChangeset {
    pub reference: Option<String>,
    pub status: Option<String>,
    pub client_name: Option<String>,
    pub total: Option<String>,
    pub date: Option<String>,
    pub due_date: Option<String>,
    pub related_external_id: Option<String>,
    pub sale_id: Option<String>,
    pub payment_id: Option<String>,
    pub pdf_path: Option<String>,
    pub raw_data: String,
    pub updated_at: String,
}

fn format_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format(DATE_FORMAT).to_string())
}

fn parse_date(column: &'static str, value: Option<String>) -> Result<Option<NaiveDate>, StorageError> {
    value
        .filter(|v| !v.is_empty())
        .map(|v| NaiveDate::parse_from_str(&v, DATE_FORMAT).map_err(|e| StorageError::decode(column, e)))
        .transpose()
}

fn parse_total(value: Option<String>) -> Result<Option<Decimal>, StorageError> {
    value
        .filter(|v| !v.is_empty())
        .map(|v| Decimal::from_str(&v).map_err(|e| StorageError::decode("total", e)))
        .transpose()
}

fn parse_timestamp(column: &'static str, value: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StorageError::decode(column, e))
}

fn parse_raw(value: &str) -> Result<serde_json::Value, StorageError> {
    serde_json::from_str(value).map_err(|e| StorageError::decode("raw_data", e))
}

impl BillingDocumentDB {
    pub fn from_new(id: String, doc: NewBillingDocument, now: &str) -> Result<Self, StorageError> {
        Ok(Self {
            id,
            organization_id: doc.organization_id,
            external_id: doc.external_id,
            reference: doc.reference,
            document_type: doc.document_type.as_str().to_string(),
            status: doc.status,
            client_name: doc.client_name,
            total: doc.total.map(|t| t.to_string()),
            date: format_date(doc.date),
            due_date: format_date(doc.due_date),
            sale_id: doc.sale_id,
            payment_id: doc.payment_id,
            pdf_path: doc.pdf_path,
            raw_data: serde_json::to_string(&doc.raw_data)
                .map_err(|e| StorageError::decode("raw_data", e))?,
            created_at: now.to_string(),
            updated_at: now.to_string(),
        })
    }

    /// The update half of the upsert. A missing new PDF path keeps `existing_pdf`.
    pub fn changeset(&self, existing_pdf: Option<String>) -> BillingDocumentChangeset {
        BillingDocumentChangeset {
            reference: self.reference.clone(),
            document_type: self.document_type.clone(),
            status: self.status.clone(),
            client_name: self.client_name.clone(),
            total: self.total.clone(),
            date: self.date.clone(),
            due_date: self.due_date.clone(),
            sale_id: self.sale_id.clone(),
            payment_id: self.payment_id.clone(),
            pdf_path: self.pdf_path.clone().or(existing_pdf),
            raw_data: self.raw_data.clone(),
            updated_at: self.updated_at.clone(),
        }
    }
}

impl TryFrom<BillingDocumentDB> for BillingDocument {
    type Error = StorageError;

    fn try_from(db: BillingDocumentDB) -> Result<Self, Self::Error> {
        Ok(Self {
            document_type: DocumentType::from_str(&db.document_type)
                .map_err(|e| StorageError::decode("document_type", e))?,
            total: parse_total(db.total)?,
            date: parse_date("date", db.date)?,
            due_date: parse_date("due_date", db.due_date)?,
            raw_data: parse_raw(&db.raw_data)?,
            created_at: parse_timestamp("created_at", &db.created_at)?,
            updated_at: parse_timestamp("updated_at", &db.updated_at)?,
            id: db.id,
            organization_id: db.organization_id,
            external_id: db.external_id,
            reference: db.reference,
            status: db.status,
            client_name: db.client_name,
            sale_id: db.sale_id,
            payment_id: db.payment_id,
            pdf_path: db.pdf_path,
        })
    }
}

impl CreditNoteDB {
    pub fn from_new(id: String, note: NewCreditNote, now: &str) -> Result<Self, StorageError> {
        Ok(Self {
            id,
            organization_id: note.organization_id,
            external_id: note.external_id,
            reference: note.reference,
            status: note.status,
            client_name: note.client_name,
            total: note.total.map(|t| t.to_string()),
            date: format_date(note.date),
            due_date: format_date(note.due_date),
            related_external_id: note.related_external_id,
            sale_id: note.sale_id,
            payment_id: note.payment_id,
            pdf_path: note.pdf_path,
            raw_data: serde_json::to_string(&note.raw_data)
                .map_err(|e| StorageError::decode("raw_data", e))?,
            created_at: now.to_string(),
            updated_at: now.to_string(),
        })
    }

    pub fn changeset(&self, existing_pdf: Option<String>) -> CreditNoteChangeset {
        CreditNoteChangeset {
            reference: self.reference.clone(),
            status: self.status.clone(),
            client_name: self.client_name.clone(),
            total: self.total.clone(),
            date: self.date.clone(),
            due_date: self.due_date.clone(),
            related_external_id: self.related_external_id.clone(),
            sale_id: self.sale_id.clone(),
            payment_id: self.payment_id.clone(),
            pdf_path: self.pdf_path.clone().or(existing_pdf),
            raw_data: self.raw_data.clone(),
            updated_at: self.updated_at.clone(),
        }
    }
}

impl TryFrom<CreditNoteDB> for CreditNote {
    type Error = StorageError;

    fn try_from(db: CreditNoteDB) -> Result<Self, Self::Error> {
        Ok(Self {
            total: parse_total(db.total)?,
            date: parse_date("date", db.date)?,
            due_date: parse_date("due_date", db.due_date)?,
            raw_data: parse_raw(&db.raw_data)?,
            created_at: parse_timestamp("created_at", &db.created_at)?,
            updated_at: parse_timestamp("updated_at", &db.updated_at)?,
            id: db.id,
            organization_id: db.organization_id,
            external_id: db.external_id,
            reference: db.reference,
            status: db.status,
            client_name: db.client_name,
            related_external_id: db.related_external_id,
            sale_id: db.sale_id,
            payment_id: db.payment_id,
            pdf_path: db.pdf_path,
        })
    }
}
