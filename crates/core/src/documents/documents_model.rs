//! Billing document domain models.
//!
//! `ExternalDocument` is what a provider returns on every run and is never
//! owned locally. `BillingDocument` and `CreditNote` are the local mirror
//! rows, keyed by `(organization_id, external_id)`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::errors::{Error, ValidationError};

/// Fiscal document types, in the order they are synced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Invoice,
    InvoiceReceipt,
    SimplifiedInvoice,
    CreditNote,
}

impl DocumentType {
    /// Declared sync order. Credit notes run last.
    pub const ALL: [DocumentType; 4] = [
        DocumentType::Invoice,
        DocumentType::InvoiceReceipt,
        DocumentType::SimplifiedInvoice,
        DocumentType::CreditNote,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Invoice => "invoice",
            DocumentType::InvoiceReceipt => "invoice_receipt",
            DocumentType::SimplifiedInvoice => "simplified_invoice",
            DocumentType::CreditNote => "credit_note",
        }
    }

    pub fn is_credit_note(&self) -> bool {
        matches!(self, DocumentType::CreditNote)
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "invoice" => Ok(DocumentType::Invoice),
            "invoice_receipt" => Ok(DocumentType::InvoiceReceipt),
            "simplified_invoice" => Ok(DocumentType::SimplifiedInvoice),
            "credit_note" => Ok(DocumentType::CreditNote),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown document type '{}'",
                other
            )))),
        }
    }
}

/// A fiscal document as returned by a provider listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalDocument {
    pub external_id: String,
    pub document_type: DocumentType,
    /// Human-readable reference, e.g. "FT 2024/0001".
    pub reference: Option<String>,
    pub status: Option<String>,
    pub client_name: Option<String>,
    pub total: Option<Decimal>,
    pub date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    /// Provider field that may carry an internal sale id verbatim.
    pub proprietary_id: Option<String>,
    /// For credit notes: the external id of the document it corrects.
    pub related_external_id: Option<String>,
    /// Free-text observations / notes.
    pub observations: Option<String>,
    /// The untouched provider payload.
    pub raw: Value,
}

impl ExternalDocument {
    /// Creates a document with only its identity set.
    pub fn new(external_id: impl Into<String>, document_type: DocumentType) -> Self {
        Self {
            external_id: external_id.into(),
            document_type,
            reference: None,
            status: None,
            client_name: None,
            total: None,
            date: None,
            due_date: None,
            proprietary_id: None,
            related_external_id: None,
            observations: None,
            raw: Value::Null,
        }
    }

    /// Trailing segment of the reference after the last `/`.
    ///
    /// "FT 2024/0001" yields "0001"; a reference without `/` is returned trimmed.
    pub fn reference_tail(&self) -> Option<&str> {
        let reference = self.reference.as_deref()?.trim();
        let tail = reference.rsplit('/').next().unwrap_or(reference).trim();
        if tail.is_empty() {
            None
        } else {
            Some(tail)
        }
    }
}

/// Outcome of matching a document against local records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub sale_id: Option<String>,
    pub payment_id: Option<String>,
}

impl MatchResult {
    pub fn sale(sale_id: impl Into<String>) -> Self {
        Self {
            sale_id: Some(sale_id.into()),
            payment_id: None,
        }
    }

    pub fn payment(payment_id: impl Into<String>, sale_id: Option<String>) -> Self {
        Self {
            sale_id,
            payment_id: Some(payment_id.into()),
        }
    }

    pub fn unmatched() -> Self {
        Self::default()
    }

    pub fn is_matched(&self) -> bool {
        self.sale_id.is_some() || self.payment_id.is_some()
    }
}

/// Local mirror of an external document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingDocument {
    pub id: String,
    pub organization_id: String,
    pub external_id: String,
    pub reference: Option<String>,
    pub document_type: DocumentType,
    pub status: Option<String>,
    pub client_name: Option<String>,
    pub total: Option<Decimal>,
    pub date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub sale_id: Option<String>,
    pub payment_id: Option<String>,
    pub pdf_path: Option<String>,
    pub raw_data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for upserting a mirror row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBillingDocument {
    pub organization_id: String,
    pub external_id: String,
    pub reference: Option<String>,
    pub document_type: DocumentType,
    pub status: Option<String>,
    pub client_name: Option<String>,
    pub total: Option<Decimal>,
    pub date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub sale_id: Option<String>,
    pub payment_id: Option<String>,
    /// `None` keeps whatever path is already stored.
    pub pdf_path: Option<String>,
    pub raw_data: Value,
}

impl NewBillingDocument {
    pub fn from_external(
        organization_id: &str,
        document: &ExternalDocument,
        matched: &MatchResult,
        pdf_path: Option<String>,
    ) -> Self {
        Self {
            organization_id: organization_id.to_string(),
            external_id: document.external_id.clone(),
            reference: document.reference.clone(),
            document_type: document.document_type,
            status: document.status.clone(),
            client_name: document.client_name.clone(),
            total: document.total,
            date: document.date,
            due_date: document.due_date,
            sale_id: matched.sale_id.clone(),
            payment_id: matched.payment_id.clone(),
            pdf_path,
            raw_data: document.raw.clone(),
        }
    }
}

/// Local mirror of a credit note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditNote {
    pub id: String,
    pub organization_id: String,
    pub external_id: String,
    pub reference: Option<String>,
    pub status: Option<String>,
    pub client_name: Option<String>,
    pub total: Option<Decimal>,
    pub date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub related_external_id: Option<String>,
    pub sale_id: Option<String>,
    pub payment_id: Option<String>,
    pub pdf_path: Option<String>,
    pub raw_data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for upserting a credit-note row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCreditNote {
    pub organization_id: String,
    pub external_id: String,
    pub reference: Option<String>,
    pub status: Option<String>,
    pub client_name: Option<String>,
    pub total: Option<Decimal>,
    pub date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub related_external_id: Option<String>,
    pub sale_id: Option<String>,
    pub payment_id: Option<String>,
    pub pdf_path: Option<String>,
    pub raw_data: Value,
}

impl From<&NewBillingDocument> for NewCreditNote {
    fn from(doc: &NewBillingDocument) -> Self {
        Self {
            organization_id: doc.organization_id.clone(),
            external_id: doc.external_id.clone(),
            reference: doc.reference.clone(),
            status: doc.status.clone(),
            client_name: doc.client_name.clone(),
            total: doc.total,
            date: doc.date,
            due_date: doc.due_date,
            related_external_id: None,
            sale_id: doc.sale_id.clone(),
            payment_id: doc.payment_id.clone(),
            pdf_path: doc.pdf_path.clone(),
            raw_data: doc.raw_data.clone(),
        }
    }
}

/// Whether an upsert created a row or converged onto an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    /// Not written: the id already belongs to the credit-note table.
    SkippedCreditNote,
}

/// Deterministic blob path for a document PDF.
pub fn pdf_blob_path(organization_id: &str, document_type: DocumentType, external_id: &str) -> String {
    format!("{}/{}_{}.pdf", organization_id, document_type.as_str(), external_id)
}
