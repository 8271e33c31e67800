//! Provider payloads and their mapping to `ExternalDocument`.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use ledgerlink_core::documents::{DocumentType, ExternalDocument};

// ─────────────────────────────────────────────────────────────────────────────
// Token API payloads
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct TokenApiClientRef {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenApiRelatedDocument {
    #[serde(default)]
    pub id: Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenApiDocument {
    pub id: Value,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub sequence_number: Option<String>,
    /// Free reference field. Documents issued by the app carry the sale id here.
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub total: Value,
    #[serde(default)]
    pub client: Option<TokenApiClientRef>,
    #[serde(default)]
    pub observations: Option<String>,
    #[serde(default)]
    pub related_documents: Vec<TokenApiRelatedDocument>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenApiPdfOutput {
    #[serde(rename = "pdfUrl")]
    pub pdf_url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenApiPdfResponse {
    pub output: TokenApiPdfOutput,
}

impl TokenApiDocument {
    pub fn into_external(self, document_type: DocumentType, raw: Value) -> Option<ExternalDocument> {
        let external_id = id_string(&self.id)?;
        let mut doc = ExternalDocument::new(external_id, document_type);
        doc.reference = non_empty(self.sequence_number);
        doc.status = non_empty(self.status);
        doc.client_name = self.client.and_then(|c| non_empty(c.name));
        doc.total = decimal(&self.total);
        doc.date = self.date.as_deref().and_then(parse_date);
        doc.due_date = self.due_date.as_deref().and_then(parse_date);
        doc.proprietary_id = non_empty(self.reference);
        doc.related_external_id = self
            .related_documents
            .iter()
            .find_map(|r| id_string(&r.id));
        doc.observations = non_empty(self.observations);
        doc.raw = raw;
        Some(doc)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session API payloads
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct SessionAuthResponse {
    #[serde(default)]
    pub sid: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SessionApiListResponse {
    #[serde(default)]
    pub documents: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SessionApiDocument {
    pub id: Value,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub total: Value,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub external_reference: Option<String>,
    #[serde(default)]
    pub related_document_id: Value,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SessionApiPdfResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl SessionApiDocument {
    pub fn into_external(self, document_type: DocumentType, raw: Value) -> Option<ExternalDocument> {
        let external_id = id_string(&self.id)?;
        let mut doc = ExternalDocument::new(external_id, document_type);
        doc.reference = non_empty(self.number);
        doc.status = non_empty(self.status);
        doc.client_name = non_empty(self.customer_name);
        doc.total = decimal(&self.total);
        doc.date = self.date.as_deref().and_then(parse_date);
        doc.due_date = self.due_date.as_deref().and_then(parse_date);
        doc.proprietary_id = non_empty(self.external_reference);
        doc.related_external_id = id_string(&self.related_document_id);
        doc.observations = non_empty(self.notes);
        doc.raw = raw;
        Some(doc)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Field helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Provider ids come as numbers or strings.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

/// Accepts ISO dates and the day-first format some providers use.
fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%d/%m/%Y"))
        .or_else(|_| NaiveDate::parse_from_str(value, "%d-%m-%Y"))
        .ok()
        .or_else(|| value.get(..10).and_then(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").ok()))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
