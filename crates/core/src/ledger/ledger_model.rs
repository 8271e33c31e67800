//! Local sale and payment models (link-relevant fields only).

use serde::{Deserialize, Serialize};

/// A sale as seen by the reconciliation engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalSale {
    pub id: String,
    pub organization_id: String,
    pub client_name: Option<String>,
    pub external_invoice_id: Option<String>,
    /// Free text typed by users, e.g. "FT 2024/0001".
    pub invoice_reference: Option<String>,
    pub invoice_file_url: Option<String>,
    pub credit_note_external_id: Option<String>,
}

impl LocalSale {
    pub fn has_credit_note(&self) -> bool {
        self.credit_note_external_id
            .as_deref()
            .map(|s| !s.is_empty())
            .unwrap_or(false)
    }
}

/// A payment as seen by the reconciliation engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalPayment {
    pub id: String,
    pub organization_id: String,
    pub sale_id: Option<String>,
    pub external_invoice_id: Option<String>,
    pub invoice_reference: Option<String>,
    pub invoice_file_url: Option<String>,
}

/// Link fields written back onto a sale or payment after a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLink {
    pub external_id: String,
    pub reference: Option<String>,
    pub file_url: Option<String>,
}
