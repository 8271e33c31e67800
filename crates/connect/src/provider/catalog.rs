//! Mapping between document types and provider-specific names.

use ledgerlink_core::documents::DocumentType;

/// Collection path segment (and listing JSON key) on the token API.
pub fn token_api_endpoint(document_type: DocumentType) -> &'static str {
    match document_type {
        DocumentType::Invoice => "invoices",
        DocumentType::InvoiceReceipt => "invoice_receipts",
        DocumentType::SimplifiedInvoice => "simplified_invoices",
        DocumentType::CreditNote => "credit_notes",
    }
}

/// Singular JSON root used in token API request bodies.
pub fn token_api_root(document_type: DocumentType) -> &'static str {
    document_type.as_str()
}

/// Fiscal series code used by the session API.
pub fn session_api_code(document_type: DocumentType) -> &'static str {
    match document_type {
        DocumentType::Invoice => "FT",
        DocumentType::InvoiceReceipt => "FR",
        DocumentType::SimplifiedInvoice => "FS",
        DocumentType::CreditNote => "NC",
    }
}
