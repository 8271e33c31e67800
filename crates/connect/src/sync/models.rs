//! Sync and cancellation request/response types.

use serde::{Deserialize, Serialize};

use ledgerlink_core::documents::DocumentType;

/// Counts returned by a single-organization sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SyncSummary {
    pub total: usize,
    pub matched: usize,
    pub not_matched: usize,
}

impl SyncSummary {
    pub fn record(&mut self, matched: bool) {
        self.total += 1;
        if matched {
            self.matched += 1;
        } else {
            self.not_matched += 1;
        }
    }
}

/// Aggregate counts for a batch run over every configured organization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BatchSyncSummary {
    pub total: usize,
    pub matched: usize,
    pub not_matched: usize,
    pub orgs_processed: usize,
    pub orgs_failed: usize,
}

impl BatchSyncSummary {
    pub fn add(&mut self, summary: &SyncSummary) {
        self.total += summary.total;
        self.matched += summary.matched;
        self.not_matched += summary.not_matched;
        self.orgs_processed += 1;
    }
}

/// Where a document ended up within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentState {
    PersistedWithPdf,
    PersistedWithoutPdf,
    /// Skipped because a credit note with the same external id exists.
    Excluded,
    /// Persistence failed; the document still counts as processed.
    Failed,
}

/// Per-type diagnostics of one run. Logged, not returned to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeReport {
    pub document_type: DocumentType,
    pub fetched: usize,
    pub pages: u32,
    pub matched: usize,
    pub not_matched: usize,
    pub excluded: usize,
    pub failed: usize,
    pub pdfs_stored: usize,
    /// Set when listing this type stopped on a provider error.
    pub aborted: Option<String>,
}

impl TypeReport {
    pub fn new(document_type: DocumentType) -> Self {
        Self {
            document_type,
            fetched: 0,
            pages: 0,
            matched: 0,
            not_matched: 0,
            excluded: 0,
            failed: 0,
            pdfs_stored: 0,
            aborted: None,
        }
    }
}

/// Request to void a document upstream and unlink it locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CancelRequest {
    #[serde(default)]
    pub sale_id: Option<String>,
    #[serde(default)]
    pub payment_id: Option<String>,
    pub organization_id: String,
    pub external_id: String,
    pub document_type: DocumentType,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CancelResponse {
    pub success: bool,
}
