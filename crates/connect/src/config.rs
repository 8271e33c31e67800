//! Tunables for sync runs.

use std::time::Duration;

use ledgerlink_core::documents::DocumentType;

/// Configuration for sync operations.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Number of documents to request per page.
    pub page_size: u32,
    /// Maximum number of pages to fetch per document type (safety limit).
    pub max_pages: u32,
    /// How many times the PDF endpoint is polled before giving up.
    pub pdf_attempts: u32,
    /// Pause between PDF polls.
    pub pdf_retry_delay: Duration,
    /// Lifetime assumed for a freshly issued provider session.
    pub session_ttl: chrono::Duration,
    /// A cached session is refreshed once less than this remains.
    pub session_refresh_margin: chrono::Duration,
    /// Wall-clock budget for one organization. `None` disables the check.
    pub organization_deadline: Option<Duration>,
    /// Document types to sync, in order.
    pub document_types: Vec<DocumentType>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: 50,
            max_pages: 20,
            pdf_attempts: 3,
            pdf_retry_delay: Duration::from_secs(2),
            session_ttl: chrono::Duration::hours(1),
            session_refresh_margin: chrono::Duration::minutes(5),
            organization_deadline: Some(Duration::from_secs(10 * 60)),
            document_types: DocumentType::ALL.to_vec(),
        }
    }
}

impl SyncConfig {
    /// Same limits with PDF retries that do not sleep. Used by tests.
    pub fn without_delays() -> Self {
        Self {
            pdf_retry_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}
