//! The reconciliation sync engine.
//!
//! One run walks every document type of an organization, fetches missing
//! PDFs, matches documents against the ledger and persists the result.

mod access;
mod assets;
mod cancellation;
mod crawler;
mod credentials;
mod models;
mod orchestrator;
mod session;

#[cfg(test)]
mod test_support;


use std::sync::Arc;

use ledgerlink_core::documents::{BillingDocumentRepositoryTrait, CreditNoteRepositoryTrait};
use ledgerlink_core::ledger::LedgerRepositoryTrait;
use ledgerlink_core::organizations::{MembershipRepositoryTrait, OrganizationRepositoryTrait};

pub use access::ensure_active_member;
pub use assets::AssetFetcher;
pub use cancellation::CancellationCommand;
pub use crawler::{CrawlOutcome, DocumentCrawler};
pub use credentials::CredentialResolver;
pub use models::{
    BatchSyncSummary, CancelRequest, CancelResponse, DocumentState, SyncSummary, TypeReport,
};
pub use orchestrator::{SyncOrchestrator, SyncReport};
pub use session::SessionManager;

/// The repositories the engine reads and writes.
#[derive(Clone)]
pub struct Repositories {
    pub organizations: Arc<dyn OrganizationRepositoryTrait>,
    pub memberships: Arc<dyn MembershipRepositoryTrait>,
    pub ledger: Arc<dyn LedgerRepositoryTrait>,
    pub documents: Arc<dyn BillingDocumentRepositoryTrait>,
    pub credit_notes: Arc<dyn CreditNoteRepositoryTrait>,
}
