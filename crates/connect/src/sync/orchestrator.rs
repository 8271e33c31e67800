//! Centralized reconciliation sync orchestrator.
//!
//! Drives one organization through crawl → match → PDF → upsert for every
//! configured document type, and runs the batch over all organizations.

use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::time::Instant;

use ledgerlink_core::blobs::BlobStoreTrait;
use ledgerlink_core::documents::{
    ExternalDocument, ReconciliationService, ReconciliationServiceTrait, UpsertOutcome,
};
use ledgerlink_core::errors::Result;
use ledgerlink_core::matching::{MatchContext, MatchResolver};

use super::access::ensure_active_member;
use super::assets::AssetFetcher;
use super::crawler::DocumentCrawler;
use super::credentials::CredentialResolver;
use super::models::{BatchSyncSummary, DocumentState, SyncSummary, TypeReport};
use super::session::SessionManager;
use super::Repositories;
use crate::config::SyncConfig;
use crate::provider::{BillingApiClient, ProviderClientFactory};

/// Full result of one organization run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub summary: SyncSummary,
    pub types: Vec<TypeReport>,
    /// The organization deadline cut the run short.
    pub timed_out: bool,
}

/// Orchestrates document synchronization.
///
/// # Example
///
/// ```ignore
/// let orchestrator = SyncOrchestrator::new(repositories, factory, blob_store, SyncConfig::default());
/// let summary = orchestrator.sync_organization("user-1", "org-1").await?;
/// ```
pub struct SyncOrchestrator {
    repositories: Repositories,
    factory: Arc<dyn ProviderClientFactory>,
    credentials: CredentialResolver,
    sessions: SessionManager,
    crawler: DocumentCrawler,
    assets: AssetFetcher,
    resolver: MatchResolver,
    reconciliation: Arc<dyn ReconciliationServiceTrait>,
    config: SyncConfig,
}

impl SyncOrchestrator {
    /// Create a new sync orchestrator.
    pub fn new(
        repositories: Repositories,
        factory: Arc<dyn ProviderClientFactory>,
        blob_store: Arc<dyn BlobStoreTrait>,
        config: SyncConfig,
    ) -> Self {
        let reconciliation = Arc::new(ReconciliationService::new(
            repositories.documents.clone(),
            repositories.credit_notes.clone(),
            repositories.ledger.clone(),
        ));
        Self {
            credentials: CredentialResolver::new(repositories.organizations.clone()),
            sessions: SessionManager::new(
                repositories.organizations.clone(),
                config.session_ttl,
                config.session_refresh_margin,
            ),
            crawler: DocumentCrawler::new(config.page_size, config.max_pages),
            assets: AssetFetcher::new(blob_store, config.pdf_attempts, config.pdf_retry_delay),
            resolver: MatchResolver::new(),
            reconciliation,
            repositories,
            factory,
            config,
        }
    }

    /// Replace the default matching chain.
    pub fn with_resolver(mut self, resolver: MatchResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn session_manager(&self) -> &SessionManager {
        &self.sessions
    }

    /// Interactive sync for a member of the organization.
    pub async fn sync_organization(&self, user_id: &str, organization_id: &str) -> Result<SyncSummary> {
        ensure_active_member(
            self.repositories.memberships.as_ref(),
            organization_id,
            user_id,
        )?;
        Ok(self.run_organization(organization_id).await?.summary)
    }

    /// Sync every organization with billing configured, one after another.
    ///
    /// A failing organization is logged and counted; the batch continues.
    pub async fn sync_all(&self) -> Result<BatchSyncSummary> {
        let organizations = self.repositories.organizations.list_with_billing()?;
        info!(
            "[Sync] Starting batch sync over {} organizations",
            organizations.len()
        );

        let mut batch = BatchSyncSummary::default();
        for organization in organizations {
            match self.run_organization(&organization.id).await {
                Ok(report) => batch.add(&report.summary),
                Err(e) => {
                    error!("[Sync] Sync failed for organization {}: {}", organization.id, e);
                    batch.orgs_failed += 1;
                }
            }
        }

        info!(
            "[Sync] Batch sync finished: {} organizations, {} failed, {} documents ({} matched)",
            batch.orgs_processed, batch.orgs_failed, batch.total, batch.matched
        );
        Ok(batch)
    }

    /// Runs one organization without an authorization check.
    pub async fn run_organization(&self, organization_id: &str) -> Result<SyncReport> {
        let started = Instant::now();
        let deadline = self.config.organization_deadline.map(|d| started + d);

        let (_, credentials) = self.credentials.resolve(organization_id)?;
        let client = self.factory.create(&credentials)?;
        let session = self
            .sessions
            .session_for(organization_id, client.as_ref())
            .await?;

        let mut context = MatchContext::new(
            self.repositories.ledger.list_sales(organization_id)?,
            self.repositories.ledger.list_payments(organization_id)?,
            self.repositories.documents.list_for_organization(organization_id)?,
        );

        info!(
            "[Sync] Syncing {} documents for {} ({} sales, {} payments)",
            credentials.provider,
            organization_id,
            context.sales().len(),
            context.payments().len()
        );

        let mut report = SyncReport {
            summary: SyncSummary::default(),
            types: Vec::with_capacity(self.config.document_types.len()),
            timed_out: false,
        };

        for document_type in &self.config.document_types {
            let outcome = self
                .crawler
                .crawl_type(client.as_ref(), session.as_deref(), *document_type, deadline)
                .await;

            let mut type_report = TypeReport::new(*document_type);
            type_report.fetched = outcome.documents.len();
            type_report.pages = outcome.pages_fetched;
            type_report.aborted = outcome.error.clone();
            report.timed_out |= outcome.timed_out;

            for document in &outcome.documents {
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    report.timed_out = true;
                    break;
                }

                let (state, matched) = self
                    .process_document(
                        client.as_ref(),
                        session.as_deref(),
                        organization_id,
                        document,
                        &mut context,
                        &mut type_report,
                    )
                    .await;

                if state != DocumentState::Excluded {
                    report.summary.record(matched);
                }
            }

            debug!(
                "[Sync] {} {}: fetched {} over {} pages, {} matched, {} unmatched, {} excluded, {} failed, {} PDFs stored",
                organization_id,
                document_type,
                type_report.fetched,
                type_report.pages,
                type_report.matched,
                type_report.not_matched,
                type_report.excluded,
                type_report.failed,
                type_report.pdfs_stored
            );
            report.types.push(type_report);

            if report.timed_out {
                warn!(
                    "[Sync] Sync for {} timed out after {:?}; returning partial counts",
                    organization_id,
                    started.elapsed()
                );
                break;
            }
        }

        info!(
            "[Sync] Sync for {} done: {} documents, {} matched, {} not matched",
            organization_id,
            report.summary.total,
            report.summary.matched,
            report.summary.not_matched
        );
        Ok(report)
    }

    /// Moves one document through match, PDF and upsert.
    ///
    /// Returns the final state and whether a match was resolved.
    /// Persistence failures are logged; the document still counts.
    async fn process_document(
        &self,
        client: &dyn BillingApiClient,
        session: Option<&str>,
        organization_id: &str,
        document: &ExternalDocument,
        context: &mut MatchContext,
        type_report: &mut TypeReport,
    ) -> (DocumentState, bool) {
        match self.reconciliation.is_excluded(organization_id, document) {
            Ok(true) => {
                debug!(
                    "[Sync] Skipping {} {}: already stored as a credit note",
                    document.document_type, document.external_id
                );
                type_report.excluded += 1;
                return (DocumentState::Excluded, false);
            }
            Ok(false) => {}
            Err(e) => {
                error!("[Sync] Exclusivity check failed for {}: {}", document.external_id, e);
                type_report.failed += 1;
                type_report.not_matched += 1;
                return (DocumentState::Failed, false);
            }
        }

        let resolution = self.resolver.resolve(document, context);
        let matched = resolution.is_matched();

        let pdf_path = match self
            .reconciliation
            .stored_pdf_path(organization_id, &document.external_id)
        {
            Ok(Some(existing)) => Some(existing),
            Ok(None) => match self
                .assets
                .fetch(client, session, organization_id, document)
                .await
            {
                Ok(Some(path)) => {
                    type_report.pdfs_stored += 1;
                    Some(path)
                }
                Ok(None) => None,
                Err(e) => {
                    error!("[Sync] Failed to store PDF for {}: {}", document.external_id, e);
                    type_report.failed += 1;
                    None
                }
            },
            Err(e) => {
                warn!("[Sync] Could not read stored PDF path for {}: {}", document.external_id, e);
                None
            }
        };
        let has_pdf = pdf_path.is_some();

        match self
            .reconciliation
            .reconcile(organization_id, document, &resolution.result, pdf_path)
            .await
        {
            Ok(UpsertOutcome::SkippedCreditNote) => {
                type_report.excluded += 1;
                return (DocumentState::Excluded, false);
            }
            Ok(_) => {}
            Err(e) => {
                tally(type_report, matched);
                error!(
                    "[Sync] Failed to persist {} {}: {}",
                    document.document_type, document.external_id, e
                );
                type_report.failed += 1;
                return (DocumentState::Failed, matched);
            }
        }

        tally(type_report, matched);
        context.record_mirrored(document, &resolution.result);
        if matched {
            debug!(
                "[Sync] {} {} matched by {}",
                document.document_type,
                document.external_id,
                resolution.strategy.unwrap_or("unknown")
            );
            context.record_match(document, &resolution.result);
        }

        let state = if has_pdf {
            DocumentState::PersistedWithPdf
        } else {
            DocumentState::PersistedWithoutPdf
        };
        (state, matched)
    }
}

fn tally(type_report: &mut TypeReport, matched: bool) {
    if matched {
        type_report.matched += 1;
    } else {
        type_report.not_matched += 1;
    }
}
