//! Idempotent write of fetched documents into the local mirror.

use async_trait::async_trait;
use log::{debug, info};
use std::sync::Arc;

use super::documents_model::{
    ExternalDocument, MatchResult, NewBillingDocument, NewCreditNote, UpsertOutcome,
};
use super::documents_traits::{BillingDocumentRepositoryTrait, CreditNoteRepositoryTrait};
use crate::errors::Result;
use crate::ledger::{InvoiceLink, LedgerRepositoryTrait};

#[async_trait]
pub trait ReconciliationServiceTrait: Send + Sync {
    /// True when an invoice-type document already lives in the credit-note table.
    fn is_excluded(&self, organization_id: &str, document: &ExternalDocument) -> Result<bool>;

    /// The PDF path stored on the mirror row, if the row exists and has one.
    fn stored_pdf_path(&self, organization_id: &str, external_id: &str) -> Result<Option<String>>;

    /// Upserts the mirror row(s) for `document` and writes links back.
    async fn reconcile(
        &self,
        organization_id: &str,
        document: &ExternalDocument,
        matched: &MatchResult,
        pdf_path: Option<String>,
    ) -> Result<UpsertOutcome>;
}

pub struct ReconciliationService {
    documents: Arc<dyn BillingDocumentRepositoryTrait>,
    credit_notes: Arc<dyn CreditNoteRepositoryTrait>,
    ledger: Arc<dyn LedgerRepositoryTrait>,
}

impl ReconciliationService {
    pub fn new(
        documents: Arc<dyn BillingDocumentRepositoryTrait>,
        credit_notes: Arc<dyn CreditNoteRepositoryTrait>,
        ledger: Arc<dyn LedgerRepositoryTrait>,
    ) -> Self {
        Self {
            documents,
            credit_notes,
            ledger,
        }
    }

    async fn write_back_links(
        &self,
        document: &ExternalDocument,
        matched: &MatchResult,
        file_url: Option<String>,
    ) -> Result<()> {
        if document.document_type.is_credit_note() {
            if let Some(sale_id) = &matched.sale_id {
                self.ledger
                    .link_sale_credit_note(sale_id, &document.external_id)
                    .await?;
            }
            return Ok(());
        }

        let link = InvoiceLink {
            external_id: document.external_id.clone(),
            reference: document.reference.clone(),
            file_url,
        };

        if let Some(sale_id) = &matched.sale_id {
            self.ledger.link_sale_invoice(sale_id, link.clone()).await?;
        }
        if let Some(payment_id) = &matched.payment_id {
            self.ledger.link_payment_invoice(payment_id, link).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ReconciliationServiceTrait for ReconciliationService {
    fn is_excluded(&self, organization_id: &str, document: &ExternalDocument) -> Result<bool> {
        if document.document_type.is_credit_note() {
            return Ok(false);
        }
        self.credit_notes
            .exists(organization_id, &document.external_id)
    }

    fn stored_pdf_path(&self, organization_id: &str, external_id: &str) -> Result<Option<String>> {
        Ok(self
            .documents
            .get(organization_id, external_id)?
            .and_then(|d| d.pdf_path))
    }

    async fn reconcile(
        &self,
        organization_id: &str,
        document: &ExternalDocument,
        matched: &MatchResult,
        pdf_path: Option<String>,
    ) -> Result<UpsertOutcome> {
        if self.is_excluded(organization_id, document)? {
            debug!(
                "[Reconcile] {} {} already synced as credit note, skipping",
                document.document_type, document.external_id
            );
            return Ok(UpsertOutcome::SkippedCreditNote);
        }

        let row = NewBillingDocument::from_external(organization_id, document, matched, pdf_path);

        let outcome = if document.document_type.is_credit_note() {
            let mut note = NewCreditNote::from(&row);
            note.related_external_id = document.related_external_id.clone();
            let outcome = self.credit_notes.upsert(note).await?;
            self.documents.upsert(row).await?;
            outcome
        } else {
            self.documents.upsert(row).await?
        };

        if outcome == UpsertOutcome::Inserted {
            info!(
                "[Reconcile] Stored new {} {} for organization {}",
                document.document_type, document.external_id, organization_id
            );
        }

        if matched.is_matched() {
            let file_url = self.stored_pdf_path(organization_id, &document.external_id)?;
            self.write_back_links(document, matched, file_url).await?;
        }

        Ok(outcome)
    }
}
