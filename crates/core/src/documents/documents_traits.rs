//! Mirror-table repository traits.

use async_trait::async_trait;

use super::documents_model::{
    BillingDocument, CreditNote, NewBillingDocument, NewCreditNote, UpsertOutcome,
};
use crate::errors::Result;

/// Persistence of the general document mirror.
///
/// Implementations must keep exactly one row per `(organization_id, external_id)`.
#[async_trait]
pub trait BillingDocumentRepositoryTrait: Send + Sync {
    fn get(&self, organization_id: &str, external_id: &str) -> Result<Option<BillingDocument>>;

    fn list_for_organization(&self, organization_id: &str) -> Result<Vec<BillingDocument>>;

    /// Insert-or-update keyed by `(organization_id, external_id)`.
    /// A `None` pdf path never clears a stored one.
    async fn upsert(&self, document: NewBillingDocument) -> Result<UpsertOutcome>;
}

/// Persistence of the credit-note mirror.
#[async_trait]
pub trait CreditNoteRepositoryTrait: Send + Sync {
    fn get(&self, organization_id: &str, external_id: &str) -> Result<Option<CreditNote>>;

    fn exists(&self, organization_id: &str, external_id: &str) -> Result<bool> {
        Ok(self.get(organization_id, external_id)?.is_some())
    }

    async fn upsert(&self, note: NewCreditNote) -> Result<UpsertOutcome>;
}
