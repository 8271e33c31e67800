//! Documents module - external documents, local mirror rows and the
//! idempotent reconciliation upsert.

mod documents_model;
mod documents_traits;
mod reconciliation_service;

pub use documents_model::*;
pub use documents_traits::{BillingDocumentRepositoryTrait, CreditNoteRepositoryTrait};
pub use reconciliation_service::{ReconciliationService, ReconciliationServiceTrait};
