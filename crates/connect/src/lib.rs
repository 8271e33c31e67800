//! Ledgerlink Connect - billing provider integration.
//!
//! This crate talks to the external billing providers and drives the
//! reconciliation sync: it crawls fiscal documents, fetches their PDFs,
//! matches them against local sales and payments, and persists the result
//! through the repository traits defined in `ledgerlink-core`.

pub mod config;
pub mod provider;
pub mod sync;

// Re-export commonly used types
pub use config::SyncConfig;
pub use provider::{
    BillingApiClient, DocumentPage, HttpProviderClientFactory, PdfStatus, ProviderClientFactory,
    ProviderCredentials, SessionApiClient, TokenApiClient,
};
pub use sync::{
    BatchSyncSummary, CancelRequest, CancelResponse, CancellationCommand, CredentialResolver,
    Repositories, SessionManager, SyncOrchestrator, SyncSummary,
};
