//! Ledgerlink Core - Domain entities, matching and traits.
//!
//! This crate contains the business rules of the billing-document
//! reconciliation engine. It is database-agnostic and defines traits that are
//! implemented by the `storage-sqlite` crate, and consumed by the `connect`
//! crate that talks to billing providers.

pub mod blobs;
pub mod documents;
pub mod errors;
pub mod ledger;
pub mod matching;
pub mod organizations;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
