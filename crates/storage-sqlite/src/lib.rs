//! SQLite storage implementation for Ledgerlink.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository traits defined in `ledgerlink-core` and contains:
//! - Database connection pooling and the single writer actor
//! - Embedded Diesel migrations
//! - Repository implementations for organizations, the ledger and the document mirror
//! - A filesystem blob store for document PDFs
//!
//! ```text
//! core (domain)          connect (sync)
//!       │                      │
//!       └──────────┬───────────┘
//!                  │
//!                  ▼
//!          storage-sqlite (this crate)
//!                  │
//!                  ▼
//!              SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;

pub mod blobs;
pub mod documents;
pub mod ledger;
pub mod organizations;

pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};

pub use errors::{IntoCore, StorageError};

pub use blobs::FsBlobStore;
pub use documents::{BillingDocumentRepository, CreditNoteRepository};
pub use ledger::LedgerRepository;
pub use organizations::{MembershipRepository, OrganizationRepository};

pub use ledgerlink_core::errors::{DatabaseError, Error, Result};

#[cfg(test)]
pub(crate) mod test_utils;
