//! Ledger module - the sales and payments owned by the CRUD side of the app.
//!
//! The engine reads identifiers from these records and writes back only the
//! invoice link fields.

mod ledger_model;
mod ledger_traits;

pub use ledger_model::*;
pub use ledger_traits::LedgerRepositoryTrait;
