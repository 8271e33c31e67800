mod model;
mod repository;

pub use model::{PaymentDB, SaleDB};
pub use repository::LedgerRepository;
