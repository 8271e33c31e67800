mod model;
mod repository;

pub use model::{BillingDocumentDB, CreditNoteDB};
pub use repository::{BillingDocumentRepository, CreditNoteRepository};
