//! Document-to-ledger matching.
//!
//! Matching is an ordered chain of pure strategies combined by a
//! first-match-wins resolver. Each strategy sees the document and a
//! snapshot of the organization's sales, payments and mirrored documents.

mod context;
mod resolver;
pub mod strategies;

pub use context::{MatchContext, MirroredDocument};
pub use resolver::{MatchResolver, MatchStrategy, NamedStrategy, Resolution};
