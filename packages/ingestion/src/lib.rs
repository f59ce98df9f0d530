//! AI-assisted document ingestion for a personal finance ledger.
//!
//! Turns uploaded receipts and bank statements into committed
//! transactions in two phases: extraction produces a TTL-bound,
//! user-scoped preview; a later commit of the (possibly edited)
//! preview inserts permanent rows, resolving category names to ids and
//! suppressing duplicates.
//!
//! The pipeline is generic over two seams: [`traits::LedgerStore`] for
//! persistence (in-memory and Postgres implementations provided) and
//! [`traits::DocumentExtractor`] for the extraction service (Gemini
//! behind the `gemini` feature, a scripted mock in [`testing`]).

pub mod error;
pub mod extractors;
pub mod pipeline;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

pub use error::{IngestionError, Result};
pub use pipeline::IngestionService;
pub use stores::MemoryLedgerStore;
#[cfg(feature = "postgres")]
pub use stores::PostgresLedgerStore;
#[cfg(feature = "gemini")]
pub use extractors::GeminiExtractor;
pub use traits::{DocumentExtractor, DocumentFile, LedgerStore, RemoteDocument};
pub use types::{
    Category, IngestionConfig, NewCategory, NewTransaction, Preview, PreviewKind,
    SuggestedTransaction, Transaction, TransactionSource, TransactionType,
};
