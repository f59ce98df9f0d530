//! Core trait abstractions.

pub mod extractor;
pub mod store;

pub use extractor::{DocumentExtractor, DocumentFile, RemoteDocument};
pub use store::{CategoryStore, LedgerStore, PreviewStore, TransactionStore};
