//! Domain data types.

pub mod category;
pub mod config;
pub mod preview;
pub mod transaction;

pub use category::{Category, NewCategory};
pub use config::IngestionConfig;
pub use preview::{Preview, PreviewKind};
pub use transaction::{
    NewTransaction, SuggestedTransaction, Transaction, TransactionSource, TransactionType,
};
