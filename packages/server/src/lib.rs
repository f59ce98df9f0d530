// Centavo - personal finance API
//
// Backend for AI-assisted document ingestion: receipt and statement
// uploads flow through the ingestion pipeline into the user's ledger.

pub mod auth;
pub mod config;
pub mod error;
pub mod scheduled_tasks;
pub mod server;

pub use config::*;
