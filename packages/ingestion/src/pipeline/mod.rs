//! The document-to-transaction pipeline.

pub mod categories;
pub mod commit;
pub mod previews;
pub mod prompts;
pub mod receipt;
pub mod schemas;
pub mod statement;

use uuid::Uuid;

use crate::error::Result;
use crate::traits::{DocumentExtractor, DocumentFile, LedgerStore};
use crate::types::{IngestionConfig, Preview, PreviewKind};

pub use commit::{
    CommitOptions, CommittedTransaction, ReceiptCommit, ReceiptMetadata, StatementCommit,
    StatementCommitResult, TransactionDraft,
};
pub use receipt::{ReceiptPayload, ReceiptPreview, RECEIPT_EXTRACTION_FAILED};
pub use statement::{
    StatementData, StatementPayload, StatementPreview, StatementSummary, StatementTransaction,
    STATEMENT_EXTRACTION_FAILED,
};

/// The ingestion pipeline over a ledger store and a document extractor.
///
/// All operations are user-scoped: the caller passes the authenticated
/// user id and the service enforces that previews are only ever read,
/// committed, or listed by their owner.
pub struct IngestionService<S, E> {
    store: S,
    extractor: E,
    config: IngestionConfig,
}

impl<S, E> IngestionService<S, E>
where
    S: LedgerStore,
    E: DocumentExtractor,
{
    pub fn new(store: S, extractor: E, config: IngestionConfig) -> Self {
        Self {
            store,
            extractor,
            config,
        }
    }

    /// Extract a receipt image into a TTL-bound preview.
    pub async fn extract_receipt(
        &self,
        file: DocumentFile,
        user_id: Uuid,
    ) -> Result<ReceiptPreview> {
        receipt::extract_receipt(&self.store, &self.extractor, &self.config, file, user_id).await
    }

    /// Extract a bank statement into a TTL-bound preview.
    pub async fn extract_statement(
        &self,
        file: DocumentFile,
        user_id: Uuid,
    ) -> Result<StatementPreview> {
        statement::extract_statement(&self.store, &self.extractor, &self.config, file, user_id)
            .await
    }

    /// Commit a verified receipt preview as a permanent transaction.
    pub async fn commit_receipt(
        &self,
        input: ReceiptCommit,
        user_id: Uuid,
    ) -> Result<CommittedTransaction> {
        commit::commit_receipt(&self.store, input, user_id).await
    }

    /// Commit verified statement rows, deduplicating against existing
    /// transactions unless the caller opted out.
    pub async fn commit_statement(
        &self,
        input: StatementCommit,
        user_id: Uuid,
    ) -> Result<StatementCommitResult> {
        commit::commit_statement(&self.store, input, user_id).await
    }

    /// Fetch a preview by id, enforcing ownership and lazy expiry.
    pub async fn get_preview(&self, preview_id: Uuid, user_id: Uuid) -> Result<Preview> {
        previews::fetch_valid_preview(&self.store, preview_id, user_id).await
    }

    /// List the caller's unexpired previews, optionally by kind.
    pub async fn list_previews(
        &self,
        user_id: Uuid,
        kind: Option<PreviewKind>,
    ) -> Result<Vec<Preview>> {
        previews::list_previews(&self.store, user_id, kind).await
    }

    /// Remove all expired previews. Meant for a periodic job; reads
    /// already delete lazily, this reclaims the rest.
    pub async fn sweep_expired(&self) -> Result<u64> {
        previews::sweep_expired(&self.store).await
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    pub fn config(&self) -> &IngestionConfig {
        &self.config
    }
}
