//! Storage traits for previews, categories, and transactions.
//!
//! The storage layer is split into focused traits:
//! - `PreviewStore`: ephemeral TTL-bound extraction results
//! - `CategoryStore`: user-scoped taxonomy with implicit creation
//! - `TransactionStore`: committed records plus the dedup lookup
//! - `LedgerStore`: composite trait combining all three
//!
//! Expiry and ownership checks live in the pipeline, not here; stores
//! only filter by what the queries need (`expires_at` comparisons are
//! passed an explicit `now` so tests can pin time).

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::types::{
    Category, NewCategory, NewTransaction, Preview, PreviewKind, Transaction, TransactionType,
};

/// Persistence for ephemeral previews.
#[async_trait]
pub trait PreviewStore: Send + Sync {
    /// Persist a new preview record.
    async fn insert_preview(&self, preview: &Preview) -> Result<()>;

    /// Fetch a preview by id, expired or not. Lazy-expiry semantics
    /// are applied by the caller.
    async fn find_preview(&self, id: Uuid) -> Result<Option<Preview>>;

    /// Delete one preview. Returns whether a record was removed.
    async fn delete_preview(&self, id: Uuid) -> Result<bool>;

    /// Unexpired previews for a user, newest first, optionally
    /// filtered by kind.
    async fn list_active_previews(
        &self,
        user_id: Uuid,
        kind: Option<PreviewKind>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Preview>>;

    /// Delete all previews with `expires_at <= now`, system-wide.
    /// Returns the number removed. Idempotent; safe to run while
    /// reads and commits are in flight.
    async fn delete_expired_previews(&self, now: DateTime<Utc>) -> Result<u64>;
}

/// Persistence for the category taxonomy.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// Names of a user's categories of the given type, for prompt
    /// context.
    async fn list_category_names(
        &self,
        user_id: Uuid,
        kind: TransactionType,
    ) -> Result<Vec<String>>;

    /// Categories whose name matches any of `names`, compared
    /// case-insensitively. One batched lookup serves an entire
    /// statement commit.
    async fn find_categories_by_names(
        &self,
        user_id: Uuid,
        names: &[String],
    ) -> Result<Vec<Category>>;

    /// Create a category. A concurrent creation of the same
    /// `(user, name, type)` surfaces as a storage error; the resolver
    /// retries the lookup.
    async fn insert_category(&self, category: NewCategory) -> Result<Category>;
}

/// Persistence for committed transactions.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// A user's transactions occurring on any of the given dates.
    /// Serves the duplicate-suppression check for statement commits.
    async fn find_transactions_on_dates(
        &self,
        user_id: Uuid,
        dates: &[NaiveDate],
    ) -> Result<Vec<Transaction>>;

    /// Insert all rows and consume the preview as one atomic unit.
    ///
    /// The preview delete is the gate against double-commit: when the
    /// preview record is already gone, nothing is inserted and
    /// `PreviewNotFound` is returned. On any failure no partial rows
    /// remain and the preview stays intact.
    async fn insert_transactions_consuming_preview(
        &self,
        preview_id: Uuid,
        rows: Vec<NewTransaction>,
    ) -> Result<Vec<Transaction>>;
}

/// Composite storage trait used by the pipeline.
pub trait LedgerStore: PreviewStore + CategoryStore + TransactionStore {}

// Blanket implementation: anything implementing all three is a LedgerStore
impl<T: PreviewStore + CategoryStore + TransactionStore> LedgerStore for T {}
