//! Commit engine: turn a verified preview into permanent transactions.
//!
//! A commit is effectively atomic from the client's view: fetch and
//! validate the preview, resolve categories, dedup, insert rows, and
//! consume the preview. The preview delete is the gate — a concurrent
//! commit of the same preview finds it gone and fails instead of
//! re-inserting. Category creation is the one tolerated exception to
//! atomicity: a category left behind by a failed commit is idempotently
//! reusable, not harmful.

use std::collections::HashSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{IngestionError, Result};
use crate::pipeline::categories::{self, category_key};
use crate::pipeline::previews::fetch_valid_preview;
use crate::traits::LedgerStore;
use crate::types::{
    Category, NewTransaction, PreviewKind, Transaction, TransactionSource, TransactionType,
};

/// Absolute amount tolerance of the duplicate heuristic.
fn duplicate_tolerance() -> Decimal {
    Decimal::new(1, 2) // 0.01
}

/// A user-verified (possibly edited) transaction submitted for commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDraft {
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: Decimal,
    pub description: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub merchant: Option<String>,
}

/// Extra receipt context not part of the transaction itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptMetadata {
    #[serde(default)]
    pub merchant: Option<String>,
}

/// Input for a receipt commit.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptCommit {
    pub preview_id: Uuid,
    pub transaction: TransactionDraft,
    #[serde(default)]
    pub metadata: Option<ReceiptMetadata>,
}

/// Options for a statement commit.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitOptions {
    #[serde(default = "default_skip_duplicates")]
    pub skip_duplicates: bool,
}

impl Default for CommitOptions {
    fn default() -> Self {
        Self {
            skip_duplicates: true,
        }
    }
}

fn default_skip_duplicates() -> bool {
    true
}

/// Input for a statement commit.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementCommit {
    pub preview_id: Uuid,
    pub transactions: Vec<TransactionDraft>,
    #[serde(default)]
    pub options: CommitOptions,
}

/// A committed transaction with its resolved category, for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommittedTransaction {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub category: Option<Category>,
}

/// Outcome counts of a statement commit.
/// Invariant: `created + skipped == total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatementCommitResult {
    pub created: u32,
    pub skipped: u32,
    pub total: u32,
}

pub(crate) async fn commit_receipt<S: LedgerStore>(
    store: &S,
    mut input: ReceiptCommit,
    user_id: Uuid,
) -> Result<CommittedTransaction> {
    validate_draft(&mut input.transaction)?;

    let preview = fetch_valid_preview(store, input.preview_id, user_id).await?;
    if preview.kind != PreviewKind::Receipt {
        return Err(IngestionError::Validation(
            "preview is not a receipt preview".into(),
        ));
    }

    let draft = input.transaction;
    let category = match trimmed_category(&draft) {
        Some(name) => {
            Some(categories::resolve_or_create(store, user_id, &name, draft.kind).await?)
        }
        None => None,
    };

    let merchant = input
        .metadata
        .and_then(|m| m.merchant)
        .or_else(|| draft.merchant.clone());

    let row = NewTransaction {
        user_id,
        kind: draft.kind,
        amount: draft.amount,
        occurred_at: draft.date,
        description: draft.description,
        merchant,
        category_id: category.as_ref().map(|c| c.id),
        source: TransactionSource::Receipt,
    };

    let mut created = store
        .insert_transactions_consuming_preview(preview.id, vec![row])
        .await?;
    let transaction = created
        .pop()
        .ok_or_else(|| IngestionError::storage("receipt commit inserted no rows"))?;

    Ok(CommittedTransaction {
        transaction,
        category,
    })
}

pub(crate) async fn commit_statement<S: LedgerStore>(
    store: &S,
    mut input: StatementCommit,
    user_id: Uuid,
) -> Result<StatementCommitResult> {
    for draft in &mut input.transactions {
        validate_draft(draft)?;
    }

    let preview = fetch_valid_preview(store, input.preview_id, user_id).await?;
    if preview.kind != PreviewKind::Statement {
        return Err(IngestionError::Validation(
            "preview is not a statement preview".into(),
        ));
    }

    // One batched resolve for all distinct (name, type) pairs.
    let pairs: HashSet<(String, TransactionType)> = input
        .transactions
        .iter()
        .filter_map(|d| trimmed_category(d).map(|name| (name, d.kind)))
        .collect();
    let resolved = categories::resolve_many(store, user_id, &pairs).await?;

    let total = input.transactions.len() as u32;
    let mut skipped = 0u32;
    let mut rows = Vec::with_capacity(input.transactions.len());

    let existing = if input.options.skip_duplicates && !input.transactions.is_empty() {
        let mut dates: Vec<NaiveDate> = input.transactions.iter().map(|d| d.date).collect();
        dates.sort_unstable();
        dates.dedup();
        store.find_transactions_on_dates(user_id, &dates).await?
    } else {
        Vec::new()
    };

    for draft in input.transactions {
        if input.options.skip_duplicates && is_duplicate(&draft, &existing) {
            skipped += 1;
            continue;
        }

        let category_id = trimmed_category(&draft)
            .map(|name| {
                resolved
                    .get(&category_key(&name, draft.kind))
                    .map(|c| c.id)
                    .ok_or_else(|| IngestionError::InvalidCategory(name))
            })
            .transpose()?;

        rows.push(NewTransaction {
            user_id,
            kind: draft.kind,
            amount: draft.amount,
            occurred_at: draft.date,
            description: draft.description,
            merchant: draft.merchant,
            category_id,
            source: TransactionSource::StatementImport,
        });
    }

    // Consumes the preview even when every row was a duplicate: the
    // commit succeeded, there was just nothing new to insert.
    let created = store
        .insert_transactions_consuming_preview(preview.id, rows)
        .await?;

    Ok(StatementCommitResult {
        created: created.len() as u32,
        skipped,
        total,
    })
}

/// Normalize and validate a draft before it touches the dedup check or
/// the insert. Trimming happens here, once, so the duplicate comparison
/// and the stored row always see the same description.
fn validate_draft(draft: &mut TransactionDraft) -> Result<()> {
    draft.description = draft.description.trim().to_string();
    if draft.description.is_empty() {
        return Err(IngestionError::Validation(
            "description must not be empty".into(),
        ));
    }
    if draft.amount <= Decimal::ZERO {
        return Err(IngestionError::Validation(
            "amount must be positive".into(),
        ));
    }
    // Stored amounts are NUMERIC(14,2); a finer-grained input would be
    // silently rounded, so reject it instead.
    if draft.amount.normalize().scale() > 2 {
        return Err(IngestionError::Validation(
            "amount must have at most 2 decimal places".into(),
        ));
    }
    Ok(())
}

fn trimmed_category(draft: &TransactionDraft) -> Option<String> {
    draft
        .category_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

/// The duplicate heuristic: exact date, amount within 0.01 absolute
/// tolerance, case-insensitive exact description match. Descriptions
/// arrive trimmed from `validate_draft`, the same form they are stored
/// in. Deliberately simple otherwise — near-duplicates with differing
/// internal whitespace are treated as distinct so legitimately
/// different transactions are never dropped.
fn is_duplicate(draft: &TransactionDraft, existing: &[Transaction]) -> bool {
    existing.iter().any(|tx| {
        tx.occurred_at == draft.date
            && (tx.amount - draft.amount).abs() <= duplicate_tolerance()
            && tx.description.to_lowercase() == draft.description.to_lowercase()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn draft(amount: Decimal, date: &str, description: &str) -> TransactionDraft {
        TransactionDraft {
            kind: TransactionType::Expense,
            amount,
            description: description.into(),
            date: date.parse().unwrap(),
            category_name: None,
            merchant: None,
        }
    }

    fn existing(amount: Decimal, date: &str, description: &str) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            kind: TransactionType::Expense,
            amount,
            occurred_at: date.parse().unwrap(),
            description: description.into(),
            merchant: None,
            category_id: None,
            source: TransactionSource::StatementImport,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn duplicate_matches_within_amount_tolerance() {
        let rows = vec![existing(Decimal::new(50000, 2), "2025-10-01", "X")];
        assert!(is_duplicate(
            &draft(Decimal::new(50001, 2), "2025-10-01", "x"),
            &rows
        ));
    }

    #[test]
    fn duplicate_requires_exact_date() {
        let rows = vec![existing(Decimal::new(50000, 2), "2025-10-01", "X")];
        assert!(!is_duplicate(
            &draft(Decimal::new(50000, 2), "2025-10-02", "X"),
            &rows
        ));
    }

    #[test]
    fn duplicate_description_is_case_insensitive_but_exact() {
        let rows = vec![existing(Decimal::new(1000, 2), "2025-10-01", "Coffee Shop")];
        assert!(is_duplicate(
            &draft(Decimal::new(1000, 2), "2025-10-01", "COFFEE SHOP"),
            &rows
        ));
        // Differing whitespace is a distinct transaction.
        assert!(!is_duplicate(
            &draft(Decimal::new(1000, 2), "2025-10-01", "Coffee  Shop"),
            &rows
        ));
    }

    #[test]
    fn duplicate_outside_tolerance_is_distinct() {
        let rows = vec![existing(Decimal::new(50000, 2), "2025-10-01", "X")];
        assert!(!is_duplicate(
            &draft(Decimal::new(50002, 2), "2025-10-01", "X"),
            &rows
        ));
    }

    #[test]
    fn zero_amount_draft_is_rejected() {
        let mut bad = draft(Decimal::ZERO, "2025-10-01", "X");
        assert!(matches!(
            validate_draft(&mut bad),
            Err(IngestionError::Validation(_))
        ));
    }

    #[test]
    fn validation_trims_the_description() {
        let mut padded = draft(Decimal::new(1000, 2), "2025-10-01", "  Coffee Shop  ");
        validate_draft(&mut padded).unwrap();
        assert_eq!(padded.description, "Coffee Shop");
    }

    #[test]
    fn sub_cent_amounts_are_rejected() {
        let mut bad = draft(Decimal::new(4755, 3), "2025-10-01", "X"); // 4.755
        assert!(matches!(
            validate_draft(&mut bad),
            Err(IngestionError::Validation(_))
        ));

        // Trailing zeros do not count against the precision limit.
        let mut ok = draft(Decimal::new(4750, 3), "2025-10-01", "X"); // 4.750
        validate_draft(&mut ok).unwrap();
    }

    #[test]
    fn commit_options_default_to_skipping_duplicates() {
        let options: CommitOptions = serde_json::from_str("{}").unwrap();
        assert!(options.skip_duplicates);

        let parsed: StatementCommit = serde_json::from_value(serde_json::json!({
            "previewId": Uuid::new_v4(),
            "transactions": []
        }))
        .unwrap();
        assert!(parsed.options.skip_duplicates);
    }
}
