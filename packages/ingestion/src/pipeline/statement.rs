//! Bank statement extraction orchestration.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use uuid::Uuid;

use crate::error::{IngestionError, Result};
use crate::pipeline::prompts;
use crate::pipeline::schemas::{self, AccountInfo, StatementExtraction, StatementRowExtraction};
use crate::traits::{DocumentExtractor, DocumentFile, LedgerStore};
use crate::types::{
    IngestionConfig, Preview, PreviewKind, SuggestedTransaction, TransactionType,
};

/// User-facing message for any statement extraction failure.
pub const STATEMENT_EXTRACTION_FAILED: &str =
    "Failed to extract statement data. Please ensure the document is a clear, valid bank statement.";

/// Default category names for rows where the model suggested none.
const DEFAULT_INCOME_CATEGORY: &str = "Other Income";
const DEFAULT_EXPENSE_CATEGORY: &str = "Other";

/// A statement row after normalization (dates parsed, amounts as
/// 2 dp decimals).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementTransaction {
    pub date: NaiveDate,
    pub description: String,
    pub merchant: Option<String>,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub suggested_category: Option<String>,
    pub balance: Option<Decimal>,
}

/// Income/expense totals over the extracted rows. Reconciles exactly
/// with the transaction list by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementSummary {
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub transaction_count: u32,
}

/// Normalized statement contents stored in the preview payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementData {
    pub account_info: Option<AccountInfo>,
    pub transactions: Vec<StatementTransaction>,
    pub summary: StatementSummary,
}

/// What gets stored in a statement preview's payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementPayload {
    pub extracted_data: StatementData,
    pub suggested_transactions: Vec<SuggestedTransaction>,
}

/// Result of a statement upload: the stored preview plus its contents.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementPreview {
    pub preview_id: Uuid,
    #[serde(rename = "type")]
    pub kind: PreviewKind,
    pub extracted_data: StatementData,
    pub suggested_transactions: Vec<SuggestedTransaction>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

pub(crate) async fn extract_statement<S, E>(
    store: &S,
    extractor: &E,
    config: &IngestionConfig,
    file: DocumentFile,
    user_id: Uuid,
) -> Result<StatementPreview>
where
    S: LedgerStore,
    E: DocumentExtractor,
{
    let income_categories = store
        .list_category_names(user_id, TransactionType::Income)
        .await?;
    let expense_categories = store
        .list_category_names(user_id, TransactionType::Expense)
        .await?;
    let prompt = prompts::statement_prompt(&income_categories, &expense_categories);

    let remote = extractor.upload(&file).await.map_err(opaque_failure)?;

    let extracted = extractor
        .extract(&remote, &prompt, schemas::statement_schema())
        .await
        .and_then(|raw| {
            serde_json::from_value::<StatementExtraction>(raw).map_err(|e| {
                IngestionError::Extraction(format!("malformed statement extraction: {}", e))
            })
        });

    if let Err(e) = extractor.release(remote).await {
        warn!(error = %e, "failed to release remote statement document");
    }

    let extracted = extracted.map_err(opaque_failure)?;
    let data = normalize(extracted).map_err(opaque_failure)?;
    let suggestions = build_suggestions(&data.transactions);

    let payload = StatementPayload {
        extracted_data: data,
        suggested_transactions: suggestions,
    };
    let payload_value = serde_json::to_value(&payload).map_err(IngestionError::storage)?;

    let now = Utc::now();
    let preview = Preview {
        id: Uuid::new_v4(),
        user_id,
        kind: PreviewKind::Statement,
        payload: payload_value,
        created_at: now,
        expires_at: now + config.preview_ttl,
    };
    store.insert_preview(&preview).await?;

    Ok(StatementPreview {
        preview_id: preview.id,
        kind: PreviewKind::Statement,
        extracted_data: payload.extracted_data,
        suggested_transactions: payload.suggested_transactions,
        created_at: preview.created_at,
        expires_at: preview.expires_at,
    })
}

/// Parse dates and amounts for every row and compute the summary.
fn normalize(extracted: StatementExtraction) -> Result<StatementData> {
    let mut transactions = Vec::with_capacity(extracted.transactions.len());
    for (index, row) in extracted.transactions.into_iter().enumerate() {
        transactions.push(normalize_row(row, index)?);
    }

    let summary = summarize(&transactions);

    Ok(StatementData {
        account_info: extracted.account_info,
        transactions,
        summary,
    })
}

fn normalize_row(row: StatementRowExtraction, index: usize) -> Result<StatementTransaction> {
    let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d").map_err(|e| {
        IngestionError::Extraction(format!(
            "row {}: unparseable date {:?}: {}",
            index, row.date, e
        ))
    })?;

    let amount = Decimal::from_f64_retain(row.amount)
        .filter(|a| *a > Decimal::ZERO)
        .map(|a| a.round_dp(2))
        .ok_or_else(|| {
            IngestionError::Extraction(format!("row {}: invalid amount {}", index, row.amount))
        })?;

    let description = row.description.trim().to_string();
    if description.is_empty() {
        return Err(IngestionError::Extraction(format!(
            "row {}: empty description",
            index
        )));
    }

    Ok(StatementTransaction {
        date,
        description,
        merchant: row.merchant,
        amount,
        kind: row.kind,
        suggested_category: row.suggested_category,
        balance: row.balance.and_then(Decimal::from_f64_retain),
    })
}

/// Totals over the normalized rows. The summary must reconcile exactly
/// with the list it was computed from.
pub(crate) fn summarize(transactions: &[StatementTransaction]) -> StatementSummary {
    let mut total_income = Decimal::ZERO;
    let mut total_expenses = Decimal::ZERO;

    for tx in transactions {
        match tx.kind {
            TransactionType::Income => total_income += tx.amount,
            TransactionType::Expense => total_expenses += tx.amount,
        }
    }

    StatementSummary {
        total_income,
        total_expenses,
        transaction_count: transactions.len() as u32,
    }
}

/// One suggestion per row, with per-type category name defaults.
fn build_suggestions(transactions: &[StatementTransaction]) -> Vec<SuggestedTransaction> {
    transactions
        .iter()
        .map(|tx| {
            let category_name = tx
                .suggested_category
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| match tx.kind {
                    TransactionType::Income => DEFAULT_INCOME_CATEGORY.to_string(),
                    TransactionType::Expense => DEFAULT_EXPENSE_CATEGORY.to_string(),
                });

            SuggestedTransaction {
                kind: tx.kind,
                amount: tx.amount,
                description: tx.description.clone(),
                date: tx.date,
                merchant: tx.merchant.clone(),
                category_name: Some(category_name),
            }
        })
        .collect()
}

fn opaque_failure(cause: IngestionError) -> IngestionError {
    match cause {
        IngestionError::Storage(_) => cause,
        other => {
            error!(error = %other, "statement extraction failed");
            IngestionError::Extraction(STATEMENT_EXTRACTION_FAILED.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(amount: f64, kind: TransactionType, category: Option<&str>) -> StatementRowExtraction {
        StatementRowExtraction {
            date: "2025-10-01".into(),
            description: "ACME PAYROLL".into(),
            merchant: Some("ACME".into()),
            amount,
            kind,
            suggested_category: category.map(str::to_string),
            balance: None,
        }
    }

    #[test]
    fn summary_reconciles_with_rows() {
        let extracted = StatementExtraction {
            account_info: None,
            transactions: vec![
                row(600.0, TransactionType::Income, None),
                row(400.0, TransactionType::Income, None),
                row(400.0, TransactionType::Expense, None),
            ],
        };
        let data = normalize(extracted).unwrap();

        assert_eq!(data.summary.total_income, Decimal::new(100000, 2));
        assert_eq!(data.summary.total_expenses, Decimal::new(40000, 2));
        assert_eq!(data.summary.transaction_count, 3);

        let recomputed = summarize(&data.transactions);
        assert_eq!(recomputed.total_income, data.summary.total_income);
        assert_eq!(recomputed.total_expenses, data.summary.total_expenses);
    }

    #[test]
    fn suggestions_default_missing_categories_per_type() {
        let extracted = StatementExtraction {
            account_info: None,
            transactions: vec![
                row(100.0, TransactionType::Income, None),
                row(50.0, TransactionType::Expense, None),
                row(25.0, TransactionType::Expense, Some("Dining")),
            ],
        };
        let data = normalize(extracted).unwrap();
        let suggestions = build_suggestions(&data.transactions);

        assert_eq!(suggestions[0].category_name.as_deref(), Some("Other Income"));
        assert_eq!(suggestions[1].category_name.as_deref(), Some("Other"));
        assert_eq!(suggestions[2].category_name.as_deref(), Some("Dining"));
    }

    #[test]
    fn bad_row_fails_the_whole_extraction() {
        let mut bad = row(100.0, TransactionType::Income, None);
        bad.date = "October 1st".into();
        let extracted = StatementExtraction {
            account_info: None,
            transactions: vec![bad],
        };
        assert!(matches!(
            normalize(extracted),
            Err(IngestionError::Extraction(_))
        ));
    }

    #[test]
    fn empty_statement_yields_zero_summary() {
        let data = normalize(StatementExtraction {
            account_info: None,
            transactions: vec![],
        })
        .unwrap();
        assert_eq!(data.summary.transaction_count, 0);
        assert_eq!(data.summary.total_income, Decimal::ZERO);
    }
}
