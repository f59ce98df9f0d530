//! Receipt extraction orchestration.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use uuid::Uuid;

use crate::error::{IngestionError, Result};
use crate::pipeline::prompts;
use crate::pipeline::schemas::{self, ReceiptExtraction};
use crate::traits::{DocumentExtractor, DocumentFile, LedgerStore};
use crate::types::{
    IngestionConfig, Preview, PreviewKind, SuggestedTransaction, TransactionType,
};

/// User-facing message for any receipt extraction failure. The internal
/// cause is logged, never exposed.
pub const RECEIPT_EXTRACTION_FAILED: &str =
    "Failed to extract receipt data. Please ensure the image is clear and contains a valid receipt.";

/// What gets stored in a receipt preview's payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptPayload {
    pub extracted_data: ReceiptExtraction,
    pub suggested_transaction: SuggestedTransaction,
}

/// Result of a receipt upload: the stored preview plus its contents.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptPreview {
    pub preview_id: Uuid,
    #[serde(rename = "type")]
    pub kind: PreviewKind,
    pub extracted_data: ReceiptExtraction,
    pub suggested_transaction: SuggestedTransaction,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

pub(crate) async fn extract_receipt<S, E>(
    store: &S,
    extractor: &E,
    config: &IngestionConfig,
    file: DocumentFile,
    user_id: Uuid,
) -> Result<ReceiptPreview>
where
    S: LedgerStore,
    E: DocumentExtractor,
{
    // Existing expense categories bias suggestions toward reuse.
    let categories = store
        .list_category_names(user_id, TransactionType::Expense)
        .await?;
    let prompt = prompts::receipt_prompt(&categories);

    let remote = extractor.upload(&file).await.map_err(opaque_failure)?;

    let extracted = extractor
        .extract(&remote, &prompt, schemas::receipt_schema())
        .await
        .and_then(|raw| {
            serde_json::from_value::<ReceiptExtraction>(raw).map_err(|e| {
                IngestionError::Extraction(format!("malformed receipt extraction: {}", e))
            })
        });

    // Release runs on both paths; a failed delete only leaks remote
    // storage, so it is logged rather than raised.
    if let Err(e) = extractor.release(remote).await {
        warn!(error = %e, "failed to release remote receipt document");
    }

    let extracted = extracted.map_err(opaque_failure)?;
    let suggestion = build_suggestion(&extracted).map_err(opaque_failure)?;

    let payload = ReceiptPayload {
        extracted_data: extracted,
        suggested_transaction: suggestion,
    };
    let payload_value = serde_json::to_value(&payload).map_err(IngestionError::storage)?;

    let now = Utc::now();
    let preview = Preview {
        id: Uuid::new_v4(),
        user_id,
        kind: PreviewKind::Receipt,
        payload: payload_value,
        created_at: now,
        expires_at: now + config.preview_ttl,
    };
    store.insert_preview(&preview).await?;

    Ok(ReceiptPreview {
        preview_id: preview.id,
        kind: PreviewKind::Receipt,
        extracted_data: payload.extracted_data,
        suggested_transaction: payload.suggested_transaction,
        created_at: preview.created_at,
        expires_at: preview.expires_at,
    })
}

/// Normalize the extraction into a suggested EXPENSE transaction.
fn build_suggestion(extracted: &ReceiptExtraction) -> Result<SuggestedTransaction> {
    let date = NaiveDate::parse_from_str(&extracted.date, "%Y-%m-%d").map_err(|e| {
        IngestionError::Extraction(format!("unparseable receipt date {:?}: {}", extracted.date, e))
    })?;

    let amount = Decimal::from_f64_retain(extracted.amount)
        .filter(|a| *a > Decimal::ZERO)
        .map(|a| a.round_dp(2))
        .ok_or_else(|| {
            IngestionError::Extraction(format!("invalid receipt amount {}", extracted.amount))
        })?;

    let description = extracted
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| {
            format!(
                "Purchase at {}",
                extracted.merchant.as_deref().unwrap_or("Unknown")
            )
        });

    Ok(SuggestedTransaction {
        kind: TransactionType::Expense,
        amount,
        description,
        date,
        merchant: extracted.merchant.clone(),
        category_name: extracted.suggested_category.clone(),
    })
}

/// Collapse any internal failure into the single user-facing error.
fn opaque_failure(cause: IngestionError) -> IngestionError {
    match cause {
        // Storage problems are not extraction problems; keep them as-is.
        IngestionError::Storage(_) => cause,
        other => {
            error!(error = %other, "receipt extraction failed");
            IngestionError::Extraction(RECEIPT_EXTRACTION_FAILED.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extraction(merchant: Option<&str>, description: Option<&str>) -> ReceiptExtraction {
        ReceiptExtraction {
            merchant: merchant.map(str::to_string),
            date: "2025-01-01".into(),
            amount: 120.0,
            currency: None,
            description: description.map(str::to_string),
            suggested_category: Some("Groceries".into()),
            confidence: Some(0.9),
        }
    }

    #[test]
    fn description_falls_back_to_unknown_merchant() {
        let suggestion = build_suggestion(&extraction(None, None)).unwrap();
        assert_eq!(suggestion.description, "Purchase at Unknown");
    }

    #[test]
    fn description_falls_back_to_merchant_name() {
        let suggestion = build_suggestion(&extraction(Some("Target"), None)).unwrap();
        assert_eq!(suggestion.description, "Purchase at Target");
    }

    #[test]
    fn extracted_description_wins_over_fallback() {
        let suggestion = build_suggestion(&extraction(Some("Target"), Some("Weekly groceries")))
            .unwrap();
        assert_eq!(suggestion.description, "Weekly groceries");
    }

    #[test]
    fn suggestion_is_always_an_expense() {
        let suggestion = build_suggestion(&extraction(None, None)).unwrap();
        assert_eq!(suggestion.kind, TransactionType::Expense);
        assert_eq!(suggestion.amount, Decimal::new(12000, 2));
    }

    #[test]
    fn bad_date_is_an_extraction_error() {
        let mut bad = extraction(None, None);
        bad.date = "01/01/2025".into();
        assert!(matches!(
            build_suggestion(&bad),
            Err(IngestionError::Extraction(_))
        ));
    }

    #[test]
    fn non_positive_amount_is_rejected() {
        let mut bad = extraction(None, None);
        bad.amount = 0.0;
        assert!(build_suggestion(&bad).is_err());
    }
}
