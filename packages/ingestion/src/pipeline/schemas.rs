//! Wire types for structured extraction responses.
//!
//! These mirror what the extraction service is asked to produce: the
//! doc comments double as field descriptions in the generated JSON
//! schema, so they are written for the model, not just the reader.
//! Amounts arrive as JSON numbers (`f64`) and dates as `YYYY-MM-DD`
//! strings; normalization into `Decimal`/`NaiveDate` happens in the
//! orchestrators.

use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use crate::types::TransactionType;

/// Structured data extracted from a single receipt image.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReceiptExtraction {
    /// Store or merchant name, if legible.
    pub merchant: Option<String>,
    /// Purchase date in YYYY-MM-DD format.
    pub date: String,
    /// Total amount paid. Always positive.
    pub amount: f64,
    /// ISO 4217 currency code, if shown.
    pub currency: Option<String>,
    /// Short free-text description of the purchase.
    pub description: Option<String>,
    /// Best-fitting spending category name. Prefer one of the user's
    /// existing categories when a reasonable match exists.
    pub suggested_category: Option<String>,
    /// Extraction confidence between 0 and 1.
    pub confidence: Option<f64>,
}

/// Structured data extracted from a bank statement document.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StatementExtraction {
    /// Account metadata, when present on the statement.
    pub account_info: Option<AccountInfo>,
    /// Every transaction row on the statement.
    pub transactions: Vec<StatementRowExtraction>,
}

/// Account metadata parsed from the statement header.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    /// Account number, possibly partially masked.
    pub account_number: Option<String>,
    /// Name of the account holder.
    pub account_holder: Option<String>,
    /// Bank or institution name.
    pub bank_name: Option<String>,
    /// Statement period as printed, e.g. "01 Oct 2025 - 31 Oct 2025".
    pub period: Option<String>,
}

/// One transaction row from a statement.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StatementRowExtraction {
    /// Transaction date in YYYY-MM-DD format.
    pub date: String,
    /// Description as printed on the statement.
    pub description: String,
    /// Merchant name parsed from the description, best effort.
    pub merchant: Option<String>,
    /// Transaction amount. Always positive regardless of direction.
    pub amount: f64,
    /// INCOME for credits, EXPENSE for debits.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Best-fitting category name. Prefer one of the user's existing
    /// categories when a reasonable match exists.
    pub suggested_category: Option<String>,
    /// Running balance after this transaction, if shown.
    pub balance: Option<f64>,
}

/// Raw JSON schema for receipt extraction. Provider-specific rewrites
/// (ref inlining and the like) happen inside the extractor.
pub fn receipt_schema() -> serde_json::Value {
    serde_json::to_value(schema_for!(ReceiptExtraction)).unwrap_or_default()
}

/// Raw JSON schema for statement extraction.
pub fn statement_schema() -> serde_json::Value {
    serde_json::to_value(schema_for!(StatementExtraction)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_schema_requires_date_and_amount() {
        let schema = receipt_schema();
        let required = schema["required"].as_array().unwrap();
        let names: Vec<&str> = required.iter().filter_map(|v| v.as_str()).collect();

        assert!(names.contains(&"date"));
        assert!(names.contains(&"amount"));
        assert!(!names.contains(&"merchant"));
    }

    #[test]
    fn statement_schema_requires_transactions() {
        let schema = statement_schema();
        let required = schema["required"].as_array().unwrap();
        assert!(required.iter().any(|v| v == "transactions"));
    }

    #[test]
    fn statement_row_type_uses_uppercase_values() {
        let row: StatementRowExtraction = serde_json::from_value(serde_json::json!({
            "date": "2025-10-01",
            "description": "SALARY OCT",
            "amount": 1000.0,
            "type": "INCOME"
        }))
        .unwrap();
        assert_eq!(row.kind, TransactionType::Income);
    }
}
