//! Transaction domain types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::IngestionError;

/// Direction of money movement.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Income,
    Expense,
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Income => write!(f, "INCOME"),
            TransactionType::Expense => write!(f, "EXPENSE"),
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = IngestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INCOME" => Ok(TransactionType::Income),
            "EXPENSE" => Ok(TransactionType::Expense),
            _ => Err(IngestionError::Validation(format!(
                "invalid transaction type: {}",
                s
            ))),
        }
    }
}

/// How a transaction entered the system. Distinguishes the ingestion
/// paths from manual entry (which is created elsewhere).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionSource {
    Receipt,
    StatementImport,
}

impl std::fmt::Display for TransactionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionSource::Receipt => write!(f, "RECEIPT"),
            TransactionSource::StatementImport => write!(f, "STATEMENT_IMPORT"),
        }
    }
}

impl std::str::FromStr for TransactionSource {
    type Err = IngestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RECEIPT" => Ok(TransactionSource::Receipt),
            "STATEMENT_IMPORT" => Ok(TransactionSource::StatementImport),
            _ => Err(IngestionError::Validation(format!(
                "invalid transaction source: {}",
                s
            ))),
        }
    }
}

/// A committed transaction record. Immutable once created here;
/// later edits go through the separate transaction service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Positive amount, 2 decimal places.
    pub amount: Decimal,
    /// The date the transaction occurred.
    pub occurred_at: NaiveDate,
    pub description: String,
    pub merchant: Option<String>,
    pub category_id: Option<Uuid>,
    pub source: TransactionSource,
    pub created_at: DateTime<Utc>,
}

/// Input row for a transaction insert.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: Uuid,
    pub kind: TransactionType,
    pub amount: Decimal,
    pub occurred_at: NaiveDate,
    pub description: String,
    pub merchant: Option<String>,
    pub category_id: Option<Uuid>,
    pub source: TransactionSource,
}

impl NewTransaction {
    /// Materialize with a fresh id and timestamp.
    pub fn into_transaction(self, now: DateTime<Utc>) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            kind: self.kind,
            amount: self.amount,
            occurred_at: self.occurred_at,
            description: self.description,
            merchant: self.merchant,
            category_id: self.category_id,
            source: self.source,
            created_at: now,
        }
    }
}

/// A transaction proposal carried inside a preview. The category is a
/// name rather than an id since it may not exist yet — resolution
/// happens at commit time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedTransaction {
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: Decimal,
    pub description: String,
    pub date: NaiveDate,
    pub merchant: Option<String>,
    pub category_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn transaction_type_round_trips_through_text() {
        for kind in [TransactionType::Income, TransactionType::Expense] {
            assert_eq!(TransactionType::from_str(&kind.to_string()).unwrap(), kind);
        }
        assert!(TransactionType::from_str("TRANSFER").is_err());
    }

    #[test]
    fn transaction_source_round_trips_through_text() {
        for source in [TransactionSource::Receipt, TransactionSource::StatementImport] {
            assert_eq!(
                TransactionSource::from_str(&source.to_string()).unwrap(),
                source
            );
        }
    }

    #[test]
    fn suggested_transaction_serializes_type_field() {
        let suggestion = SuggestedTransaction {
            kind: TransactionType::Expense,
            amount: Decimal::new(1250, 2),
            description: "Coffee".into(),
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            merchant: None,
            category_name: Some("Dining".into()),
        };
        let value = serde_json::to_value(&suggestion).unwrap();
        assert_eq!(value["type"], "EXPENSE");
        assert_eq!(value["categoryName"], "Dining");
    }
}
