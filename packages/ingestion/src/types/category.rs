//! Category taxonomy types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::transaction::TransactionType;

/// User-scoped taxonomy entry. Unique per `(user, name, type)` up to
/// case-insensitive name comparison. Created implicitly during commit
/// when no matching entry exists; never deleted by this pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub created_at: DateTime<Utc>,
}

/// Input for an implicit category creation.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub user_id: Uuid,
    pub name: String,
    pub kind: TransactionType,
}
