//! Ephemeral preview records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::IngestionError;

/// Which ingestion path produced a preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewKind {
    Receipt,
    Statement,
}

impl std::fmt::Display for PreviewKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreviewKind::Receipt => write!(f, "receipt"),
            PreviewKind::Statement => write!(f, "statement"),
        }
    }
}

impl std::str::FromStr for PreviewKind {
    type Err = IngestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "receipt" => Ok(PreviewKind::Receipt),
            "statement" => Ok(PreviewKind::Statement),
            _ => Err(IngestionError::Validation(format!(
                "invalid preview kind: {}",
                s
            ))),
        }
    }
}

/// An extraction result held for user verification.
///
/// Accessible only by its owning user. Once `expires_at` has passed
/// the record is treated as nonexistent by all read paths and deleted
/// on first touch. A preview is removed exactly once: by a successful
/// commit or by expiry cleanup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preview {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: PreviewKind,
    /// Extracted data plus suggested transaction(s), as stored.
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Preview {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn expiry_boundary_is_inclusive() {
        let now = Utc::now();
        let preview = Preview {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            kind: PreviewKind::Receipt,
            payload: serde_json::json!({}),
            created_at: now - Duration::minutes(15),
            expires_at: now,
        };
        assert!(preview.is_expired(now));
        assert!(!preview.is_expired(now - Duration::seconds(1)));
    }
}
