//! Pipeline configuration.

use chrono::Duration;

/// Tunable ingestion behavior.
#[derive(Debug, Clone)]
pub struct IngestionConfig {
    /// How long a preview stays valid after creation.
    pub preview_ttl: Duration,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            preview_ttl: Duration::seconds(900),
        }
    }
}

impl IngestionConfig {
    /// Override the preview TTL.
    pub fn with_preview_ttl(mut self, ttl: Duration) -> Self {
        self.preview_ttl = ttl;
        self
    }

    /// Build from a TTL expressed in seconds (as configured in env).
    pub fn from_ttl_seconds(seconds: i64) -> Self {
        Self {
            preview_ttl: Duration::seconds(seconds),
        }
    }
}
