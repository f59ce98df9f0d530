//! Extraction client abstraction.
//!
//! Wraps the external multimodal extraction service behind three
//! operations: upload (blocks until the remote file is usable),
//! schema-constrained extract, and release. Implementations own the
//! provider specifics — polling, model fallback, auth. The mock in
//! [`crate::testing`] scripts responses for pipeline tests.

use async_trait::async_trait;

use crate::error::Result;

/// A document handed to the pipeline for extraction.
#[derive(Debug, Clone)]
pub struct DocumentFile {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl DocumentFile {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }
}

/// Handle to a document uploaded to the remote extraction service.
#[derive(Debug, Clone)]
pub struct RemoteDocument {
    /// Provider-side identifier, used for release.
    pub handle: String,
    /// URI referenced from extraction requests.
    pub uri: String,
    pub mime_type: String,
}

/// Client for the external structured-extraction service.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    /// Upload a document and block until the service reports it ready,
    /// polling at a fixed interval up to a bounded attempt count.
    async fn upload(&self, file: &DocumentFile) -> Result<RemoteDocument>;

    /// Request generation constrained to the given JSON schema.
    ///
    /// An empty or unparseable response is an error. Implementations
    /// retry once against a configured fallback model when it differs
    /// from the primary; repeated failure propagates.
    async fn extract(
        &self,
        document: &RemoteDocument,
        prompt: &str,
        schema: serde_json::Value,
    ) -> Result<serde_json::Value>;

    /// Delete the remote document.
    ///
    /// Must run after extraction regardless of outcome so remote
    /// storage is not leaked. Callers log failures instead of
    /// propagating them.
    async fn release(&self, document: RemoteDocument) -> Result<()>;
}
