//! Gemini-backed document extractor.

use async_trait::async_trait;
use gemini_client::{to_response_schema, GeminiClient, GeminiError, ModelChain, RemoteFile};
use tracing::warn;

use crate::error::{IngestionError, Result};
use crate::traits::{DocumentExtractor, DocumentFile, RemoteDocument};

/// [`DocumentExtractor`] over the Gemini Files and generateContent
/// APIs, with primary/fallback model selection.
pub struct GeminiExtractor {
    client: GeminiClient,
    models: ModelChain,
}

impl GeminiExtractor {
    pub fn new(client: GeminiClient, models: ModelChain) -> Self {
        Self { client, models }
    }
}

fn extraction_error(err: GeminiError) -> IngestionError {
    IngestionError::Extraction(err.to_string())
}

fn to_remote_file(document: &RemoteDocument) -> RemoteFile {
    RemoteFile {
        name: document.handle.clone(),
        uri: document.uri.clone(),
        mime_type: document.mime_type.clone(),
    }
}

#[async_trait]
impl DocumentExtractor for GeminiExtractor {
    async fn upload(&self, file: &DocumentFile) -> Result<RemoteDocument> {
        let remote = self
            .client
            .upload_file(file.bytes.clone(), &file.mime_type)
            .await
            .map_err(extraction_error)?;

        Ok(RemoteDocument {
            handle: remote.name,
            uri: remote.uri,
            mime_type: remote.mime_type,
        })
    }

    async fn extract(
        &self,
        document: &RemoteDocument,
        prompt: &str,
        schema: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let schema = to_response_schema(schema);
        let file = to_remote_file(document);

        let mut last_error = GeminiError::Api("no model attempts configured".into());
        for model in self.models.attempts() {
            match self
                .client
                .generate_structured(model, prompt, &file, &schema)
                .await
            {
                Ok(text) => {
                    return serde_json::from_str(&text).map_err(|e| {
                        IngestionError::Extraction(format!("non-JSON model output: {}", e))
                    });
                }
                Err(e) => {
                    warn!(model, error = %e, "extraction attempt failed");
                    last_error = e;
                }
            }
        }

        Err(extraction_error(last_error))
    }

    async fn release(&self, document: RemoteDocument) -> Result<()> {
        self.client
            .delete_file(&document.handle)
            .await
            .map_err(extraction_error)
    }
}
