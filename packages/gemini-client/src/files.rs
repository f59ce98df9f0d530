//! Gemini Files API: upload, poll until active, delete.
//!
//! Uploaded files start in `PROCESSING` and only become usable for
//! generation once the service reports `ACTIVE`. Upload therefore blocks
//! on a bounded polling loop; callers are responsible for deleting the
//! remote file when they are done with it.

use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{GeminiError, Result};
use crate::types::{FileInfo, FileState, RemoteFile, UploadFileResponse};
use crate::GeminiClient;

/// Polling behavior for the upload readiness loop.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay between readiness checks.
    pub interval: Duration,
    /// Hard ceiling on readiness checks before giving up.
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 30,
        }
    }
}

impl GeminiClient {
    /// Upload a file and block until the service reports it usable.
    ///
    /// Polls file state at a fixed interval up to the configured attempt
    /// ceiling. A `FAILED` state or an exhausted ceiling is an error.
    pub async fn upload_file(&self, bytes: Vec<u8>, mime_type: &str) -> Result<RemoteFile> {
        let url = format!("{}/upload/v1beta/files", self.base_url());

        let response = self
            .http()
            .post(&url)
            .header("x-goog-api-key", self.api_key())
            .header("X-Goog-Upload-Protocol", "raw")
            .header("Content-Type", mime_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| GeminiError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(error = %error_text, "Gemini file upload failed");
            return Err(GeminiError::Api(format!(
                "Gemini file upload error: {}",
                error_text
            )));
        }

        let uploaded: UploadFileResponse = response
            .json()
            .await
            .map_err(|e| GeminiError::Parse(e.to_string()))?;

        let info = self.wait_until_active(uploaded.file).await?;
        debug!(name = %info.name, "Gemini file active");

        Ok(RemoteFile {
            name: info.name,
            uri: info.uri,
            mime_type: info.mime_type.unwrap_or_else(|| mime_type.to_string()),
        })
    }

    /// Fetch current metadata for an uploaded file.
    pub async fn get_file(&self, name: &str) -> Result<FileInfo> {
        let url = format!("{}/v1beta/{}", self.base_url(), name);

        let response = self
            .http()
            .get(&url)
            .header("x-goog-api-key", self.api_key())
            .send()
            .await
            .map_err(|e| GeminiError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GeminiError::Api(format!(
                "Gemini file lookup error: {}",
                error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| GeminiError::Parse(e.to_string()))
    }

    /// Delete an uploaded file from remote storage.
    pub async fn delete_file(&self, name: &str) -> Result<()> {
        let url = format!("{}/v1beta/{}", self.base_url(), name);

        let response = self
            .http()
            .delete(&url)
            .header("x-goog-api-key", self.api_key())
            .send()
            .await
            .map_err(|e| GeminiError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GeminiError::Api(format!(
                "Gemini file delete error: {}",
                error_text
            )));
        }

        debug!(name, "Gemini file deleted");
        Ok(())
    }

    /// Suspend until the file leaves `PROCESSING`, within the poll ceiling.
    async fn wait_until_active(&self, mut info: FileInfo) -> Result<FileInfo> {
        let poll = self.poll_config().clone();

        for attempt in 0..poll.max_attempts {
            match info.state {
                FileState::Active => return Ok(info),
                FileState::Failed => {
                    return Err(GeminiError::FileProcessing(format!(
                        "remote processing failed for {}",
                        info.name
                    )));
                }
                FileState::Processing | FileState::Unknown => {
                    debug!(name = %info.name, attempt, "waiting for file to become active");
                    tokio::time::sleep(poll.interval).await;
                    info = self.get_file(&info.name).await?;
                }
            }
        }

        Err(GeminiError::FileProcessing(format!(
            "file {} not active after {} attempts",
            info.name, poll.max_attempts
        )))
    }
}
