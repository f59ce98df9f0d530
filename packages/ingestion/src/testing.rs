//! Test double for the extraction client.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{IngestionError, Result};
use crate::traits::{DocumentExtractor, DocumentFile, RemoteDocument};

/// Scripted [`DocumentExtractor`]: responses are queued up front and
/// popped per `extract` call. Upload and release can be scripted to
/// fail; every call is counted so tests can assert cleanup ran.
#[derive(Default)]
pub struct MockExtractor {
    responses: Mutex<VecDeque<std::result::Result<serde_json::Value, String>>>,
    fail_upload: Mutex<Option<String>>,
    fail_release: Mutex<bool>,
    upload_calls: AtomicUsize,
    extract_calls: AtomicUsize,
    release_calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful extraction response.
    pub fn push_response(&self, value: serde_json::Value) {
        self.responses.lock().unwrap().push_back(Ok(value));
    }

    /// Queue an extraction failure.
    pub fn push_failure(&self, message: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Err(message.into()));
    }

    /// Make the next uploads fail with the given message.
    pub fn fail_uploads(&self, message: impl Into<String>) {
        *self.fail_upload.lock().unwrap() = Some(message.into());
    }

    /// Make release calls fail.
    pub fn fail_releases(&self) {
        *self.fail_release.lock().unwrap() = true;
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn extract_calls(&self) -> usize {
        self.extract_calls.load(Ordering::SeqCst)
    }

    pub fn release_calls(&self) -> usize {
        self.release_calls.load(Ordering::SeqCst)
    }

    /// The prompt of the most recent `extract` call.
    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentExtractor for MockExtractor {
    async fn upload(&self, file: &DocumentFile) -> Result<RemoteDocument> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.fail_upload.lock().unwrap().clone() {
            return Err(IngestionError::Extraction(message));
        }
        Ok(RemoteDocument {
            handle: format!("files/mock-{}", self.upload_calls()),
            uri: "https://mock.example/files/mock".into(),
            mime_type: file.mime_type.clone(),
        })
    }

    async fn extract(
        &self,
        _document: &RemoteDocument,
        prompt: &str,
        _schema: serde_json::Value,
    ) -> Result<serde_json::Value> {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());

        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(IngestionError::Extraction(message)),
            None => Err(IngestionError::Extraction(
                "mock extractor: no scripted response".into(),
            )),
        }
    }

    async fn release(&self, _document: RemoteDocument) -> Result<()> {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_release.lock().unwrap() {
            return Err(IngestionError::Extraction("mock release failed".into()));
        }
        Ok(())
    }
}
