//! Wire types for the Gemini REST API.

use serde::{Deserialize, Serialize};

/// Primary/fallback model selection policy.
///
/// Encodes the two-attempt retry behavior as data: the primary model is
/// always tried first, and the fallback is tried once if it is configured
/// and differs from the primary. Keeping this as a plain value makes the
/// retry semantics testable without any network mocking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelChain {
    primary: String,
    fallback: Option<String>,
}

impl ModelChain {
    /// A chain with a single model and no fallback.
    pub fn new(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            fallback: None,
        }
    }

    /// A chain with a fallback model.
    ///
    /// A fallback equal to the primary is dropped — retrying the same
    /// model adds latency without changing the outcome.
    pub fn with_fallback(primary: impl Into<String>, fallback: impl Into<String>) -> Self {
        let primary = primary.into();
        let fallback = fallback.into();
        let fallback = (fallback != primary).then_some(fallback);
        Self { primary, fallback }
    }

    /// The primary model identifier.
    pub fn primary(&self) -> &str {
        &self.primary
    }

    /// Models to try, in order.
    pub fn attempts(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary.as_str()).chain(self.fallback.as_deref())
    }
}

/// Handle to a file stored with the Gemini Files API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteFile {
    /// Resource name, e.g. `files/abc-123`. Used for polling and deletion.
    pub name: String,
    /// Download URI referenced from `generateContent` requests.
    pub uri: String,
    /// MIME type the file was uploaded with.
    pub mime_type: String,
}

/// Processing state of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileState {
    Processing,
    Active,
    Failed,
    #[serde(other)]
    Unknown,
}

/// File metadata as returned by the Files API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    pub state: FileState,
}

/// Response envelope for the raw media upload endpoint.
#[derive(Debug, Deserialize)]
pub struct UploadFileResponse {
    pub file: FileInfo,
}

/// `generateContent` request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

/// A single content part: either inline text or a file reference.
#[derive(Debug, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_data: Option<FileData>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn file(file: &RemoteFile) -> Self {
        Self {
            file_data: Some(FileData {
                file_uri: file.uri.clone(),
                mime_type: file.mime_type.clone(),
            }),
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    pub file_uri: String,
    pub mime_type: String,
}

/// Generation settings. The schema constrains output to valid JSON.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: String,
    pub response_schema: serde_json::Value,
}

/// `generateContent` response body (only the fields we consume).
#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: CandidateContent,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    #[serde(default)]
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if any.
    pub fn into_text(self) -> Option<String> {
        let candidate = self.candidates.into_iter().next()?;
        let text: String = candidate
            .content
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_chain_tries_fallback_once() {
        let chain = ModelChain::with_fallback("gemini-2.5-flash", "gemini-2.0-flash");
        let attempts: Vec<_> = chain.attempts().collect();
        assert_eq!(attempts, vec!["gemini-2.5-flash", "gemini-2.0-flash"]);
    }

    #[test]
    fn model_chain_collapses_identical_fallback() {
        let chain = ModelChain::with_fallback("gemini-2.5-flash", "gemini-2.5-flash");
        let attempts: Vec<_> = chain.attempts().collect();
        assert_eq!(attempts, vec!["gemini-2.5-flash"]);
    }

    #[test]
    fn model_chain_without_fallback_is_single_attempt() {
        let chain = ModelChain::new("gemini-2.5-flash");
        assert_eq!(chain.attempts().count(), 1);
    }

    #[test]
    fn response_text_concatenates_parts() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": "{\"a\":" }, { "text": "1}" }] }
            }]
        }))
        .unwrap();
        assert_eq!(response.into_text().unwrap(), "{\"a\":1}");
    }

    #[test]
    fn empty_candidates_yield_no_text() {
        let response: GenerateContentResponse =
            serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(response.into_text().is_none());
    }
}
