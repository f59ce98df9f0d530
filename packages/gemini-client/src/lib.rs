//! Pure Google Gemini REST API client.
//!
//! A clean, minimal client for the Gemini API with no domain-specific
//! logic. Supports the Files API (upload, poll, delete) and JSON-schema
//! constrained generation with primary/fallback model selection.
//!
//! # Example
//!
//! ```rust,ignore
//! use gemini_client::{GeminiClient, ModelChain};
//! use schemars::JsonSchema;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, JsonSchema)]
//! struct Receipt {
//!     merchant: Option<String>,
//!     amount: f64,
//! }
//!
//! let client = GeminiClient::from_env()?;
//! let models = ModelChain::with_fallback("gemini-2.5-flash", "gemini-2.0-flash");
//!
//! // Upload blocks until the file is ready for use.
//! let file = client.upload_file(bytes, "image/jpeg").await?;
//!
//! // Schema generated automatically from the type.
//! let receipt: Receipt = client.extract(&models, "Extract the receipt.", &file).await?;
//!
//! client.delete_file(&file.name).await?;
//! ```

pub mod error;
pub mod files;
pub mod schema;
pub mod types;

pub use error::{GeminiError, Result};
pub use files::PollConfig;
pub use schema::{to_response_schema, StructuredOutput};
pub use types::{FileInfo, FileState, ModelChain, RemoteFile};

use reqwest::Client;
use tracing::{debug, warn};

use types::{Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part};

/// Pure Gemini API client.
#[derive(Clone)]
pub struct GeminiClient {
    http_client: Client,
    api_key: String,
    base_url: String,
    poll_config: PollConfig,
}

impl GeminiClient {
    /// Create a new Gemini client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            poll_config: PollConfig::default(),
        }
    }

    /// Create from environment variable `GEMINI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| GeminiError::Config("GEMINI_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set a custom base URL (for proxies and test servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Override the file readiness polling behavior.
    pub fn with_poll_config(mut self, poll_config: PollConfig) -> Self {
        self.poll_config = poll_config;
        self
    }

    /// Get the API key.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http_client
    }

    pub(crate) fn poll_config(&self) -> &PollConfig {
        &self.poll_config
    }

    /// Type-safe structured extraction from an uploaded file.
    ///
    /// Generates a JSON schema from `T` via `schemars`, constrains
    /// generation to it, and deserializes the response. Models from the
    /// chain are tried in order; the last error propagates when every
    /// attempt fails.
    pub async fn extract<T: StructuredOutput>(
        &self,
        models: &ModelChain,
        prompt: &str,
        file: &RemoteFile,
    ) -> Result<T> {
        let schema = T::gemini_schema();

        debug!(
            type_name = %T::type_name(),
            model = models.primary(),
            "running structured extraction"
        );

        let mut last_error = GeminiError::Api("no model attempts configured".into());

        for model in models.attempts() {
            match self.generate_structured(model, prompt, file, &schema).await {
                Ok(json_str) => {
                    return serde_json::from_str(&json_str).map_err(|e| {
                        GeminiError::Parse(format!("failed to deserialize response: {}", e))
                    });
                }
                Err(e) => {
                    warn!(model, error = %e, "structured extraction attempt failed");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }

    /// Single `generateContent` call constrained to a JSON schema.
    ///
    /// Returns the raw JSON text of the first candidate. An empty
    /// response is an error.
    pub async fn generate_structured(
        &self,
        model: &str,
        prompt: &str,
        file: &RemoteFile,
        schema: &serde_json::Value,
    ) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part::file(file), Part::text(prompt)],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: schema.clone(),
            },
        };

        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);
        let start = std::time::Instant::now();

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Gemini request failed");
                GeminiError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "Gemini API error");
            return Err(GeminiError::Api(format!("Gemini API error: {}", error_text)));
        }

        let generated: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GeminiError::Parse(e.to_string()))?;

        debug!(
            model,
            duration_ms = start.elapsed().as_millis(),
            "Gemini generateContent"
        );

        generated
            .into_text()
            .ok_or_else(|| GeminiError::Parse("empty response from Gemini".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builder() {
        let client = GeminiClient::new("test-key").with_base_url("https://custom.api.com");

        assert_eq!(client.api_key, "test-key");
        assert_eq!(client.base_url, "https://custom.api.com");
    }

    #[test]
    fn test_poll_config_override() {
        let client = GeminiClient::new("test-key").with_poll_config(PollConfig {
            interval: std::time::Duration::from_millis(10),
            max_attempts: 3,
        });

        assert_eq!(client.poll_config.max_attempts, 3);
    }
}
