use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_fallback_model: Option<String>,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub preview_ttl_seconds: i64,
    pub max_receipt_bytes: usize,
    pub max_statement_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            gemini_api_key: env::var("GEMINI_API_KEY").context("GEMINI_API_KEY must be set")?,
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-2.5-flash".to_string()),
            gemini_fallback_model: env::var("GEMINI_FALLBACK_MODEL").ok(),
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "centavo".to_string()),
            preview_ttl_seconds: env::var("PREVIEW_TTL_SECONDS")
                .unwrap_or_else(|_| "900".to_string())
                .parse()
                .context("PREVIEW_TTL_SECONDS must be a valid number")?,
            max_receipt_bytes: env::var("MAX_RECEIPT_BYTES")
                .unwrap_or_else(|_| (10 * 1024 * 1024).to_string())
                .parse()
                .context("MAX_RECEIPT_BYTES must be a valid number")?,
            max_statement_bytes: env::var("MAX_STATEMENT_BYTES")
                .unwrap_or_else(|_| (20 * 1024 * 1024).to_string())
                .parse()
                .context("MAX_STATEMENT_BYTES must be a valid number")?,
        })
    }
}
