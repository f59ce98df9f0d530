//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Extension},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use gemini_client::{GeminiClient, ModelChain};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use ingestion::{GeminiExtractor, IngestionConfig, IngestionService, PostgresLedgerStore};

use crate::auth::JwtService;
use crate::config::Config;
use crate::server::middleware::jwt_auth_middleware;
use crate::server::routes::{
    commit_receipt_handler, commit_statement_handler, delete_preview_handler, get_preview_handler,
    health_handler, list_previews_handler, upload_receipt_handler, upload_statement_handler,
};

/// The concrete pipeline the server runs: Postgres persistence, Gemini
/// extraction.
pub type AppIngestion = IngestionService<PostgresLedgerStore, GeminiExtractor>;

/// Per-document upload size caps.
#[derive(Clone, Copy, Debug)]
pub struct UploadLimits {
    pub max_receipt_bytes: usize,
    pub max_statement_bytes: usize,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub ingestion: Arc<AppIngestion>,
    pub jwt_service: Arc<JwtService>,
    pub limits: UploadLimits,
}

/// Wire the pipeline from configuration and a connected pool.
pub fn build_ingestion(config: &Config, pool: PgPool) -> AppIngestion {
    let client = GeminiClient::new(config.gemini_api_key.clone());
    let models = match &config.gemini_fallback_model {
        Some(fallback) => ModelChain::with_fallback(&config.gemini_model, fallback),
        None => ModelChain::new(&config.gemini_model),
    };

    IngestionService::new(
        PostgresLedgerStore::new(pool),
        GeminiExtractor::new(client, models),
        IngestionConfig::from_ttl_seconds(config.preview_ttl_seconds),
    )
}

/// Build the Axum application router
pub fn build_app(pool: PgPool, ingestion: Arc<AppIngestion>, config: &Config) -> Router {
    let jwt_service = Arc::new(JwtService::new(&config.jwt_secret, config.jwt_issuer.clone()));
    let limits = UploadLimits {
        max_receipt_bytes: config.max_receipt_bytes,
        max_statement_bytes: config.max_statement_bytes,
    };

    let state = AppState {
        db_pool: pool,
        ingestion,
        jwt_service: jwt_service.clone(),
        limits,
    };

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_origin(Any);

    // Multipart bodies are capped at the larger of the two document
    // limits plus headroom for the multipart framing.
    let body_limit = limits.max_receipt_bytes.max(limits.max_statement_bytes) + 64 * 1024;

    Router::new()
        .route("/health", get(health_handler))
        .route("/uploads/receipt", post(upload_receipt_handler))
        .route("/uploads/statement", post(upload_statement_handler))
        .route("/uploads/receipt/commit", post(commit_receipt_handler))
        .route(
            "/uploads/statement/commit",
            post(commit_statement_handler),
        )
        .route("/uploads/previews", get(list_previews_handler))
        .route(
            "/uploads/previews/:id",
            get(get_preview_handler).delete(delete_preview_handler),
        )
        .layer(middleware::from_fn(move |request, next| {
            jwt_auth_middleware(jwt_service.clone(), request, next)
        }))
        .layer(Extension(state))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
