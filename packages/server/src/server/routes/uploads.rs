//! Upload and preview endpoints.
//!
//! Two-phase flow: POST a document to get a preview, then POST the
//! verified rows against that preview to commit. Previews are owned by
//! the authenticated user and expire on a TTL.

use axum::extract::{Extension, Multipart, Path, Query};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use ingestion::pipeline::{
    CommittedTransaction, ReceiptCommit, ReceiptPreview, StatementCommit, StatementCommitResult,
    StatementPreview,
};
use ingestion::traits::PreviewStore;
use ingestion::{DocumentFile, Preview, PreviewKind};

use crate::error::ApiError;
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

const RECEIPT_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/heic"];
const STATEMENT_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "image/jpeg",
    "image/png",
    "image/webp",
];

/// POST /uploads/receipt
pub async fn upload_receipt_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ReceiptPreview>), ApiError> {
    let file = read_document(
        multipart,
        RECEIPT_MIME_TYPES,
        state.limits.max_receipt_bytes,
    )
    .await?;

    let preview = state.ingestion.extract_receipt(file, user.user_id).await?;
    Ok((StatusCode::CREATED, Json(preview)))
}

/// POST /uploads/statement
pub async fn upload_statement_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<StatementPreview>), ApiError> {
    let file = read_document(
        multipart,
        STATEMENT_MIME_TYPES,
        state.limits.max_statement_bytes,
    )
    .await?;

    let preview = state
        .ingestion
        .extract_statement(file, user.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(preview)))
}

/// POST /uploads/receipt/commit
pub async fn commit_receipt_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Json(input): Json<ReceiptCommit>,
) -> Result<(StatusCode, Json<CommittedTransaction>), ApiError> {
    let committed = state.ingestion.commit_receipt(input, user.user_id).await?;
    Ok((StatusCode::CREATED, Json(committed)))
}

/// POST /uploads/statement/commit
pub async fn commit_statement_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Json(input): Json<StatementCommit>,
) -> Result<(StatusCode, Json<StatementCommitResult>), ApiError> {
    let result = state.ingestion.commit_statement(input, user.user_id).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

#[derive(Debug, Deserialize)]
pub struct PreviewListQuery {
    #[serde(rename = "type")]
    kind: Option<PreviewKind>,
}

/// A preview as returned by the read endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub preview_id: Uuid,
    #[serde(rename = "type")]
    pub kind: PreviewKind,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<Preview> for PreviewResponse {
    fn from(preview: Preview) -> Self {
        Self {
            preview_id: preview.id,
            kind: preview.kind,
            payload: preview.payload,
            created_at: preview.created_at,
            expires_at: preview.expires_at,
        }
    }
}

/// GET /uploads/previews?type=receipt|statement
pub async fn list_previews_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Query(query): Query<PreviewListQuery>,
) -> Result<Json<Vec<PreviewResponse>>, ApiError> {
    let previews = state
        .ingestion
        .list_previews(user.user_id, query.kind)
        .await?;
    Ok(Json(previews.into_iter().map(Into::into).collect()))
}

/// GET /uploads/previews/{id}
pub async fn get_preview_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PreviewResponse>, ApiError> {
    let preview = state.ingestion.get_preview(id, user.user_id).await?;
    Ok(Json(preview.into()))
}

/// DELETE /uploads/previews/{id}
///
/// Discard a preview without committing it.
pub async fn delete_preview_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    // Ownership and expiry checks run first; only the owner of a live
    // preview can discard it.
    let preview = state.ingestion.get_preview(id, user.user_id).await?;
    state.ingestion.store().delete_preview(preview.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Pull the `file` field out of the multipart body, enforcing the MIME
/// allow-list and size cap.
async fn read_document(
    mut multipart: Multipart,
    allowed_mime_types: &[&str],
    max_bytes: usize,
) -> Result<DocumentFile, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let mime_type = field
            .content_type()
            .map(str::to_string)
            .ok_or_else(|| ApiError::BadRequest("file field has no content type".into()))?;

        if !allowed_mime_types.contains(&mime_type.as_str()) {
            return Err(ApiError::UnsupportedMediaType(format!(
                "unsupported content type {}, expected one of: {}",
                mime_type,
                allowed_mime_types.join(", ")
            )));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read file field: {}", e)))?;

        if bytes.is_empty() {
            return Err(ApiError::BadRequest("uploaded file is empty".into()));
        }
        if bytes.len() > max_bytes {
            return Err(ApiError::PayloadTooLarge(format!(
                "file exceeds the {} byte limit",
                max_bytes
            )));
        }

        return Ok(DocumentFile::new(bytes.to_vec(), mime_type));
    }

    Err(ApiError::BadRequest(
        "multipart body must contain a 'file' field".into(),
    ))
}
