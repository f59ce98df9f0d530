//! HTTP error mapping for the ingestion pipeline.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ingestion::IngestionError;
use serde_json::json;
use tracing::error;

/// API-level error: an ingestion error plus anything the handlers
/// themselves reject (bad multipart, unsupported media types).
#[derive(Debug)]
pub enum ApiError {
    Ingestion(IngestionError),
    BadRequest(String),
    UnsupportedMediaType(String),
    PayloadTooLarge(String),
    Unauthorized,
    Internal(anyhow::Error),
}

impl From<IngestionError> for ApiError {
    fn from(err: IngestionError) -> Self {
        ApiError::Ingestion(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl ApiError {
    fn status_and_message(self) -> (StatusCode, String) {
        match self {
            ApiError::Ingestion(err) => match err {
                IngestionError::Validation(message) => (StatusCode::BAD_REQUEST, message),
                IngestionError::Extraction(message) => (StatusCode::BAD_GATEWAY, message),
                IngestionError::PreviewNotFound => {
                    (StatusCode::NOT_FOUND, "preview not found".into())
                }
                IngestionError::PreviewForbidden => {
                    (StatusCode::FORBIDDEN, "preview belongs to another user".into())
                }
                IngestionError::PreviewExpired => (
                    StatusCode::GONE,
                    "preview has expired, please re-upload the document".into(),
                ),
                IngestionError::InvalidCategory(name) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    format!("invalid category: {}", name),
                ),
                IngestionError::Storage(cause) => {
                    error!(error = %cause, "storage failure");
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal error".into())
                }
            },
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::UnsupportedMediaType(message) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, message)
            }
            ApiError::PayloadTooLarge(message) => (StatusCode::PAYLOAD_TOO_LARGE, message),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "authentication required".into()),
            ApiError::Internal(cause) => {
                error!(error = %cause, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".into())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ApiError) -> StatusCode {
        err.status_and_message().0
    }

    #[test]
    fn ingestion_errors_map_to_distinct_statuses() {
        assert_eq!(
            status_of(IngestionError::Validation("x".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(IngestionError::Extraction("x".into()).into()),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(IngestionError::PreviewNotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(IngestionError::PreviewForbidden.into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(IngestionError::PreviewExpired.into()),
            StatusCode::GONE
        );
        assert_eq!(
            status_of(IngestionError::InvalidCategory("x".into()).into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn storage_errors_hide_their_cause() {
        let err: ApiError = IngestionError::storage("connection refused").into();
        let (status, message) = err.status_and_message();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!message.contains("connection"));
    }
}
