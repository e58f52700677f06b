use axum::extract::multipart::MultipartError;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

use anyshare_registry::RegistryError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("malformed upload: {0}")]
    Upload(#[from] MultipartError),

    #[error("malformed upload: {0}")]
    UploadRejected(#[from] MultipartRejection),

    #[error("malformed query: {0}")]
    Query(#[from] QueryRejection),

    #[error("storage error: {0}")]
    Store(#[from] anyshare_store::StoreError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Registry(RegistryError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            Self::Registry(RegistryError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Registry(RegistryError::Expired(_)) => StatusCode::GONE,
            // A body over the request limit is an oversized payload.
            Self::Upload(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                StatusCode::BAD_REQUEST
            }
            Self::Upload(e) => e.status(),
            Self::UploadRejected(e) => e.status(),
            Self::Query(e) => e.status(),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use anyshare_types::ShareId;

    #[test]
    fn status_mapping() {
        let invalid: ServerError = RegistryError::InvalidInput("x".into()).into();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let missing: ServerError = RegistryError::NotFound("x".into()).into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let expired: ServerError = RegistryError::Expired(ShareId::new("abcd").unwrap()).into();
        assert_eq!(expired.status(), StatusCode::GONE);

        let storage: ServerError =
            RegistryError::Storage(anyshare_store::StoreError::ReadOnly).into();
        assert_eq!(storage.status(), StatusCode::INTERNAL_SERVER_ERROR);

        assert_eq!(
            ServerError::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
