use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::email::EmailError;
use crate::services::inference::ResolutionError;
use crate::services::storage::StorageError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Campo mancante: {0}")]
    MissingField(String),

    #[error("Richiesta non valida: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("Errore servizio esterno: {0}")]
    Upstream(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Email(#[from] EmailError),

    #[error("Errore immagine: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Errore interno: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingField(_) => StatusCode::BAD_REQUEST,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Resolution(e) => match e {
                ResolutionError::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
                ResolutionError::ModelNotFound(_) => StatusCode::NOT_FOUND,
                ResolutionError::VersionNotFound { .. } => StatusCode::NOT_FOUND,
                ResolutionError::Upstream(_) => StatusCode::BAD_GATEWAY,
            },
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Storage(StorageError::BucketNotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Storage(_) => StatusCode::BAD_GATEWAY,
            AppError::Email(_) => StatusCode::BAD_GATEWAY,
            AppError::ImageError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Upstream(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = self.to_string();

        if status.is_server_error() {
            tracing::error!("{}", error_message);
        } else {
            tracing::warn!("{}", error_message);
        }

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
