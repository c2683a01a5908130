use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Stato del relay
    pub status: String,
    /// Versione del relay
    pub version: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ModelStartedResponse {
    pub response: String,
}

impl ModelStartedResponse {
    pub fn started() -> Self {
        Self {
            response: "Model started".to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ImageUrlResponse {
    pub image_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Esito di un webhook: URL consegnato oppure errore senza effetti collaterali
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
#[serde(untagged)]
pub enum CallbackResponse {
    Delivered { image_url: String },
    Rejected { error: String },
}

impl CallbackResponse {
    pub fn delivered(image_url: impl Into<String>) -> Self {
        CallbackResponse::Delivered {
            image_url: image_url.into(),
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        CallbackResponse::Rejected {
            error: error.into(),
        }
    }
}

impl IntoResponse for CallbackResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub status: u16,
}
