//! Endpoint Replicate: avvio prediction e webhook di completamento

use axum::{
    extract::{Query, State},
    routing::post,
    Json, Router,
};

use crate::error::{AppError, Result};
use crate::models::request::non_blank;
use crate::models::{
    CallbackPayload, CallbackResponse, EmailQuery, ErrorResponse, ModelRequest,
    ModelStartedResponse, UploadQuery,
};
use crate::routes::AppState;
use crate::services::delivery::deliver_to_bucket;
use crate::services::email::compose_email_text;
use crate::services::inference::PredictionRequest;

const MISSING_OUTPUT: &str = "Output URL is None";
const MISSING_OUTPUT_OR_EMAIL: &str = "Output URL is None or email is missing";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/replicate/models", post(replicate_model_request))
        .route(
            "/replicate/handle_prediction_upload",
            post(handle_prediction_upload),
        )
        .route(
            "/replicate/handle_prediction_email",
            post(handle_prediction_email),
        )
        .with_state(state)
}

/// Avvia una prediction asincrona su Replicate
#[utoipa::path(
    post,
    path = "/replicate/models",
    request_body = ModelRequest,
    responses(
        (status = 200, description = "Prediction avviata", body = ModelStartedResponse),
        (status = 400, description = "Modello non valido o destinazione mancante", body = ErrorResponse),
        (status = 404, description = "Modello o versione inesistente", body = ErrorResponse),
        (status = 502, description = "Errore Replicate", body = ErrorResponse),
    ),
    tag = "Replicate"
)]
pub async fn replicate_model_request(
    State(state): State<AppState>,
    Json(request): Json<ModelRequest>,
) -> Result<Json<ModelStartedResponse>> {
    let target = request.delivery_target()?;

    let version = state
        .inference
        .resolve_version(&request.model, &request.version)
        .await?;

    let webhook = target.callback_url(state.config.callback_base());
    let prediction = PredictionRequest::on_completion(
        &version,
        request.input.to_provider_input(),
        webhook,
    );

    let created = state.inference.create_prediction(&prediction).await?;
    tracing::info!(
        "Prediction {} avviata su {}:{} ({:?}), webhook {}",
        created.id,
        version.model,
        version.id,
        created.status,
        prediction.webhook
    );

    Ok(Json(ModelStartedResponse::started()))
}

/// Webhook di completamento: carica l'immagine nel bucket indicato
#[utoipa::path(
    post,
    path = "/replicate/handle_prediction_upload",
    params(
        ("bucket" = Option<String>, Query, description = "Bucket di destinazione"),
    ),
    request_body = CallbackPayload,
    responses(
        (status = 200, description = "Immagine caricata oppure output mancante", body = CallbackResponse),
        (status = 400, description = "Bucket mancante", body = ErrorResponse),
        (status = 502, description = "Errore download o storage", body = ErrorResponse),
    ),
    tag = "Replicate"
)]
pub async fn handle_prediction_upload(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    Json(payload): Json<CallbackPayload>,
) -> Result<CallbackResponse> {
    let Some(image_url) = payload.image_url() else {
        tracing::warn!(
            "Webhook upload senza output (prediction {:?}, status {:?})",
            payload.id,
            payload.status
        );
        return Ok(CallbackResponse::rejected(MISSING_OUTPUT));
    };

    let bucket = non_blank(query.bucket.as_deref())
        .ok_or_else(|| AppError::MissingField("bucket".to_string()))?;

    let image = state.fetcher.fetch(image_url).await?;
    deliver_to_bucket(state.storage.as_ref(), image, bucket).await?;

    Ok(CallbackResponse::delivered(image_url))
}

/// Webhook di completamento: invia l'immagine via email
#[utoipa::path(
    post,
    path = "/replicate/handle_prediction_email",
    params(
        ("email" = Option<String>, Query, description = "Destinatario"),
        ("reset_counter" = Option<bool>, Query, description = "Azzera il contatore allegati"),
    ),
    request_body = CallbackPayload,
    responses(
        (status = 200, description = "Email inviata oppure dati mancanti", body = CallbackResponse),
        (status = 502, description = "Errore download o provider email", body = ErrorResponse),
    ),
    tag = "Replicate"
)]
pub async fn handle_prediction_email(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
    Json(payload): Json<CallbackPayload>,
) -> Result<CallbackResponse> {
    let (Some(image_url), Some(email)) = (payload.image_url(), non_blank(query.email.as_deref()))
    else {
        tracing::warn!(
            "Webhook email senza output o destinatario (prediction {:?})",
            payload.id
        );
        return Ok(CallbackResponse::rejected(MISSING_OUTPUT_OR_EMAIL));
    };

    let text = compose_email_text(payload.input.as_ref());
    let image = state.fetcher.fetch(image_url).await?;
    state
        .mailer
        .deliver(email, image, &text, query.reset_counter)
        .await?;

    Ok(CallbackResponse::delivered(image_url))
}
