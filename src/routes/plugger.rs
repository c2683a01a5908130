use axum::{extract::State, routing::post, Json, Router};

use crate::error::{AppError, Result};
use crate::models::request::non_blank;
use crate::models::{ErrorResponse, ImageUrlResponse, PluggerRequest};
use crate::routes::AppState;
use crate::services::delivery::deliver_to_bucket;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/plugger/request", post(plugger_request))
        .with_state(state)
}

/// Generazione sincrona su Plugger con upload del risultato nel bucket
#[utoipa::path(
    post,
    path = "/plugger/request",
    request_body = PluggerRequest,
    responses(
        (status = 200, description = "Immagine generata e caricata", body = ImageUrlResponse),
        (status = 400, description = "Bucket mancante", body = ErrorResponse),
        (status = 502, description = "Errore Plugger, download o storage", body = ErrorResponse),
    ),
    tag = "Plugger"
)]
pub async fn plugger_request(
    State(state): State<AppState>,
    Json(request): Json<PluggerRequest>,
) -> Result<Json<ImageUrlResponse>> {
    let bucket = non_blank(request.bucket.as_deref())
        .ok_or_else(|| AppError::MissingField("bucket".to_string()))?
        .to_string();

    let image_url = state.plugger.generate(&request).await?;
    tracing::info!("Plugger ha generato {}", image_url);

    let image = state.fetcher.fetch(&image_url).await?;
    deliver_to_bucket(state.storage.as_ref(), image, &bucket).await?;

    Ok(Json(ImageUrlResponse { image_url }))
}
