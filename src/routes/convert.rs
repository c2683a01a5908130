use axum::{extract::State, routing::post, Json, Router};

use crate::error::Result;
use crate::models::{ConvertRequest, ErrorResponse, MessageResponse};
use crate::routes::AppState;
use crate::services::converter;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/convert", post(convert_image))
        .with_state(state)
}

/// Scarica un'immagine, la converte in JPEG RGB e la carica nel bucket
#[utoipa::path(
    post,
    path = "/convert",
    request_body = ConvertRequest,
    responses(
        (status = 200, description = "Immagine convertita e caricata", body = MessageResponse),
        (status = 422, description = "Immagine non decodificabile", body = ErrorResponse),
        (status = 502, description = "Errore download o storage", body = ErrorResponse),
    ),
    tag = "Conversione"
)]
pub async fn convert_image(
    State(state): State<AppState>,
    Json(request): Json<ConvertRequest>,
) -> Result<Json<MessageResponse>> {
    let object = converter::convert_and_store(
        state.fetcher.as_ref(),
        state.storage.as_ref(),
        &request.url,
        &request.bucket,
    )
    .await?;

    tracing::info!("Convertita {} in gs://{}/{}", request.url, object.bucket, object.name);

    Ok(Json(MessageResponse {
        message: "Image converted and uploaded to Google Cloud Storage.".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use crate::routes::create_router;
    use crate::test_utils::{png_fixture, StaticFetcher, TestHarness};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn post_convert(harness: &TestHarness, body: Value) -> (StatusCode, Value) {
        let response = create_router(harness.state.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/convert")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_convert_endpoint() {
        let harness = TestHarness::new(StaticFetcher::with_image(
            "https://example/img.png",
            png_fixture(),
        ));

        let (status, body) = post_convert(
            &harness,
            json!({"url": "https://example/img.png", "bucket": "store-living"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"message": "Image converted and uploaded to Google Cloud Storage."})
        );

        let uploads = harness.storage.uploads();
        assert_eq!(uploads.len(), 1);
        assert!(uploads[0].name.starts_with("living-"));
        assert_eq!(uploads[0].content_type, "image/jpeg");

        let decoded = image::load_from_memory(&uploads[0].data).unwrap();
        assert_eq!(decoded.color(), image::ColorType::Rgb8);
    }

    #[tokio::test]
    async fn test_convert_undecodable_image() {
        let harness = TestHarness::new(StaticFetcher::with_image(
            "https://example/page.html",
            b"<html></html>".to_vec(),
        ));

        let (status, body) = post_convert(
            &harness,
            json!({"url": "https://example/page.html", "bucket": "store-living"}),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["status"], 422);
        assert!(harness.storage.uploads().is_empty());
    }
}
