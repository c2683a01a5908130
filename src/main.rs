use std::net::SocketAddr;

use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use image_relay::config::Config;
use image_relay::models::*;
use image_relay::routes::{self, AppState};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Image Relay API",
        version = "0.1.0",
        description = "Relay per la generazione di immagini: avvia prediction Replicate, riceve i webhook e consegna il risultato su Google Cloud Storage o via email",
        license(name = "MIT"),
    ),
    paths(
        routes::health::health_check,
        routes::replicate::replicate_model_request,
        routes::replicate::handle_prediction_upload,
        routes::replicate::handle_prediction_email,
        routes::plugger::plugger_request,
        routes::convert::convert_image,
    ),
    components(schemas(
        HealthResponse,
        ModelRequest,
        GenerationInput,
        ModelStartedResponse,
        CallbackPayload,
        CallbackResponse,
        PluggerRequest,
        ImageUrlResponse,
        ConvertRequest,
        MessageResponse,
        ErrorResponse,
    )),
    tags(
        (name = "Replicate", description = "Prediction asincrone e webhook di completamento"),
        (name = "Plugger", description = "Generazione sincrona"),
        (name = "Conversione", description = "Conversione immagini in JPEG"),
        (name = "Sistema", description = "Health check"),
    ),
    servers(
        (url = "http://localhost:8000", description = "Server locale"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Carica variabili da .env
    dotenvy::dotenv().ok();

    // Inizializza logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "image_relay=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if config.replicate_api_token.is_none() {
        tracing::warn!("REPLICATE_API_TOKEN non impostato: richieste Replicate senza autenticazione");
    }
    if config.resend_api_key.is_none() {
        tracing::warn!("RESEND_API_KEY non impostato: consegna email disabilitata");
    }
    if config.gcs_access_token.is_none() && config.gcs_credentials_path.is_none() {
        tracing::warn!("Nessuna credenziale GCS: upload anonimi");
    }

    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!("Indirizzo non valido {}:{}: {}", config.host, config.port, e);
            std::process::exit(1);
        }
    };
    let public_url = config.callback_base().to_string();

    let state = match AppState::from_config(config) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Errore inizializzazione servizi: {}", e);
            std::process::exit(1);
        }
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(routes::create_router(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    tracing::info!("========================================");
    tracing::info!("  Image Relay v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("========================================");
    tracing::info!("Server: http://{}", addr);
    tracing::info!("Webhook base: {}", public_url);
    tracing::info!("Swagger UI: http://{}/swagger-ui/", addr);
    tracing::info!("----------------------------------------");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                              - Health check");
    tracing::info!("  POST /replicate/models                    - Avvia prediction");
    tracing::info!("  POST /replicate/handle_prediction_upload  - Webhook upload GCS");
    tracing::info!("  POST /replicate/handle_prediction_email   - Webhook email");
    tracing::info!("  POST /plugger/request                     - Generazione Plugger");
    tracing::info!("  POST /convert                             - Converti in JPEG");
    tracing::info!("----------------------------------------");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Impossibile aprire {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Errore server: {}", e);
    }
}
