pub mod convert;
pub mod health;
pub mod plugger;
pub mod replicate;

use axum::Router;
use std::sync::Arc;

use crate::config::Config;
use crate::services::delivery::{EmailDelivery, EmailSettings};
use crate::services::email::ResendClient;
use crate::services::fetcher::{HttpImageFetcher, ImageFetcher};
use crate::services::inference::{InferenceProvider, ReplicateClient};
use crate::services::plugger::{PluggerClient, PluggerHttpClient};
use crate::services::storage::{GcsCredentials, GcsStorage, ObjectStorage};

/// Stato condiviso: configurazione e servizi esterni
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub inference: Arc<dyn InferenceProvider>,
    pub plugger: Arc<dyn PluggerClient>,
    pub fetcher: Arc<dyn ImageFetcher>,
    pub storage: Arc<dyn ObjectStorage>,
    pub mailer: Arc<EmailDelivery>,
}

impl AppState {
    /// Costruisce i client reali (Replicate, Plugger, GCS, Resend) dalla configurazione
    pub fn from_config(config: Config) -> crate::error::Result<Self> {
        let credentials = gcs_credentials(&config)?;

        Ok(Self {
            inference: Arc::new(ReplicateClient::new(
                config.replicate_api_base.clone(),
                config.replicate_api_token.clone(),
            )),
            plugger: Arc::new(PluggerHttpClient::new(
                config.plugger_url.clone(),
                config.plugger_api_key.clone(),
            )),
            fetcher: Arc::new(HttpImageFetcher::new(config.download_timeout())),
            storage: Arc::new(GcsStorage::new(config.gcs_api_base.clone(), credentials)),
            mailer: Arc::new(EmailDelivery::new(
                Arc::new(ResendClient::new(
                    config.resend_api_base.clone(),
                    config.resend_api_key.clone(),
                )),
                EmailSettings::from_config(&config),
            )),
            config: Arc::new(config),
        })
    }
}

#[cfg(feature = "google-auth")]
fn gcs_credentials(config: &Config) -> crate::error::Result<GcsCredentials> {
    use crate::error::AppError;
    use crate::services::google_auth::{ServiceAccountKey, ServiceAccountTokenSource};

    if let Some(token) = &config.gcs_access_token {
        return Ok(GcsCredentials::Static(token.clone()));
    }

    match &config.gcs_credentials_path {
        Some(path) => {
            let key = ServiceAccountKey::from_file(path)
                .map_err(|e| AppError::Internal(e.to_string()))?;
            let source = ServiceAccountTokenSource::new(key);
            tracing::info!("GCS: service account {}", source.client_email());
            Ok(GcsCredentials::ServiceAccount(source))
        }
        None => Ok(GcsCredentials::Anonymous),
    }
}

#[cfg(not(feature = "google-auth"))]
fn gcs_credentials(config: &Config) -> crate::error::Result<GcsCredentials> {
    if config.gcs_credentials_path.is_some() {
        tracing::warn!("GOOGLE_APPLICATION_CREDENTIALS ignorato: feature google-auth disabilitata");
    }

    Ok(config
        .gcs_access_token
        .clone()
        .map(GcsCredentials::Static)
        .unwrap_or(GcsCredentials::Anonymous))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(replicate::router(state.clone()))
        .merge(plugger::router(state.clone()))
        .merge(convert::router(state))
}
