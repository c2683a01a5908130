//! Client per l'API Replicate: risoluzione modello/versione e creazione prediction

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::error::{AppError, Result};

/// Errori nella risoluzione di modello/versione sul provider
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error("Identificativo modello non valido: {0}")]
    InvalidIdentifier(String),
    #[error("Modello non trovato: {0}")]
    ModelNotFound(String),
    #[error("Versione {version} non trovata per il modello {model}")]
    VersionNotFound { model: String, version: String },
    #[error("Errore risoluzione modello: {0}")]
    Upstream(String),
}

/// Versione risolta di un modello
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelVersion {
    pub model: String,
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictionRequest {
    pub version: String,
    pub input: Value,
    pub webhook: String,
    pub webhook_events_filter: Vec<String>,
}

impl PredictionRequest {
    /// Prediction con webhook invocato solo al completamento
    pub fn on_completion(version: &ModelVersion, input: Value, webhook: String) -> Self {
        Self {
            version: version.id.clone(),
            input,
            webhook,
            webhook_events_filter: vec!["completed".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Prediction {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[async_trait]
pub trait InferenceProvider: Send + Sync {
    async fn resolve_version(
        &self,
        model: &str,
        version: &str,
    ) -> std::result::Result<ModelVersion, ResolutionError>;

    async fn create_prediction(&self, request: &PredictionRequest) -> Result<Prediction>;
}

/// Separa "owner/name" validando entrambe le parti
pub fn parse_model_id(model: &str) -> std::result::Result<(&str, &str), ResolutionError> {
    match model.trim().split_once('/') {
        Some((owner, name))
            if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
        {
            Ok((owner, name))
        }
        _ => Err(ResolutionError::InvalidIdentifier(model.to_string())),
    }
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    id: String,
}

pub struct ReplicateClient {
    client: reqwest::Client,
    api_base: String,
    token: Option<String>,
}

impl ReplicateClient {
    pub fn new(api_base: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.authorized(self.client.get(url))
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait]
impl InferenceProvider for ReplicateClient {
    async fn resolve_version(
        &self,
        model: &str,
        version: &str,
    ) -> std::result::Result<ModelVersion, ResolutionError> {
        let (owner, name) = parse_model_id(model)?;
        let version = version.trim();
        if version.is_empty() {
            return Err(ResolutionError::InvalidIdentifier(format!(
                "{}: versione mancante",
                model
            )));
        }
        let model_id = format!("{}/{}", owner, name);

        let response = self
            .get(&format!("{}/models/{}/{}", self.api_base, owner, name))
            .send()
            .await
            .map_err(|e| ResolutionError::Upstream(e.to_string()))?;

        match response.status() {
            s if s.is_success() => {}
            reqwest::StatusCode::NOT_FOUND => {
                return Err(ResolutionError::ModelNotFound(model_id));
            }
            s => {
                let error = response.text().await.unwrap_or_default();
                return Err(ResolutionError::Upstream(format!("HTTP {}: {}", s, error)));
            }
        }

        let response = self
            .get(&format!(
                "{}/models/{}/{}/versions/{}",
                self.api_base,
                owner,
                name,
                urlencoding::encode(version)
            ))
            .send()
            .await
            .map_err(|e| ResolutionError::Upstream(e.to_string()))?;

        match response.status() {
            s if s.is_success() => {}
            reqwest::StatusCode::NOT_FOUND => {
                return Err(ResolutionError::VersionNotFound {
                    model: model_id,
                    version: version.to_string(),
                });
            }
            s => {
                let error = response.text().await.unwrap_or_default();
                return Err(ResolutionError::Upstream(format!("HTTP {}: {}", s, error)));
            }
        }

        let resolved: VersionResponse = response
            .json()
            .await
            .map_err(|e| ResolutionError::Upstream(e.to_string()))?;

        Ok(ModelVersion {
            model: model_id,
            id: resolved.id,
        })
    }

    async fn create_prediction(&self, request: &PredictionRequest) -> Result<Prediction> {
        let response = self
            .authorized(self.client.post(format!("{}/predictions", self.api_base)))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "Creazione prediction fallita (HTTP {}): {}",
                status, error
            )));
        }

        let prediction: Prediction = response.json().await?;
        Ok(prediction)
    }
}
