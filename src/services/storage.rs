//! Upload su Google Cloud Storage (JSON API)

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use std::time::Duration;

#[cfg(feature = "google-auth")]
use crate::services::google_auth::{GoogleAuthError, ServiceAccountTokenSource};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Bucket non trovato: {0}")]
    BucketNotFound(String),
    #[error("Credenziali storage non disponibili: {0}")]
    Auth(String),
    #[error("Upload fallito: {0}")]
    UploadFailed(String),
    #[error("Errore API storage: {0}")]
    Api(String),
}

#[cfg(feature = "google-auth")]
impl From<GoogleAuthError> for StorageError {
    fn from(e: GoogleAuthError) -> Self {
        StorageError::Auth(e.to_string())
    }
}

/// Oggetto salvato nello storage
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoredObject {
    pub bucket: String,
    pub name: String,
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(
        &self,
        bucket: &str,
        object_name: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<StoredObject, StorageError>;
}

/// Origine delle credenziali GCS
pub enum GcsCredentials {
    Static(String),
    #[cfg(feature = "google-auth")]
    ServiceAccount(ServiceAccountTokenSource),
    Anonymous,
}

pub struct GcsStorage {
    client: reqwest::Client,
    api_base: String,
    credentials: GcsCredentials,
}

impl GcsStorage {
    pub fn new(api_base: impl Into<String>, credentials: GcsCredentials) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            credentials,
        }
    }

    async fn access_token(&self) -> Result<Option<String>, StorageError> {
        match &self.credentials {
            GcsCredentials::Static(token) => Ok(Some(token.clone())),
            #[cfg(feature = "google-auth")]
            GcsCredentials::ServiceAccount(source) => Ok(Some(source.access_token().await?)),
            GcsCredentials::Anonymous => Ok(None),
        }
    }

    fn authorized(
        &self,
        builder: reqwest::RequestBuilder,
        token: Option<&str>,
    ) -> reqwest::RequestBuilder {
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Verifica che il bucket esista prima dell'upload
    async fn get_bucket(&self, bucket: &str, token: Option<&str>) -> Result<(), StorageError> {
        let url = format!(
            "{}/storage/v1/b/{}",
            self.api_base,
            urlencoding::encode(bucket)
        );

        let response = self
            .authorized(self.client.get(&url), token)
            .send()
            .await
            .map_err(|e| StorageError::Api(e.to_string()))?;

        match response.status() {
            s if s.is_success() => Ok(()),
            reqwest::StatusCode::NOT_FOUND => Err(StorageError::BucketNotFound(bucket.to_string())),
            s => {
                let error = response.text().await.unwrap_or_default();
                Err(StorageError::Api(format!("lookup bucket {} ({}): {}", bucket, s, error)))
            }
        }
    }
}

#[async_trait]
impl ObjectStorage for GcsStorage {
    async fn upload(
        &self,
        bucket: &str,
        object_name: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        let token = self.access_token().await?;
        self.get_bucket(bucket, token.as_deref()).await?;

        let url = format!(
            "{}/upload/storage/v1/b/{}/o?uploadType=media&name={}",
            self.api_base,
            urlencoding::encode(bucket),
            urlencoding::encode(object_name)
        );

        let size = data.len();
        let response = self
            .authorized(self.client.post(&url), token.as_deref())
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        if !response.status().is_success() {
            let error = response.text().await.unwrap_or_default();
            return Err(StorageError::UploadFailed(error));
        }

        let object: StoredObject = response
            .json()
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        tracing::info!(
            "Caricato gs://{}/{} ({} byte, {})",
            object.bucket,
            object.name,
            size,
            content_type
        );

        Ok(object)
    }
}
