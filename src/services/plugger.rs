//! Client per l'inferenza sincrona Plugger

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::PluggerRequest;

#[async_trait]
pub trait PluggerClient: Send + Sync {
    /// Inoltra il payload e restituisce l'URL dell'immagine generata
    async fn generate(&self, request: &PluggerRequest) -> Result<String>;
}

pub struct PluggerHttpClient {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl PluggerHttpClient {
    pub fn new(url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(600))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            url: url.into(),
            api_key,
        }
    }
}

/// Estrae `data.image_url` dalla risposta Plugger
pub fn image_url_from_response(result: &Value) -> Option<&str> {
    result
        .get("data")
        .and_then(|data| data.get("image_url"))
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
}

#[async_trait]
impl PluggerClient for PluggerHttpClient {
    async fn generate(&self, request: &PluggerRequest) -> Result<String> {
        let mut builder = self.client.post(&self.url).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.header("x-api-key", key);
        }

        let response = builder.send().await?;
        let status = response.status();
        let result: Value = response.json().await?;

        image_url_from_response(&result)
            .map(str::to_string)
            .ok_or_else(|| {
                AppError::Upstream(format!(
                    "Risposta Plugger senza data.image_url (HTTP {})",
                    status
                ))
            })
    }
}
