//! Download delle immagini generate

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

use crate::error::Result;

#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Scarica un'immagine. `None` se il server non risponde 200.
    async fn fetch(&self, url: &str) -> Result<Option<Bytes>>;
}

/// Fetcher HTTP con timeout ampio e redirect abilitati
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .redirect(reqwest::redirect::Policy::limited(10))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Option<Bytes>> {
        let response = self.client.get(url).send().await?;

        if response.status() != reqwest::StatusCode::OK {
            tracing::warn!(
                "Download immagine fallito da {}: status {}",
                url,
                response.status()
            );
            return Ok(None);
        }

        let bytes = response.bytes().await?;
        tracing::debug!("Scaricati {} byte da {}", bytes.len(), url);
        Ok(Some(bytes))
    }
}
