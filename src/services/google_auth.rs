//! Token OAuth per Google Cloud Storage tramite service account

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

const STORAGE_SCOPE: &str = "https://www.googleapis.com/auth/devstorage.read_write";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: i64 = 3600;
/// Margine prima della scadenza entro cui il token viene rinnovato
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Errori di autenticazione Google
#[derive(Debug, thiserror::Error)]
pub enum GoogleAuthError {
    #[error("Impossibile leggere il key file: {0}")]
    KeyFile(String),
    #[error("Chiave privata non valida: {0}")]
    InvalidKey(String),
    #[error("Scambio token fallito: {0}")]
    TokenExchange(String),
}

/// Key file JSON del service account
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self, GoogleAuthError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| GoogleAuthError::KeyFile(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&raw).map_err(|e| GoogleAuthError::KeyFile(e.to_string()))
    }
}

/// Claims dell'asserzione JWT firmata con la chiave del service account
#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// Fornisce access token per GCS, rinnovandoli alla scadenza
pub struct ServiceAccountTokenSource {
    key: ServiceAccountKey,
    client: reqwest::Client,
    cached: RwLock<Option<(String, Instant)>>,
}

impl ServiceAccountTokenSource {
    pub fn new(key: ServiceAccountKey) -> Self {
        Self {
            key,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            cached: RwLock::new(None),
        }
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    pub async fn access_token(&self) -> Result<String, GoogleAuthError> {
        {
            let cache = self.cached.read().await;
            if let Some((token, expires_at)) = cache.as_ref() {
                if Instant::now() + EXPIRY_MARGIN < *expires_at {
                    return Ok(token.clone());
                }
            }
        }

        let assertion = self.sign_assertion(chrono::Utc::now().timestamp())?;
        let params = [("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())];

        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| GoogleAuthError::TokenExchange(e.to_string()))?;

        if !response.status().is_success() {
            let error = response.text().await.unwrap_or_default();
            return Err(GoogleAuthError::TokenExchange(error));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| GoogleAuthError::TokenExchange(e.to_string()))?;

        let expires_at = Instant::now() + Duration::from_secs(token.expires_in);
        *self.cached.write().await = Some((token.access_token.clone(), expires_at));
        tracing::debug!("Nuovo access token GCS per {}", self.key.client_email);

        Ok(token.access_token)
    }

    fn sign_assertion(&self, now: i64) -> Result<String, GoogleAuthError> {
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: STORAGE_SCOPE,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
        };

        let key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| GoogleAuthError::InvalidKey(e.to_string()))?;

        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| GoogleAuthError::InvalidKey(e.to_string()))
    }
}
