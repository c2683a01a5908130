//! Invio email con allegato tramite Resend

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("Provider email non configurato (RESEND_API_KEY mancante)")]
    NotConfigured,
    #[error("Invio email fallito: {0}")]
    SendFailed(String),
}

/// Email generica, indipendente dal provider
#[derive(Debug, Clone)]
pub struct Email {
    pub from: String,
    pub to: String,
    pub cc: Vec<String>,
    pub subject: String,
    pub text: String,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub content: Bytes,
    pub content_type: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Invia l'email e restituisce l'ID assegnato dal provider
    async fn send(&self, email: &Email) -> Result<String, EmailError>;
}

#[derive(Debug, Serialize)]
struct ResendAttachment<'a> {
    filename: &'a str,
    content: String,
    content_type: &'a str,
}

#[derive(Debug, Serialize)]
struct ResendEmail<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    cc: Vec<&'a str>,
    subject: &'a str,
    text: &'a str,
    attachments: Vec<ResendAttachment<'a>>,
}

impl<'a> From<&'a Email> for ResendEmail<'a> {
    fn from(email: &'a Email) -> Self {
        Self {
            from: &email.from,
            to: vec![email.to.as_str()],
            cc: email.cc.iter().map(String::as_str).collect(),
            subject: &email.subject,
            text: &email.text,
            attachments: email
                .attachments
                .iter()
                .map(|a| ResendAttachment {
                    filename: &a.filename,
                    content: STANDARD.encode(&a.content),
                    content_type: &a.content_type,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResendResponse {
    id: String,
}

pub struct ResendClient {
    client: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
}

impl ResendClient {
    pub fn new(api_base: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl EmailSender for ResendClient {
    async fn send(&self, email: &Email) -> Result<String, EmailError> {
        let api_key = self.api_key.as_deref().ok_or(EmailError::NotConfigured)?;

        let response = self
            .client
            .post(format!("{}/emails", self.api_base))
            .bearer_auth(api_key)
            .json(&ResendEmail::from(email))
            .send()
            .await
            .map_err(|e| EmailError::SendFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            return Err(EmailError::SendFailed(format!("HTTP {}: {}", status, error)));
        }

        let sent: ResendResponse = response
            .json()
            .await
            .map_err(|e| EmailError::SendFailed(e.to_string()))?;

        Ok(sent.id)
    }
}

/// Testo dell'email a partire dai parametri di input restituiti dal provider.
///
/// Gli input "product image" (con `image_path`) usano un template dedicato.
pub fn compose_email_text(input: Option<&Map<String, Value>>) -> String {
    let empty = Map::new();
    let input = input.unwrap_or(&empty);
    let field = |key: &str| render_value(input.get(key));

    if input.contains_key("image_path") {
        format!(
            "Image Path: {}\nPixel: {}\nProduct Size: {}\n\nPrompt: {}\n\nNegative Prompt: {}",
            field("image_path"),
            field("pixel"),
            field("product_size"),
            field("prompt"),
            field("negative_prompt"),
        )
    } else {
        format!(
            "Width: {}\nHeight: {}\nVariants: {}\n\nPrompt: {}\n\nNegative Prompt: {}",
            field("width"),
            field("height"),
            field("num_outputs"),
            field("prompt"),
            field("negative_prompt"),
        )
    }
}

fn render_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
