//! Payload dei webhook di completamento Replicate

use serde::Deserialize;
use serde_json::{Map, Value};
use utoipa::ToSchema;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CallbackPayload {
    /// ID della prediction
    #[serde(default)]
    pub id: Option<String>,
    /// Stato finale (succeeded, failed, canceled)
    #[serde(default)]
    pub status: Option<String>,
    /// URL singolo o lista di URL
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub output: Option<Value>,
    /// Parametri di input restituiti dal provider
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub input: Option<Map<String, Value>>,
}

impl CallbackPayload {
    pub fn image_url(&self) -> Option<&str> {
        extract_image_url(self.output.as_ref())
    }
}

/// Estrae l'URL dell'immagine: primo elemento se lista, altrimenti lo scalare
pub fn extract_image_url(output: Option<&Value>) -> Option<&str> {
    let url = match output? {
        Value::Array(items) => items.first()?.as_str()?,
        Value::String(url) => url.as_str(),
        _ => return None,
    };

    if url.is_empty() {
        None
    } else {
        Some(url)
    }
}
