use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::error::{AppError, Result};

/// Richiesta di generazione verso Replicate
#[derive(Debug, Deserialize, ToSchema)]
pub struct ModelRequest {
    /// Modello nel formato "owner/name"
    pub model: String,
    /// ID della versione del modello
    pub version: String,
    #[serde(default)]
    pub input: GenerationInput,
    /// Destinatario email (se presente ha precedenza sul bucket)
    #[serde(default)]
    pub email: Option<String>,
    /// Azzera il contatore allegati prima del prossimo invio
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub reset_counter: bool,
    /// Bucket di destinazione per l'upload
    #[serde(default)]
    pub bucket: Option<String>,
}

impl ModelRequest {
    /// Decide la destinazione dell'immagine: email se presente, altrimenti bucket
    pub fn delivery_target(&self) -> Result<DeliveryTarget> {
        if let Some(address) = non_blank(self.email.as_deref()) {
            return Ok(DeliveryTarget::Email {
                address: address.to_string(),
                reset_counter: self.reset_counter,
            });
        }

        non_blank(self.bucket.as_deref())
            .map(|name| DeliveryTarget::Bucket(name.to_string()))
            .ok_or_else(|| AppError::MissingField("bucket o email".to_string()))
    }
}

/// Parametri di generazione inoltrati al provider
#[derive(Debug, Default, Clone, Deserialize, Serialize, ToSchema)]
pub struct GenerationInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    /// Inoltrata così com'è (numero o stringa)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<u32>)]
    pub width: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<u32>)]
    pub height: Option<Value>,
    /// Parametri aggiuntivi specifici del modello (es. image_path, pixel, product_size)
    #[serde(flatten)]
    #[schema(ignore)]
    pub extra: Map<String, Value>,
}

impl GenerationInput {
    /// Input da inviare a Replicate. Viene sempre richiesta una sola immagine.
    pub fn to_provider_input(&self) -> Value {
        let mut input = self.extra.clone();
        if let Some(prompt) = &self.prompt {
            input.insert("prompt".to_string(), Value::from(prompt.clone()));
        }
        if let Some(negative) = &self.negative_prompt {
            input.insert("negative_prompt".to_string(), Value::from(negative.clone()));
        }
        if let Some(width) = &self.width {
            input.insert("width".to_string(), width.clone());
        }
        if let Some(height) = &self.height {
            input.insert("height".to_string(), height.clone());
        }
        input.insert("num_outputs".to_string(), Value::from(1));
        Value::Object(input)
    }
}

/// Destinazione di un'immagine generata, codificata nell'URL del webhook
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryTarget {
    Bucket(String),
    Email { address: String, reset_counter: bool },
}

impl DeliveryTarget {
    pub fn callback_url(&self, base: &str) -> String {
        let base = base.trim_end_matches('/');
        match self {
            DeliveryTarget::Bucket(name) => format!(
                "{}/replicate/handle_prediction_upload?bucket={}",
                base,
                urlencoding::encode(name)
            ),
            DeliveryTarget::Email {
                address,
                reset_counter,
            } => format!(
                "{}/replicate/handle_prediction_email?email={}&reset_counter={}",
                base,
                urlencoding::encode(address),
                reset_counter
            ),
        }
    }
}

/// Richiesta di conversione formato
#[derive(Debug, Deserialize, ToSchema)]
pub struct ConvertRequest {
    /// URL dell'immagine sorgente
    pub url: String,
    /// Bucket di destinazione (es. "store-fashion")
    pub bucket: String,
}

/// Richiesta Plugger: il payload viene inoltrato così com'è, `bucket` incluso
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct PluggerRequest {
    /// Bucket di destinazione per l'upload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    /// Parametri di generazione Plugger
    #[serde(flatten)]
    #[schema(ignore)]
    pub params: Map<String, Value>,
}

/// Query del webhook di upload
#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    #[serde(default)]
    pub bucket: Option<String>,
}

/// Query del webhook email
#[derive(Debug, Default, Deserialize)]
pub struct EmailQuery {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub reset_counter: bool,
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Interpreta un flag booleano tollerante ("true", "True", "1", "yes", "on", ...)
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum FlagRepr {
        Bool(bool),
        Number(i64),
        Text(String),
    }

    match FlagRepr::deserialize(deserializer)? {
        FlagRepr::Bool(b) => Ok(b),
        FlagRepr::Number(n) => Ok(n != 0),
        FlagRepr::Text(s) => parse_flag(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("flag non valido: {}", s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: Value) -> ModelRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_email_wins_over_bucket() {
        let req = request(json!({
            "model": "owner/model",
            "version": "v1",
            "email": "someone@example.com",
            "reset_counter": true,
            "bucket": "store-demo"
        }));
        assert_eq!(
            req.delivery_target().unwrap(),
            DeliveryTarget::Email {
                address: "someone@example.com".to_string(),
                reset_counter: true
            }
        );
    }

    #[test]
    fn test_empty_email_falls_back_to_bucket() {
        let req = request(json!({
            "model": "owner/model",
            "version": "v1",
            "email": "",
            "bucket": "store-demo"
        }));
        assert_eq!(
            req.delivery_target().unwrap(),
            DeliveryTarget::Bucket("store-demo".to_string())
        );
    }

    #[test]
    fn test_missing_target_is_rejected() {
        let req = request(json!({"model": "owner/model", "version": "v1"}));
        assert!(matches!(
            req.delivery_target(),
            Err(AppError::MissingField(_))
        ));
    }

    #[test]
    fn test_callback_urls() {
        let upload = DeliveryTarget::Bucket("store-demo".to_string());
        assert_eq!(
            upload.callback_url("https://relay.example.com/"),
            "https://relay.example.com/replicate/handle_prediction_upload?bucket=store-demo"
        );

        let email = DeliveryTarget::Email {
            address: "a+b@example.com".to_string(),
            reset_counter: false,
        };
        assert_eq!(
            email.callback_url("https://relay.example.com"),
            "https://relay.example.com/replicate/handle_prediction_email?email=a%2Bb%40example.com&reset_counter=false"
        );
    }

    #[test]
    fn test_provider_input_forces_single_output() {
        let req = request(json!({
            "model": "owner/model",
            "version": "v1",
            "input": {
                "prompt": "a red chair",
                "width": 512,
                "height": 768,
                "num_outputs": 4,
                "image_path": "https://example.com/product.png"
            }
        }));
        let input = req.input.to_provider_input();
        assert_eq!(input["prompt"], "a red chair");
        assert_eq!(input["width"], 512);
        assert_eq!(input["height"], 768);
        assert_eq!(input["num_outputs"], 1);
        assert_eq!(input["image_path"], "https://example.com/product.png");
        assert!(input.get("negative_prompt").is_none());
    }

    #[test]
    fn test_dimensions_are_forwarded_untouched() {
        let req = request(json!({
            "model": "owner/model",
            "version": "v1",
            "input": {"width": "512", "height": 768.0}
        }));
        let input = req.input.to_provider_input();
        assert_eq!(input["width"], "512");
        assert_eq!(input["height"], 768.0);
    }

    #[test]
    fn test_reset_counter_accepts_strings() {
        let req = request(json!({
            "model": "owner/model",
            "version": "v1",
            "reset_counter": "True"
        }));
        assert!(req.reset_counter);
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
