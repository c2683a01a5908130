//! Test helpers: fake collaborators and in-process HTTP servers

use async_trait::async_trait;
use axum::Router;
use bytes::Bytes;
use serde_json::Value;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::PluggerRequest;
use crate::routes::AppState;
use crate::services::delivery::{EmailDelivery, EmailSettings};
use crate::services::email::{Email, EmailError, EmailSender};
use crate::services::fetcher::ImageFetcher;
use crate::services::inference::{
    parse_model_id, InferenceProvider, ModelVersion, Prediction, PredictionRequest,
    ResolutionError,
};
use crate::services::plugger::PluggerClient;
use crate::services::storage::{ObjectStorage, StorageError, StoredObject};

/// Chiave RSA di test per il service account GCS
#[cfg(feature = "google-auth")]
pub const TEST_PRIVATE_KEY_PEM: &str = include_str!("../testdata/service_account_key.pem");
#[cfg(feature = "google-auth")]
pub const TEST_PUBLIC_KEY_PEM: &str = include_str!("../testdata/service_account_key.pub.pem");

/// Avvia il router su una porta libera e restituisce l'URL base
pub async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// PNG RGBA 4x4
pub fn png_fixture() -> Vec<u8> {
    let img = image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
        4,
        4,
        image::Rgba([0, 128, 255, 200]),
    ));
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, image::ImageFormat::Png).unwrap();
    buffer.into_inner()
}

#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub bucket: String,
    pub name: String,
    pub content_type: String,
    pub size: usize,
    pub data: Bytes,
}

#[derive(Default)]
pub struct RecordingStorage {
    uploads: Mutex<Vec<RecordedUpload>>,
}

impl RecordingStorage {
    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStorage for RecordingStorage {
    async fn upload(
        &self,
        bucket: &str,
        object_name: &str,
        data: Bytes,
        content_type: &str,
    ) -> std::result::Result<StoredObject, StorageError> {
        self.uploads.lock().unwrap().push(RecordedUpload {
            bucket: bucket.to_string(),
            name: object_name.to_string(),
            content_type: content_type.to_string(),
            size: data.len(),
            data,
        });
        Ok(StoredObject {
            bucket: bucket.to_string(),
            name: object_name.to_string(),
        })
    }
}

#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<Email>>,
}

impl RecordingSender {
    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for RecordingSender {
    async fn send(&self, email: &Email) -> std::result::Result<String, EmailError> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(email.clone());
        Ok(format!("email-{}", sent.len()))
    }
}

/// Fetcher con immagini predefinite per URL; gli URL sconosciuti non restituiscono dati
#[derive(Default)]
pub struct StaticFetcher {
    images: HashMap<String, Bytes>,
    calls: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn with_image(url: &str, data: Vec<u8>) -> Self {
        let mut fetcher = Self::default();
        fetcher.images.insert(url.to_string(), Bytes::from(data));
        fetcher
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<Option<Bytes>> {
        self.calls.lock().unwrap().push(url.to_string());
        Ok(self.images.get(url).cloned())
    }
}

/// Provider che conosce solo "owner/model" alla versione "v1"
#[derive(Default)]
pub struct MockInference {
    predictions: Mutex<Vec<PredictionRequest>>,
}

impl MockInference {
    pub fn predictions(&self) -> Vec<PredictionRequest> {
        self.predictions.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceProvider for MockInference {
    async fn resolve_version(
        &self,
        model: &str,
        version: &str,
    ) -> std::result::Result<ModelVersion, ResolutionError> {
        parse_model_id(model)?;
        if model != "owner/model" {
            return Err(ResolutionError::ModelNotFound(model.to_string()));
        }
        if version != "v1" {
            return Err(ResolutionError::VersionNotFound {
                model: model.to_string(),
                version: version.to_string(),
            });
        }
        Ok(ModelVersion {
            model: model.to_string(),
            id: version.to_string(),
        })
    }

    async fn create_prediction(&self, request: &PredictionRequest) -> Result<Prediction> {
        let mut predictions = self.predictions.lock().unwrap();
        predictions.push(request.clone());
        Ok(Prediction {
            id: format!("pred-{}", predictions.len()),
            status: Some("starting".to_string()),
        })
    }
}

/// Plugger che restituisce sempre lo stesso URL
pub struct MockPlugger {
    pub image_url: Option<String>,
    payloads: Mutex<Vec<Value>>,
}

impl MockPlugger {
    pub fn returning(image_url: Option<&str>) -> Self {
        Self {
            image_url: image_url.map(str::to_string),
            payloads: Mutex::new(Vec::new()),
        }
    }

    pub fn payloads(&self) -> Vec<Value> {
        self.payloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl PluggerClient for MockPlugger {
    async fn generate(&self, request: &PluggerRequest) -> Result<String> {
        self.payloads
            .lock()
            .unwrap()
            .push(serde_json::to_value(request).unwrap());
        self.image_url
            .clone()
            .ok_or_else(|| AppError::Upstream("Risposta Plugger senza data.image_url".to_string()))
    }
}

/// Collaboratori finti condivisi con lo stato dell'applicazione
pub struct TestHarness {
    pub inference: Arc<MockInference>,
    pub plugger: Arc<MockPlugger>,
    pub fetcher: Arc<StaticFetcher>,
    pub storage: Arc<RecordingStorage>,
    pub sender: Arc<RecordingSender>,
    pub state: AppState,
}

impl TestHarness {
    pub fn new(fetcher: StaticFetcher) -> Self {
        Self::with_plugger(fetcher, MockPlugger::returning(None))
    }

    pub fn with_plugger(fetcher: StaticFetcher, plugger: MockPlugger) -> Self {
        let config = Config {
            public_url: "https://relay.example.com".to_string(),
            ..Default::default()
        };
        let inference = Arc::new(MockInference::default());
        let plugger = Arc::new(plugger);
        let fetcher = Arc::new(fetcher);
        let storage = Arc::new(RecordingStorage::default());
        let sender = Arc::new(RecordingSender::default());

        let state = AppState {
            config: Arc::new(config.clone()),
            inference: inference.clone(),
            plugger: plugger.clone(),
            fetcher: fetcher.clone(),
            storage: storage.clone(),
            mailer: Arc::new(EmailDelivery::new(
                sender.clone(),
                EmailSettings::from_config(&config),
            )),
        };

        Self {
            inference,
            plugger,
            fetcher,
            storage,
            sender,
            state,
        }
    }
}
