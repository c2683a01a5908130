//! Consegna delle immagini generate: upload su bucket oppure email con allegato

use bytes::Bytes;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::Config;
use crate::services::email::{Attachment, Email, EmailError, EmailSender};
use crate::services::storage::{ObjectStorage, StorageError, StoredObject};
use crate::utils::{get_content_type, get_mime_type, random_upload_object_name};

/// Carica l'immagine nel bucket con un nome generato.
/// Senza dati (download fallito) non fa nulla.
pub async fn deliver_to_bucket(
    storage: &dyn ObjectStorage,
    image: Option<Bytes>,
    bucket: &str,
) -> Result<Option<StoredObject>, StorageError> {
    let Some(data) = image else {
        tracing::warn!(
            "Upload su {} saltato: dati immagine vuoti o download fallito",
            bucket
        );
        return Ok(None);
    };

    let object_name = random_upload_object_name();
    let object = storage
        .upload(bucket, &object_name, data, get_content_type("png"))
        .await?;

    Ok(Some(object))
}

/// Contatore allegati della sessione, usato per nomi file distinti.
/// Chiamate concorrenti ottengono valori distinti solo tra un reset e l'altro:
/// un `next(true)` riporta la sequenza a 1.
/// Non persistito: riparte da zero al riavvio.
#[derive(Debug, Default)]
pub struct AttachmentCounter {
    value: AtomicU64,
}

impl AttachmentCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Valore da usare per il prossimo allegato: 1 dopo un reset, altrimenti precedente + 1
    pub fn next(&self, reset: bool) -> u64 {
        if reset {
            self.value.store(1, Ordering::SeqCst);
            1
        } else {
            self.value.fetch_add(1, Ordering::SeqCst) + 1
        }
    }

    pub fn current(&self) -> u64 {
        self.value.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct EmailSettings {
    pub from: String,
    pub cc: Option<String>,
    pub subject: String,
}

impl EmailSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            from: config.email_from.clone(),
            cc: config.email_cc.clone(),
            subject: config.email_subject.clone(),
        }
    }
}

/// Invio delle immagini via email, proprietario del contatore allegati
pub struct EmailDelivery {
    sender: Arc<dyn EmailSender>,
    counter: AttachmentCounter,
    settings: EmailSettings,
}

impl EmailDelivery {
    pub fn new(sender: Arc<dyn EmailSender>, settings: EmailSettings) -> Self {
        Self {
            sender,
            counter: AttachmentCounter::new(),
            settings,
        }
    }

    pub fn counter(&self) -> &AttachmentCounter {
        &self.counter
    }

    /// Invia una email con l'immagine allegata come `image_{n}.png`.
    /// Restituisce il numero dell'allegato, `None` se non c'erano dati da inviare.
    pub async fn deliver(
        &self,
        recipient: &str,
        image: Option<Bytes>,
        text: &str,
        reset_counter: bool,
    ) -> Result<Option<u64>, EmailError> {
        let Some(data) = image else {
            tracing::warn!(
                "Email a {} saltata: dati immagine vuoti o download fallito",
                recipient
            );
            return Ok(None);
        };

        let number = self.counter.next(reset_counter);
        let filename = format!("image_{}.png", number);

        let email = Email {
            from: self.settings.from.clone(),
            to: recipient.to_string(),
            cc: self.settings.cc.iter().cloned().collect(),
            subject: self.settings.subject.clone(),
            text: text.to_string(),
            attachments: vec![Attachment {
                content_type: get_mime_type(&filename),
                filename,
                content: data,
            }],
        };

        let id = self.sender.send(&email).await?;
        tracing::info!("Email {} inviata a {} (allegato {})", id, recipient, number);

        Ok(Some(number))
    }
}
