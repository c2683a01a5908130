//! Nomi degli oggetti caricati su storage

use chrono::{DateTime, Utc};
use rand::Rng;

/// Nome per le immagini generate: timestamp al microsecondo + suffisso casuale 1-100.
///
/// L'unicità è solo probabilistica: due upload nello stesso microsecondo
/// collidono con probabilità 1/100.
pub fn upload_object_name(now: DateTime<Utc>, suffix: u32) -> String {
    format!("{}-{}.png", now.format("%d-%m-%Y_%H-%M-%S%6f"), suffix)
}

pub fn random_upload_object_name() -> String {
    let suffix = rand::thread_rng().gen_range(1..=100);
    upload_object_name(Utc::now(), suffix)
}

/// Tema del bucket: il segmento dopo il primo trattino ("store-fashion-eu" -> "fashion")
pub fn bucket_theme(bucket: &str) -> Option<&str> {
    bucket.split('-').nth(1).filter(|theme| !theme.is_empty())
}

/// Nome per le immagini convertite in JPEG
pub fn converted_object_name(bucket: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}-{}.jpg",
        bucket_theme(bucket).unwrap_or("image"),
        now.format("%Y%m%d%H%M%S%6f")
    )
}
