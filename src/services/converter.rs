//! Conversione in JPEG di un'immagine remota e upload su bucket

use bytes::Bytes;

use crate::error::{AppError, Result};
use crate::handlers::image as image_handler;
use crate::services::fetcher::ImageFetcher;
use crate::services::storage::{ObjectStorage, StoredObject};
use crate::utils::{converted_object_name, get_content_type};

pub async fn convert_and_store(
    fetcher: &dyn ImageFetcher,
    storage: &dyn ObjectStorage,
    url: &str,
    bucket: &str,
) -> Result<StoredObject> {
    let data = fetcher.fetch(url).await?.ok_or_else(|| {
        AppError::Upstream(format!("Impossibile scaricare l'immagine da {}", url))
    })?;

    let jpeg = image_handler::convert_to_jpeg(&data)?;
    let object_name = converted_object_name(bucket, chrono::Utc::now());

    let object = storage
        .upload(bucket, &object_name, Bytes::from(jpeg), get_content_type("jpg"))
        .await?;

    Ok(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{png_fixture, RecordingStorage, StaticFetcher};

    #[tokio::test]
    async fn test_convert_and_store() {
        let fetcher = StaticFetcher::with_image("https://example/img.png", png_fixture());
        let storage = RecordingStorage::default();

        let object = convert_and_store(&fetcher, &storage, "https://example/img.png", "store-fashion")
            .await
            .unwrap();

        assert!(object.name.starts_with("fashion-"));
        assert!(object.name.ends_with(".jpg"));

        let uploads = storage.uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].bucket, "store-fashion");
        assert_eq!(uploads[0].content_type, "image/jpeg");
        assert_eq!(&uploads[0].data[..2], &[0xFF, 0xD8]);
    }

    #[tokio::test]
    async fn test_failed_download_is_an_error() {
        let fetcher = StaticFetcher::default();
        let storage = RecordingStorage::default();

        let result = convert_and_store(&fetcher, &storage, "https://example/missing.png", "store-x").await;
        assert!(matches!(result, Err(AppError::Upstream(_))));
        assert!(storage.uploads().is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_image_is_an_error() {
        let fetcher = StaticFetcher::with_image("https://example/bad.png", b"nope".to_vec());
        let storage = RecordingStorage::default();

        let result = convert_and_store(&fetcher, &storage, "https://example/bad.png", "store-x").await;
        assert!(matches!(result, Err(AppError::ImageError(_))));
        assert!(storage.uploads().is_empty());
    }
}
