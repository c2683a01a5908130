//! Shared image encoding utilities

use image::DynamicImage;
use std::io::Cursor;

use crate::error::{AppError, Result};

/// Qualità JPEG di default (come gli encoder più diffusi)
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Encode a DynamicImage to the specified format
///
/// # Arguments
/// * `img` - The image to encode
/// * `format` - Output format (jpg, jpeg)
/// * `quality` - Optional quality for JPEG encoding (1-100, default 75)
pub fn encode_image(img: &DynamicImage, format: &str, quality: Option<u8>) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());

    match format.to_lowercase().as_str() {
        "jpg" | "jpeg" => {
            let q = quality.unwrap_or(DEFAULT_JPEG_QUALITY);
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, q);
            img.write_with_encoder(encoder)?;
        }
        _ => {
            return Err(AppError::BadRequest(format!(
                "Formato output non supportato: {}",
                format
            )));
        }
    }

    Ok(buffer.into_inner())
}
