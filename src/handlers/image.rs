use image::{ColorType, DynamicImage};

use crate::error::Result;
use crate::utils::encode_image;

/// Porta l'immagine a RGB a 8 bit se non lo è già (palette, RGBA, grigi, 16 bit)
pub fn normalize_color(img: DynamicImage) -> DynamicImage {
    if img.color() == ColorType::Rgb8 {
        img
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    }
}

/// Decodifica, normalizza a RGB e ricodifica in JPEG
pub fn convert_to_jpeg(input_data: &[u8]) -> Result<Vec<u8>> {
    let img = image::load_from_memory(input_data)?;
    tracing::debug!(
        "Immagine {}x{} in {:?}",
        img.width(),
        img.height(),
        img.color()
    );
    let img = normalize_color(img);
    encode_image(&img, "jpeg", None)
}
