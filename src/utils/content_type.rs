//! Content-type utilities for storage uploads

/// Get the MIME content-type for an image format
///
/// # Arguments
/// * `format` - The file format extension ("png", "jpg" or "jpeg")
pub fn get_content_type(format: &str) -> &'static str {
    match format.to_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}
