pub mod content_type;
pub mod encoding;
pub mod file;
pub mod naming;

pub use content_type::get_content_type;
pub use encoding::encode_image;
pub use file::get_mime_type;
pub use naming::{converted_object_name, random_upload_object_name};
