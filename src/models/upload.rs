use serde::{Deserialize, Serialize};

/// Image types the cover uploader accepts.
pub const ALLOWED_IMAGE_TYPES: [&str; 3] = ["image/png", "image/jpeg", "image/webp"];
pub const MAX_IMAGE_BYTES: f64 = 5.0 * 1024.0 * 1024.0;

/// Response of `POST /upload/image`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedImage {
    pub object_key: String,
    pub url: String,
}

/// Response of `GET /upload/url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileUrl {
    pub url: String,
}
