//! Image helpers for attachments.
//!
//! PNG encoding of captured screenshots, media type guessing, content hashes
//! for spotting repeat captures and `data:` URL previews.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::error::UploadError;

/// Extension → media type table for files we know how to label.
const MEDIA_TYPES: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("pdf", "application/pdf"),
    ("txt", "text/plain"),
    ("md", "text/markdown"),
    ("csv", "text/csv"),
    ("json", "application/json"),
];

const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// Raw RGBA capture handed over by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screenshot {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Screenshot {
    pub fn new(rgba: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            rgba,
            width,
            height,
        }
    }

    /// Encode the capture as PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, UploadError> {
        encode_rgba_to_png(&self.rgba, self.width, self.height)
    }
}

/// Encode RGBA pixel data to PNG bytes.
pub fn encode_rgba_to_png(rgba: &[u8], width: u32, height: u32) -> Result<Vec<u8>, UploadError> {
    use image::{ImageBuffer, RgbaImage};

    let img: RgbaImage =
        ImageBuffer::from_raw(width, height, rgba.to_vec()).ok_or_else(|| {
            UploadError::EncodeFailed {
                message: "Invalid RGBA buffer dimensions".to_string(),
            }
        })?;

    let mut buf = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buf);
    img.write_to(&mut cursor, image::ImageFormat::Png)
        .map_err(|e| UploadError::EncodeFailed {
            message: e.to_string(),
        })?;

    Ok(buf)
}

/// File name for a screenshot taken at `at`, e.g. `screenshot-20240101T120000Z.png`.
pub fn screenshot_filename(at: DateTime<Utc>) -> String {
    format!("screenshot-{}.png", at.format("%Y%m%dT%H%M%SZ"))
}

/// Guess a media type from a file name's extension.
pub fn media_type_for(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    MEDIA_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, media_type)| *media_type)
        .unwrap_or(FALLBACK_MEDIA_TYPE)
}

pub fn is_image(media_type: &str) -> bool {
    media_type.starts_with("image/")
}

/// Inline preview URL for bytes that have not been uploaded yet.
pub fn data_url(media_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", media_type, BASE64.encode(bytes))
}

/// First 8 hex characters of the SHA-256 hash.
pub fn short_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    hex::encode(&result[..4])
}
