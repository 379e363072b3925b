//! Image encoding: `DynamicImage` → PNG bytes / base64 data URL.
//!
//! PNG is lossless, which keeps rendered text crisp for both tesseract and
//! vision models.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode an image as PNG bytes.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    Ok(buf)
}

/// Encode an image as a `data:image/png;base64,…` URL for chat-completions
/// `image_url` parts.
pub fn encode_data_url(img: &DynamicImage) -> Result<String, image::ImageError> {
    let png = encode_png(img)?;
    let b64 = STANDARD.encode(&png);
    debug!("Encoded image → {} bytes base64", b64.len());
    Ok(format!("data:image/png;base64,{b64}"))
}
