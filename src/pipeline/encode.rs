//! Image encoding: raw bytes → `data:` URI the OCR endpoint accepts inline.
//!
//! The media type is taken from the caller when given (an upload's declared
//! content type) and sniffed from magic bytes otherwise. Anything that is not
//! `image/*` is rejected before a network call is made.

use crate::error::Img2LatexError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

/// Determine the media type of `bytes`, preferring the declared one.
pub fn media_type(bytes: &[u8], declared: Option<&str>) -> Result<String, Img2LatexError> {
    if let Some(declared) = declared.map(str::trim).filter(|d| !d.is_empty()) {
        let lower = declared.to_ascii_lowercase();
        if !lower.starts_with("image/") {
            return Err(Img2LatexError::UnsupportedMediaType {
                media_type: declared.to_string(),
            });
        }
        return Ok(lower);
    }

    image::guess_format(bytes)
        .map(|format| format.to_mime_type().to_string())
        .map_err(|_| Img2LatexError::UnsupportedMediaType {
            media_type: "application/octet-stream".to_string(),
        })
}

/// Encode image bytes as a base64 `data:` URI.
pub fn encode_data_uri(bytes: &[u8], declared: Option<&str>) -> Result<String, Img2LatexError> {
    if bytes.is_empty() {
        return Err(Img2LatexError::InputInvalid {
            reason: "no image provided".to_string(),
        });
    }
    let mime = media_type(bytes, declared)?;
    let b64 = STANDARD.encode(bytes);
    debug!("Encoded {} image → {} bytes base64", mime, b64.len());
    Ok(format!("data:{mime};base64,{b64}"))
}
