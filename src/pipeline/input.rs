//! Input resolution: normalise a caller-supplied image to something the OCR
//! endpoint can fetch.
//!
//! Remote URLs are passed through untouched (the OCR service downloads them
//! itself). Local files and in-memory bytes are validated and inlined as a
//! base64 `data:` URI, so no object storage is needed.

use crate::error::Img2LatexError;
use crate::pipeline::encode::encode_data_uri;
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

/// An image as handed to [`crate::convert::Converter::convert`].
#[derive(Debug, Clone)]
pub enum ImageInput {
    /// Raw bytes, e.g. from a multipart upload, with the declared content type.
    Bytes {
        data: Vec<u8>,
        media_type: Option<String>,
    },
    /// An `http(s)://` URL the OCR service can fetch.
    Url(String),
    /// A local image file.
    Path(PathBuf),
}

impl ImageInput {
    pub fn bytes(data: impl Into<Vec<u8>>, media_type: Option<&str>) -> Self {
        ImageInput::Bytes {
            data: data.into(),
            media_type: media_type.map(str::to_string),
        }
    }

    /// Interpret a CLI argument as a URL or a local path.
    pub fn from_arg(arg: &str) -> Self {
        if is_url(arg) {
            ImageInput::Url(arg.to_string())
        } else {
            ImageInput::Path(PathBuf::from(arg))
        }
    }
}

/// What the OCR collaborator receives.
#[derive(Clone, PartialEq, Eq)]
pub enum ImageRef {
    Url(String),
    DataUri(String),
}

impl ImageRef {
    pub fn as_str(&self) -> &str {
        match self {
            ImageRef::Url(s) | ImageRef::DataUri(s) => s,
        }
    }
}

impl fmt::Debug for ImageRef {
    // Data URIs run to megabytes; keep logs readable.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageRef::Url(u) => f.debug_tuple("Url").field(u).finish(),
            ImageRef::DataUri(d) => write!(f, "DataUri(<{} bytes>)", d.len()),
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve an [`ImageInput`] into an [`ImageRef`].
pub async fn resolve_input(input: ImageInput) -> Result<ImageRef, Img2LatexError> {
    match input {
        ImageInput::Url(url) => {
            let url = url.trim().to_string();
            if !is_url(&url) {
                return Err(Img2LatexError::InputInvalid {
                    reason: format!("'{url}' is not an http(s) URL"),
                });
            }
            debug!("Passing image URL through: {}", url);
            Ok(ImageRef::Url(url))
        }
        ImageInput::Bytes { data, media_type } => {
            encode_data_uri(&data, media_type.as_deref()).map(ImageRef::DataUri)
        }
        ImageInput::Path(path) => {
            let data = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => Img2LatexError::FileNotFound { path: path.clone() },
                _ => Img2LatexError::InputInvalid {
                    reason: format!("cannot read '{}': {e}", path.display()),
                },
            })?;
            debug!("Read {} bytes from {}", data.len(), path.display());
            encode_data_uri(&data, None).map(ImageRef::DataUri)
        }
    }
}
