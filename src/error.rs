//! Error types for the img2latex library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Img2LatexError`] — **Fatal**: the conversion cannot produce a result at
//!   all (no image, wrong media type, OCR unreachable). Returned as
//!   `Err(Img2LatexError)` from [`crate::convert::Converter::convert`].
//!
//! * [`CollaboratorError`] — **Non-fatal**: one external collaborator (OCR,
//!   LLM, typesetter) failed or timed out. The strategy selector absorbs these
//!   into a fallback path or a degraded document; only the orchestrator
//!   decides whether one becomes fatal, and it never forwards the raw cause.

use std::path::PathBuf;
use thiserror::Error;

/// Coarse failure taxonomy exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Caller-correctable: missing image, wrong media type, bad path.
    InputInvalid,
    /// OCR, LLM or typesetter failed or timed out.
    UpstreamUnavailable,
    /// Configuration or local I/O problem.
    Internal,
}

/// All fatal errors returned by the img2latex library.
#[derive(Debug, Error)]
pub enum Img2LatexError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// No image bytes, empty file, or unreadable path.
    #[error("Invalid input: {reason}")]
    InputInvalid { reason: String },

    /// The upload is not an image.
    #[error("Invalid file type '{media_type}': only images accepted")]
    UnsupportedMediaType { media_type: String },

    /// Image file was not found at the given path.
    #[error("Image file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    // ── Upstream errors ───────────────────────────────────────────────────
    /// A collaborator failed and no fallback could cover for it.
    ///
    /// The message stays generic; the cause is logged where it is caught.
    #[error("Processing failed: {collaborator} unavailable")]
    UpstreamUnavailable { collaborator: Collaborator },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output LaTeX file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Img2LatexError {
    /// Map the error onto the caller-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InputInvalid { .. } | Self::UnsupportedMediaType { .. } | Self::FileNotFound { .. } => {
                ErrorKind::InputInvalid
            }
            Self::UpstreamUnavailable { .. } => ErrorKind::UpstreamUnavailable,
            Self::InvalidConfig(_) | Self::OutputWriteFailed { .. } | Self::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// HTTP-equivalent status for a thin request handler.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::UnsupportedMediaType { .. } => 415,
            Self::InputInvalid { .. } | Self::FileNotFound { .. } => 400,
            Self::UpstreamUnavailable { .. } => 502,
            _ => 500,
        }
    }
}

/// Which external collaborator an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collaborator {
    Ocr,
    Llm,
    Typesetter,
}

impl std::fmt::Display for Collaborator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Collaborator::Ocr => "OCR service",
            Collaborator::Llm => "LLM service",
            Collaborator::Typesetter => "typesetter",
        })
    }
}

/// A non-fatal failure of one external collaborator call.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum CollaboratorError {
    /// OCR request failed (transport, HTTP status, or malformed body).
    #[error("OCR failed: {detail}")]
    Ocr { detail: String },

    /// Every model in the LLM chain failed.
    #[error("LLM failed after {attempts} attempt(s): {detail}")]
    Llm { attempts: usize, detail: String },

    /// The external Markdown→LaTeX converter failed.
    #[error("Typesetter failed: {detail}")]
    Typesetter { detail: String },

    /// A single call exceeded its time budget.
    #[error("{collaborator} call timed out after {secs}s")]
    Timeout { collaborator: Collaborator, secs: u64 },

    /// No implementation is wired in for this collaborator.
    #[error("{collaborator} is not configured")]
    NotConfigured { collaborator: Collaborator },
}

impl CollaboratorError {
    pub fn collaborator(&self) -> Collaborator {
        match self {
            Self::Ocr { .. } => Collaborator::Ocr,
            Self::Llm { .. } => Collaborator::Llm,
            Self::Typesetter { .. } => Collaborator::Typesetter,
            Self::Timeout { collaborator, .. } | Self::NotConfigured { collaborator } => *collaborator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_message_hides_cause() {
        let e = Img2LatexError::UpstreamUnavailable {
            collaborator: Collaborator::Ocr,
        };
        let msg = e.to_string();
        assert!(msg.contains("OCR service"), "got: {msg}");
        assert_eq!(e.kind(), ErrorKind::UpstreamUnavailable);
        assert_eq!(e.status_code(), 502);
    }

    #[test]
    fn media_type_is_caller_correctable() {
        let e = Img2LatexError::UnsupportedMediaType {
            media_type: "application/pdf".into(),
        };
        assert_eq!(e.kind(), ErrorKind::InputInvalid);
        assert_eq!(e.status_code(), 415);
        assert!(e.to_string().contains("only images accepted"));
    }

    #[test]
    fn missing_image_is_bad_request() {
        let e = Img2LatexError::InputInvalid {
            reason: "no image provided".into(),
        };
        assert_eq!(e.status_code(), 400);
    }

    #[test]
    fn timeout_display() {
        let e = CollaboratorError::Timeout {
            collaborator: Collaborator::Typesetter,
            secs: 30,
        };
        assert!(e.to_string().contains("30s"));
        assert_eq!(e.collaborator(), Collaborator::Typesetter);
    }
}
