//! Progress-callback trait for per-stage conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline moves through OCR, classification and rendering.
//!
//! # Why callbacks instead of channels?
//!
//! The callback is the least-invasive integration point: callers can forward
//! events to a terminal spinner, a request log or a channel without the
//! library knowing how the host application communicates.
//!
//! # Example
//!
//! ```rust
//! use img2latex::{ConversionConfig, ConversionProgressCallback, Strategy};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl ConversionProgressCallback for Printer {
//!     fn on_strategy(&self, strategy: Strategy) {
//!         eprintln!("rendering with {strategy}");
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(Printer) as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::structure::DocumentStructure;
use crate::strategy::Strategy;
use std::sync::Arc;

/// Called by the conversion pipeline at each stage boundary.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Events for one conversion arrive in order:
/// `on_ocr_start`, `on_ocr_complete`, `on_classified`, `on_strategy`, then
/// either `on_conversion_complete` or `on_error`.
/// [`crate::convert::Converter::convert_markdown`] skips the OCR events.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called just before the OCR request is sent.
    fn on_ocr_start(&self) {}

    /// Called when OCR returned.
    ///
    /// # Arguments
    /// * `markdown_len` — byte length of the recognised Markdown
    fn on_ocr_complete(&self, markdown_len: usize) {
        let _ = markdown_len;
    }

    /// Called once the classifier has produced its structure record.
    fn on_classified(&self, structure: &DocumentStructure) {
        let _ = structure;
    }

    /// Called when the rendering strategy is chosen, before it runs.
    fn on_strategy(&self, strategy: Strategy) {
        let _ = strategy;
    }

    /// Called when a result is returned.
    ///
    /// # Arguments
    /// * `confidence` — classification confidence in `[0, 1]`
    /// * `degraded`   — the LaTeX came from a fallback, not a collaborator
    fn on_conversion_complete(&self, confidence: f64, degraded: bool) {
        let _ = (confidence, degraded);
    }

    /// Called when the conversion fails.
    ///
    /// # Arguments
    /// * `error` — the caller-facing error message
    fn on_error(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
