//! # img2latex
//!
//! Convert images of documents (scans, photos, screenshots) into compilable
//! LaTeX.
//!
//! ## Why this crate?
//!
//! OCR alone gives flat text or Markdown; an LLM alone hallucinates structure.
//! This crate runs OCR to Markdown first, classifies what the page contains
//! (tables, equations, lists, résumé, layout complexity) and only then picks
//! how to produce LaTeX: a specialised LLM prompt, an external typesetter, or
//! a deterministic rule-based renderer. Every successful call returns a
//! complete document, even when collaborators fail.
//!
//! ## Pipeline Overview
//!
//! ```text
//! image
//!  │
//!  ├─ 1. Input     URL passthrough, or bytes/path → base64 data URI
//!  ├─ 2. OCR       Mistral OCR → Markdown (+ layout hints)
//!  ├─ 3. Classify  tables / equations / lists / layout / document type
//!  ├─ 4. Strategy  résumé | equation | table | general (typesetter → LLM) | direct
//!  └─ 5. Output    LaTeX document + structure metadata + confidence
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use img2latex::{ConversionConfig, Converter, DocumentTypeHint, ImageInput};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .ocr_api_key(std::env::var("MISTRAL_API_KEY")?)
//!         .provider_name("mistral")
//!         .build()?;
//!     let converter = Converter::new(config)?;
//!     let result = converter
//!         .convert(ImageInput::from_arg("scan.png"), DocumentTypeHint::Auto)
//!         .await?;
//!     println!("{}", result.latex_document);
//!     eprintln!("confidence {:.2}", result.confidence);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `img2tex` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! img2latex = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod classify;
pub mod config;
pub mod convert;
pub mod error;
pub mod latex;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod strategy;
pub mod structure;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use classify::classify;
pub use config::{ConversionConfig, ConversionConfigBuilder};
pub use convert::Converter;
pub use error::{Collaborator, CollaboratorError, ErrorKind, Img2LatexError};
pub use output::{ConversionResult, ConversionStats};
pub use pipeline::input::{ImageInput, ImageRef};
pub use pipeline::llm::{LlmGenerator, TextGenerator};
pub use pipeline::ocr::{MistralOcr, OcrEngine, OcrOutput};
pub use pipeline::typeset::{PandocTypesetter, Typesetter};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use strategy::{select_strategy, Rendering, Selector, Strategy};
pub use structure::{DocumentStructure, DocumentType, DocumentTypeHint, Layout, LayoutHints};
