//! Pipeline stages and external collaborators for image-to-LaTeX conversion.
//!
//! Each submodule implements exactly one step or one collaborator seam.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ encode ──▶ ocr ──▶ classify ──▶ strategy ──▶ {llm | typeset | render}
//! (URL/path/bytes)  (data URI)  (Markdown)                  └──▶ postprocess
//! ```
//!
//! 1. [`input`]  — canonicalise a URL, path or upload into an [`input::ImageRef`]
//! 2. [`encode`] — sniff the media type and base64-wrap local bytes
//! 3. [`ocr`]    — OCR collaborator ([`ocr::OcrEngine`], Mistral over HTTP)
//! 4. [`llm`]    — LLM collaborator ([`llm::TextGenerator`], primary/fallback chain)
//! 5. [`typeset`] — typesetter collaborator ([`typeset::Typesetter`], pandoc)
//! 6. [`postprocess`] — extract LaTeX from model replies, clean résumé bodies

pub mod encode;
pub mod input;
pub mod llm;
pub mod ocr;
pub mod postprocess;
pub mod typeset;
