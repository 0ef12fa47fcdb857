//! Conversion entry points: the orchestrator.
//!
//! [`Converter`] owns the three collaborators and runs the fixed sequence
//! input → OCR → classify → strategy → result. Every stage is awaited in
//! turn; nothing is shared between calls, so one `Converter` can serve
//! concurrent requests.
//!
//! ## Why a struct instead of free functions?
//!
//! Collaborators are built once from [`ConversionConfig`] (HTTP client, LLM
//! chain) and reused. Tests and embedders swap any of them through the
//! `with_*` methods without touching the environment.

use crate::classify::classify;
use crate::config::ConversionConfig;
use crate::error::{Collaborator, CollaboratorError, Img2LatexError};
use crate::output::{ConversionResult, ConversionStats};
use crate::pipeline::input::{resolve_input, ImageInput, ImageRef};
use crate::pipeline::llm::{LlmGenerator, TextGenerator};
use crate::pipeline::ocr::{MistralOcr, OcrEngine, OcrOutput};
use crate::pipeline::typeset::{PandocTypesetter, Typesetter};
use crate::progress::ConversionProgressCallback;
use crate::strategy::Selector;
use crate::structure::{DocumentTypeHint, LayoutHints};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

/// Image-to-LaTeX orchestrator.
pub struct Converter {
    config: ConversionConfig,
    ocr: Option<Arc<dyn OcrEngine>>,
    generator: Option<Arc<dyn TextGenerator>>,
    typesetter: Option<Arc<dyn Typesetter>>,
}

impl Converter {
    /// Build a converter and its collaborators from `config`.
    ///
    /// A collaborator is left out when the config does not describe it: no
    /// OCR key means image conversion fails with `UpstreamUnavailable`, no
    /// LLM provider and no typesetter means the rule-based renderer is used.
    ///
    /// # Errors
    /// `InvalidConfig` when a named LLM provider cannot be created or the
    /// OCR HTTP client cannot be built.
    pub fn new(config: ConversionConfig) -> Result<Self, Img2LatexError> {
        let ocr = match config.ocr_api_key {
            Some(ref key) => {
                let engine = MistralOcr::new(
                    key.clone(),
                    config.ocr_endpoint.clone(),
                    config.ocr_model.clone(),
                    config.api_timeout_secs,
                )
                .map_err(|e| Img2LatexError::InvalidConfig(e.to_string()))?;
                Some(Arc::new(engine) as Arc<dyn OcrEngine>)
            }
            None => None,
        };

        let generator = LlmGenerator::from_config(&config)
            .map_err(|e| Img2LatexError::InvalidConfig(e.to_string()))?
            .map(|g| Arc::new(g) as Arc<dyn TextGenerator>);

        let typesetter = config.typesetter.as_ref().map(|program| {
            Arc::new(PandocTypesetter::new(program.clone(), config.typesetter_timeout_secs))
                as Arc<dyn Typesetter>
        });

        debug!(
            ocr = ocr.is_some(),
            llm = generator.is_some(),
            typesetter = typesetter.is_some(),
            "Converter ready"
        );

        Ok(Self {
            config,
            ocr,
            generator,
            typesetter,
        })
    }

    /// A converter with no collaborators: Markdown input, rule-based output.
    pub fn offline(config: ConversionConfig) -> Self {
        Self {
            config,
            ocr: None,
            generator: None,
            typesetter: None,
        }
    }

    pub fn with_ocr(mut self, ocr: Arc<dyn OcrEngine>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_typesetter(mut self, typesetter: Arc<dyn Typesetter>) -> Self {
        self.typesetter = Some(typesetter);
        self
    }

    pub fn without_typesetter(mut self) -> Self {
        self.typesetter = None;
        self
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Convert an image to a LaTeX document.
    ///
    /// # Errors
    /// - `InputInvalid` / `UnsupportedMediaType` / `FileNotFound` for bad input
    /// - `UpstreamUnavailable { Ocr }` when OCR fails, times out or is not
    ///   configured (no retry)
    /// - `UpstreamUnavailable { Llm }` only with `fail_on_degraded`
    ///
    /// Every other collaborator failure yields `Ok` with `degraded = true`.
    pub async fn convert(
        &self,
        input: ImageInput,
        hint: DocumentTypeHint,
    ) -> Result<ConversionResult, Img2LatexError> {
        let total_start = Instant::now();
        info!("Starting conversion: {} (hint: {:?})", describe(&input), hint);

        let result = self.convert_inner(input, hint, total_start).await;
        if let Err(ref e) = result {
            self.emit(|cb| cb.on_error(&e.to_string()));
        }
        result
    }

    async fn convert_inner(
        &self,
        input: ImageInput,
        hint: DocumentTypeHint,
        total_start: Instant,
    ) -> Result<ConversionResult, Img2LatexError> {
        // ── Step 1: Resolve input ────────────────────────────────────────
        let image = resolve_input(input).await?;

        // ── Step 2: OCR ──────────────────────────────────────────────────
        self.emit(|cb| cb.on_ocr_start());
        let ocr_start = Instant::now();
        let ocr = self.run_ocr(&image).await.map_err(|e| {
            // The cause stays in the log; the caller gets the generic message.
            warn!("OCR failed — {}", e);
            Img2LatexError::UpstreamUnavailable {
                collaborator: Collaborator::Ocr,
            }
        })?;
        let ocr_duration_ms = ocr_start.elapsed().as_millis() as u64;
        info!("OCR returned {} chars in {}ms", ocr.markdown.len(), ocr_duration_ms);
        self.emit(|cb| cb.on_ocr_complete(ocr.markdown.len()));

        // ── Steps 3-5: Classify, render, compose ─────────────────────────
        self.finish(
            ocr.markdown,
            ocr.layout_hints.as_ref(),
            hint,
            ocr_duration_ms,
            total_start,
        )
        .await
    }

    /// Run classification and rendering on Markdown the caller already has.
    pub async fn convert_markdown(
        &self,
        markdown: &str,
        hint: DocumentTypeHint,
        layout_hints: Option<&LayoutHints>,
    ) -> Result<ConversionResult, Img2LatexError> {
        let total_start = Instant::now();
        info!("Starting Markdown conversion: {} chars (hint: {:?})", markdown.len(), hint);

        let result = self
            .finish(markdown.to_string(), layout_hints, hint, 0, total_start)
            .await;
        if let Err(ref e) = result {
            self.emit(|cb| cb.on_error(&e.to_string()));
        }
        result
    }

    /// Convert an image and write the LaTeX to `output_path`.
    ///
    /// Writes atomically: a temp file in the target directory is persisted
    /// over the destination, so a failed run never leaves a partial file.
    pub async fn convert_to_file(
        &self,
        input: ImageInput,
        hint: DocumentTypeHint,
        output_path: impl AsRef<Path>,
    ) -> Result<ConversionResult, Img2LatexError> {
        let result = self.convert(input, hint).await?;
        result.write_to(output_path.as_ref(), false)?;
        info!("Wrote {}", output_path.as_ref().display());
        Ok(result)
    }

    /// Synchronous wrapper around [`Converter::convert`].
    ///
    /// Creates a temporary tokio runtime internally; do not call from inside
    /// an async context.
    pub fn convert_sync(
        &self,
        input: ImageInput,
        hint: DocumentTypeHint,
    ) -> Result<ConversionResult, Img2LatexError> {
        tokio::runtime::Runtime::new()
            .map_err(|e| Img2LatexError::Internal(format!("Failed to create tokio runtime: {}", e)))?
            .block_on(self.convert(input, hint))
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    async fn run_ocr(&self, image: &ImageRef) -> Result<OcrOutput, CollaboratorError> {
        let engine = self.ocr.as_ref().ok_or(CollaboratorError::NotConfigured {
            collaborator: Collaborator::Ocr,
        })?;
        let secs = self.config.api_timeout_secs;
        timeout(Duration::from_secs(secs), engine.process(image))
            .await
            .map_err(|_| CollaboratorError::Timeout {
                collaborator: Collaborator::Ocr,
                secs,
            })?
    }

    async fn finish(
        &self,
        markdown: String,
        layout_hints: Option<&LayoutHints>,
        hint: DocumentTypeHint,
        ocr_duration_ms: u64,
        total_start: Instant,
    ) -> Result<ConversionResult, Img2LatexError> {
        let structure = classify(&markdown, layout_hints, hint);
        self.emit(|cb| cb.on_classified(&structure));

        let selector = Selector::new(
            self.generator.clone(),
            self.typesetter.clone(),
            self.config.local_fallback,
        );
        let strategy = selector.strategy_for(&structure);
        self.emit(|cb| cb.on_strategy(strategy));

        let render_start = Instant::now();
        let rendering = selector.run(strategy, &markdown, &structure).await;
        let render_duration_ms = render_start.elapsed().as_millis() as u64;

        if rendering.llm_exhausted && self.config.fail_on_degraded {
            warn!(
                "Rendering degraded ({}) and fail_on_degraded is set",
                rendering.degradation.as_deref().unwrap_or("unknown")
            );
            return Err(Img2LatexError::UpstreamUnavailable {
                collaborator: Collaborator::Llm,
            });
        }

        let confidence = structure.confidence();
        let stats = ConversionStats {
            ocr_duration_ms,
            render_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        };

        info!(
            "Conversion complete: strategy {}, confidence {:.2}{}, {}ms total",
            rendering.strategy,
            confidence,
            if rendering.degraded { " (degraded)" } else { "" },
            stats.total_duration_ms
        );
        self.emit(|cb| cb.on_conversion_complete(confidence, rendering.degraded));

        Ok(ConversionResult {
            latex_document: rendering.latex,
            structure_metadata: structure,
            confidence,
            strategy: rendering.strategy,
            degraded: rendering.degraded,
            degradation: rendering.degradation,
            ocr_markdown: markdown,
            stats,
        })
    }

    fn emit(&self, event: impl FnOnce(&dyn ConversionProgressCallback)) {
        if let Some(ref cb) = self.config.progress_callback {
            event(cb.as_ref());
        }
    }
}

/// Short log label for an input; never logs the bytes themselves.
fn describe(input: &ImageInput) -> String {
    match input {
        ImageInput::Bytes { data, media_type } => format!(
            "{} bytes ({})",
            data.len(),
            media_type.as_deref().unwrap_or("undeclared type")
        ),
        ImageInput::Url(url) => url.clone(),
        ImageInput::Path(path) => path.display().to_string(),
    }
}
