//! Configuration types for image-to-LaTeX conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`] and handed to
//! [`crate::convert::Converter::new`]. The library itself never reads the
//! environment; [`ConversionConfig::from_env`] exists for binaries that want
//! the usual `MISTRAL_API_KEY`-style setup.

use crate::error::Img2LatexError;
use crate::pipeline::ocr::{DEFAULT_OCR_ENDPOINT, DEFAULT_OCR_MODEL};
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default LLM provider when only an API key is known.
pub const DEFAULT_PROVIDER: &str = "mistral";
/// Default primary model.
pub const DEFAULT_PRIMARY_MODEL: &str = "mistral-large-latest";
/// Default fallback model, tried when the primary fails.
pub const DEFAULT_FALLBACK_MODEL: &str = "mistral-small-latest";

/// Configuration for an image-to-LaTeX conversion.
///
/// # Example
/// ```rust
/// use img2latex::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .ocr_api_key("sk-test")
///     .provider_name("mistral")
///     .api_timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.api_timeout_secs, 30);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// API key for the OCR endpoint. Required for image input.
    pub ocr_api_key: Option<String>,

    /// OCR endpoint URL. Default: Mistral's `/v1/ocr`.
    pub ocr_endpoint: String,

    /// OCR model identifier. Default: `mistral-ocr-latest`.
    pub ocr_model: String,

    /// LLM provider name (e.g. "mistral", "openai", "anthropic", "ollama").
    /// If None and no pre-built provider is given, LLM strategies are disabled.
    pub provider_name: Option<String>,

    /// Model tried first. Default: `mistral-large-latest`.
    pub primary_model: String,

    /// Model tried when the primary fails. Default: `mistral-small-latest`.
    pub fallback_model: Option<String>,

    /// Pre-constructed primary provider. Takes precedence over `provider_name`.
    pub primary_provider: Option<Arc<dyn LLMProvider>>,

    /// Pre-constructed fallback provider. Takes precedence over `fallback_model`.
    pub fallback_provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for the LLM completion. Default: 0.1.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate. Default: 4096.
    pub max_tokens: usize,

    /// Per-call timeout for OCR and LLM requests, in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// External Markdown→LaTeX converter executable. Default: `pandoc`.
    /// `None` disables the typesetter path.
    pub typesetter: Option<PathBuf>,

    /// Per-call typesetter timeout in seconds. Default: 30.
    pub typesetter_timeout_secs: u64,

    /// Use the rule-based renderer instead of the stub document when every
    /// collaborator fails. Default: false.
    pub local_fallback: bool,

    /// Turn a degraded result caused by LLM exhaustion into an
    /// `UpstreamUnavailable` error. Default: false.
    pub fail_on_degraded: bool,

    /// Optional stage-progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            ocr_api_key: None,
            ocr_endpoint: DEFAULT_OCR_ENDPOINT.to_string(),
            ocr_model: DEFAULT_OCR_MODEL.to_string(),
            provider_name: None,
            primary_model: DEFAULT_PRIMARY_MODEL.to_string(),
            fallback_model: Some(DEFAULT_FALLBACK_MODEL.to_string()),
            primary_provider: None,
            fallback_provider: None,
            temperature: 0.1,
            max_tokens: 4096,
            api_timeout_secs: 60,
            typesetter: Some(PathBuf::from("pandoc")),
            typesetter_timeout_secs: 30,
            local_fallback: false,
            fail_on_degraded: false,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("ocr_api_key", &self.ocr_api_key.as_ref().map(|_| "<redacted>"))
            .field("ocr_endpoint", &self.ocr_endpoint)
            .field("ocr_model", &self.ocr_model)
            .field("provider_name", &self.provider_name)
            .field("primary_model", &self.primary_model)
            .field("fallback_model", &self.fallback_model)
            .field("primary_provider", &self.primary_provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("fallback_provider", &self.fallback_provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("typesetter", &self.typesetter)
            .field("typesetter_timeout_secs", &self.typesetter_timeout_secs)
            .field("local_fallback", &self.local_fallback)
            .field("fail_on_degraded", &self.fail_on_degraded)
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Defaults overlaid with environment variables.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `MISTRAL_API_KEY` | `ocr_api_key`; also selects the `mistral` provider |
    /// | `IMG2LATEX_PROVIDER` | `provider_name` |
    /// | `IMG2LATEX_MODEL` | `primary_model` |
    /// | `IMG2LATEX_FALLBACK_MODEL` | `fallback_model` |
    pub fn from_env() -> Self {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(key) = non_empty("MISTRAL_API_KEY") {
            config.ocr_api_key = Some(key);
            config.provider_name = Some(DEFAULT_PROVIDER.to_string());
        }
        if let Some(provider) = non_empty("IMG2LATEX_PROVIDER") {
            config.provider_name = Some(provider);
        }
        if let Some(model) = non_empty("IMG2LATEX_MODEL") {
            config.primary_model = model;
        }
        if let Some(model) = non_empty("IMG2LATEX_FALLBACK_MODEL") {
            config.fallback_model = Some(model);
        }
        config
    }

    /// Wrap an existing config in a builder to tweak it.
    pub fn into_builder(self) -> ConversionConfigBuilder {
        ConversionConfigBuilder { config: self }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn ocr_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.ocr_api_key = Some(key.into());
        self
    }

    pub fn ocr_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.ocr_endpoint = url.into();
        self
    }

    pub fn ocr_model(mut self, model: impl Into<String>) -> Self {
        self.config.ocr_model = model.into();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn primary_model(mut self, model: impl Into<String>) -> Self {
        self.config.primary_model = model.into();
        self
    }

    pub fn fallback_model(mut self, model: Option<String>) -> Self {
        self.config.fallback_model = model;
        self
    }

    pub fn primary_provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.primary_provider = Some(provider);
        self
    }

    pub fn fallback_provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.fallback_provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn typesetter(mut self, program: Option<PathBuf>) -> Self {
        self.config.typesetter = program;
        self
    }

    pub fn typesetter_timeout_secs(mut self, secs: u64) -> Self {
        self.config.typesetter_timeout_secs = secs;
        self
    }

    pub fn local_fallback(mut self, v: bool) -> Self {
        self.config.local_fallback = v;
        self
    }

    pub fn fail_on_degraded(mut self, v: bool) -> Self {
        self.config.fail_on_degraded = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Img2LatexError> {
        let c = &self.config;
        if c.api_timeout_secs == 0 {
            return Err(Img2LatexError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.typesetter.is_some() && c.typesetter_timeout_secs == 0 {
            return Err(Img2LatexError::InvalidConfig(
                "Typesetter timeout must be ≥ 1 second".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(Img2LatexError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.ocr_endpoint.trim().is_empty() {
            return Err(Img2LatexError::InvalidConfig(
                "OCR endpoint must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ConversionConfig::default();
        assert_eq!(c.ocr_model, "mistral-ocr-latest");
        assert_eq!(c.fallback_model.as_deref(), Some("mistral-small-latest"));
        assert_eq!(c.typesetter, Some(PathBuf::from("pandoc")));
        assert!(!c.local_fallback);
        assert!(c.provider_name.is_none());
    }

    #[test]
    fn temperature_is_clamped() {
        let c = ConversionConfig::builder().temperature(9.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = ConversionConfig::builder().api_timeout_secs(0).build().unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn disabled_typesetter_ignores_its_timeout() {
        let c = ConversionConfig::builder()
            .typesetter(None)
            .typesetter_timeout_secs(0)
            .build();
        assert!(c.is_ok());
    }

    #[test]
    fn debug_redacts_key() {
        let c = ConversionConfig::builder().ocr_api_key("secret-key").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("secret-key"));
        assert!(dbg.contains("<redacted>"));
    }
}
