//! LLM collaborator: prompt → generated text.
//!
//! [`TextGenerator`] is the seam the strategy selector depends on; any backend
//! satisfying `generate(prompt) -> text` can be dropped in. [`LlmGenerator`]
//! is the production implementation over `edgequake-llm` providers.
//!
//! ## Model chain
//!
//! Providers are tried in order (primary, then fallback). Each attempt is
//! bounded by the API timeout; a timeout counts as a failure of that attempt.
//! The error surfaces only when every provider in the chain has failed.

use crate::config::ConversionConfig;
use crate::error::{Collaborator, CollaboratorError};
use crate::prompts::{LATEX_EXPERT_ACK, LATEX_EXPERT_PREAMBLE};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

/// Anything that turns a prompt into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, CollaboratorError>;
}

/// Ordered chain of LLM providers with role-primed prompts.
pub struct LlmGenerator {
    chain: Vec<Arc<dyn LLMProvider>>,
    options: CompletionOptions,
    timeout_secs: u64,
}

impl LlmGenerator {
    pub fn new(chain: Vec<Arc<dyn LLMProvider>>, config: &ConversionConfig) -> Self {
        Self {
            chain,
            options: build_options(config),
            timeout_secs: config.api_timeout_secs,
        }
    }

    /// Build the generator described by `config`.
    ///
    /// Pre-built providers take precedence over named ones. Returns `Ok(None)`
    /// when no provider is configured at all.
    pub fn from_config(config: &ConversionConfig) -> Result<Option<Self>, CollaboratorError> {
        let mut chain: Vec<Arc<dyn LLMProvider>> = Vec::new();

        if let Some(ref primary) = config.primary_provider {
            chain.push(Arc::clone(primary));
        } else if let Some(ref name) = config.provider_name {
            chain.push(create_provider(name, &config.primary_model)?);
        }

        if let Some(ref fallback) = config.fallback_provider {
            chain.push(Arc::clone(fallback));
        } else if let (Some(name), Some(model)) =
            (config.provider_name.as_ref(), config.fallback_model.as_ref())
        {
            // A misconfigured fallback should not take the primary down with it.
            match create_provider(name, model) {
                Ok(p) => chain.push(p),
                Err(e) => warn!("Fallback model '{}' unavailable: {}", model, e),
            }
        }

        if chain.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self::new(chain, config)))
    }
}

#[async_trait]
impl TextGenerator for LlmGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, CollaboratorError> {
        let messages = primed_messages(prompt);
        let mut last_err: Option<String> = None;

        for (attempt, provider) in self.chain.iter().enumerate() {
            let start = Instant::now();
            let call = provider.chat(&messages, Some(&self.options));

            match timeout(Duration::from_secs(self.timeout_secs), call).await {
                Ok(Ok(response)) => {
                    debug!(
                        "LLM attempt {}: {} input tokens, {} output tokens, {:?}",
                        attempt + 1,
                        response.prompt_tokens,
                        response.completion_tokens,
                        start.elapsed()
                    );
                    return Ok(response.content);
                }
                Ok(Err(e)) => {
                    warn!("LLM attempt {} failed — {}", attempt + 1, e);
                    last_err = Some(e.to_string());
                }
                Err(_) => {
                    let e = CollaboratorError::Timeout {
                        collaborator: Collaborator::Llm,
                        secs: self.timeout_secs,
                    };
                    warn!("LLM attempt {} failed — {}", attempt + 1, e);
                    last_err = Some(e.to_string());
                }
            }
        }

        Err(CollaboratorError::Llm {
            attempts: self.chain.len(),
            detail: last_err.unwrap_or_else(|| "no provider configured".to_string()),
        })
    }
}

/// The role-primed exchange: preamble, canned acknowledgement, task.
pub fn primed_messages(prompt: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::user(LATEX_EXPERT_PREAMBLE),
        ChatMessage::assistant(LATEX_EXPERT_ACK),
        ChatMessage::user(prompt),
    ]
}

fn create_provider(name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, CollaboratorError> {
    ProviderFactory::create_llm_provider(name, model).map_err(|e| CollaboratorError::Llm {
        attempts: 0,
        detail: format!("cannot create provider '{name}' with model '{model}': {e}"),
    })
}

/// Build `CompletionOptions` from the conversion config.
fn build_options(config: &ConversionConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}
