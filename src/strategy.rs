//! Conversion strategy selection: classified Markdown → complete LaTeX document.
//!
//! ## Decision table (first match wins)
//!
//! | Condition | Strategy | Collaborators |
//! |-----------|----------|---------------|
//! | no LLM and no typesetter configured | [`Strategy::Direct`] | none |
//! | `document_type == resume` | [`Strategy::Resume`] | LLM |
//! | `has_equations` | [`Strategy::Equation`] | LLM |
//! | `has_tables` | [`Strategy::Table`] | LLM |
//! | otherwise | [`Strategy::General`] | typesetter, then LLM |
//!
//! ## Why the selector never fails
//!
//! Collaborator errors are absorbed here. When nothing produced LaTeX the
//! selector still returns a document: the stub (or, with `local_fallback`,
//! the rule-based rendering) flagged as degraded. The orchestrator decides
//! whether a degraded rendering is acceptable.

use crate::error::{Collaborator, CollaboratorError};
use crate::latex::render;
use crate::latex::template::{
    body_or_fragment, build_preamble, stub_document, wrap_document, RESUME_PREAMBLE,
};
use crate::pipeline::llm::TextGenerator;
use crate::pipeline::postprocess::{clean_resume_body, extract_latex};
use crate::pipeline::typeset::Typesetter;
use crate::prompts;
use crate::structure::{DocumentStructure, DocumentType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How a document is turned into LaTeX.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// LLM with the résumé prompt, cleaned body in the fixed résumé template.
    Resume,
    /// LLM with the equation prompt; the reply is a full document.
    Equation,
    /// LLM with the table prompt; the reply is a full document.
    Table,
    /// Typesetter first, LLM general prompt second, generated preamble.
    General,
    /// Rule-based renderer only.
    Direct,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::Resume => "resume",
            Strategy::Equation => "equation",
            Strategy::Table => "table",
            Strategy::General => "general",
            Strategy::Direct => "direct",
        })
    }
}

/// Pick the strategy for a classified document.
///
/// Résumé, equation and table strategies need the LLM; without one those
/// documents go to the rule-based renderer. General documents use the
/// typesetter when that is all there is.
pub fn select_strategy(structure: &DocumentStructure, has_llm: bool, has_typesetter: bool) -> Strategy {
    let specialised = if structure.document_type == Some(DocumentType::Resume) {
        Some(Strategy::Resume)
    } else if structure.has_equations {
        Some(Strategy::Equation)
    } else if structure.has_tables {
        Some(Strategy::Table)
    } else {
        None
    };

    match (specialised, has_llm, has_typesetter) {
        (Some(strategy), true, _) => strategy,
        (None, true, _) | (None, false, true) => Strategy::General,
        _ => Strategy::Direct,
    }
}

/// Output of the selector.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendering {
    /// Always a complete document, `\documentclass` through `\end{document}`.
    pub latex: String,
    pub strategy: Strategy,
    /// No collaborator produced the LaTeX; it is a stub or the local rendering.
    pub degraded: bool,
    pub degradation: Option<String>,
    /// The degradation happened because every LLM attempt failed.
    pub llm_exhausted: bool,
}

impl Rendering {
    fn ok(latex: String, strategy: Strategy) -> Self {
        Self {
            latex,
            strategy,
            degraded: false,
            degradation: None,
            llm_exhausted: false,
        }
    }
}

/// Chooses and runs a conversion strategy over injected collaborators.
#[derive(Clone, Default)]
pub struct Selector {
    generator: Option<Arc<dyn TextGenerator>>,
    typesetter: Option<Arc<dyn Typesetter>>,
    local_fallback: bool,
}

impl Selector {
    pub fn new(
        generator: Option<Arc<dyn TextGenerator>>,
        typesetter: Option<Arc<dyn Typesetter>>,
        local_fallback: bool,
    ) -> Self {
        Self {
            generator,
            typesetter,
            local_fallback,
        }
    }

    /// Strategy that [`Selector::select`] would run for `structure`.
    pub fn strategy_for(&self, structure: &DocumentStructure) -> Strategy {
        select_strategy(structure, self.generator.is_some(), self.typesetter.is_some())
    }

    /// Choose a strategy and produce the document.
    pub async fn select(&self, markdown: &str, structure: &DocumentStructure) -> Rendering {
        let strategy = self.strategy_for(structure);
        self.run(strategy, markdown, structure).await
    }

    /// Produce the document with a strategy chosen beforehand.
    pub async fn run(
        &self,
        strategy: Strategy,
        markdown: &str,
        structure: &DocumentStructure,
    ) -> Rendering {
        info!("Rendering with '{}' strategy", strategy);

        let result = match strategy {
            Strategy::Direct => return Rendering::ok(render(markdown), strategy),
            Strategy::Resume => self
                .generate(&prompts::resume_prompt(markdown))
                .await
                .map(|reply| {
                    let body = clean_resume_body(body_or_fragment(&reply));
                    wrap_document(RESUME_PREAMBLE, &body)
                }),
            Strategy::Equation => self
                .generate(&prompts::equation_prompt(markdown))
                .await
                .map(|reply| ensure_document(reply, structure)),
            Strategy::Table => self
                .generate(&prompts::table_prompt(markdown))
                .await
                .map(|reply| ensure_document(reply, structure)),
            Strategy::General => self.general(markdown, structure).await,
        };

        match result {
            Ok(latex) => Rendering::ok(latex, strategy),
            Err(e) => self.degrade(strategy, markdown, &e),
        }
    }

    /// Typesetter first; on its failure the LLM with the general prompt.
    async fn general(
        &self,
        markdown: &str,
        structure: &DocumentStructure,
    ) -> Result<String, CollaboratorError> {
        let preamble = build_preamble(structure);

        if let Some(ref typesetter) = self.typesetter {
            match typesetter.convert(markdown).await {
                Ok(body) => return Ok(wrap_document(&preamble, &body)),
                Err(e) => warn!("Typesetter failed — {}; falling back to LLM", e),
            }
        }

        let reply = self.generate(&prompts::general_prompt(markdown)).await?;
        Ok(wrap_document(&preamble, body_or_fragment(&reply)))
    }

    async fn generate(&self, prompt: &str) -> Result<String, CollaboratorError> {
        let generator = self.generator.as_ref().ok_or(CollaboratorError::NotConfigured {
            collaborator: Collaborator::Llm,
        })?;
        let reply = generator.generate(prompt).await?;
        debug!("LLM reply: {} chars", reply.len());
        Ok(extract_latex(&reply))
    }

    fn degrade(&self, strategy: Strategy, markdown: &str, cause: &CollaboratorError) -> Rendering {
        warn!("Strategy '{}' produced no LaTeX — {}", strategy, cause);
        let reason = format!("{} unavailable", cause.collaborator());
        let latex = if self.local_fallback {
            info!("Using rule-based rendering as fallback");
            render(markdown)
        } else {
            stub_document(&reason)
        };
        Rendering {
            latex,
            strategy,
            degraded: true,
            degradation: Some(reason),
            llm_exhausted: cause.collaborator() == Collaborator::Llm
                && !matches!(cause, CollaboratorError::NotConfigured { .. }),
        }
    }
}

/// Equation/table replies are full documents; a bare fragment gets wrapped.
fn ensure_document(reply: String, structure: &DocumentStructure) -> String {
    if reply.contains("\\documentclass") {
        reply
    } else {
        wrap_document(&build_preamble(structure), &reply)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────
