//! Document-structure facts produced by the classifier.
//!
//! A [`DocumentStructure`] is built once per conversion and never mutated in
//! place afterwards. The classifier produces it through a chain of
//! `self -> Self` steps; the strengthening helpers here guarantee a step can
//! only add facts, never retract them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Layout complexity, ordered from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    #[default]
    Simple,
    Complex,
    MultiColumn,
}

impl Layout {
    /// `true` for anything above `Simple`.
    pub fn is_complex(self) -> bool {
        self != Layout::Simple
    }
}

impl FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "simple" => Ok(Layout::Simple),
            "complex" => Ok(Layout::Complex),
            "multi-column" | "multicolumn" => Ok(Layout::MultiColumn),
            other => Err(format!("unknown layout '{other}'")),
        }
    }
}

/// What kind of document the page looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Resume,
    Equation,
    Table,
    General,
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DocumentType::Resume => "resume",
            DocumentType::Equation => "equation",
            DocumentType::Table => "table",
            DocumentType::General => "general",
        })
    }
}

/// Caller-supplied hint about the document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentTypeHint {
    #[default]
    Auto,
    Equation,
    Table,
    Resume,
    General,
}

impl DocumentTypeHint {
    /// The document type a non-auto hint pins down.
    pub fn document_type(self) -> Option<DocumentType> {
        match self {
            DocumentTypeHint::Auto => None,
            DocumentTypeHint::Equation => Some(DocumentType::Equation),
            DocumentTypeHint::Table => Some(DocumentType::Table),
            DocumentTypeHint::Resume => Some(DocumentType::Resume),
            DocumentTypeHint::General => Some(DocumentType::General),
        }
    }
}

impl FromStr for DocumentTypeHint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(DocumentTypeHint::Auto),
            "equation" => Ok(DocumentTypeHint::Equation),
            "table" => Ok(DocumentTypeHint::Table),
            "resume" => Ok(DocumentTypeHint::Resume),
            "general" => Ok(DocumentTypeHint::General),
            other => Err(format!(
                "unknown document type '{other}' (expected auto, equation, table, resume or general)"
            )),
        }
    }
}

/// Raw layout metadata an OCR backend may attach to a page.
///
/// The arrays are opaque: they only switch presence flags on and are copied
/// through to the result untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutHints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tables: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equations: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,
}

impl LayoutHints {
    pub fn is_empty(&self) -> bool {
        self.tables.is_none() && self.equations.is_none() && self.layout.is_none()
    }
}

/// Structure facts about one page of Markdown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStructure {
    pub has_tables: bool,
    pub has_equations: bool,
    pub has_lists: bool,
    pub layout: Layout,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<DocumentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_tables: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_equations: Option<Vec<serde_json::Value>>,
}

impl DocumentStructure {
    pub(crate) fn with_tables(mut self, present: bool) -> Self {
        self.has_tables |= present;
        self
    }

    pub(crate) fn with_equations(mut self, present: bool) -> Self {
        self.has_equations |= present;
        self
    }

    pub(crate) fn with_lists(mut self, present: bool) -> Self {
        self.has_lists |= present;
        self
    }

    /// Raise the layout; a weaker label is ignored.
    pub(crate) fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = self.layout.max(layout);
        self
    }

    /// Set the document type only if none has been decided yet.
    pub(crate) fn with_document_type(mut self, doc_type: DocumentType) -> Self {
        self.document_type.get_or_insert(doc_type);
        self
    }

    /// Confidence in the classification, in `[0, 1]`.
    ///
    /// Depends on the structure record alone; rendering outcome never feeds in.
    pub fn confidence(&self) -> f64 {
        let mut score: f64 = 0.9;
        if self.has_tables {
            score -= 0.05;
        }
        if self.has_equations {
            score -= 0.02;
        }
        if self.layout.is_complex() {
            score -= 0.10;
        }
        if self.document_type.is_some() {
            score += 0.05;
        }
        // Two decimals keep 0.9 - 0.10 + 0.05 == 0.85 exactly.
        ((score * 100.0).round() / 100.0).clamp(0.0, 1.0)
    }
}
