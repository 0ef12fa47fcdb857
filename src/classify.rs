//! Document-structure classification.
//!
//! [`classify`] is a pure function of its inputs. It threads a
//! [`DocumentStructure`] through seven steps, in this order:
//!
//! 1. table presence (2+ column pipe row **and** an alignment row)
//! 2. equation presence (`$$…$$` or `$…$`)
//! 3. list presence
//! 4. caller hint widening
//! 5. OCR layout hints
//! 6. résumé detection (only if no document type yet)
//! 7. layout complexity from header density (only if still `simple`)
//!
//! Each step takes the record by value and returns it. The strengthening
//! helpers on `DocumentStructure` only add facts, so a later step can never
//! undo what an earlier one concluded.

use crate::structure::{DocumentStructure, DocumentType, DocumentTypeHint, Layout, LayoutHints};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static RE_TABLE_ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*\|?[^|\n]+\|[^|\n]+").unwrap());
static RE_TABLE_SEPARATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*\|?[ \t]*:?-+:?[ \t]*(\|[ \t]*:?-+:?[ \t]*)+\|?[ \t]*$").unwrap()
});
static RE_EQUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\$[\s\S]+?\$\$|\$[^$\n]+?\$").unwrap());
static RE_LIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*(?:[-*+]|\d+\.)\s+").unwrap());
static RE_FUNCTION_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z]\([A-Za-z]\)").unwrap());

/// Section titles that typically appear in a résumé.
pub const RESUME_KEYWORDS: &[&str] = &[
    "experience",
    "education",
    "skills",
    "work experience",
    "professional experience",
    "employment",
    "qualifications",
    "projects",
    "certifications",
    "achievements",
    "languages",
    "summary",
    "objective",
    "profile",
    "contact",
];

/// One regex per keyword: either a heading (`## Skills`) or a title line
/// (`Skills: …`), case-insensitive, optional bold markers.
static RE_RESUME_KEYWORDS: Lazy<Vec<Regex>> = Lazy::new(|| {
    RESUME_KEYWORDS
        .iter()
        .map(|kw| {
            let kw = regex::escape(kw).replace(' ', r"\s+");
            Regex::new(&format!(
                r"(?im)^[ \t]*(?:#{{1,6}}[ \t]*\**[ \t]*{kw}[ \t]*\**[ \t]*:?[ \t]*$|\**{kw}\**[ \t]*:)"
            ))
            .unwrap()
        })
        .collect()
});
static RE_EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());
static RE_PHONE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+?\d{1,3}[\s.-]?)?\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}\b").unwrap()
});
static RE_DATE_RANGE: Lazy<Regex> = Lazy::new(|| {
    let month = r"(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?";
    Regex::new(&format!(
        r"(?i)\b{month}\s+\d{{4}}\s*(?:-|–|—|to)\s*{month}\s+\d{{4}}\b"
    ))
    .unwrap()
});

/// Classify a page of Markdown.
pub fn classify(
    markdown: &str,
    layout_hints: Option<&LayoutHints>,
    hint: DocumentTypeHint,
) -> DocumentStructure {
    let structure = DocumentStructure::default();
    let structure = detect_tables(structure, markdown);
    let structure = detect_equations(structure, markdown);
    let structure = detect_lists(structure, markdown);
    let structure = apply_type_hint(structure, markdown, hint);
    let structure = apply_layout_hints(structure, layout_hints);
    let structure = detect_resume(structure, markdown);
    let structure = detect_complexity(structure, markdown);

    debug!(
        tables = structure.has_tables,
        equations = structure.has_equations,
        lists = structure.has_lists,
        layout = ?structure.layout,
        document_type = ?structure.document_type,
        "classified document"
    );
    structure
}

fn detect_tables(s: DocumentStructure, md: &str) -> DocumentStructure {
    s.with_tables(RE_TABLE_ROW.is_match(md) && RE_TABLE_SEPARATOR.is_match(md))
}

fn detect_equations(s: DocumentStructure, md: &str) -> DocumentStructure {
    s.with_equations(RE_EQUATION.is_match(md))
}

fn detect_lists(s: DocumentStructure, md: &str) -> DocumentStructure {
    s.with_lists(RE_LIST.is_match(md))
}

fn apply_type_hint(s: DocumentStructure, md: &str, hint: DocumentTypeHint) -> DocumentStructure {
    let s = match hint {
        DocumentTypeHint::Auto => return s,
        DocumentTypeHint::Table => s.with_tables(md.contains('|')),
        DocumentTypeHint::Equation => {
            s.with_equations(md.contains('$') || RE_FUNCTION_CALL.is_match(md))
        }
        DocumentTypeHint::Resume => s.with_layout(Layout::Complex),
        DocumentTypeHint::General => s,
    };
    match hint.document_type() {
        Some(doc_type) => s.with_document_type(doc_type),
        None => s,
    }
}

fn apply_layout_hints(s: DocumentStructure, hints: Option<&LayoutHints>) -> DocumentStructure {
    let Some(hints) = hints else { return s };
    let mut s = s;

    if let Some(tables) = &hints.tables {
        s = s.with_tables(!tables.is_empty());
        s.raw_tables = Some(tables.clone());
    }
    if let Some(equations) = &hints.equations {
        s = s.with_equations(!equations.is_empty());
        s.raw_equations = Some(equations.clone());
    }
    match hints.layout {
        Some(layout) => s.with_layout(layout),
        None => s,
    }
}

fn detect_resume(s: DocumentStructure, md: &str) -> DocumentStructure {
    if s.document_type.is_some() || !ResumeSignals::scan(md).is_resume() {
        return s;
    }
    s.with_document_type(DocumentType::Resume)
        .with_layout(Layout::Complex)
}

fn detect_complexity(s: DocumentStructure, md: &str) -> DocumentStructure {
    if s.layout != Layout::Simple {
        return s;
    }
    let headers = md.lines().filter(|l| l.starts_with('#')).count();
    let lines = md.lines().count();
    if headers > 5 && lines < 100 {
        s.with_layout(Layout::Complex)
    } else {
        s
    }
}

/// Evidence that a page is a résumé.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResumeSignals {
    pub keyword_hits: usize,
    pub email: bool,
    pub phone: bool,
    pub linkedin: bool,
    pub date_range: bool,
}

impl ResumeSignals {
    pub fn scan(md: &str) -> Self {
        Self {
            keyword_hits: RE_RESUME_KEYWORDS.iter().filter(|re| re.is_match(md)).count(),
            email: RE_EMAIL.is_match(md),
            phone: RE_PHONE.is_match(md),
            linkedin: md.to_ascii_lowercase().contains("linkedin.com"),
            date_range: RE_DATE_RANGE.is_match(md),
        }
    }

    fn has_contact(&self) -> bool {
        self.email || self.phone || self.linkedin
    }

    pub fn is_resume(&self) -> bool {
        self.keyword_hits >= 2
            || (self.keyword_hits >= 1 && self.has_contact())
            || (self.date_range && self.has_contact())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const RESUME: &str = "# Jane Doe\njane.doe@example.com\n\n## Experience\nAcme Corp\n\n## Education\nMIT\n";

    #[test]
    fn plain_text_is_simple() {
        let s = classify("Just a paragraph.", None, DocumentTypeHint::Auto);
        assert_eq!(s, DocumentStructure::default());
        assert_eq!(s.confidence(), 0.9);
    }

    #[test]
    fn resume_keywords_and_email() {
        let s = classify(RESUME, None, DocumentTypeHint::Auto);
        assert_eq!(s.document_type, Some(DocumentType::Resume));
        assert_eq!(s.layout, Layout::Complex);
        assert!(s.confidence() <= 0.85);
        assert_eq!(s.confidence(), 0.85);
    }

    #[test]
    fn single_table_block() {
        let md = "Intro\n\n| Name | Qty |\n| --- | --- |\n| a | 1 |\n";
        let s = classify(md, None, DocumentTypeHint::Auto);
        assert!(s.has_tables);
        assert!(!s.has_equations);
        assert_eq!(s.confidence(), 0.85);
    }

    #[test]
    fn pipes_without_separator_are_not_a_table() {
        let s = classify("a | b | c\n", None, DocumentTypeHint::Auto);
        assert!(!s.has_tables);
    }

    #[test]
    fn table_hint_widens_on_any_pipe() {
        let s = classify("a | b\n", None, DocumentTypeHint::Table);
        assert!(s.has_tables);
        assert_eq!(s.document_type, Some(DocumentType::Table));
    }

    #[test]
    fn equations_detected() {
        assert!(classify("Let $x^2$ be", None, DocumentTypeHint::Auto).has_equations);
        assert!(classify("$$\na=b\n$$", None, DocumentTypeHint::Auto).has_equations);
        assert!(!classify("f(x) = 2", None, DocumentTypeHint::Auto).has_equations);
    }

    #[test]
    fn equation_hint_widens_on_function_call() {
        let s = classify("f(x) = 2", None, DocumentTypeHint::Equation);
        assert!(s.has_equations);
        assert_eq!(s.document_type, Some(DocumentType::Equation));
    }

    #[test]
    fn lists_detected() {
        assert!(classify("  - item", None, DocumentTypeHint::Auto).has_lists);
        assert!(classify("12. item", None, DocumentTypeHint::Auto).has_lists);
        assert!(!classify("-not a list", None, DocumentTypeHint::Auto).has_lists);
    }

    #[test]
    fn resume_hint_forces_complex() {
        let s = classify("hello", None, DocumentTypeHint::Resume);
        assert_eq!(s.document_type, Some(DocumentType::Resume));
        assert_eq!(s.layout, Layout::Complex);
    }

    #[test]
    fn general_hint_blocks_resume_detection() {
        let s = classify(RESUME, None, DocumentTypeHint::General);
        assert_eq!(s.document_type, Some(DocumentType::General));
    }

    #[test]
    fn layout_hints_override_flags_and_copy_arrays() {
        let hints = LayoutHints {
            tables: Some(vec![json!({"bbox": [0, 0, 10, 10]})]),
            equations: Some(vec![json!("x")]),
            layout: Some(Layout::MultiColumn),
        };
        let s = classify("text", Some(&hints), DocumentTypeHint::Auto);
        assert!(s.has_tables);
        assert!(s.has_equations);
        assert_eq!(s.layout, Layout::MultiColumn);
        assert_eq!(s.raw_tables.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn simple_layout_hint_does_not_weaken_resume() {
        let hints = LayoutHints {
            layout: Some(Layout::Simple),
            ..Default::default()
        };
        let s = classify("x", Some(&hints), DocumentTypeHint::Resume);
        assert_eq!(s.layout, Layout::Complex);
    }

    #[test]
    fn many_headers_promote_complex() {
        let md = "# a\n# b\n# c\n# d\n# e\n# f\n";
        let s = classify(md, None, DocumentTypeHint::Auto);
        assert_eq!(s.layout, Layout::Complex);

        let five = "# a\n# b\n# c\n# d\n# e\n";
        assert_eq!(classify(five, None, DocumentTypeHint::Auto).layout, Layout::Simple);
    }

    #[test]
    fn resume_signals_rules() {
        let one_kw_phone = ResumeSignals::scan("Skills: Rust\nCall 555-123-4567");
        assert_eq!(one_kw_phone.keyword_hits, 1);
        assert!(one_kw_phone.phone);
        assert!(one_kw_phone.is_resume());

        let dates_linkedin =
            ResumeSignals::scan("Jan 2019 - Mar 2021 at Foo\nlinkedin.com/in/jane");
        assert!(dates_linkedin.date_range);
        assert!(dates_linkedin.is_resume());

        let one_kw_only = ResumeSignals::scan("## Summary\nThis report covers Q3.");
        assert!(!one_kw_only.is_resume());
    }

    #[test]
    fn keyword_inside_prose_does_not_count() {
        let s = ResumeSignals::scan("We gained experience and education along the way.");
        assert_eq!(s.keyword_hits, 0);
    }
}
