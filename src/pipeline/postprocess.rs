//! Post-processing: deterministic cleanup of LLM-generated LaTeX.
//!
//! Two entry points:
//!
//! - [`extract_latex`] pulls the LaTeX out of a model reply (fenced block,
//!   bare document, or the trimmed reply as-is). It does not validate.
//! - [`clean_resume_body`] prepares a résumé body for the fixed template:
//!   strips a blacklist of package/command lines the template owns, then
//!   normalises spacing around `\section` and `\item`.
//!
//! The blacklist is literal and line-based; it can miss a command that shares
//! a line with content and can drop a line that merely starts with one.

use once_cell::sync::Lazy;
use regex::Regex;

// ── Reply extraction ─────────────────────────────────────────────────────────

// Any info string after the opening fence, in any case.
static RE_FENCED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?si)```[a-z0-9_+-]*[ \t]*\r?\n(.*?)\r?\n?```").unwrap()
});

/// Extract LaTeX from a model reply.
///
/// The content of the first fenced code block wins. Without a fence, a reply
/// that already starts with `\documentclass` and any other reply are both
/// returned trimmed, unvalidated.
pub fn extract_latex(response: &str) -> String {
    match RE_FENCED.captures(response) {
        Some(caps) => caps[1].trim().to_string(),
        None => response.trim().to_string(),
    }
}

// ── Résumé cleanup ───────────────────────────────────────────────────────────

/// Commands whose lines are removed from résumé bodies.
pub const RESUME_BLACKLIST: &[&str] = &[
    "\\documentclass",
    "\\usepackage",
    "\\RequirePackage",
    "\\setmainfont",
    "\\setsansfont",
    "\\geometry",
    "\\pagestyle",
    "\\fancyhf",
    "\\titleformat",
    "\\titlespacing",
    "\\definecolor",
    "\\hypersetup",
    "\\maketitle",
    "\\faIcon",
];

static RE_BEFORE_SECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*(\\section\*?\{)").unwrap());
static RE_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n?[ \t]*\\item\b[ \t]*").unwrap());
static RE_BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Apply all résumé cleanup rules to a body fragment.
///
/// Rules (applied in order):
/// 1. Drop blacklisted lines
/// 2. One blank line before each `\section`
/// 3. Each `\item` on its own line, indented two spaces
/// 4. Collapse 3+ newlines down to 2
pub fn clean_resume_body(body: &str) -> String {
    let s = strip_blacklisted_lines(body);
    let s = normalise_section_spacing(&s);
    let s = normalise_item_spacing(&s);
    collapse_blank_lines(&s).trim().to_string()
}

// ── Rule 1: Drop blacklisted lines ───────────────────────────────────────────

fn strip_blacklisted_lines(input: &str) -> String {
    input
        .lines()
        .filter(|line| {
            let t = line.trim_start();
            !RESUME_BLACKLIST.iter().any(|cmd| {
                t.strip_prefix(cmd)
                    .is_some_and(|rest| !rest.starts_with(|c: char| c.is_ascii_alphabetic()))
            })
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 2: Blank line before sections ───────────────────────────────────────

fn normalise_section_spacing(input: &str) -> String {
    RE_BEFORE_SECTION.replace_all(input, "\n\n$1").to_string()
}

// ── Rule 3: Items on their own lines ─────────────────────────────────────────

fn normalise_item_spacing(input: &str) -> String {
    RE_ITEM.replace_all(input, "\n  \\item ").to_string()
}

// ── Rule 4: Collapse excessive blank lines ───────────────────────────────────

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_RUNS.replace_all(input, "\n\n").to_string()
}

// ── Tests ────────────────────────────────────────────────────────────────────
