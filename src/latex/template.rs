//! Preambles, document wrappers and the stub document.

use crate::structure::DocumentStructure;

/// Preamble used by the rule-based renderer. Ends inside the document body.
pub const DEFAULT_PREAMBLE: &str = r"\documentclass{article}
\usepackage{graphicx}
\usepackage{amsmath}
\usepackage{amssymb}
\usepackage{booktabs}
\usepackage{hyperref}
\usepackage{xcolor}
\usepackage{listings}
\usepackage{multirow}
\usepackage[utf8]{inputenc}

\title{Converted Document}
\author{Markdown Converter}
\date{\today}

\begin{document}
\maketitle
";

/// Fixed professional résumé preamble. The body is inserted after
/// `\begin{document}`.
pub const RESUME_PREAMBLE: &str = r"\documentclass[11pt,a4paper]{article}
\usepackage[utf8]{inputenc}
\usepackage[T1]{fontenc}
\usepackage[margin=0.75in]{geometry}
\usepackage{enumitem}
\usepackage{titlesec}
\usepackage[hidelinks]{hyperref}
\usepackage{xcolor}

\pagestyle{empty}
\setlength{\parindent}{0pt}
\setlist[itemize]{leftmargin=*,noitemsep,topsep=2pt}
\titleformat{\section}{\large\bfseries\uppercase}{}{0em}{}[\titlerule]
\titlespacing*{\section}{0pt}{10pt}{6pt}
\titleformat{\subsection}{\normalsize\bfseries}{}{0em}{}
\titlespacing*{\subsection}{0pt}{6pt}{2pt}

\begin{document}
";

/// Build a preamble whose packages follow the structure flags.
pub fn build_preamble(structure: &DocumentStructure) -> String {
    let mut packages: Vec<&str> = vec![
        r"\usepackage[utf8]{inputenc}",
        r"\usepackage[T1]{fontenc}",
        r"\usepackage{amsmath}",
        r"\usepackage{amssymb}",
        r"\usepackage{graphicx}",
        r"\usepackage{listings}",
        r"\usepackage{hyperref}",
    ];
    if structure.has_tables {
        packages.extend([
            r"\usepackage{booktabs}",
            r"\usepackage{longtable}",
            r"\usepackage{array}",
            r"\usepackage{multirow}",
        ]);
    }
    if structure.has_lists {
        packages.push(r"\usepackage{enumitem}");
    }
    if structure.layout.is_complex() {
        packages.push(r"\usepackage{multicol}");
    }

    let mut preamble = String::from("\\documentclass{article}\n");
    for pkg in packages {
        preamble.push_str(pkg);
        preamble.push('\n');
    }
    // pandoc output refers to \tightlist without defining it.
    preamble.push_str("\\providecommand{\\tightlist}{\\setlength{\\itemsep}{0pt}\\setlength{\\parskip}{0pt}}\n");
    preamble
}

/// Wrap body content into a full document.
pub fn wrap_document(preamble: &str, body: &str) -> String {
    let mut doc = String::with_capacity(preamble.len() + body.len() + 64);
    doc.push_str(preamble.trim_end());
    if !preamble.contains("\\begin{document}") {
        doc.push_str("\n\n\\begin{document}");
    }
    doc.push('\n');
    doc.push_str(body.trim());
    doc.push_str("\n\\end{document}\n");
    doc
}

/// Extract the content between `\begin{document}` and `\end{document}`.
///
/// Returns `None` when the text is not a full document.
pub fn extract_body(latex: &str) -> Option<&str> {
    let start = latex.find("\\begin{document}")? + "\\begin{document}".len();
    let end = latex[start..]
        .rfind("\\end{document}")
        .map_or(latex.len(), |i| start + i);
    Some(latex[start..end].trim())
}

/// Body content of `latex`, or the whole text if it is a fragment.
pub fn body_or_fragment(latex: &str) -> &str {
    extract_body(latex).unwrap_or_else(|| latex.trim())
}

/// Minimal valid document reporting why no rendering is available.
pub fn stub_document(reason: &str) -> String {
    format!(
        "\\documentclass{{article}}\n\\begin{{document}}\n\\section*{{Conversion unavailable}}\nThe document could not be converted to LaTeX.\n\n\\textit{{Reason: {}}}\n\\end{{document}}\n",
        super::escape::escape(reason)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::Layout;

    #[test]
    fn preamble_follows_flags() {
        let plain = build_preamble(&DocumentStructure::default());
        assert!(!plain.contains("booktabs"));
        assert!(!plain.contains("enumitem"));
        assert!(!plain.contains("multicol"));

        let rich = build_preamble(&DocumentStructure {
            has_tables: true,
            has_lists: true,
            layout: Layout::MultiColumn,
            ..Default::default()
        });
        assert!(rich.contains("booktabs"));
        assert!(rich.contains("enumitem"));
        assert!(rich.contains("multicol"));
    }

    #[test]
    fn wrap_adds_document_environment() {
        let doc = wrap_document("\\documentclass{article}\n", "Hello");
        assert!(doc.starts_with("\\documentclass{article}"));
        assert!(doc.contains("\\begin{document}\nHello\n\\end{document}"));
    }

    #[test]
    fn wrap_resume_preamble_keeps_single_begin() {
        let doc = wrap_document(RESUME_PREAMBLE, "Body");
        assert_eq!(doc.matches("\\begin{document}").count(), 1);
        assert!(doc.trim_end().ends_with("\\end{document}"));
    }

    #[test]
    fn extract_body_from_full_document() {
        let doc = "\\documentclass{article}\n\\begin{document}\n  Hi there\n\\end{document}";
        assert_eq!(extract_body(doc), Some("Hi there"));
        assert_eq!(extract_body("just a fragment"), None);
        assert_eq!(body_or_fragment(" fragment "), "fragment");
    }

    #[test]
    fn stub_is_closed_and_escaped() {
        let stub = stub_document("LLM 100% down");
        assert!(stub.starts_with("\\documentclass"));
        assert!(stub.trim_end().ends_with("\\end{document}"));
        assert!(stub.contains("100\\% down"));
    }
}
