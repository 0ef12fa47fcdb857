//! Prompts for LLM-driven LaTeX generation.
//!
//! Every prompt lives here so prompt changes never touch retry, timeout or
//! strategy code, and so tests can inspect them without a live model.
//!
//! The exchange sent to the model is role-primed: a fixed preamble stating
//! the model is a LaTeX expert, a canned assistant acknowledgement, then the
//! task prompt built by one of the functions below.

/// First user turn of every exchange.
pub const LATEX_EXPERT_PREAMBLE: &str = "You are a LaTeX expert. You convert Markdown produced by OCR into clean, \
compilable LaTeX. You reply with LaTeX only, inside a single ```latex code block, \
without commentary.";

/// Canned assistant turn acknowledging the preamble.
pub const LATEX_EXPERT_ACK: &str = "Understood. I will reply with compilable LaTeX only, \
inside a single ```latex code block.";

/// Résumé: body content only, the caller supplies the template.
pub fn resume_prompt(markdown: &str) -> String {
    format!(
        r#"Convert the following résumé into LaTeX body content.

Rules:
1. Use \section{{...}} for each résumé section (Experience, Education, Skills, ...).
2. Use itemize lists for bullet points; one \item per achievement.
3. Put the candidate's name in a centered \textbf{{\Large ...}} line followed by contact details.
4. Do NOT load packages, fonts or icons; do NOT define colours or commands.
5. Escape LaTeX special characters in plain text.
6. Output only what goes between \begin{{document}} and \end{{document}}.

Résumé:
"""
{markdown}
""""#
    )
}

/// Equations: a full document with amsmath environments.
pub fn equation_prompt(markdown: &str) -> String {
    format!(
        r#"Convert the following Markdown, which contains mathematical notation, into a complete LaTeX document.

Rules:
1. Start with \documentclass{{article}} and load amsmath and amssymb.
2. Use equation or align environments for display math; keep inline math inline.
3. Repair obvious OCR mistakes in formulas (missing braces, split subscripts).
4. Keep the surrounding prose and its order.
5. End with \end{{document}}.

Markdown:
"""
{markdown}
""""#
    )
}

/// Tables: a full document with booktabs tables.
pub fn table_prompt(markdown: &str) -> String {
    format!(
        r#"Convert the following Markdown, which contains tables, into a complete LaTeX document.

Rules:
1. Start with \documentclass{{article}} and load booktabs and array.
2. Render each table as a tabular inside a table environment using \toprule, \midrule and \bottomrule.
3. Preserve column alignment and every cell value exactly.
4. Keep the surrounding prose and its order.
5. End with \end{{document}}.

Markdown:
"""
{markdown}
""""#
    )
}

/// General text: body content only, the caller supplies the preamble.
pub fn general_prompt(markdown: &str) -> String {
    format!(
        r#"Convert the following Markdown into LaTeX body content.

Rules:
1. Map headings to \section, \subsection and \subsubsection.
2. Use itemize/enumerate for lists, quote for block quotes, lstlisting for code.
3. Escape LaTeX special characters in plain text.
4. Do NOT include \documentclass, \usepackage, \begin{{document}} or \end{{document}}.

Markdown:
"""
{markdown}
""""#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompts_embed_markdown() {
        let md = "# Title\n- item";
        for prompt in [
            resume_prompt(md),
            equation_prompt(md),
            table_prompt(md),
            general_prompt(md),
        ] {
            assert!(prompt.contains(md));
        }
    }

    #[test]
    fn format_braces_survive() {
        assert!(resume_prompt("x").contains(r"\section{...}"));
        assert!(equation_prompt("x").contains(r"\end{document}"));
    }

    #[test]
    fn preamble_states_role() {
        assert!(LATEX_EXPERT_PREAMBLE.contains("LaTeX expert"));
    }
}
