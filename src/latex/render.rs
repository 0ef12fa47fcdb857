//! Rule-based Markdown → LaTeX renderer.
//!
//! A single forward pass over the lines with one line of lookahead (used to
//! decide whether a table or block quote continues). Per line, the first
//! matching rule wins:
//!
//! 1. fenced code block (` ``` `, optional language tag)
//! 2. header `#`…`######`
//! 3. list item (`-`, `*`, `+`, `N.`), nesting = leading spaces / 2
//! 4. table row (contains `|`)
//! 5. image `![alt](path)`
//! 6. block quote `>`
//! 7. display equation `$$…$$` (single line, or a `$$` … `$$` block)
//! 8. paragraph text with inline transforms
//!
//! A line not taken by the table rule ends any pending table, so table rows
//! never carry over into a later pipe block.
//!
//! The function is total: every input produces a closed document, and every
//! environment opened during the pass is closed exactly once.

use super::escape::{escape_path, render_inline};
use super::template::DEFAULT_PREAMBLE;
use once_cell::sync::Lazy;
use regex::Regex;

// Depths 5 and 6 both map to `subparagraph`; LaTeX has nothing deeper.
const SECTION_COMMANDS: [&str; 6] = [
    "section",
    "subsection",
    "subsubsection",
    "paragraph",
    "subparagraph",
    "subparagraph",
];

static RE_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.*)$").unwrap());
static RE_LIST_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*)([-*+]|\d+\.)\s+(.*)$").unwrap());
static RE_ALIGN_CELL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^:?-+:?$").unwrap());
static RE_IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^!\[(.*?)\]\((.*?)\)").unwrap());
static RE_DISPLAY_MATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\$\$(.*?)\$\$$").unwrap());
static RE_NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W").unwrap());

/// Render Markdown into a complete LaTeX document using the default preamble.
pub fn render(markdown: &str) -> String {
    let mut doc = String::from(DEFAULT_PREAMBLE);
    doc.push_str(&render_body(markdown));
    doc.push_str("\\end{document}");
    doc
}

/// Render Markdown into LaTeX body content (no preamble, no `\end{document}`).
///
/// All environments opened by the body are closed before returning.
pub fn render_body(markdown: &str) -> String {
    let lines: Vec<&str> = markdown.lines().collect();
    let mut state = ParseState::default();

    for (i, raw) in lines.iter().enumerate() {
        let next = lines.get(i + 1).map(|l| l.trim_end());
        state.line(raw.trim_end(), next);
    }

    state.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Itemize,
    Enumerate,
}

impl ListKind {
    fn env(self) -> &'static str {
        match self {
            ListKind::Itemize => "itemize",
            ListKind::Enumerate => "enumerate",
        }
    }
}

/// One open list environment and the indentation that opened it.
#[derive(Debug)]
struct ListFrame {
    kind: ListKind,
    indent: usize,
}

/// Mutable state for one rendering call.
#[derive(Debug, Default)]
struct ParseState {
    out: String,
    lists: Vec<ListFrame>,
    in_code: bool,
    math_block: Option<Vec<String>>,
    in_quote: bool,
    table_spec: Option<String>,
    table_rows: Vec<Vec<String>>,
    prev_blank: bool,
}

impl ParseState {
    fn line(&mut self, line: &str, next: Option<&str>) {
        // 1. Code fences; content is copied verbatim.
        if self.in_code {
            if line.trim_start().starts_with("```") {
                self.out.push_str("\\end{lstlisting}\n");
                self.in_code = false;
            } else {
                self.out.push_str(line);
                self.out.push('\n');
            }
            return;
        }

        if let Some(buf) = self.math_block.as_mut() {
            if line.trim() == "$$" {
                let content = buf.join("\n");
                self.math_block = None;
                self.push_equation(content.trim());
            } else {
                buf.push(line.to_string());
            }
            return;
        }

        if line.trim().is_empty() {
            self.flush_table();
            if !self.prev_blank {
                self.out.push_str("\n\\par\n");
            }
            self.prev_blank = true;
            return;
        }
        self.prev_blank = false;

        if let Some(rest) = line.trim_start().strip_prefix("```") {
            self.flush_table();
            self.close_lists(0);
            let lang: String = rest
                .trim()
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-'))
                .collect();
            let lang = if lang.is_empty() { "text".to_string() } else { lang };
            self.out
                .push_str(&format!("\\begin{{lstlisting}}[language={lang}]\n"));
            self.in_code = true;
            return;
        }

        // 2. Headers
        if let Some(caps) = RE_HEADER.captures(line) {
            self.flush_table();
            self.close_lists(0);
            let depth = caps[1].len().min(6);
            let title = render_inline(caps[2].trim());
            self.out
                .push_str(&format!("\\{}{{{}}}\n", SECTION_COMMANDS[depth - 1], title));
            return;
        }

        // 3. List items
        if let Some(caps) = RE_LIST_ITEM.captures(line) {
            let indent: usize = caps[1]
                .chars()
                .map(|c| if c == '\t' { 2 } else { 1 })
                .sum();
            let kind = if caps[2].ends_with('.') {
                ListKind::Enumerate
            } else {
                ListKind::Itemize
            };
            self.flush_table();
            self.list_item(indent, kind, &caps[3]);
            return;
        }

        // Anything that is not a list item ends the open lists.
        self.close_lists(0);

        // 4. Tables
        if line.contains('|') {
            self.table_line(line);
            if !next.is_some_and(|n| n.contains('|')) {
                self.flush_table();
            }
            return;
        }
        self.flush_table();

        // 5. Images
        if let Some(caps) = RE_IMAGE.captures(line) {
            let alt = render_inline(&caps[1]);
            let label = RE_NON_WORD.replace_all(&caps[2], "_");
            let path = escape_path(&caps[2]);
            self.out.push_str(&format!(
                "\\begin{{figure}}[ht]\n  \\centering\n  \\includegraphics[width=0.8\\textwidth]{{{path}}}\n  \\caption{{{alt}}}\n  \\label{{fig:{label}}}\n\\end{{figure}}\n"
            ));
            return;
        }

        // 6. Block quotes
        if let Some(quoted) = line.strip_prefix('>') {
            if !self.in_quote {
                self.out.push_str("\\begin{quote}\n");
                self.in_quote = true;
            }
            self.out.push_str(&render_inline(quoted.trim()));
            self.out.push('\n');
            if !next.is_some_and(|n| n.starts_with('>')) {
                self.out.push_str("\\end{quote}\n");
                self.in_quote = false;
            }
            return;
        }

        // 7. Display equations
        if line.trim() == "$$" {
            self.math_block = Some(Vec::new());
            return;
        }
        if let Some(caps) = RE_DISPLAY_MATH.captures(line) {
            self.push_equation(caps[1].trim());
            return;
        }

        // 8. Paragraph text
        self.out.push_str(&render_inline(line));
        self.out.push('\n');
    }

    fn list_item(&mut self, indent: usize, kind: ListKind, text: &str) {
        let level = indent / 2 + 1;
        self.close_lists(level);
        if let Some(frame) = self.lists.last() {
            tracing::trace!(level, indent, parent_indent = frame.indent, "list item");
        }
        if self.lists.len() == level && self.lists.last().is_some_and(|f| f.kind != kind) {
            self.close_lists(level - 1);
        }
        while self.lists.len() < level {
            self.out.push_str(&format!("\\begin{{{}}}\n", kind.env()));
            self.lists.push(ListFrame { kind, indent });
        }
        self.out.push_str(&format!("\\item {}\n", render_inline(text)));
    }

    /// Close list environments until at most `depth` remain, innermost first.
    fn close_lists(&mut self, depth: usize) {
        while self.lists.len() > depth {
            if let Some(frame) = self.lists.pop() {
                self.out
                    .push_str(&format!("\\end{{{}}}\n", frame.kind.env()));
            }
        }
    }

    fn table_line(&mut self, line: &str) {
        let mut cells: Vec<&str> = line.split('|').map(str::trim).collect();
        if cells.first().is_some_and(|c| c.is_empty()) {
            cells.remove(0);
        }
        if cells.last().is_some_and(|c| c.is_empty()) {
            cells.pop();
        }
        if cells.is_empty() {
            return;
        }

        if cells.iter().all(|c| RE_ALIGN_CELL.is_match(c)) {
            let spec: String = cells
                .iter()
                .map(|c| match (c.starts_with(':'), c.ends_with(':')) {
                    (true, true) => 'c',
                    (false, true) => 'r',
                    _ => 'l',
                })
                .collect();
            self.table_spec = Some(spec);
            return;
        }

        self.table_rows
            .push(cells.iter().map(|c| render_inline(c)).collect());
    }

    /// Emit the buffered table; rows without an alignment row are dropped.
    fn flush_table(&mut self) {
        let rows = std::mem::take(&mut self.table_rows);
        let Some(spec) = self.table_spec.take() else {
            return;
        };
        if rows.is_empty() {
            return;
        }

        self.out
            .push_str(&format!("\\begin{{tabular}}{{{spec}}}\n\\toprule\n"));
        for (idx, row) in rows.iter().enumerate() {
            self.out.push_str(&row.join(" & "));
            self.out.push_str(" \\\\");
            if idx == 0 && rows.len() > 1 {
                self.out.push_str(" \\midrule");
            }
            self.out.push('\n');
        }
        self.out.push_str("\\bottomrule\n\\end{tabular}\n");
    }

    fn push_equation(&mut self, content: &str) {
        self.out
            .push_str(&format!("\\begin{{equation}}\n{content}\n\\end{{equation}}\n"));
    }

    /// Drain every open construct and return the body.
    fn finish(mut self) -> String {
        if self.in_code {
            self.out.push_str("\\end{lstlisting}\n");
            self.in_code = false;
        }
        if let Some(buf) = self.math_block.take() {
            let content = buf.join("\n");
            self.push_equation(content.trim());
        }
        self.flush_table();
        self.close_lists(0);
        if self.in_quote {
            self.out.push_str("\\end{quote}\n");
            self.in_quote = false;
        }
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    #[test]
    fn document_is_always_closed() {
        for md in ["", "hello", "- a\n  - b", "```rust\nfn main() {}", "> q", "$$\nx"] {
            let out = render(md);
            assert!(out.starts_with("\\documentclass"), "{md:?}");
            assert!(out.ends_with("\\end{document}"), "{md:?}");
        }
    }

    #[test]
    fn headers_map_to_sectioning() {
        let out = render_body("# A\n## B\n### C\n#### D\n##### E\n###### F");
        assert!(out.contains("\\section{A}"));
        assert!(out.contains("\\subsection{B}"));
        assert!(out.contains("\\subsubsection{C}"));
        assert!(out.contains("\\paragraph{D}"));
        assert!(out.contains("\\subparagraph{E}"));
        assert!(out.contains("\\subparagraph{F}"));
    }

    #[test]
    fn nested_list_opens_and_closes_in_order() {
        let out = render_body("- a\n  - b\nafter");
        let expected = "\\begin{itemize}\n\\item a\n\\begin{itemize}\n\\item b\n\\end{itemize}\n\\end{itemize}\nafter\n";
        assert_eq!(out, expected);
    }

    #[test]
    fn ordered_list_uses_enumerate() {
        let out = render_body("1. one\n2. two");
        assert_eq!(count(&out, "\\begin{enumerate}"), 1);
        assert_eq!(count(&out, "\\end{enumerate}"), 1);
        assert_eq!(count(&out, "\\item"), 2);
    }

    #[test]
    fn switching_marker_kind_reopens_list() {
        let out = render_body("- a\n1. b");
        assert!(out.contains("\\end{itemize}\n\\begin{enumerate}"));
    }

    #[test]
    fn open_lists_closed_at_end_of_input() {
        let out = render_body("- a\n  - b\n    - c");
        assert_eq!(count(&out, "\\begin{itemize}"), 3);
        assert_eq!(count(&out, "\\end{itemize}"), 3);
        assert!(out.ends_with("\\end{itemize}\n\\end{itemize}\n\\end{itemize}\n"));
    }

    #[test]
    fn table_with_separator() {
        let out = render_body("| A | B |\n| --- | ---: |\n| 1 | 2 |\n| 3 | 4 |");
        assert!(out.contains("\\begin{tabular}{lr}"));
        assert!(out.contains("A & B \\\\ \\midrule\n"));
        assert!(out.contains("1 & 2 \\\\\n"));
        assert!(out.contains("3 & 4 \\\\\n\\bottomrule"));
        assert_eq!(count(&out, "\\midrule"), 1);
    }

    #[test]
    fn centered_alignment() {
        let out = render_body("| A |\n|:---:|\n| x |");
        assert!(out.contains("\\begin{tabular}{c}"));
    }

    #[test]
    fn table_without_separator_is_dropped() {
        let out = render_body("| A | B |\n| 1 | 2 |\n\ntext");
        assert!(!out.contains("tabular"));
        assert!(!out.contains("A & B"));
        assert!(out.contains("text"));
    }

    #[test]
    fn table_flushes_before_following_paragraph() {
        let out = render_body("| A | B |\n|---|---|\n| 1 | 2 |\nAfter");
        let end = out.find("\\end{tabular}").unwrap();
        let after = out.find("After").unwrap();
        assert!(end < after);
    }

    #[test]
    fn table_before_piped_list_item_is_flushed_in_place() {
        let out = render_body("| A | B |\n|---|---|\n- item | x\n\nText\n\n| C | D |\n| 1 | 2 |");
        assert_eq!(count(&out, "\\begin{tabular}"), 1);
        let end = out.find("\\end{tabular}").unwrap();
        assert!(end < out.find("\\item").unwrap());
        assert!(end < out.find("Text").unwrap());
        assert!(!out.contains("C & D"));
        assert!(!out.contains("1 & 2"));
    }

    #[test]
    fn alignment_row_does_not_leak_past_header() {
        let out = render_body("| A |\n|---|\n# Next | part\n| x |\n| y |");
        assert_eq!(count(&out, "\\begin{tabular}"), 1);
        assert!(out.find("\\end{tabular}").unwrap() < out.find("\\section").unwrap());
        assert!(!out.contains("x \\\\"));
    }

    #[test]
    fn code_block_is_verbatim() {
        let out = render_body("```python\nx = a_b & {c}\n\ny = 1\n```");
        assert!(out.contains("\\begin{lstlisting}[language=python]\nx = a_b & {c}\n\ny = 1\n\\end{lstlisting}"));
    }

    #[test]
    fn code_block_default_language() {
        let out = render_body("```\nplain\n```");
        assert!(out.contains("[language=text]"));
    }

    #[test]
    fn image_becomes_figure() {
        let out = render_body("![A chart](img/chart-1.png)");
        assert!(out.contains("\\includegraphics[width=0.8\\textwidth]{img/chart-1.png}"));
        assert!(out.contains("\\caption{A chart}"));
        assert!(out.contains("\\label{fig:img_chart_1_png}"));
    }

    #[test]
    fn image_path_is_escaped() {
        let out = render_body("![chart](img%201.png)");
        assert!(out.contains("\\includegraphics[width=0.8\\textwidth]{img\\%201.png}\n"));
        assert!(out.contains("\\label{fig:img_201_png}"));
        let open = count(&out, "{") - count(&out, "\\{");
        let close = count(&out, "}") - count(&out, "\\}");
        assert_eq!(open, close);
    }

    #[test]
    fn block_quote_opens_and_closes_once() {
        let out = render_body("> first\n> second\nplain");
        assert_eq!(out, "\\begin{quote}\nfirst\nsecond\n\\end{quote}\nplain\n");
    }

    #[test]
    fn display_equation_single_line() {
        let out = render_body("$$ E = mc^2 $$");
        assert_eq!(out, "\\begin{equation}\nE = mc^2\n\\end{equation}\n");
    }

    #[test]
    fn display_equation_block() {
        let out = render_body("$$\na + b\n= c\n$$");
        assert_eq!(out, "\\begin{equation}\na + b\n= c\n\\end{equation}\n");
    }

    #[test]
    fn blank_lines_collapse() {
        let out = render_body("a\n\n\n\nb");
        assert_eq!(count(&out, "\\par"), 1);
    }

    #[test]
    fn paragraph_inline_and_escaping() {
        let out = render_body("Save 50% with **bold** & *style*");
        assert_eq!(out, "Save 50\\% with \\textbf{bold} \\& \\textit{style}\n");
    }
}
