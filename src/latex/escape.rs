//! LaTeX escaping and inline Markdown transforms.
//!
//! Escaping is applied to raw text fragments only. Inline constructs (links,
//! emphasis, code, `$…$` math) are located first with a single tokenising
//! regex; the text *between* matches is escaped, and the braces of the
//! emitted control sequences are never touched a second time.

use once_cell::sync::Lazy;
use regex::Regex;

/// Escape LaTeX special characters in plain text.
///
/// Text containing none of the specials comes back unchanged.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\textbackslash{}"),
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            '~' => out.push_str("\\textasciitilde{}"),
            '^' => out.push_str("\\textasciicircum{}"),
            '\u{00A0}' => out.push('~'),
            '\u{2013}' => out.push_str("--"),
            '\u{2014}' => out.push_str("---"),
            '\u{00AB}' => out.push_str("\\guillemotleft{}"),
            '\u{00BB}' => out.push_str("\\guillemotright{}"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape the few characters that break `\href{…}` arguments.
fn escape_url(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    for c in url.chars() {
        match c {
            '%' | '#' => {
                out.push('\\');
                out.push(c);
            }
            '\\' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Escape a file path for a `\includegraphics{…}` argument.
///
/// Backslash separators become `/`; characters that would unbalance or
/// comment out the argument are escaped.
pub fn escape_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        match c {
            '%' | '#' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            '\\' => out.push('/'),
            _ => out.push(c),
        }
    }
    out
}

// Alternation order matters at equal start offsets: `**` before `*`.
// Inline math follows the pandoc rule (no space just inside the dollars) so
// prices like "$5 and $10" stay literal.
static RE_INLINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\$(?P<math>[^$\s](?:[^$\n]*?[^$\s])?)\$",
        r"|\[(?P<text>[^\]]*)\]\((?P<url>[^)\s]*)\)",
        r"|\*\*(?P<bold>.+?)\*\*",
        r"|\*(?P<italic>.+?)\*",
        r"|`(?P<code>[^`]+)`",
    ))
    .unwrap()
});

/// Apply inline transforms (math, links, bold, italic, code) and escape the
/// remaining raw text.
pub fn render_inline(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut last = 0;

    for caps in RE_INLINE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&escape(&text[last..whole.start()]));

        if let Some(math) = caps.name("math") {
            out.push('$');
            out.push_str(math.as_str());
            out.push('$');
        } else if let Some(label) = caps.name("text") {
            let url = caps.name("url").map_or("", |m| m.as_str());
            out.push_str(&format!(
                "\\href{{{}}}{{{}}}",
                escape_url(url),
                render_inline(label.as_str())
            ));
        } else if let Some(bold) = caps.name("bold") {
            out.push_str(&format!("\\textbf{{{}}}", render_inline(bold.as_str())));
        } else if let Some(italic) = caps.name("italic") {
            out.push_str(&format!("\\textit{{{}}}", render_inline(italic.as_str())));
        } else if let Some(code) = caps.name("code") {
            out.push_str(&format!("\\texttt{{{}}}", escape(code.as_str())));
        }

        last = whole.end();
    }

    out.push_str(&escape(&text[last..]));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_specials() {
        assert_eq!(escape("50% & $3 #1 a_b {x}"), r"50\% \& \$3 \#1 a\_b \{x\}");
        assert_eq!(escape(r"C:\dir"), r"C:\textbackslash{}dir");
        assert_eq!(escape("a~b^c"), r"a\textasciitilde{}b\textasciicircum{}c");
    }

    #[test]
    fn escapes_typographic_characters() {
        assert_eq!(escape("1\u{2013}2\u{2014}3"), "1--2---3");
        assert_eq!(escape("\u{00AB}hi\u{00BB}"), r"\guillemotleft{}hi\guillemotright{}");
        assert_eq!(escape("a\u{00A0}b"), "a~b");
    }

    #[test]
    fn graphics_paths_keep_underscores() {
        assert_eq!(escape_path("img/chart_1.png"), "img/chart_1.png");
        assert_eq!(escape_path("a%b#c{d}.png"), r"a\%b\#c\{d\}.png");
        assert_eq!(escape_path(r"scans\page.png"), "scans/page.png");
    }

    #[test]
    fn plain_text_is_a_fixed_point() {
        let plain = "Nothing special here, just words. (And parens!)";
        assert_eq!(escape(plain), plain);
        assert_eq!(escape(&escape(plain)), plain);
    }

    #[test]
    fn bold_braces_are_not_escaped() {
        assert_eq!(render_inline("**Bold** text"), r"\textbf{Bold} text");
    }

    #[test]
    fn italic_and_code() {
        assert_eq!(render_inline("an *emph* word"), r"an \textit{emph} word");
        assert_eq!(render_inline("call `f_x()`"), r"call \texttt{f\_x()}");
    }

    #[test]
    fn nested_emphasis() {
        assert_eq!(
            render_inline("**a *b* c**"),
            r"\textbf{a \textit{b} c}"
        );
    }

    #[test]
    fn links_become_href() {
        assert_eq!(
            render_inline("see [the docs](https://x.org/a#b) now"),
            r"see \href{https://x.org/a\#b}{the docs} now"
        );
    }

    #[test]
    fn inline_math_passes_through() {
        assert_eq!(render_inline("where $x_i^2$ holds"), "where $x_i^2$ holds");
    }

    #[test]
    fn prices_are_not_math() {
        assert_eq!(render_inline("$5 and $10"), r"\$5 and \$10");
    }

    #[test]
    fn text_around_tokens_is_escaped() {
        assert_eq!(render_inline("50% **off** & more"), r"50\% \textbf{off} \& more");
    }
}
