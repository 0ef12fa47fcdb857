//! Result types returned by a conversion.

use crate::error::Img2LatexError;
use crate::strategy::Strategy;
use crate::structure::DocumentStructure;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// Outcome of one successful conversion.
///
/// Serialises with camelCase keys (`latexDocument`, `structureMetadata`,
/// `confidence`, …) so it can be returned as-is from a request handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    /// Complete LaTeX document, `\documentclass` through `\end{document}`.
    pub latex_document: String,

    /// Classifier output the strategy was chosen from.
    pub structure_metadata: DocumentStructure,

    /// Classification confidence; never reflects rendering success.
    pub confidence: f64,

    /// Strategy that produced `latex_document`.
    pub strategy: Strategy,

    /// True when the document is a stub or a local fallback rendering.
    #[serde(default)]
    pub degraded: bool,

    /// Why the result is degraded, e.g. `"LLM service unavailable"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degradation: Option<String>,

    /// Markdown as returned by OCR (or as passed to `convert_markdown`).
    pub ocr_markdown: String,

    pub stats: ConversionStats,
}

impl ConversionResult {
    /// Write the LaTeX document, or the whole result as pretty JSON, to `path`.
    ///
    /// Writes atomically: a temp file in the target directory is persisted
    /// over the destination, so a failed run never leaves a partial file.
    /// Missing parent directories are created.
    pub fn write_to(&self, path: impl AsRef<Path>, as_json: bool) -> Result<(), Img2LatexError> {
        let contents = if as_json {
            serde_json::to_string_pretty(self)
                .map_err(|e| Img2LatexError::Internal(format!("Failed to serialise result: {e}")))?
        } else {
            self.latex_document.clone()
        };
        write_atomic(path.as_ref(), &contents)
    }
}

fn write_atomic(path: &Path, contents: &str) -> Result<(), Img2LatexError> {
    let write_err = |source: std::io::Error| Img2LatexError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(contents.as_bytes()).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

/// Wall-clock timings for one conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionStats {
    /// Zero when OCR was skipped.
    pub ocr_duration_ms: u64,
    /// Strategy selection and rendering, collaborators included.
    pub render_duration_ms: u64,
    pub total_duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ConversionResult {
        ConversionResult {
            latex_document: "\\documentclass{article}".into(),
            structure_metadata: DocumentStructure::default(),
            confidence: 0.9,
            strategy: Strategy::Direct,
            degraded: false,
            degradation: None,
            ocr_markdown: "text".into(),
            stats: ConversionStats::default(),
        }
    }

    #[test]
    fn serialises_camel_case() {
        let result = sample();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["confidence"], 0.9);
        assert_eq!(json["strategy"], "direct");
        assert_eq!(json["structureMetadata"]["hasTables"], false);
        assert_eq!(json["structureMetadata"]["layout"], "simple");
        assert!(json["latexDocument"].is_string());
        assert!(json.get("degradation").is_none());
        assert_eq!(json["stats"]["totalDurationMs"], 0);
    }

    #[test]
    fn write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.tex");
        sample().write_to(&path, false).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "\\documentclass{article}");
    }

    #[test]
    fn write_json_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        std::fs::write(&path, "stale").unwrap();

        sample().write_to(&path, true).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["strategy"], "direct");
        assert_eq!(written["latexDocument"], "\\documentclass{article}");
    }

    #[test]
    fn write_into_a_file_path_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();

        let err = sample().write_to(blocker.join("out.tex"), false).unwrap_err();
        assert!(matches!(err, Img2LatexError::OutputWriteFailed { .. }));
    }
}
