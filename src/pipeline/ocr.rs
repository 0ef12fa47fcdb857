//! OCR collaborator: image reference → Markdown (+ optional layout hints).
//!
//! [`OcrEngine`] is the seam; [`MistralOcr`] is the production implementation
//! talking to Mistral's document OCR endpoint. Only the first page of the
//! response is used.

use crate::error::{Collaborator, CollaboratorError};
use crate::pipeline::input::ImageRef;
use crate::structure::{Layout, LayoutHints};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Default OCR endpoint.
pub const DEFAULT_OCR_ENDPOINT: &str = "https://api.mistral.ai/v1/ocr";
/// Default OCR model.
pub const DEFAULT_OCR_MODEL: &str = "mistral-ocr-latest";

/// Result of one OCR call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrOutput {
    pub markdown: String,
    pub layout_hints: Option<LayoutHints>,
}

/// Anything that can turn an image reference into Markdown.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn process(&self, image: &ImageRef) -> Result<OcrOutput, CollaboratorError>;
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct OcrRequest<'a> {
    model: &'a str,
    document: OcrDocument<'a>,
}

#[derive(Debug, Serialize)]
struct OcrDocument<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    image_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    #[serde(default)]
    pages: Vec<OcrPage>,
}

#[derive(Debug, Deserialize)]
struct OcrPage {
    #[serde(default)]
    markdown: String,
    #[serde(default)]
    tables: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    equations: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    layout: Option<String>,
}

impl OcrResponse {
    fn into_output(self) -> OcrOutput {
        let Some(page) = self.pages.into_iter().next() else {
            return OcrOutput::default();
        };
        let hints = LayoutHints {
            tables: page.tables,
            equations: page.equations,
            layout: page.layout.as_deref().and_then(|l| l.parse::<Layout>().ok()),
        };
        OcrOutput {
            markdown: page.markdown,
            layout_hints: (!hints.is_empty()).then_some(hints),
        }
    }
}

// ── Mistral implementation ───────────────────────────────────────────────

/// Mistral document OCR over HTTPS.
pub struct MistralOcr {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    timeout_secs: u64,
}

impl MistralOcr {
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, CollaboratorError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| CollaboratorError::Ocr {
                detail: e.to_string(),
            })?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
            timeout_secs,
        })
    }
}

#[async_trait]
impl OcrEngine for MistralOcr {
    async fn process(&self, image: &ImageRef) -> Result<OcrOutput, CollaboratorError> {
        info!("Running OCR with {} on {:?}", self.model, image);

        let body = OcrRequest {
            model: &self.model,
            document: OcrDocument {
                kind: "image_url",
                image_url: image.as_str(),
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CollaboratorError::Timeout {
                        collaborator: Collaborator::Ocr,
                        secs: self.timeout_secs,
                    }
                } else {
                    CollaboratorError::Ocr {
                        detail: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Ocr {
                detail: format!("HTTP {status}: {}", truncate(&detail, 200)),
            });
        }

        let parsed: OcrResponse = response.json().await.map_err(|e| CollaboratorError::Ocr {
            detail: format!("malformed response: {e}"),
        })?;
        let output = parsed.into_output();
        debug!("OCR returned {} chars of Markdown", output.markdown.len());
        Ok(output)
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_wire_shape() {
        let body = OcrRequest {
            model: DEFAULT_OCR_MODEL,
            document: OcrDocument {
                kind: "image_url",
                image_url: "https://x/y.png",
            },
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["model"], "mistral-ocr-latest");
        assert_eq!(v["document"]["type"], "image_url");
        assert_eq!(v["document"]["image_url"], "https://x/y.png");
    }

    #[test]
    fn first_page_markdown_is_used() {
        let resp: OcrResponse = serde_json::from_value(json!({
            "pages": [
                {"index": 0, "markdown": "# One", "images": [], "dimensions": {"dpi": 200}},
                {"index": 1, "markdown": "# Two"}
            ],
            "model": "mistral-ocr-latest"
        }))
        .unwrap();
        let out = resp.into_output();
        assert_eq!(out.markdown, "# One");
        assert!(out.layout_hints.is_none());
    }

    #[test]
    fn layout_fields_become_hints() {
        let resp: OcrResponse = serde_json::from_value(json!({
            "pages": [{"markdown": "x", "tables": [{"id": "t0"}], "layout": "multi-column"}]
        }))
        .unwrap();
        let hints = resp.into_output().layout_hints.unwrap();
        assert_eq!(hints.tables.unwrap().len(), 1);
        assert_eq!(hints.layout, Some(Layout::MultiColumn));
        assert!(hints.equations.is_none());
    }

    #[test]
    fn no_pages_yields_empty_markdown() {
        let resp: OcrResponse = serde_json::from_value(json!({"pages": []})).unwrap();
        assert_eq!(resp.into_output(), OcrOutput::default());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("hi", 10), "hi");
    }
}
