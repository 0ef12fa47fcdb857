//! End-to-end tests against the live OCR and LLM services.
//!
//! Gated behind the `E2E_ENABLED` environment variable so they do not run in
//! CI unless explicitly requested. They also need `MISTRAL_API_KEY`, and the
//! image tests need sample files in `./test_cases/`.
//!
//! Run with:
//!   E2E_ENABLED=1 MISTRAL_API_KEY=... cargo test --test e2e -- --nocapture

use img2latex::{ConversionConfig, Converter, DocumentTypeHint, ImageInput, Strategy};
use std::path::PathBuf;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

/// Skip unless E2E_ENABLED and MISTRAL_API_KEY are set; yields the config.
macro_rules! e2e_config_or_skip {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let config = ConversionConfig::from_env();
        if config.ocr_api_key.is_none() {
            println!("SKIP — MISTRAL_API_KEY not set");
            return;
        }
        config
    }};
}

/// Skip if the sample image is missing.
macro_rules! sample_or_skip {
    ($name:expr) => {{
        let p = test_cases_dir().join($name);
        if !p.exists() {
            println!("SKIP — test file not found: {}", p.display());
            return;
        }
        p
    }};
}

/// Assert the LaTeX passes basic well-formedness checks.
fn assert_latex_document(latex: &str, context: &str) {
    assert!(
        latex.trim_start().starts_with("\\documentclass"),
        "[{context}] document must start with \\documentclass"
    );
    assert!(
        latex.trim_end().ends_with("\\end{document}"),
        "[{context}] document must end with \\end{{document}}"
    );
    assert_eq!(
        latex.matches("\\begin{document}").count(),
        1,
        "[{context}] exactly one \\begin{{document}}"
    );
    assert!(
        !latex.trim_start().starts_with("```"),
        "[{context}] output must not be wrapped in a code fence"
    );
}

// ── Live tests ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_convert_resume_image() {
    let config = e2e_config_or_skip!();
    let path = sample_or_skip!("resume.png");

    let converter = Converter::new(config).expect("converter");
    let result = converter
        .convert(ImageInput::Path(path), DocumentTypeHint::Resume)
        .await
        .expect("conversion should succeed");

    assert_latex_document(&result.latex_document, "resume");
    assert_eq!(result.strategy, Strategy::Resume);
    println!(
        "resume: {} chars, confidence {:.2}, degraded {}",
        result.latex_document.len(),
        result.confidence,
        result.degraded
    );
}

#[tokio::test]
async fn test_convert_equation_image() {
    let config = e2e_config_or_skip!();
    let path = sample_or_skip!("equation.png");

    let converter = Converter::new(config).expect("converter");
    let result = converter
        .convert(ImageInput::Path(path), DocumentTypeHint::Equation)
        .await
        .expect("conversion should succeed");

    assert_latex_document(&result.latex_document, "equation");
    assert!(result.structure_metadata.has_equations);
}

#[tokio::test]
async fn test_convert_json_serialisable() {
    let config = e2e_config_or_skip!();
    let path = sample_or_skip!("table.png");

    let converter = Converter::new(config).expect("converter");
    let result = converter
        .convert(ImageInput::Path(path), DocumentTypeHint::Auto)
        .await
        .expect("conversion should succeed");

    let json = serde_json::to_string_pretty(&result).expect("serialise");
    assert!(json.contains("\"latexDocument\""));
    assert!(json.contains("\"structureMetadata\""));
}

#[tokio::test]
async fn test_bad_ocr_key_is_upstream_unavailable() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
        return;
    }
    let path = sample_or_skip!("table.png");

    let config = ConversionConfig::builder()
        .ocr_api_key("invalid-key")
        .api_timeout_secs(30)
        .build()
        .unwrap();
    let err = Converter::new(config)
        .unwrap()
        .convert(ImageInput::Path(path), DocumentTypeHint::Auto)
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 502);
    assert!(!err.to_string().contains("invalid-key"));
}

// ── Offline checks (always run) ──────────────────────────────────────────────

#[test]
fn test_default_config_builds_without_network() {
    let converter = Converter::new(ConversionConfig::default()).expect("no provider, no client error");
    assert!(converter.config().ocr_api_key.is_none());
}

#[test]
fn test_converter_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Converter>();
}
