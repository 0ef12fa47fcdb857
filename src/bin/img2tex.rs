//! CLI binary for img2latex.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use img2latex::{
    ConversionConfig, ConversionProgressCallback, ConversionResult, Converter, DocumentStructure,
    DocumentTypeHint, ImageInput, ProgressCallback, Strategy,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal spinner that follows the pipeline stages.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading input…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_ocr_start(&self) {
        self.bar.set_prefix("OCR");
        self.bar.set_message("Recognising text…");
    }

    fn on_ocr_complete(&self, markdown_len: usize) {
        self.bar
            .println(format!("  {} OCR  {}", green("✓"), dim(&format!("{markdown_len} chars"))));
    }

    fn on_classified(&self, structure: &DocumentStructure) {
        self.bar.set_prefix("Classify");
        let mut facts = Vec::new();
        if structure.has_tables {
            facts.push("tables");
        }
        if structure.has_equations {
            facts.push("equations");
        }
        if structure.has_lists {
            facts.push("lists");
        }
        let doc_type = structure
            .document_type
            .map_or_else(|| "untyped".to_string(), |t| t.to_string());
        self.bar.println(format!(
            "  {} Structure  {} {}",
            green("✓"),
            doc_type,
            dim(&format!("[{}]", facts.join(", ")))
        ));
    }

    fn on_strategy(&self, strategy: Strategy) {
        self.bar.set_prefix("Render");
        self.bar.set_message(format!("{strategy} strategy…"));
    }

    fn on_conversion_complete(&self, confidence: f64, degraded: bool) {
        self.bar.finish_and_clear();
        if degraded {
            eprintln!("{} Converted with fallback  confidence {confidence:.2}", yellow("⚠"));
        } else {
            eprintln!("{} Converted  confidence {confidence:.2}", green("✔"));
        }
    }

    fn on_error(&self, _error: &str) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert an image (stdout)
  img2tex scan.png

  # Convert to file with a hint
  img2tex --hint equation formula.jpg -o formula.tex

  # Convert from URL
  img2tex https://example.com/cv.png --hint resume -o cv.tex

  # Skip OCR, convert Markdown you already have, no network
  img2tex --from-markdown --offline notes.md

  # JSON output with structure metadata and confidence
  img2tex --json page.png > result.json

ENVIRONMENT VARIABLES:
  MISTRAL_API_KEY           OCR key; also selects the mistral LLM provider
  IMG2LATEX_PROVIDER        LLM provider (mistral, openai, anthropic, ollama, …)
  IMG2LATEX_MODEL           Primary LLM model
  IMG2LATEX_FALLBACK_MODEL  Fallback LLM model
  RUST_LOG                  Log filter (overrides -v / -q)
"#;

/// Convert document images to LaTeX.
#[derive(Parser, Debug)]
#[command(
    name = "img2tex",
    version,
    about = "Convert document images to LaTeX via OCR, classification and LLMs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Image path or HTTP/HTTPS URL (a Markdown file or '-' with --from-markdown).
    input: String,

    /// Document type hint.
    #[arg(long, value_enum, default_value = "auto", env = "IMG2LATEX_HINT")]
    hint: HintArg,

    /// Write LaTeX to this file instead of stdout.
    #[arg(short, long, env = "IMG2LATEX_OUTPUT")]
    output: Option<PathBuf>,

    /// Output the full JSON result instead of LaTeX.
    #[arg(long)]
    json: bool,

    /// Treat INPUT as Markdown and skip OCR.
    #[arg(long)]
    from_markdown: bool,

    /// Use no LLM and no typesetter: rule-based rendering only.
    #[arg(long)]
    offline: bool,

    /// LLM provider (mistral, openai, anthropic, ollama, …).
    #[arg(long, env = "IMG2LATEX_PROVIDER")]
    provider: Option<String>,

    /// Primary LLM model.
    #[arg(long, env = "IMG2LATEX_MODEL")]
    model: Option<String>,

    /// Fallback LLM model, tried when the primary fails.
    #[arg(long, env = "IMG2LATEX_FALLBACK_MODEL")]
    fallback_model: Option<String>,

    /// OCR model.
    #[arg(long)]
    ocr_model: Option<String>,

    /// Markdown→LaTeX typesetter executable.
    #[arg(long, conflicts_with = "no_typesetter")]
    typesetter: Option<PathBuf>,

    /// Disable the typesetter.
    #[arg(long)]
    no_typesetter: bool,

    /// On total collaborator failure, emit the rule-based rendering instead of a stub.
    #[arg(long)]
    local_fallback: bool,

    /// Fail instead of returning a degraded document when every LLM attempt fails.
    #[arg(long)]
    fail_on_degraded: bool,

    /// Per-call OCR/LLM timeout in seconds.
    #[arg(long, env = "IMG2LATEX_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,

    /// Disable the progress spinner.
    #[arg(long)]
    no_progress: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum HintArg {
    Auto,
    Equation,
    Table,
    Resume,
    General,
}

impl From<HintArg> for DocumentTypeHint {
    fn from(v: HintArg) -> Self {
        match v {
            HintArg::Auto => DocumentTypeHint::Auto,
            HintArg::Equation => DocumentTypeHint::Equation,
            HintArg::Table => DocumentTypeHint::Table,
            HintArg::Resume => DocumentTypeHint::Resume,
            HintArg::General => DocumentTypeHint::General,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // INFO logs would fight with the spinner, so it gets error-only.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build converter ──────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;
    let converter = Converter::new(config).context("Failed to set up converter")?;
    let hint = DocumentTypeHint::from(cli.hint);

    // ── Run conversion ───────────────────────────────────────────────────
    let outcome = if cli.from_markdown {
        let markdown = read_markdown(&cli.input)?;
        converter.convert_markdown(&markdown, hint, None).await
    } else {
        converter
            .convert(ImageInput::from_arg(&cli.input), hint)
            .await
    };
    let result = outcome.context("Conversion failed")?;

    write_result(&cli, &result)?;

    if !cli.quiet && !show_progress {
        eprintln!(
            "Converted with {} strategy, confidence {:.2}, {}ms{}",
            result.strategy,
            result.confidence,
            result.stats.total_duration_ms,
            result
                .degradation
                .as_deref()
                .map(|d| format!(" (degraded: {d})"))
                .unwrap_or_default()
        );
    }

    Ok(())
}

/// Map CLI args onto `ConversionConfig`, starting from the environment.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::from_env()
        .into_builder()
        .api_timeout_secs(cli.api_timeout)
        .local_fallback(cli.local_fallback)
        .fail_on_degraded(cli.fail_on_degraded);

    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref model) = cli.model {
        builder = builder.primary_model(model.clone());
    }
    if let Some(ref model) = cli.fallback_model {
        builder = builder.fallback_model(Some(model.clone()));
    }
    if let Some(ref model) = cli.ocr_model {
        builder = builder.ocr_model(model.clone());
    }
    if cli.no_typesetter {
        builder = builder.typesetter(None);
    } else if let Some(ref program) = cli.typesetter {
        builder = builder.typesetter(Some(program.clone()));
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    let mut config = builder.build().context("Invalid configuration")?;

    if cli.offline {
        config.provider_name = None;
        config.typesetter = None;
    }

    Ok(config)
}

fn read_markdown(input: &str) -> Result<String> {
    if input == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read Markdown from stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(input).with_context(|| format!("Failed to read Markdown from {input}"))
}

fn write_result(cli: &Cli, result: &ConversionResult) -> Result<()> {
    match cli.output {
        Some(ref path) => {
            result.write_to(path, cli.json)?;
            if !cli.quiet {
                eprintln!("  →  {}", bold(&path.display().to_string()));
            }
        }
        None => {
            let text = if cli.json {
                serde_json::to_string_pretty(result).context("Failed to serialise output")?
            } else {
                result.latex_document.clone()
            };
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(text.as_bytes())
                .context("Failed to write to stdout")?;
            if !text.ends_with('\n') {
                handle.write_all(b"\n").ok();
            }
        }
    }
    Ok(())
}
