//! CLI binary for img2docx.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use img2docx::{
    extract_only, try_convert, ConversionConfig, ConversionProgressCallback, ProgressCallback,
    Stage,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner that names the current stage and a
/// log line per completed stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self) {
        self.bar.set_message("Starting…");
    }

    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_message(format!("{}…", stage.label()));
    }

    fn on_stage_complete(&self, stage: Stage, detail: &str) {
        self.bar
            .println(format!("  {} {}  {}", green("✓"), stage.label(), dim(detail)));
    }

    fn on_conversion_complete(&self, _success: bool) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic conversion
  img2docx scan.jpg

  # Explicit output path
  img2docx scan.jpg -o letter.docx

  # Use a specific model
  img2docx --provider openai --model gpt-4.1-nano scan.png

  # Convert from URL
  img2docx https://example.com/receipt.png -o receipt.docx

  # Show the extracted marker text without writing a document
  img2docx --text-only scan.jpg

  # Structured JSON output (paragraphs, warnings, stats)
  img2docx --json scan.jpg -o scan.docx > run.json

  # Skip image normalisation for clean renders
  img2docx --no-preprocess screenshot.png

SUPPORTED PROVIDERS & MODELS:
  Provider     Model                    Vision
  ─────────    ───────────────────────  ──────
  gemini       gemini-2.5-flash (default)  ✓
  gemini       gemini-2.5-pro              ✓
  openai       gpt-4.1-nano                ✓
  openai       gpt-4o                      ✓
  anthropic    claude-sonnet-4-20250514    ✓
  ollama       llava, llama3.2-vision      ✓

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (preferred when set)
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (gemini, openai, anthropic, ollama)
  EDGEQUAKE_MODEL         Override model ID

SETUP:
  1. Set API key:     export GEMINI_API_KEY=...
  2. Convert:         img2docx scan.jpg -o scan.docx
"#;

/// Convert scanned document images to formatted Word documents.
#[derive(Parser, Debug)]
#[command(
    name = "img2docx",
    version,
    about = "Convert scanned document images to formatted Word documents using Vision LLMs",
    long_about = "Convert a scanned document image (JPG/PNG, local file or URL) to a formatted \
.docx, preserving bold, italic, headings, and alignment. Supports Google Gemini, OpenAI, \
Anthropic, and any OpenAI-compatible endpoint.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local image file path (JPG/PNG) or HTTP/HTTPS URL.
    input: String,

    /// Write the document to this path (default: input name with .docx).
    #[arg(short, long, env = "IMG2DOCX_OUTPUT")]
    output: Option<PathBuf>,

    /// LLM model ID (e.g. gemini-2.5-flash, gpt-4.1-nano).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: gemini, openai, anthropic, ollama.
    #[arg(long, env = "EDGEQUAKE_LLM_PROVIDER")]
    provider: Option<String>,

    /// Print the extracted marker text instead of writing a document.
    #[arg(long)]
    text_only: bool,

    /// Output structured JSON (paragraphs, warnings, stats) to stdout.
    #[arg(long, env = "IMG2DOCX_JSON")]
    json: bool,

    /// Skip image normalisation (grayscale/denoise/contrast).
    #[arg(long, env = "IMG2DOCX_NO_PREPROCESS")]
    no_preprocess: bool,

    /// Maximum image dimension in pixels before downscaling.
    #[arg(long, env = "IMG2DOCX_MAX_DIMENSION", default_value_t = 2000)]
    max_dimension: u32,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "IMG2DOCX_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Max LLM output tokens.
    #[arg(long, env = "IMG2DOCX_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "IMG2DOCX_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Retries on transient extraction failure (default: fail immediately).
    #[arg(long, env = "IMG2DOCX_MAX_RETRIES", default_value_t = 0)]
    max_retries: u32,

    /// Disable the progress spinner.
    #[arg(long, env = "IMG2DOCX_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "IMG2DOCX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "IMG2DOCX_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "IMG2DOCX_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Extraction call timeout in seconds.
    #[arg(long, env = "IMG2DOCX_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the spinner is active; the
    // stage log lines provide all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.text_only;
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

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb: ProgressCallback = CliProgressCallback::new();
        Some(cb)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb).await?;

    // ── Text-only mode ───────────────────────────────────────────────────
    if cli.text_only {
        let output = extract_only(&cli.input, &config)
            .await
            .context("Extraction failed")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&output).context("Failed to serialise output")?
            );
        } else {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(output.marker_text.as_bytes())
                .context("Failed to write to stdout")?;
            if !output.marker_text.ends_with('\n') {
                handle.write_all(b"\n").ok();
            }
        }
        return Ok(());
    }

    // ── Run conversion ───────────────────────────────────────────────────
    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.input));

    let output = try_convert(&cli.input, &output_path, &config)
        .await
        .context("Conversion failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialise output")?
        );
        return Ok(());
    }

    if !cli.quiet {
        for w in &output.warnings {
            eprintln!("  {} {}", cyan("⚠"), dim(&w.to_string()));
        }
        eprintln!(
            "{}  {} paragraphs  {}ms  →  {}",
            green("✔"),
            output.stats.paragraph_count,
            output.stats.total_duration_ms,
            bold(&output_path.display().to_string()),
        );
        eprintln!(
            "   {} tokens in  /  {} tokens out",
            dim(&output.stats.input_tokens.to_string()),
            dim(&output.stats.output_tokens.to_string()),
        );
        if output.stats.extract_retries > 0 {
            eprintln!(
                "   {}",
                red(&format!(
                    "{} extraction retries were needed",
                    output.stats.extract_retries
                ))
            );
        }
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let system_prompt = if let Some(ref path) = cli.system_prompt {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read system prompt from {:?}", path))?,
        )
    } else {
        None
    };

    let mut builder = ConversionConfig::builder()
        .preprocess(!cli.no_preprocess)
        .max_image_pixels(cli.max_dimension)
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .max_retries(cli.max_retries)
        .download_timeout_secs(cli.download_timeout)
        .api_timeout_secs(cli.api_timeout);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    let mut config = builder.build().context("Invalid configuration")?;

    // Optional fields without dedicated builder defaults
    config.model = cli.model.clone();
    config.provider_name = cli.provider.clone();
    config.system_prompt = system_prompt;

    Ok(config)
}

/// Derive the default output path from the input: the input's file stem with
/// a `.docx` extension, in the current directory for URL inputs.
fn default_output_path(input: &str) -> PathBuf {
    let stem = if input.starts_with("http://") || input.starts_with("https://") {
        input
            .rsplit('/')
            .next()
            .and_then(|seg| seg.split('.').next())
            .filter(|s| !s.is_empty())
            .unwrap_or("output")
            .to_string()
    } else {
        PathBuf::from(input)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string())
    };
    PathBuf::from(format!("{stem}.docx"))
}
