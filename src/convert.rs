//! Conversion entry points.
//!
//! [`try_convert`] is the fallible, fully-typed API: it wires the pipeline
//! stages together and returns either a rich [`ConversionOutput`] or an
//! [`ImgToDocxError`]. [`convert`] wraps it in the flat
//! [`ConversionResult`] contract — success flag, message, output path — so
//! callers that only care about "did it work, where is the file" never
//! touch a Rust error type. Every stage failure collapses there; nothing
//! propagates an uncaught fault past the boundary.
//!
//! Temporary intermediates (a downloaded URL input) live in a `TempDir`
//! owned by the resolved input, so they are removed on every exit path —
//! success, error, or panic. The normalised image itself never touches
//! disk; it flows through the pipeline as an in-memory buffer.

use crate::assembler;
use crate::config::ConversionConfig;
use crate::error::ImgToDocxError;
use crate::output::{ConversionOutput, ConversionResult, ConversionStats};
use crate::parser;
use crate::pipeline::extract::{TextExtractor, VlmExtractor};
use crate::pipeline::{encode, input, preprocess};
use crate::progress::Stage;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Default extraction model when none is configured. Gemini's flash tier
/// is cheap, fast, and strong at OCR.
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Convert a scanned image (local path or HTTP/HTTPS URL) to a `.docx` file.
///
/// This is the boundary contract: any failure from any stage is collapsed
/// into `ConversionResult { success: false, message }`. On success the
/// result carries `output_path` and the file is guaranteed to exist there.
pub async fn convert(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> ConversionResult {
    match try_convert(input_str.as_ref(), output_path.as_ref(), config).await {
        Ok(_) => ConversionResult::ok(output_path.as_ref().to_path_buf()),
        Err(e) => {
            warn!("Conversion failed: {}", e);
            ConversionResult::failed(e.to_string())
        }
    }
}

/// Fallible conversion returning the full [`ConversionOutput`].
///
/// # Errors
/// - Input errors (missing file, bad magic bytes, failed download)
/// - Extraction errors (provider not configured, API failure, empty text)
/// - Output errors (target path not writable)
pub async fn try_convert(
    input_str: &str,
    output_path: &Path,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ImgToDocxError> {
    let result = try_convert_inner(input_str, output_path, config).await;
    finish(config, result.is_ok());
    result
}

async fn try_convert_inner(
    input_str: &str,
    output_path: &Path,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ImgToDocxError> {
    let mut output = run_extraction_stages(input_str, config).await?;

    stage(config, Stage::Assemble);
    assembler::assemble(&output.paragraphs, output_path)?;
    stage_done(
        config,
        Stage::Assemble,
        &format!("{} paragraphs", output.paragraphs.len()),
    );

    output.output_path = Some(output_path.to_path_buf());

    info!(
        "Conversion complete: {} paragraphs, {}ms total → {}",
        output.stats.paragraph_count,
        output.stats.total_duration_ms,
        output_path.display()
    );
    Ok(output)
}

/// Run the pipeline up to and including parsing, returning the marker text
/// and paragraph records without writing a document.
///
/// Used by the CLI's text-only mode and by callers that want the structured
/// content for their own rendering.
pub async fn extract_only(
    input_str: &str,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ImgToDocxError> {
    let result = run_extraction_stages(input_str, config).await;
    finish(config, result.is_ok());
    result
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> ConversionResult {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => rt.block_on(convert(input_str, output_path, config)),
        Err(e) => ConversionResult::failed(format!("Failed to create tokio runtime: {e}")),
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Input → preprocess → encode → extract → parse.
async fn run_extraction_stages(
    input_str: &str,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ImgToDocxError> {
    let total_start = Instant::now();
    info!("Starting conversion: {}", input_str);
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start();
    }

    // Resolve the extractor first: a missing credential should surface
    // before any image work, not after.
    let extractor = resolve_extractor(config)?;

    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;

    // ── Preprocess ───────────────────────────────────────────────────────
    stage(config, Stage::Preprocess);
    let preprocess_start = Instant::now();
    let image = preprocess::load_and_normalize(resolved.path(), config).await?;
    let preprocess_duration_ms = preprocess_start.elapsed().as_millis() as u64;
    stage_done(
        config,
        Stage::Preprocess,
        &format!("{}x{} px", image.width(), image.height()),
    );

    // ── Extract ──────────────────────────────────────────────────────────
    stage(config, Stage::Extract);
    let image_data = encode::encode_image(&image)?;
    let extract_start = Instant::now();
    let extraction = extractor.extract(&image_data).await?;
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;
    stage_done(
        config,
        Stage::Extract,
        &format!("{} chars", extraction.marker_text.len()),
    );

    // ── Parse ────────────────────────────────────────────────────────────
    stage(config, Stage::Parse);
    let parsed = parser::parse(&extraction.marker_text);
    for w in &parsed.warnings {
        debug!("Marker warning: {}", w);
    }
    stage_done(
        config,
        Stage::Parse,
        &format!("{} paragraphs", parsed.paragraphs.len()),
    );

    let stats = ConversionStats {
        paragraph_count: parsed.paragraphs.len(),
        run_count: parsed.paragraphs.iter().map(|p| p.runs.len()).sum(),
        warning_count: parsed.warnings.len(),
        input_tokens: extraction.input_tokens as u64,
        output_tokens: extraction.output_tokens as u64,
        extract_retries: extraction.retries,
        preprocess_duration_ms,
        extract_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    Ok(ConversionOutput {
        marker_text: extraction.marker_text,
        paragraphs: parsed.paragraphs,
        warnings: parsed.warnings,
        output_path: None,
        stats,
    })
}

/// Instantiate a named provider with the given model.
fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, ImgToDocxError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ImgToDocxError::ExtractorNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the text extractor, from most-specific to least-specific.
///
/// 1. **Pre-built extractor** (`config.extractor`) — the caller supplied the
///    whole capability; test fixtures come in here.
/// 2. **Pre-built provider** (`config.provider`) — wrapped in the standard
///    [`VlmExtractor`] retry shell.
/// 3. **Named provider + model** (`config.provider_name`) — the factory reads
///    the matching API key (`GEMINI_API_KEY`, `OPENAI_API_KEY`, …) from the
///    environment.
/// 4. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`) —
///    honoured before auto-detection so an execution-environment choice wins
///    even when several API keys are present.
/// 5. **Gemini preference** — when `GEMINI_API_KEY` is set we default to
///    Gemini with [`DEFAULT_MODEL`], the stack this tool was tuned on.
/// 6. **Full auto-detection** (`ProviderFactory::from_env`) — scan all known
///    API key variables and pick the first available provider.
fn resolve_extractor(
    config: &ConversionConfig,
) -> Result<Arc<dyn TextExtractor>, ImgToDocxError> {
    if let Some(ref extractor) = config.extractor {
        return Ok(Arc::clone(extractor));
    }

    let provider = resolve_provider(config)?;
    Ok(Arc::new(VlmExtractor::new(provider, config)))
}

fn resolve_provider(
    config: &ConversionConfig,
) -> Result<Arc<dyn LLMProvider>, ImgToDocxError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_vision_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_vision_provider(&prov, &model);
        }
    }

    if let Ok(key) = std::env::var("GEMINI_API_KEY") {
        if !key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_vision_provider("gemini", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ImgToDocxError::ExtractorNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY, OPENAI_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

fn stage(config: &ConversionConfig, s: Stage) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(s);
    }
}

fn stage_done(config: &ConversionConfig, s: Stage, detail: &str) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_complete(s, detail);
    }
}

fn finish(config: &ConversionConfig, success: bool) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(success);
    }
}
