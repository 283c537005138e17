//! Output types returned by the conversion entry points.
//!
//! [`ConversionOutput`] is the rich result of a successful conversion:
//! everything intermediate a caller might want to inspect (the raw marker
//! text, the parsed paragraphs, warnings, timing and token stats).
//!
//! [`ConversionResult`] is the flat boundary contract — success flag, one
//! message, and the output path when it exists. It is what
//! [`crate::convert::convert`] hands to callers that never want to handle a
//! Rust error type (CLIs wrapping the library, FFI surfaces, job runners).

use crate::document::ParagraphRecord;
use crate::error::MarkerWarning;
use serde::Serialize;
use std::path::PathBuf;

/// Full result of a conversion, including intermediates.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutput {
    /// The raw marker text returned by the extractor.
    pub marker_text: String,
    /// Parsed paragraphs in document order.
    pub paragraphs: Vec<ParagraphRecord>,
    /// Non-fatal marker anomalies encountered while parsing.
    pub warnings: Vec<MarkerWarning>,
    /// Where the document was written. `None` for extract-only runs.
    pub output_path: Option<PathBuf>,
    /// Accounting for the run.
    pub stats: ConversionStats,
}

/// Timing and size accounting for one conversion.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionStats {
    pub paragraph_count: usize,
    pub run_count: usize,
    pub warning_count: usize,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Retries the extraction stage needed before succeeding.
    pub extract_retries: u32,
    pub preprocess_duration_ms: u64,
    pub extract_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// The collapsed success/failure contract returned by
/// [`crate::convert::convert`].
///
/// Invariant: `success == true` implies `output_path` is set and the file
/// exists at that path.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionResult {
    pub success: bool,
    pub message: String,
    pub output_path: Option<PathBuf>,
}

impl ConversionResult {
    /// A successful result for a document written to `path`.
    pub fn ok(path: PathBuf) -> Self {
        Self {
            success: true,
            message: "Conversion completed successfully".to_string(),
            output_path: Some(path),
        }
    }

    /// A failed result carrying a human-readable reason.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            output_path: None,
        }
    }
}
