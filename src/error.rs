//! Error types for the img2docx library.
//!
//! Two distinct types reflect two distinct failure modes:
//!
//! * [`ImgToDocxError`] — **Fatal**: the conversion cannot proceed at all
//!   (unreadable input image, no extraction provider configured, output path
//!   not writable). Returned as `Err(ImgToDocxError)` from the fallible
//!   `try_convert` entry point; [`crate::convert::convert`] collapses it into
//!   a [`crate::output::ConversionResult`] for callers that want the flat
//!   success/message contract.
//!
//! * [`MarkerWarning`] — **Non-fatal**: a single line of extracted text had a
//!   malformed or conflicting marker (unclosed `**`, duplicate alignment
//!   tags). The parser recovers locally — unmatched delimiters become literal
//!   text, the first alignment tag wins — and records the warning in
//!   [`crate::output::ConversionOutput`] so callers can inspect what was
//!   resolved rather than losing the whole document to one bad line.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the img2docx library.
///
/// Per-line marker anomalies use [`MarkerWarning`] and are stored in
/// [`crate::parser::ParsedDocument`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ImgToDocxError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a JPEG or PNG image.
    #[error("File is not a JPEG or PNG image: '{path}'\nFirst bytes: {magic:?}")]
    NotAnImage { path: PathBuf, magic: [u8; 4] },

    /// The image had a valid signature but could not be decoded.
    #[error("Failed to decode image '{path}': {detail}")]
    DecodeFailed { path: PathBuf, detail: String },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("Extraction provider '{provider}' is not configured.\n{hint}")]
    ExtractorNotConfigured { provider: String, hint: String },

    /// The VLM call failed after all retries were exhausted.
    #[error("Text extraction failed after {retries} retries: {detail}")]
    ExtractionFailed { retries: u32, detail: String },

    /// The VLM responded, but with no usable text.
    #[error("Extraction returned an empty response — the image may contain no readable text")]
    EmptyExtraction,

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output document file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal marker anomaly on a single line of extracted text.
///
/// The parser resolves each of these deterministically (first-wins for
/// alignment tags, literal-fallback for unmatched delimiters) and continues;
/// the warning records what happened.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum MarkerWarning {
    /// An emphasis delimiter on the line had no matching close; the
    /// delimiter characters were kept as literal text.
    #[error("Line {line}: unmatched emphasis delimiter kept as literal text: {snippet:?}")]
    UnmatchedDelimiter { line: usize, snippet: String },

    /// More than one alignment tag led the line; the first was honoured.
    #[error("Line {line}: conflicting alignment tags, kept '{kept}', ignored '{ignored}'")]
    ConflictingAlignment {
        line: usize,
        kept: String,
        ignored: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_failed_display() {
        let e = ImgToDocxError::ExtractionFailed {
            retries: 3,
            detail: "HTTP 503".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("3 retries"), "got: {msg}");
        assert!(msg.contains("HTTP 503"));
    }

    #[test]
    fn not_an_image_display() {
        let e = ImgToDocxError::NotAnImage {
            path: PathBuf::from("/tmp/doc.gif"),
            magic: [0x47, 0x49, 0x46, 0x38],
        };
        assert!(e.to_string().contains("doc.gif"));
    }

    #[test]
    fn output_write_failed_keeps_source() {
        use std::error::Error as _;
        let e = ImgToDocxError::OutputWriteFailed {
            path: PathBuf::from("/no/such/dir/out.docx"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(e.source().is_some());
    }

    #[test]
    fn warning_display() {
        let w = MarkerWarning::ConflictingAlignment {
            line: 4,
            kept: "[CENTER]".into(),
            ignored: "[RIGHT]".into(),
        };
        assert!(w.to_string().contains("[CENTER]"));
        assert!(w.to_string().contains("[RIGHT]"));
    }
}
