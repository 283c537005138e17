//! Progress-callback trait for per-stage conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline moves through its stages.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a channel, a WebSocket, or a terminal spinner without
//! the library knowing anything about how the host application communicates.
//! The trait is `Send + Sync`; all methods default to no-ops so callers only
//! override what they care about.

use std::sync::Arc;

/// The pipeline stages a conversion moves through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Image normalisation (grayscale, denoise, contrast, size cap).
    Preprocess,
    /// The VLM extraction call.
    Extract,
    /// Marker parsing into paragraph records.
    Parse,
    /// Docx assembly and file write.
    Assemble,
}

impl Stage {
    /// Human-readable stage label for log lines and spinners.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Preprocess => "Preprocessing image",
            Stage::Extract => "Extracting text",
            Stage::Parse => "Parsing formatting",
            Stage::Assemble => "Assembling document",
        }
    }
}

/// Called by the conversion pipeline as it enters and leaves each stage.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before the first stage runs.
    fn on_conversion_start(&self) {}

    /// Called as a stage begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage finishes successfully.
    ///
    /// `detail` is a short human-readable summary, e.g. "14 paragraphs".
    fn on_stage_complete(&self, stage: Stage, detail: &str) {
        let _ = (stage, detail);
    }

    /// Called once after the pipeline finishes or fails.
    fn on_conversion_complete(&self, success: bool) {
        let _ = success;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
