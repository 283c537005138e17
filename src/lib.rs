//! # img2docx
//!
//! Convert scanned document images to formatted Word documents using Vision
//! Language Models (VLMs).
//!
//! ## Why this crate?
//!
//! Traditional OCR tools give you a flat wall of text — bold, italics,
//! headings, and alignment are gone, and reconstructing them by hand defeats
//! the point of scanning. Instead this crate lets a VLM read the page as a
//! human would and transcribe it with lightweight formatting markers, then
//! parses those markers into structured paragraphs and renders a real
//! `.docx` with the emphasis, heading levels, and alignment of the original.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Image (JPG/PNG, path or URL)
//!  │
//!  ├─ 1. Input       resolve local file or download from URL
//!  ├─ 2. Preprocess  grayscale + denoise + contrast (CPU-bound, spawn_blocking)
//!  ├─ 3. Encode      PNG → base64 ImageData
//!  ├─ 4. Extract     VLM call (gemini-2.5-flash / gpt-4.1-nano / …) → marker text
//!  ├─ 5. Parse       marker grammar → ParagraphRecord sequence
//!  └─ 6. Assemble    docx with styles, alignment, bold/italic runs
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use img2docx::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     // Provider auto-detected from GEMINI_API_KEY / OPENAI_API_KEY / …
//!     let config = ConversionConfig::default();
//!     let result = convert("scan.jpg", "scan.docx", &config).await;
//!     if result.success {
//!         println!("Wrote {}", result.output_path.unwrap().display());
//!     } else {
//!         eprintln!("Failed: {}", result.message);
//!     }
//! }
//! ```
//!
//! ## Marker Grammar
//!
//! The wire contract between the extraction model and the parser:
//!
//! | Marker | Meaning |
//! |--------|---------|
//! | `#` / `##` / `###` at line start | Heading level 1–3 (deeper clamps to 3) |
//! | `[CENTER]` / `[RIGHT]` / `[JUSTIFY]` at line start | Paragraph alignment (default left) |
//! | `**text**` | Bold |
//! | `*text*`   | Italic |
//! | `***text***` | Bold + italic |
//!
//! One line is one paragraph; blank lines separate paragraphs. Malformed
//! markers degrade to literal text on that line only and are reported as
//! warnings, never as errors.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `img2docx` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! img2docx = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod assembler;
pub mod config;
pub mod convert;
pub mod document;
pub mod error;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder};
pub use convert::{convert, convert_sync, extract_only, try_convert};
pub use document::{Alignment, ParagraphRecord, ParagraphStyle, RunRecord};
pub use error::{ImgToDocxError, MarkerWarning};
pub use output::{ConversionOutput, ConversionResult, ConversionStats};
pub use parser::{parse, ParsedDocument};
pub use pipeline::extract::{Extraction, MarkerText, TextExtractor, VlmExtractor};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
