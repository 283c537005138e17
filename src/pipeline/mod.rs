//! Pipeline stages for image-to-docx conversion.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a different extraction backend) without
//! touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ preprocess ──▶ encode ──▶ extract
//! (URL/path)  (normalise)   (base64)   (VLM → marker text)
//! ```
//!
//! 1. [`input`]      — canonicalise the user-supplied path or URL to a local
//!    image file
//! 2. [`preprocess`] — grayscale/denoise/contrast normalisation; runs in
//!    `spawn_blocking` because it is CPU-bound
//! 3. [`encode`]     — PNG-encode and base64-wrap the image for the
//!    multimodal API request body
//! 4. [`extract`]    — drive the VLM call with retry/backoff; the only stage
//!    with network I/O
//!
//! The marker text produced here flows into [`crate::parser`] and then
//! [`crate::assembler`], which live at the crate root because they are the
//! core of the library rather than plumbing.

pub mod encode;
pub mod extract;
pub mod input;
pub mod preprocess;
