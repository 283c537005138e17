//! Configuration types for image-to-docx conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs, serialise them for logging, and diff two runs
//! to understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A dozen-field constructor is unreadable and breaks on every new field.
//! The builder pattern lets callers set only what they care about and rely on
//! well-documented defaults for the rest.

use crate::error::ImgToDocxError;
use crate::pipeline::extract::TextExtractor;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Configuration for an image-to-docx conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use img2docx::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .model("gemini-2.5-flash")
///     .max_image_pixels(1600)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Run the image normaliser (grayscale, denoise, contrast) before
    /// extraction. Default: true.
    ///
    /// Disable for images that are already clean renders (screenshots,
    /// exported pages) where tone-mapping can only lose information.
    pub preprocess: bool,

    /// Maximum image dimension (width or height) in pixels. Default: 2000.
    ///
    /// A flatbed scan at 600 DPI can exceed 12 000 px on its long edge; the
    /// cap bounds memory and keeps the base64 payload under typical API
    /// upload limits (~20 MB) while staying in the resolution sweet spot for
    /// vision models (1 024–2 048 px).
    pub max_image_pixels: u32,

    /// LLM model identifier, e.g. "gemini-2.5-flash", "gpt-4.1-nano".
    /// If None, uses provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai", "anthropic").
    /// If None along with `provider`, the provider is auto-detected from
    /// environment API keys.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Pre-constructed extractor. Takes precedence over everything else —
    /// this is the injection point for deterministic fixtures in tests.
    pub extractor: Option<Arc<dyn TextExtractor>>,

    /// Sampling temperature for the extraction call. Default: 0.1.
    ///
    /// Low temperature makes the model deterministic and faithful to what it
    /// sees on the page — exactly what you want for transcription. Higher
    /// values introduce creativity that worsens OCR accuracy.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 4096.
    ///
    /// Dense single-page scans rarely exceed 2 000 output tokens; setting
    /// this too low silently truncates the text mid-sentence.
    pub max_tokens: usize,

    /// Maximum retry attempts on a transient extraction failure. Default: 0
    /// (a failed call surfaces immediately).
    ///
    /// Opt in when running unattended against a flaky endpoint: most 5xx and
    /// timeout errors are transient. Permanent errors (bad API key, empty
    /// response) are never retried regardless of this setting.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 500.
    pub retry_backoff_ms: u64,

    /// Custom system prompt. If None, uses the built-in marker-grammar
    /// prompt from [`crate::prompts`].
    pub system_prompt: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Per-extraction-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Optional stage-level progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            preprocess: true,
            max_image_pixels: 2000,
            model: None,
            provider_name: None,
            provider: None,
            extractor: None,
            temperature: 0.1,
            max_tokens: 4096,
            max_retries: 0,
            retry_backoff_ms: 500,
            system_prompt: None,
            download_timeout_secs: 120,
            api_timeout_secs: 60,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("preprocess", &self.preprocess)
            .field("max_image_pixels", &self.max_image_pixels)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field(
                "extractor",
                &self.extractor.as_ref().map(|_| "<dyn TextExtractor>"),
            )
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn preprocess(mut self, v: bool) -> Self {
        self.config.preprocess = v;
        self
    }

    pub fn max_image_pixels(mut self, px: u32) -> Self {
        self.config.max_image_pixels = px.max(100);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.config.extractor = Some(extractor);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, ImgToDocxError> {
        let c = &self.config;
        if c.max_image_pixels < 100 {
            return Err(ImgToDocxError::InvalidConfig(format!(
                "max_image_pixels must be ≥ 100, got {}",
                c.max_image_pixels
            )));
        }
        if c.max_tokens == 0 {
            return Err(ImgToDocxError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ConversionConfig::default();
        assert!(c.preprocess);
        assert_eq!(c.max_image_pixels, 2000);
        assert_eq!(c.temperature, 0.1);
        assert_eq!(c.max_tokens, 4096);
        assert_eq!(c.max_retries, 0);
    }

    #[test]
    fn builder_clamps_pixels_and_temperature() {
        let c = ConversionConfig::builder()
            .max_image_pixels(10)
            .temperature(9.0)
            .build()
            .unwrap();
        assert_eq!(c.max_image_pixels, 100);
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn builder_rejects_zero_max_tokens() {
        let err = ConversionConfig::builder().max_tokens(0).build().unwrap_err();
        assert!(matches!(err, ImgToDocxError::InvalidConfig(_)));
    }

    #[test]
    fn debug_omits_trait_objects() {
        let repr = format!("{:?}", ConversionConfig::default());
        assert!(repr.contains("max_image_pixels"));
        assert!(!repr.contains("panicked"));
    }
}
