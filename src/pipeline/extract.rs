//! Text extraction: send the normalised scan to a VLM and get marker text.
//!
//! The [`TextExtractor`] trait is the seam between the pipeline and the
//! remote model. Everything downstream (parser, assembler) depends only on
//! the marker-text contract, so tests swap in a fixture extractor and run
//! the whole document path deterministically with no network.
//!
//! ## Retry Strategy
//!
//! By default a failed call surfaces immediately. With `max_retries > 0`,
//! exponential backoff (`retry_backoff_ms * 2^attempt`) avoids hammering a
//! recovering endpoint: with 500 ms base and 3 retries the wait sequence is
//! 500 ms → 1 s → 2 s. An *empty* response is never retried — it means the
//! model saw nothing to read, and asking again will not change the page.

use crate::config::ConversionConfig;
use crate::error::ImgToDocxError;
use crate::prompts::DEFAULT_SYSTEM_PROMPT;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// Marker-annotated text as returned by the extractor — the wire contract
/// consumed by [`crate::parser::parse`].
pub type MarkerText = String;

/// A successful extraction plus its accounting.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub marker_text: MarkerText,
    pub input_tokens: u32,
    pub output_tokens: u32,
    /// Retries that were needed before the call succeeded.
    pub retries: u32,
}

/// Capability interface for turning an image into marker text.
///
/// Implementations must be `Send + Sync`; the pipeline holds them behind an
/// `Arc<dyn TextExtractor>` so callers (and tests) can inject their own.
pub trait TextExtractor: Send + Sync {
    fn extract<'a>(
        &'a self,
        image: &'a ImageData,
    ) -> BoxFuture<'a, Result<Extraction, ImgToDocxError>>;
}

/// The production extractor: drives an [`LLMProvider`] vision call with
/// bounded retry and a per-call timeout.
pub struct VlmExtractor {
    provider: Arc<dyn LLMProvider>,
    system_prompt: String,
    temperature: f32,
    max_tokens: usize,
    max_retries: u32,
    retry_backoff_ms: u64,
    api_timeout_secs: u64,
}

impl VlmExtractor {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &ConversionConfig) -> Self {
        Self {
            provider,
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_retries: config.max_retries,
            retry_backoff_ms: config.retry_backoff_ms,
            api_timeout_secs: config.api_timeout_secs,
        }
    }

    async fn call_once(&self, image: &ImageData) -> Result<(String, u32, u32), String> {
        let messages = vec![
            ChatMessage::system(&self.system_prompt),
            // VLM APIs require at least one user turn; the image carries all
            // the actual content.
            ChatMessage::user_with_images("", vec![image.clone()]),
        ];
        let options = CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        };

        let call = self.provider.chat(&messages, Some(&options));
        match timeout(Duration::from_secs(self.api_timeout_secs), call).await {
            Ok(Ok(response)) => Ok((
                response.content,
                response.prompt_tokens as u32,
                response.completion_tokens as u32,
            )),
            Ok(Err(e)) => Err(format!("{e}")),
            Err(_) => Err(format!("timed out after {}s", self.api_timeout_secs)),
        }
    }
}

impl TextExtractor for VlmExtractor {
    fn extract<'a>(
        &'a self,
        image: &'a ImageData,
    ) -> BoxFuture<'a, Result<Extraction, ImgToDocxError>> {
        Box::pin(async move {
            let mut last_err: Option<String> = None;

            for attempt in 0..=self.max_retries {
                if attempt > 0 {
                    let backoff = self.retry_backoff_ms * 2u64.pow(attempt - 1);
                    warn!(
                        "Extraction retry {}/{} after {}ms",
                        attempt, self.max_retries, backoff
                    );
                    sleep(Duration::from_millis(backoff)).await;
                }

                match self.call_once(image).await {
                    Ok((content, input_tokens, output_tokens)) => {
                        if content.trim().is_empty() {
                            // The model saw nothing to read; retrying the
                            // same pixels will not change that.
                            return Err(ImgToDocxError::EmptyExtraction);
                        }
                        debug!(
                            "Extraction ok: {} chars, {} in / {} out tokens",
                            content.len(),
                            input_tokens,
                            output_tokens
                        );
                        return Ok(Extraction {
                            marker_text: content,
                            input_tokens,
                            output_tokens,
                            retries: attempt,
                        });
                    }
                    Err(e) => {
                        warn!("Extraction attempt {} failed: {}", attempt + 1, e);
                        last_err = Some(e);
                    }
                }
            }

            Err(ImgToDocxError::ExtractionFailed {
                retries: self.max_retries,
                detail: last_err.unwrap_or_else(|| "Unknown error".to_string()),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fixture extractor returning canned marker text.
    pub(crate) struct FixedExtractor(pub String);

    impl TextExtractor for FixedExtractor {
        fn extract<'a>(
            &'a self,
            _image: &'a ImageData,
        ) -> BoxFuture<'a, Result<Extraction, ImgToDocxError>> {
            Box::pin(async move {
                Ok(Extraction {
                    marker_text: self.0.clone(),
                    input_tokens: 0,
                    output_tokens: 0,
                    retries: 0,
                })
            })
        }
    }

    #[tokio::test]
    async fn fixture_extractor_round_trips() {
        let ex = FixedExtractor("# Title\nBody".into());
        let img = ImageData::new("aGk=", "image/png");
        let out = ex.extract(&img).await.unwrap();
        assert_eq!(out.marker_text, "# Title\nBody");
        assert_eq!(out.retries, 0);
    }
}
