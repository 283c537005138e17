//! System prompt for VLM-based marker-text extraction.
//!
//! Centralising the prompt here serves two purposes:
//!
//! 1. **Single source of truth** — the prompt *is* the wire contract: the
//!    marker grammar it instructs the model to emit is exactly the grammar
//!    [`crate::parser`] understands. Changing one without the other breaks
//!    conversion, so they live a module apart and are cross-tested.
//!
//! 2. **Testability** — unit tests can inspect the prompt directly without
//!    spinning up a real VLM, making grammar regressions easy to catch.
//!
//! Callers can override the default via
//! [`crate::config::ConversionConfig::system_prompt`]; the constant here is
//! used only when no override is provided.

/// Default system prompt instructing the model to transcribe the scan using
/// the marker grammar.
///
/// This prompt is used when `ConversionConfig::system_prompt` is `None`.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are an expert OCR system that preserves document formatting.

TASK: Extract ALL text from this image and mark formatting attributes.

FORMATTING MARKERS TO USE:
- For BOLD text: Wrap in **text**
- For ITALIC text: Wrap in *text*
- For BOLD AND ITALIC text: Wrap in ***text***
- For HEADINGS: Start line with # (H1), ## (H2), or ### (H3)
- For centered text: Start line with [CENTER]
- For right-aligned text: Start line with [RIGHT]
- For justified text: Start line with [JUSTIFY]
- For normal paragraphs: Just write the text

IMPORTANT RULES:
1. Preserve the exact text content and structure
2. Separate paragraphs with blank lines
3. Detect and mark all bold/italic text
4. Identify headings by their size and position
5. Detect text alignment from visual position
6. Maintain reading order (top to bottom)
7. Use at most one alignment marker per line, at the start of the line
8. Every ** or * you open must be closed on the same line

OUTPUT FORMAT:
Return ONLY the formatted text with markers. No commentary, no code fences."#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Alignment, ParagraphStyle};
    use crate::parser::parse;

    /// The grammar the prompt asks for must be the grammar the parser reads.
    #[test]
    fn prompt_grammar_matches_parser() {
        for marker in ["**text**", "*text*", "***text***", "[CENTER]", "[RIGHT]", "[JUSTIFY]"] {
            assert!(
                DEFAULT_SYSTEM_PROMPT.contains(marker),
                "prompt no longer documents {marker}"
            );
        }

        let doc = parse("# H\n[CENTER]**b**");
        assert_eq!(doc.paragraphs[0].style, ParagraphStyle::Heading1);
        assert_eq!(doc.paragraphs[1].alignment, Alignment::Center);
        assert!(doc.paragraphs[1].runs[0].bold);
    }
}
