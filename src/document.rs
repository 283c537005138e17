//! The structured document model produced by the parser and consumed by the
//! assembler.
//!
//! Everything here is a plain value object: records are created once during
//! parsing, never mutated, and handed to the assembler by reference in
//! document order. Keeping the model free of behaviour (no I/O, no docx
//! types) is what lets the parser stay a pure function and the assembler a
//! thin mapping.

use serde::{Deserialize, Serialize};

/// A contiguous span of text sharing the same emphasis.
///
/// Invariant: `text` is never empty — the parser drops zero-length spans
/// rather than emitting empty runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
}

impl RunRecord {
    /// A run with neither bold nor italic set.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
            italic: false,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
            italic: false,
        }
    }

    pub fn italic(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
            italic: true,
        }
    }

    pub fn bold_italic(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
            italic: true,
        }
    }
}

/// Paragraph style. Heading levels deeper than 3 are clamped by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParagraphStyle {
    #[default]
    Body,
    Heading1,
    Heading2,
    Heading3,
}

impl ParagraphStyle {
    /// Map a heading depth (count of leading `#`) to a style, clamping
    /// anything deeper than 3 to [`ParagraphStyle::Heading3`].
    pub fn from_heading_depth(depth: usize) -> Self {
        match depth {
            0 => ParagraphStyle::Body,
            1 => ParagraphStyle::Heading1,
            2 => ParagraphStyle::Heading2,
            _ => ParagraphStyle::Heading3,
        }
    }
}

/// Horizontal paragraph alignment. Absence of a tag means [`Alignment::Left`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// One paragraph of the output document: an ordered run sequence plus its
/// block-level formatting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphRecord {
    pub runs: Vec<RunRecord>,
    pub style: ParagraphStyle,
    pub alignment: Alignment,
}

impl ParagraphRecord {
    /// The paragraph text with all markers stripped — the concatenation of
    /// every run's text.
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}
