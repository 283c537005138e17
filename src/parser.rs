//! Marker parser: turn VLM-extracted marker text into [`ParagraphRecord`]s.
//!
//! This is the one genuinely interesting stage of the pipeline, and it is a
//! pure function: no I/O, no shared state, deterministic output for a given
//! input. That is what lets the whole document-assembly path be tested with
//! fixed fixtures and no network.
//!
//! ## Grammar
//!
//! One line of marker text is one paragraph. Blank lines separate paragraphs
//! and never produce output. Within a line, in parse order:
//!
//! 1. **Alignment tags** at line start: `[CENTER]`, `[RIGHT]`, `[JUSTIFY]`
//!    (case-insensitive). The first tag wins; any further leading tags are
//!    stripped and reported as a [`MarkerWarning::ConflictingAlignment`].
//! 2. **Heading marker**: leading `#` characters. `#`/`##`/`###` map to
//!    heading levels 1–3; deeper prefixes clamp to level 3.
//! 3. **Emphasis spans**: `***both***`, `**bold**`, `*italic*`, matched
//!    leftmost with the longest delimiter tried first. Text outside any span
//!    becomes a plain run.
//!
//! ## Recovery policy
//!
//! Malformed markers never fail the document. An unclosed delimiter simply
//! does not match, so its characters survive as literal text in a plain run
//! (recorded as [`MarkerWarning::UnmatchedDelimiter`]). For partially
//! overlapping delimiters such as `**a*b**c*`, the leftmost match wins:
//! a bold run `a*b` followed by the literal text `c*`.

use crate::document::{Alignment, ParagraphRecord, ParagraphStyle, RunRecord};
use crate::error::MarkerWarning;
use once_cell::sync::Lazy;
use regex::Regex;

/// Result of parsing one blob of marker text.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct ParsedDocument {
    /// Paragraphs in document order.
    pub paragraphs: Vec<ParagraphRecord>,
    /// Non-fatal marker anomalies, in line order.
    pub warnings: Vec<MarkerWarning>,
}

/// Leading alignment tag, e.g. `[CENTER]` with optional trailing spaces.
static RE_ALIGN_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\[(center|right|justify)\]\s*").unwrap());

/// Emphasis spans. Alternation order matters: the `***` arm must be tried
/// before `**` and `*` so a bold+italic span is not consumed as a shorter
/// match with stray asterisks left behind.
static RE_EMPHASIS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*\*(.+?)\*\*\*|\*\*(.+?)\*\*|\*(.+?)\*").unwrap());

/// Parse marker-annotated text into an ordered paragraph sequence.
///
/// Empty input yields an empty document. Lines consisting only of markers
/// (no visible text) are skipped without producing a paragraph.
pub fn parse(marker_text: &str) -> ParsedDocument {
    let mut doc = ParsedDocument::default();

    for (idx, raw_line) in marker_text.lines().enumerate() {
        let line_num = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(paragraph) = parse_line(line, line_num, &mut doc.warnings) {
            doc.paragraphs.push(paragraph);
        }
    }

    doc
}

/// Parse one non-blank line. Returns `None` when the line has no visible
/// text once markers are stripped.
fn parse_line(
    line: &str,
    line_num: usize,
    warnings: &mut Vec<MarkerWarning>,
) -> Option<ParagraphRecord> {
    let (rest, alignment) = take_alignment(line, line_num, warnings);
    let (rest, style) = take_heading(rest);

    let rest = rest.trim();
    if rest.is_empty() {
        return None;
    }

    let runs = parse_runs(rest, line_num, warnings);
    if runs.is_empty() {
        return None;
    }

    Some(ParagraphRecord {
        runs,
        style,
        alignment,
    })
}

/// Strip leading alignment tags. The first tag decides the alignment; every
/// further leading tag is stripped and reported.
fn take_alignment<'a>(
    line: &'a str,
    line_num: usize,
    warnings: &mut Vec<MarkerWarning>,
) -> (&'a str, Alignment) {
    let mut rest = line;
    let mut alignment: Option<(Alignment, String)> = None;

    while let Some(m) = RE_ALIGN_TAG.find(rest) {
        let tag = rest[..m.end()].trim().to_uppercase();
        let parsed = match tag.as_str() {
            "[CENTER]" => Alignment::Center,
            "[RIGHT]" => Alignment::Right,
            "[JUSTIFY]" => Alignment::Justify,
            _ => unreachable!("regex only matches known tags"),
        };
        match &alignment {
            None => alignment = Some((parsed, tag)),
            Some((_, kept)) => warnings.push(MarkerWarning::ConflictingAlignment {
                line: line_num,
                kept: kept.clone(),
                ignored: tag,
            }),
        }
        rest = &rest[m.end()..];
    }

    (
        rest,
        alignment.map(|(a, _)| a).unwrap_or(Alignment::Left),
    )
}

/// Strip a leading heading marker and return the clamped style.
fn take_heading(line: &str) -> (&str, ParagraphStyle) {
    let depth = line.chars().take_while(|&c| c == '#').count();
    let rest = line[depth..].trim_start();
    (rest, ParagraphStyle::from_heading_depth(depth))
}

/// Split the visible line text into emphasis runs.
///
/// Text between matches becomes plain runs; any asterisk remaining in a plain
/// run means a delimiter failed to pair and is reported once for the line.
fn parse_runs(text: &str, line_num: usize, warnings: &mut Vec<MarkerWarning>) -> Vec<RunRecord> {
    let mut runs = Vec::new();
    let mut cursor = 0;
    let mut leftover_delimiter = false;

    for caps in RE_EMPHASIS.captures_iter(text) {
        let m = caps.get(0).unwrap();
        if m.start() > cursor {
            let gap = &text[cursor..m.start()];
            leftover_delimiter |= gap.contains('*');
            runs.push(RunRecord::plain(gap));
        }

        let run = if let Some(inner) = caps.get(1) {
            RunRecord::bold_italic(inner.as_str())
        } else if let Some(inner) = caps.get(2) {
            RunRecord::bold(inner.as_str())
        } else {
            RunRecord::italic(caps.get(3).unwrap().as_str())
        };
        runs.push(run);

        cursor = m.end();
    }

    if cursor < text.len() {
        let tail = &text[cursor..];
        leftover_delimiter |= tail.contains('*');
        runs.push(RunRecord::plain(tail));
    }

    if leftover_delimiter {
        warnings.push(MarkerWarning::UnmatchedDelimiter {
            line: line_num,
            snippet: snippet_of(text),
        });
    }

    runs
}

/// A short prefix of the line for warning messages.
fn snippet_of(text: &str) -> String {
    const MAX: usize = 40;
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        let cut: String = text.chars().take(MAX).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Alignment, ParagraphStyle, RunRecord};

    fn parse_one(line: &str) -> ParagraphRecord {
        let doc = parse(line);
        assert_eq!(doc.paragraphs.len(), 1, "expected one paragraph: {doc:?}");
        doc.paragraphs.into_iter().next().unwrap()
    }

    #[test]
    fn empty_input_yields_empty_document() {
        let doc = parse("");
        assert!(doc.paragraphs.is_empty());
        assert!(doc.warnings.is_empty());
    }

    #[test]
    fn blank_lines_are_separators_only() {
        let doc = parse("one\n\n\ntwo\n");
        assert_eq!(doc.paragraphs.len(), 2);
        assert_eq!(doc.paragraphs[0].plain_text(), "one");
        assert_eq!(doc.paragraphs[1].plain_text(), "two");
    }

    #[test]
    fn marker_free_line_is_single_plain_body_run() {
        let p = parse_one("Just an ordinary sentence.");
        assert_eq!(p.style, ParagraphStyle::Body);
        assert_eq!(p.alignment, Alignment::Left);
        assert_eq!(p.runs, vec![RunRecord::plain("Just an ordinary sentence.")]);
    }

    #[test]
    fn bold_span() {
        let p = parse_one("**X**");
        assert_eq!(p.runs, vec![RunRecord::bold("X")]);
    }

    #[test]
    fn italic_span() {
        let p = parse_one("*X*");
        assert_eq!(p.runs, vec![RunRecord::italic("X")]);
    }

    #[test]
    fn bold_italic_span() {
        let p = parse_one("***X***");
        assert_eq!(p.runs, vec![RunRecord::bold_italic("X")]);
    }

    #[test]
    fn heading_levels_map_and_clamp() {
        assert_eq!(parse_one("# A").style, ParagraphStyle::Heading1);
        assert_eq!(parse_one("## A").style, ParagraphStyle::Heading2);
        assert_eq!(parse_one("### A").style, ParagraphStyle::Heading3);
        assert_eq!(parse_one("##### A").style, ParagraphStyle::Heading3);
    }

    #[test]
    fn heading_without_space_still_counts() {
        let p = parse_one("#Title");
        assert_eq!(p.style, ParagraphStyle::Heading1);
        assert_eq!(p.plain_text(), "Title");
    }

    #[test]
    fn alignment_tags() {
        assert_eq!(parse_one("[CENTER]Hello").alignment, Alignment::Center);
        assert_eq!(parse_one("[right] Hello").alignment, Alignment::Right);
        assert_eq!(parse_one("[Justify]Hello").alignment, Alignment::Justify);
        assert_eq!(parse_one("Hello").alignment, Alignment::Left);
    }

    #[test]
    fn first_alignment_tag_wins() {
        let doc = parse("[CENTER][RIGHT]Hello");
        assert_eq!(doc.paragraphs[0].alignment, Alignment::Center);
        assert_eq!(doc.paragraphs[0].plain_text(), "Hello");
        assert_eq!(
            doc.warnings,
            vec![MarkerWarning::ConflictingAlignment {
                line: 1,
                kept: "[CENTER]".into(),
                ignored: "[RIGHT]".into(),
            }]
        );
    }

    #[test]
    fn marker_only_line_is_skipped() {
        assert!(parse("###").paragraphs.is_empty());
        assert!(parse("[center]").paragraphs.is_empty());
        assert!(parse("[center] ##").paragraphs.is_empty());
    }

    #[test]
    fn unmatched_delimiter_stays_literal_and_warns() {
        let doc = parse("a **broken line");
        assert_eq!(
            doc.paragraphs[0].runs,
            vec![RunRecord::plain("a **broken line")]
        );
        assert!(matches!(
            doc.warnings[0],
            MarkerWarning::UnmatchedDelimiter { line: 1, .. }
        ));
    }

    #[test]
    fn partial_overlap_resolves_leftmost() {
        // `**a*b**c*` — the bold delimiters pair first, leaving `c*` literal.
        let doc = parse("**a*b**c*");
        assert_eq!(
            doc.paragraphs[0].runs,
            vec![RunRecord::bold("a*b"), RunRecord::plain("c*")]
        );
        assert_eq!(doc.warnings.len(), 1);
    }

    #[test]
    fn mixed_emphasis_line() {
        let p = parse_one("**Bold** and *italic* text.");
        assert_eq!(
            p.runs,
            vec![
                RunRecord::bold("Bold"),
                RunRecord::plain(" and "),
                RunRecord::italic("italic"),
                RunRecord::plain(" text."),
            ]
        );
    }

    #[test]
    fn run_concatenation_equals_marker_stripped_text() {
        let p = parse_one("## **Bold** middle *italic* end");
        assert_eq!(p.plain_text(), "Bold middle italic end");
    }

    #[test]
    fn heading_with_alignment_and_emphasis() {
        let p = parse_one("[CENTER]## A **bold** title");
        assert_eq!(p.style, ParagraphStyle::Heading2);
        assert_eq!(p.alignment, Alignment::Center);
        assert_eq!(p.plain_text(), "A bold title");
    }

    #[test]
    fn sample_page_three_paragraphs() {
        let doc = parse("# Title\n**Bold** and *italic* text.\n[center]Centered line.");
        assert_eq!(doc.paragraphs.len(), 3);

        let title = &doc.paragraphs[0];
        assert_eq!(title.style, ParagraphStyle::Heading1);
        assert_eq!(title.alignment, Alignment::Left);
        assert_eq!(title.runs, vec![RunRecord::plain("Title")]);

        let body = &doc.paragraphs[1];
        assert_eq!(body.style, ParagraphStyle::Body);
        assert_eq!(
            body.runs,
            vec![
                RunRecord::bold("Bold"),
                RunRecord::plain(" and "),
                RunRecord::italic("italic"),
                RunRecord::plain(" text."),
            ]
        );

        let centered = &doc.paragraphs[2];
        assert_eq!(centered.style, ParagraphStyle::Body);
        assert_eq!(centered.alignment, Alignment::Center);
        assert_eq!(centered.runs, vec![RunRecord::plain("Centered line.")]);
    }

    #[test]
    fn parse_is_deterministic() {
        let input = "[RIGHT]# H\n**a** *b* ***c*** broken** tail";
        assert_eq!(parse(input), parse(input));
    }
}
