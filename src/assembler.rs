//! Document assembler: map [`ParagraphRecord`]s onto a Word document.
//!
//! The assembler is deliberately thin — all decisions were made by the
//! parser. Each record becomes exactly one docx paragraph, in insertion
//! order, with its alignment, heading style, and per-run bold/italic flags
//! applied verbatim. No reordering, no deduplication.
//!
//! ## Atomic output
//!
//! The document is packed into an in-memory buffer first, then written to a
//! temp file next to the destination and renamed into place. A failed pack
//! or a failed write therefore never leaves a partial `.docx` behind.

use crate::document::{Alignment, ParagraphRecord, ParagraphStyle};
use crate::error::ImgToDocxError;
use docx_rs::{
    AlignmentType, Docx, Paragraph, Run, Style, StyleType,
};
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

/// Font sizes in half-points, matching common word-processor defaults:
/// 24 pt / 18 pt / 14 pt headings over an 11 pt body.
const SIZE_HEADING1: usize = 48;
const SIZE_HEADING2: usize = 36;
const SIZE_HEADING3: usize = 28;
const SIZE_BODY: usize = 22;

/// Build the in-memory document from a paragraph sequence.
///
/// Exposed separately from [`assemble`] so tests can inspect document
/// structure without touching the filesystem.
pub fn build_document(paragraphs: &[ParagraphRecord]) -> Docx {
    let mut docx = Docx::new()
        .add_style(
            Style::new("Heading1", StyleType::Paragraph)
                .name("Heading 1")
                .size(SIZE_HEADING1)
                .bold(),
        )
        .add_style(
            Style::new("Heading2", StyleType::Paragraph)
                .name("Heading 2")
                .size(SIZE_HEADING2)
                .bold(),
        )
        .add_style(
            Style::new("Heading3", StyleType::Paragraph)
                .name("Heading 3")
                .size(SIZE_HEADING3)
                .bold(),
        );

    for record in paragraphs {
        docx = docx.add_paragraph(build_paragraph(record));
    }

    docx
}

/// Map one record to one docx paragraph.
fn build_paragraph(record: &ParagraphRecord) -> Paragraph {
    let mut paragraph = Paragraph::new().align(map_alignment(record.alignment));

    let run_size = match record.style {
        ParagraphStyle::Body => SIZE_BODY,
        ParagraphStyle::Heading1 => SIZE_HEADING1,
        ParagraphStyle::Heading2 => SIZE_HEADING2,
        ParagraphStyle::Heading3 => SIZE_HEADING3,
    };

    if let Some(style_id) = style_id(record.style) {
        paragraph = paragraph.style(style_id);
    }

    for run_record in &record.runs {
        let mut run = Run::new().add_text(&run_record.text).size(run_size);
        if run_record.bold {
            run = run.bold();
        }
        if run_record.italic {
            run = run.italic();
        }
        paragraph = paragraph.add_run(run);
    }

    paragraph
}

fn style_id(style: ParagraphStyle) -> Option<&'static str> {
    match style {
        ParagraphStyle::Body => None,
        ParagraphStyle::Heading1 => Some("Heading1"),
        ParagraphStyle::Heading2 => Some("Heading2"),
        ParagraphStyle::Heading3 => Some("Heading3"),
    }
}

fn map_alignment(alignment: Alignment) -> AlignmentType {
    match alignment {
        Alignment::Left => AlignmentType::Left,
        Alignment::Center => AlignmentType::Center,
        Alignment::Right => AlignmentType::Right,
        Alignment::Justify => AlignmentType::Both,
    }
}

/// Assemble the paragraph sequence into a `.docx` file at `output_path`.
///
/// Overwrites an existing file. On any failure the destination is left
/// untouched — either the whole document is written or none of it.
pub fn assemble(
    paragraphs: &[ParagraphRecord],
    output_path: &Path,
) -> Result<(), ImgToDocxError> {
    let docx = build_document(paragraphs);

    let mut buffer = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buffer)
        .map_err(|e| ImgToDocxError::Internal(format!("Failed to pack docx: {e}")))?;
    let bytes = buffer.into_inner();
    debug!("Packed document: {} bytes", bytes.len());

    write_atomic(&bytes, output_path)?;

    info!(
        "Wrote {} paragraphs to {}",
        paragraphs.len(),
        output_path.display()
    );
    Ok(())
}

/// Write bytes via a sibling temp file and rename, so a crash or I/O error
/// mid-write never leaves a truncated document at the destination.
fn write_atomic(bytes: &[u8], output_path: &Path) -> Result<(), ImgToDocxError> {
    let parent = match output_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let io_err = |source: std::io::Error| ImgToDocxError::OutputWriteFailed {
        path: output_path.to_path_buf(),
        source,
    };

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(io_err)?;
    std::io::Write::write_all(&mut tmp, bytes).map_err(io_err)?;
    tmp.persist(output_path)
        .map_err(|e| io_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::RunRecord;
    use docx_rs::{DocumentChild, ParagraphChild};

    fn record(text: &str, style: ParagraphStyle, alignment: Alignment) -> ParagraphRecord {
        ParagraphRecord {
            runs: vec![RunRecord::plain(text)],
            style,
            alignment,
        }
    }

    fn paragraph_count(docx: &Docx) -> usize {
        docx.document
            .children
            .iter()
            .filter(|c| matches!(c, DocumentChild::Paragraph(_)))
            .count()
    }

    #[test]
    fn one_docx_paragraph_per_record_in_order() {
        let records = vec![
            record("first", ParagraphStyle::Heading1, Alignment::Left),
            record("second", ParagraphStyle::Body, Alignment::Center),
            record("third", ParagraphStyle::Body, Alignment::Right),
        ];
        let docx = build_document(&records);
        assert_eq!(paragraph_count(&docx), 3);
    }

    #[test]
    fn runs_carry_emphasis_flags() {
        let records = vec![ParagraphRecord {
            runs: vec![
                RunRecord::bold("Bold"),
                RunRecord::plain(" and "),
                RunRecord::italic("italic"),
            ],
            style: ParagraphStyle::Body,
            alignment: Alignment::Left,
        }];
        let docx = build_document(&records);

        let DocumentChild::Paragraph(p) = &docx.document.children[0] else {
            panic!("expected a paragraph");
        };
        let runs: Vec<_> = p
            .children
            .iter()
            .filter_map(|c| match c {
                ParagraphChild::Run(r) => Some(r),
                _ => None,
            })
            .collect();
        assert_eq!(runs.len(), 3);
        assert!(runs[0].run_property.bold.is_some());
        assert!(runs[0].run_property.italic.is_none());
        assert!(runs[1].run_property.bold.is_none());
        assert!(runs[1].run_property.italic.is_none());
        assert!(runs[2].run_property.italic.is_some());
    }

    #[test]
    fn assemble_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.docx");
        let records = vec![record("hello", ParagraphStyle::Body, Alignment::Left)];

        assemble(&records, &out).expect("assemble should succeed");
        let meta = std::fs::metadata(&out).expect("output file should exist");
        assert!(meta.len() > 0);
    }

    #[test]
    fn assemble_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.docx");
        std::fs::write(&out, b"stale").unwrap();

        let records = vec![record("fresh", ParagraphStyle::Body, Alignment::Left)];
        assemble(&records, &out).unwrap();
        assert!(std::fs::metadata(&out).unwrap().len() > 5);
    }

    #[test]
    fn assemble_into_missing_directory_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("no/such/dir/out.docx");
        let records = vec![record("hello", ParagraphStyle::Body, Alignment::Left)];

        let err = assemble(&records, &out).unwrap_err();
        assert!(matches!(err, ImgToDocxError::OutputWriteFailed { .. }));
        assert!(!out.exists(), "no partial file may be left behind");
    }

    #[test]
    fn assembly_is_idempotent() {
        let records = vec![
            record("a", ParagraphStyle::Heading2, Alignment::Center),
            record("b", ParagraphStyle::Body, Alignment::Justify),
        ];

        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.docx");
        let second = dir.path().join("second.docx");
        assemble(&records, &first).unwrap();
        assemble(&records, &second).unwrap();

        // Same records, structurally identical documents.
        assert_eq!(
            paragraph_count(&build_document(&records)),
            paragraph_count(&build_document(&records)),
        );
        let len_a = std::fs::metadata(&first).unwrap().len();
        let len_b = std::fs::metadata(&second).unwrap().len();
        assert_eq!(len_a, len_b);
    }
}
