//! Text normalization and paragraph segmentation.
//!
//! Raw extracted text goes through a fixed sequence of passes:
//!
//! | Step | Pass | Effect |
//! |------|------|--------|
//! | 1 | canonicalize | quotes, dashes, ligatures, invisible characters |
//! | 2 | collapse | line endings, horizontal whitespace |
//! | 3 | pages | running headers/footers, page markers |
//! | 4 | de-hyphenate | `pala-\nbra` → `palabra` |
//! | 5 | semantic | `dos (2) meses` → `2 meses`, `12,5 %` → `12.5%` |
//! | 6 | cap | length limit |
//! | 7 | segment | paragraphs with byte spans |
//!
//! The result is idempotent: normalizing already-normalized text returns it
//! unchanged.

mod clean;
mod pages;
mod segment;

use serde::Serialize;
use std::ops::Range;
use thiserror::Error;

use crate::text::floor_boundary;
use crate::tuning::{MAX_CHARS, MIN_LEGIBLE_CHARS};

pub use clean::{canonicalize, collapse_whitespace, dehyphenate};
pub use segment::paragraph_spans;

/// Errors raised by normalization.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("document is illegible: {legible_chars} legible characters, at least {required} required")]
    DocumentIllegible { legible_chars: usize, required: usize },
}

/// Position of an offset inside the paragraph list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphLocation {
    pub paragraph_index: usize,
    pub local_index: usize,
}

/// Normalized text with its paragraph segmentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedDocument {
    text: String,
    paragraphs: Vec<String>,
    paragraph_spans: Vec<Range<usize>>,
    notes: Vec<String>,
}

impl NormalizedDocument {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn paragraphs(&self) -> &[String] {
        &self.paragraphs
    }

    /// Byte ranges of each paragraph in [`NormalizedDocument::text`].
    pub fn paragraph_spans(&self) -> &[Range<usize>] {
        &self.paragraph_spans
    }

    /// Processing notes such as `truncated:{len}->{max}`.
    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    /// Map a possibly negative offset to a paragraph position.
    ///
    /// Negative offsets map to the start of the first paragraph.
    pub fn locate(&self, index: i64) -> ParagraphLocation {
        match usize::try_from(index) {
            Ok(offset) => self.locate_offset(offset),
            Err(_) if index < 0 => ParagraphLocation::default(),
            Err(_) => self.locate_offset(usize::MAX),
        }
    }

    /// Map a byte offset to a paragraph position.
    ///
    /// Total: offsets in the gap between two paragraphs map to the preceding
    /// one, offsets past the end map to the last one, and the local index is
    /// clamped to the paragraph length.
    pub fn locate_offset(&self, offset: usize) -> ParagraphLocation {
        let Some(last) = self.paragraph_spans.len().checked_sub(1) else {
            return ParagraphLocation::default();
        };
        let following = self.paragraph_spans.partition_point(|s| s.start <= offset);
        let paragraph_index = following.saturating_sub(1).min(last);
        let span = &self.paragraph_spans[paragraph_index];
        ParagraphLocation {
            paragraph_index,
            local_index: offset.saturating_sub(span.start).min(span.len()),
        }
    }
}

/// Normalize raw extracted text.
///
/// Fails with [`NormalizeError::DocumentIllegible`] when fewer than
/// [`MIN_LEGIBLE_CHARS`] alphanumeric characters survive cleanup.
pub fn normalize(raw: &str) -> Result<NormalizedDocument, NormalizeError> {
    normalize_with_limit(raw, MAX_CHARS)
}

/// Normalize, cutting the result to at most `max_chars` characters.
///
/// The cut lands on a char boundary and trailing whitespace is dropped, so
/// normalizing the result again with the same limit leaves it unchanged.
pub fn normalize_with_limit(
    raw: &str,
    max_chars: usize,
) -> Result<NormalizedDocument, NormalizeError> {
    let mut notes = Vec::new();

    let text = canonicalize(raw);
    let text = collapse_whitespace(&text);
    let cleaned = pages::strip_headers_footers(&text);
    if cleaned.removed_lines > 0 {
        notes.push(format!(
            "headers-footers:{}/{}",
            cleaned.removed_lines, cleaned.pages
        ));
    }
    let text = dehyphenate(&cleaned.text);
    let mut text = clean::semantic(&text);

    let chars = text.chars().count();
    if chars > max_chars {
        let cut = text
            .char_indices()
            .nth(max_chars)
            .map(|(i, _)| i)
            .unwrap_or(text.len());
        text.truncate(floor_boundary(&text, cut));
        text.truncate(text.trim_end().len());
        notes.push(format!("truncated:{}->{}", chars, max_chars));
        tracing::warn!(chars, max = max_chars, "document truncated");
    }

    let legible_chars = text.chars().filter(|c| c.is_alphanumeric()).count();
    if legible_chars < MIN_LEGIBLE_CHARS {
        return Err(NormalizeError::DocumentIllegible {
            legible_chars,
            required: MIN_LEGIBLE_CHARS,
        });
    }

    let spans = paragraph_spans(&text);
    let paragraphs = spans.iter().map(|s| text[s.clone()].to_string()).collect();
    tracing::debug!(
        bytes = text.len(),
        paragraphs = spans.len(),
        "document normalized"
    );

    Ok(NormalizedDocument {
        text,
        paragraphs,
        paragraph_spans: spans,
        notes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn doc(text: &str) -> NormalizedDocument {
        normalize(text).unwrap()
    }

    #[test]
    fn test_pipeline_end_to_end() {
        let raw = "CONTRATO DE LOCACI\u{00D3}N\r\n\r\nEl LOCATARIO entregar\u{00E1} un (1) mes de dep\u{00F3}-\nsito.\r\n\r\n\r\n\r\nInter\u{00E9}s del 3,5 % mensual sobre $ 1.000";
        let d = doc(raw);
        assert_eq!(d.paragraphs().len(), 3);
        assert!(d.text().contains("1 mes de depósito."));
        assert!(d.text().contains("3.5% mensual sobre $1.000"));
        for (p, span) in d.paragraphs().iter().zip(d.paragraph_spans()) {
            assert_eq!(&d.text()[span.clone()], p);
        }
    }

    #[test]
    fn test_illegible_document() {
        let err = normalize(" \n.. -- ..\n ").unwrap_err();
        assert_eq!(
            err,
            NormalizeError::DocumentIllegible {
                legible_chars: 0,
                required: MIN_LEGIBLE_CHARS
            }
        );
    }

    #[test]
    fn test_locate_edges() {
        let d = doc("Primer párrafo.\n\nSegundo párrafo.");
        let second = d.paragraph_spans()[1].start;
        assert_eq!(d.locate(-5), ParagraphLocation::default());
        assert_eq!(
            d.locate(second as i64 + 3),
            ParagraphLocation { paragraph_index: 1, local_index: 3 }
        );
        // the blank line between paragraphs belongs to the first one
        let gap = d.paragraph_spans()[0].end + 1;
        let first_len = d.paragraph_spans()[0].len();
        assert_eq!(
            d.locate_offset(gap),
            ParagraphLocation { paragraph_index: 0, local_index: first_len }
        );
        let past = d.locate_offset(10_000);
        assert_eq!(past.paragraph_index, 1);
        assert_eq!(past.local_index, d.paragraph_spans()[1].len());
        assert_eq!(d.locate(i64::MAX).paragraph_index, 1);
    }

    #[test]
    fn test_locate_on_empty_document() {
        let d = NormalizedDocument {
            text: String::new(),
            paragraphs: Vec::new(),
            paragraph_spans: Vec::new(),
            notes: Vec::new(),
        };
        assert_eq!(d.locate(42), ParagraphLocation::default());
    }

    #[test]
    fn test_idempotent_with_pages() {
        let raw = "Estudio Jurídico\ncláusula uno del contrato\nPágina 1\n\x0C\nEstudio Jurídico\ncláusula dos del contrato\nPágina 2";
        let once = doc(raw);
        assert!(!once.text().contains("Estudio"));
        assert!(!once.text().contains("Página"));
        let twice = doc(once.text());
        assert_eq!(once.text(), twice.text());
    }

    #[test]
    fn test_hyphen_before_padded_line_break() {
        for raw in [
            "El locatario abonará el alqui- \nler mensual por adelantado.",
            "El locatario abonará el alqui-\n    ler mensual por adelantado.",
        ] {
            let once = doc(raw);
            assert!(once.text().contains("alquiler mensual"));
            assert_eq!(doc(once.text()).text(), once.text());
        }
    }

    #[test]
    fn test_truncation() {
        let raw = "Cláusula de depósito en garantía. ".repeat(20);
        let d = normalize_with_limit(&raw, 50).unwrap();
        assert!(d.text().chars().count() <= 50);
        assert!(raw.starts_with(d.text()));
        assert!(!d.text().ends_with(' '));
        let total = raw.trim_end().chars().count();
        assert_eq!(d.notes(), [format!("truncated:{}->50", total)]);

        let again = normalize_with_limit(d.text(), 50).unwrap();
        assert_eq!(again.text(), d.text());
        assert!(again.notes().is_empty());
    }

    #[test]
    fn test_truncation_cuts_on_char_boundary() {
        let raw = "depósito ".repeat(10);
        let d = normalize_with_limit(&raw, 13).unwrap();
        assert_eq!(d.text(), "depósito depó");
        assert_eq!(d.text().chars().count(), 13);
        assert_eq!(d.text().len(), 15);
    }

    fn paragraph_text() -> impl Strategy<Value = String> {
        let line = prop::collection::vec(
            prop_oneof![
                4 => "[a-zA-Z0-9áéíóúñ ,.()%$\t-]{1,12}",
                1 => Just("-\n".to_string()),
                1 => Just("- \n".to_string()),
                1 => Just("\n   ".to_string()),
                1 => Just("\n\t".to_string()),
            ],
            1..8,
        )
        .prop_map(|pieces| pieces.concat());
        prop::collection::vec(line, 1..8).prop_map(|paras| paras.join("\n\n"))
    }

    proptest! {
        #[test]
        fn prop_locate_is_total(text in paragraph_text(), index in any::<i64>()) {
            if let Ok(d) = normalize(&format!("contrato de prueba {}", text)) {
                let loc = d.locate(index);
                prop_assert!(loc.paragraph_index < d.paragraphs().len());
                prop_assert!(loc.local_index <= d.paragraphs()[loc.paragraph_index].len());
            }
        }

        #[test]
        fn prop_normalize_is_idempotent(text in paragraph_text()) {
            if let Ok(once) = normalize(&text) {
                let twice = normalize(once.text()).unwrap();
                prop_assert_eq!(once.text(), twice.text());
            }
        }
    }
}
