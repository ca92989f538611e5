//! Extracted-document input and plain-text intake.
//!
//! PDF, OCR and Office extraction run outside this crate. Callers that
//! already hold text build an [`ExtractedDocument`] directly; raw uploads go
//! through [`ExtractedDocument::from_bytes`], which only decodes plain text.

use serde::{Deserialize, Serialize};

use crate::types::SourceKind;
use crate::AnalysisError;

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const PDF_MIME: &str = "application/pdf";
const PDF_SIGNATURE: &[u8] = b"%PDF-";
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Text recovered from an uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedDocument {
    pub text: String,
    pub source_kind: SourceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_hint: Option<String>,
}

impl ExtractedDocument {
    /// Wrap text produced by an external extractor.
    pub fn new(text: impl Into<String>, source_kind: SourceKind) -> Self {
        Self {
            text: text.into(),
            source_kind,
            filename_hint: None,
            mime_hint: None,
        }
    }

    /// Plain text supplied directly.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, SourceKind::PlainText)
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename_hint = Some(filename.into());
        self
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime_hint = Some(mime.into());
        self
    }

    /// Decode an upload, accepting only plain text.
    ///
    /// Binary formats are detected from the filename, the MIME type and the
    /// `%PDF-` signature, and rejected with
    /// [`AnalysisError::ExtractionFailure`].
    pub fn from_bytes(
        bytes: &[u8],
        filename: Option<&str>,
        mime: Option<&str>,
    ) -> Result<Self, AnalysisError> {
        let kind = detect_source_kind(bytes, filename, mime);
        if kind != SourceKind::PlainText {
            return Err(AnalysisError::ExtractionFailure {
                reason: format!(
                    "{} input requires an external extractor",
                    source_kind_label(kind)
                ),
            });
        }

        let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let text = std::str::from_utf8(body).map_err(|e| AnalysisError::ExtractionFailure {
            reason: format!("input is not valid UTF-8 text: {}", e),
        })?;
        if text.contains('\0') {
            return Err(AnalysisError::ExtractionFailure {
                reason: "input contains binary data".to_string(),
            });
        }

        let mut document = Self::plain(text);
        if let Some(filename) = filename {
            document = document.with_filename(filename);
        }
        if let Some(mime) = mime {
            document = document.with_mime(mime);
        }
        Ok(document)
    }
}

/// Guess how a document's text must be obtained.
pub fn detect_source_kind(bytes: &[u8], filename: Option<&str>, mime: Option<&str>) -> SourceKind {
    let name = filename.unwrap_or_default().to_lowercase();
    let mime = mime.unwrap_or_default().to_lowercase();

    if name.ends_with(".docx") || mime.contains(DOCX_MIME) {
        return SourceKind::Docx;
    }
    if name.ends_with(".pdf") || mime.contains(PDF_MIME) || bytes.starts_with(PDF_SIGNATURE) {
        return SourceKind::PdfText;
    }
    SourceKind::PlainText
}

fn source_kind_label(kind: SourceKind) -> &'static str {
    match kind {
        SourceKind::PdfText | SourceKind::PdfOcr => "PDF",
        SourceKind::Docx => "DOCX",
        SourceKind::PlainText => "text",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_by_name_mime_and_signature() {
        assert_eq!(detect_source_kind(b"", Some("Contrato.DOCX"), None), SourceKind::Docx);
        assert_eq!(detect_source_kind(b"", None, Some(PDF_MIME)), SourceKind::PdfText);
        assert_eq!(detect_source_kind(b"%PDF-1.7\n", Some("x.txt"), None), SourceKind::PdfText);
        assert_eq!(detect_source_kind(b"hola", Some("x.txt"), None), SourceKind::PlainText);
    }

    #[test]
    fn test_plain_text_strips_bom() {
        let doc = ExtractedDocument::from_bytes(b"\xEF\xBB\xBFContrato", Some("c.txt"), None).unwrap();
        assert_eq!(doc.text, "Contrato");
        assert_eq!(doc.filename_hint.as_deref(), Some("c.txt"));
    }

    #[test]
    fn test_binary_inputs_are_rejected() {
        let err = ExtractedDocument::from_bytes(b"%PDF-1.4 ...", None, None).unwrap_err();
        assert!(matches!(err, AnalysisError::ExtractionFailure { .. }));

        let err = ExtractedDocument::from_bytes(&[0xff, 0xfe, 0x00], None, None).unwrap_err();
        assert!(matches!(err, AnalysisError::ExtractionFailure { .. }));
    }
}
