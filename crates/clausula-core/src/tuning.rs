//! Calibration constants.
//!
//! Window sizes are in bytes of normalized text and are snapped to char
//! boundaries before slicing. Every value here is policy: severity and
//! confidence calibration depend on them, so change them together with the
//! fixtures that pin them.

/// Findings with confidence strictly below this are dropped.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.6;

/// Lower threshold used in diagnostic runs.
pub const DEBUG_CONFIDENCE_THRESHOLD: f64 = 0.5;

/// Confidence at or above this maps to high severity.
pub const HIGH_BAND: f64 = 0.8;

/// Confidence at or above this maps to medium severity.
pub const MEDIUM_BAND: f64 = 0.6;

/// Confidence assumed for a finding that reports none.
pub const DEFAULT_CONFIDENCE: f64 = 0.6;

/// How far before an anchor a negating marker still suppresses it.
pub const NEGATION_WINDOW: usize = 60;

/// Radius used by rules to look for amounts, periods and qualifiers.
pub const SIGNAL_WINDOW: usize = 260;

/// Sentences shorter than this are not useful evidence on their own.
pub const MIN_SENTENCE_EVIDENCE: usize = 40;

/// Paragraph evidence is only used up to this length.
pub const MAX_PARAGRAPH_EVIDENCE: usize = 1_200;

/// Default half-width of window evidence.
pub const EVIDENCE_WINDOW: usize = 300;

/// Search radius for a clause heading above a deposit anchor.
pub const HEADING_SEARCH_WINDOW: usize = 2_000;

/// Evidence cut-off after the last heading in the search range.
pub const HEADING_EVIDENCE_MAX: usize = 1_200;

/// Heading-aligned evidence shorter than this is discarded.
pub const HEADING_EVIDENCE_MIN: usize = 20;

/// Maximum normalized length in characters.
pub const MAX_CHARS: usize = 2_000_000;

/// Minimum alphanumeric characters for a document to count as legible.
pub const MIN_LEGIBLE_CHARS: usize = 10;
