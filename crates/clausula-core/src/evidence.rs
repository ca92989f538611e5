//! Evidence excerpts for findings.
//!
//! Rules only report a byte offset. The engine turns it into a readable
//! excerpt: the enclosing sentence, or the enclosing paragraph when the
//! sentence is too short, or a fixed window as a last resort. The merge
//! layer can re-anchor an excerpt to the clause heading it belongs to.

use lazy_static::lazy_static;
use regex::Regex;

use crate::text::{bounds_around, floor_boundary};
use crate::tuning::{
    HEADING_EVIDENCE_MAX, HEADING_EVIDENCE_MIN, HEADING_SEARCH_WINDOW, MAX_PARAGRAPH_EVIDENCE,
    MIN_SENTENCE_EVIDENCE,
};

lazy_static! {
    /// Clause heading lines: "CLÁUSULA NOVENA - ...", "NOVENA - ...",
    /// "9ª - ...", "9. ...", "CLÁUSULA 9º: ...", "CLÁUSULA 10 – ..."
    static ref HEADING: Regex = Regex::new(
        r"(?mi)^[ \t]*(?:cl[aá]usula[ \t]+\d{1,2}\b|(?:cl[aá]usula[ \t]+)?(?:primera|segunda|tercera|cuarta|quinta|sexta|s[eé]ptima|octava|novena|d[eé]cima(?:[ \t]+\w+)?)\b|\d{1,2}[ \t]*(?:[ºo°ª]\.?|[-–—:.]))[^\n]*$"
    ).unwrap();
}

fn is_sentence_break(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '¡' | '¿' | '\n')
}

/// Byte bounds of the sentence enclosing `index`.
pub fn sentence_bounds(text: &str, index: usize) -> (usize, usize) {
    let index = floor_boundary(text, index);
    let start = text[..index]
        .char_indices()
        .rev()
        .find(|&(_, c)| is_sentence_break(c))
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let end = text[index..]
        .char_indices()
        .find(|&(_, c)| is_sentence_break(c))
        .map(|(i, c)| index + i + c.len_utf8())
        .unwrap_or(text.len());
    (start, end)
}

/// Byte bounds of the blank-line delimited paragraph enclosing `index`.
pub fn paragraph_bounds(text: &str, index: usize) -> (usize, usize) {
    let index = floor_boundary(text, index);
    let start = text[..index].rfind("\n\n").map(|i| i + 2).unwrap_or(0);
    let end = text[index..]
        .find("\n\n")
        .map(|i| index + i)
        .unwrap_or(text.len());
    (start, end)
}

/// Readable excerpt around `index`.
pub fn derive(text: &str, index: usize, window: usize) -> String {
    let (start, end) = sentence_bounds(text, index);
    let sentence = text[start..end].trim();
    if sentence.chars().count() >= MIN_SENTENCE_EVIDENCE {
        return sentence.to_string();
    }
    paragraph_excerpt(text, index, window)
}

/// The enclosing paragraph, or a window when it is empty or too long.
pub fn paragraph_excerpt(text: &str, index: usize, window: usize) -> String {
    let (start, end) = paragraph_bounds(text, index);
    let paragraph = text[start..end].trim();
    if !paragraph.is_empty() && paragraph.chars().count() <= MAX_PARAGRAPH_EVIDENCE {
        return paragraph.to_string();
    }

    let (start, end) = bounds_around(text, index, window);
    text[start..end].trim().to_string()
}

/// Section from the nearest heading at or before `index` whose line matches
/// `keyword`, up to the next heading.
///
/// Returns `None` when no such heading is found or the section is too short.
pub fn heading_section(text: &str, index: usize, keyword: &Regex) -> Option<String> {
    let (start, end) = bounds_around(text, index, HEADING_SEARCH_WINDOW);
    let headings: Vec<(usize, usize)> = HEADING
        .find_iter(&text[start..end])
        .map(|m| (start + m.start(), start + m.end()))
        .collect();

    let chosen = headings
        .iter()
        .rposition(|&(from, to)| from <= index && keyword.is_match(&text[from..to]))?;
    let (from, to) = headings[chosen];
    let until = headings
        .get(chosen + 1)
        .map(|&(next, _)| next)
        .unwrap_or_else(|| floor_boundary(text, to.saturating_add(HEADING_EVIDENCE_MAX)));

    let section = text[from..until].trim();
    (section.chars().count() > HEADING_EVIDENCE_MIN).then(|| section.to_string())
}
