//! Page splitting and removal of running headers and footers.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet};

lazy_static! {
    static ref PAGE_MARKER: Regex =
        Regex::new(r"(?i)^(?:p[aá]gina|page|p[aá]g\.)\s*\d+(?:\s*(?:de|of|/)\s*\d+)?$").unwrap();
    static ref DIGIT_RUN: Regex = Regex::new(r"\d+").unwrap();
    static ref BLANK_RUNS: Regex = Regex::new(r"\n{3,}").unwrap();
}

/// Blank lines in a row that separate pages when no form feed is present.
const PAGE_GAP_LINES: usize = 3;

/// Result of the header/footer pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCleanup {
    pub text: String,
    pub pages: usize,
    pub removed_lines: usize,
}

/// Split into pages, drop recurring first/last lines and marker lines, and
/// rejoin with single blank lines between blocks.
pub fn strip_headers_footers(text: &str) -> PageCleanup {
    let lines: Vec<&str> = text.split('\n').collect();
    let pages = split_pages(&lines);
    let frequent = frequent_edge_lines(&lines, &pages);

    let mut kept: Vec<&str> = Vec::with_capacity(lines.len());
    let mut removed_lines = 0;
    for line in &lines {
        if *line == "\x0C" {
            kept.push("");
            continue;
        }
        if is_marker(line) {
            removed_lines += 1;
            kept.push("");
            continue;
        }
        if !line.is_empty() && frequent.contains(&line_key(line)) {
            removed_lines += 1;
            continue;
        }
        kept.push(line);
    }

    let joined = kept.join("\n");
    let text = BLANK_RUNS.replace_all(&joined, "\n\n").trim().to_string();
    PageCleanup {
        text,
        pages: pages.len(),
        removed_lines,
    }
}

fn is_marker(line: &str) -> bool {
    PAGE_MARKER.is_match(line)
}

/// Comparison key: digit runs collapse to `#` so "Página 3" matches "Página 12".
fn line_key(line: &str) -> String {
    DIGIT_RUN.replace_all(line, "#").to_lowercase()
}

/// Line indices grouped by page.
fn split_pages(lines: &[&str]) -> Vec<Vec<usize>> {
    let mut pages: Vec<Vec<usize>> = Vec::new();
    let mut current: Vec<usize> = Vec::new();
    let mut blank_run = 0;

    for (i, line) in lines.iter().enumerate() {
        if *line == "\x0C" || is_marker(line) {
            pages.push(std::mem::take(&mut current));
            blank_run = 0;
            continue;
        }
        if line.is_empty() {
            blank_run += 1;
            if blank_run == PAGE_GAP_LINES {
                pages.push(std::mem::take(&mut current));
            }
            continue;
        }
        blank_run = 0;
        current.push(i);
    }
    pages.push(current);
    pages.retain(|p| !p.is_empty());
    pages
}

/// Keys of first/last lines recurring on enough pages.
fn frequent_edge_lines(lines: &[&str], pages: &[Vec<usize>]) -> HashSet<String> {
    if pages.len() < 2 {
        return HashSet::new();
    }
    let mut counts: HashMap<String, usize> = HashMap::new();
    for page in pages {
        let mut keys: HashSet<String> = HashSet::new();
        if let Some(&first) = page.first() {
            keys.insert(line_key(lines[first]));
        }
        if let Some(&last) = page.last() {
            keys.insert(line_key(lines[last]));
        }
        for key in keys {
            *counts.entry(key).or_insert(0) += 1;
        }
    }
    let required = (pages.len() / 2).max(2);
    counts
        .into_iter()
        .filter(|(_, n)| *n >= required)
        .map(|(k, _)| k)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_header_removed_across_form_feeds() {
        let text = "ESTUDIO PEREZ\nprimera página\nfin uno\n\x0C\nESTUDIO PEREZ\nsegunda página\nfin dos\n\x0C\nESTUDIO PEREZ\ntercera\nfin tres";
        let out = strip_headers_footers(text);
        assert_eq!(out.pages, 3);
        assert!(!out.text.contains("ESTUDIO PEREZ"));
        assert!(out.text.contains("segunda página"));
    }

    #[test]
    fn test_numbered_footer_matches_across_pages() {
        let text = "uno\nPág. 1 de 3\n\x0C\ndos\nHoja 2 - Contrato\n\x0C\ntres\nHoja 3 - Contrato";
        let out = strip_headers_footers(text);
        assert!(!out.text.contains("Hoja"));
        assert!(!out.text.contains("Pág."));
        assert!(out.text.contains("tres"));
    }

    #[test]
    fn test_single_page_untouched() {
        let text = "CLÁUSULA PRIMERA\n\nEl locador...";
        let out = strip_headers_footers(text);
        assert_eq!(out.text, text);
        assert_eq!(out.removed_lines, 0);
    }

    #[test]
    fn test_blank_runs_collapse() {
        let out = strip_headers_footers("a\n\n\n\n\nb");
        assert_eq!(out.text, "a\n\nb");
    }
}
