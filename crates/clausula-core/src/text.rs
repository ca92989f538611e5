//! Byte-offset helpers over UTF-8 text.
//!
//! Every index in this crate is a byte offset into normalized text. These
//! helpers clamp and snap offsets so slicing never panics on multi-byte
//! characters (accented vowels, ñ, ª, º).

/// Largest char boundary `<= index`, clamped to the text length.
pub fn floor_boundary(text: &str, index: usize) -> usize {
    let mut i = index.min(text.len());
    while !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Smallest char boundary `>= index`, clamped to the text length.
pub fn ceil_boundary(text: &str, index: usize) -> usize {
    let mut i = index.min(text.len());
    while !text.is_char_boundary(i) {
        i += 1;
    }
    i
}

/// Slice `radius` bytes on each side of `index`.
pub fn slice_around(text: &str, index: usize, radius: usize) -> &str {
    let (start, end) = bounds_around(text, index, radius);
    &text[start..end]
}

/// Byte bounds of [`slice_around`].
pub fn bounds_around(text: &str, index: usize, radius: usize) -> (usize, usize) {
    let start = floor_boundary(text, index.saturating_sub(radius));
    let end = ceil_boundary(text, index.saturating_add(radius));
    (start, end)
}

/// Slice up to `radius` bytes ending at `index`.
pub fn slice_before(text: &str, index: usize, radius: usize) -> &str {
    let end = floor_boundary(text, index);
    let start = floor_boundary(text, end.saturating_sub(radius));
    &text[start..end]
}

/// Slice from `index` forward, at most `radius` bytes.
pub fn slice_after(text: &str, index: usize, radius: usize) -> &str {
    let start = floor_boundary(text, index);
    let end = ceil_boundary(text, start.saturating_add(radius));
    &text[start..end]
}

/// Value of a spelled-out Spanish number ("dos", "treinta y seis").
///
/// Covers 1..=99, which is enough for months, days and percentages in
/// contract clauses. Case-insensitive; accents are optional.
pub fn spelled_number(words: &str) -> Option<u32> {
    let lower = words.trim().to_lowercase();
    let parts: Vec<&str> = lower.split_whitespace().collect();
    match parts.as_slice() {
        [single] => single_word_number(single),
        [tens, "y", unit] => {
            let t = tens_word(tens)?;
            let u = single_word_number(unit).filter(|u| (1..=9).contains(u))?;
            Some(t + u)
        }
        _ => None,
    }
}

fn single_word_number(word: &str) -> Option<u32> {
    let n = match word {
        "un" | "uno" | "una" => 1,
        "dos" => 2,
        "tres" => 3,
        "cuatro" => 4,
        "cinco" => 5,
        "seis" => 6,
        "siete" => 7,
        "ocho" => 8,
        "nueve" => 9,
        "diez" => 10,
        "once" => 11,
        "doce" => 12,
        "trece" => 13,
        "catorce" => 14,
        "quince" => 15,
        "dieciseis" | "dieciséis" => 16,
        "diecisiete" => 17,
        "dieciocho" => 18,
        "diecinueve" => 19,
        "veintiuno" | "veintiún" | "veintiun" => 21,
        "veintidos" | "veintidós" => 22,
        "veintitres" | "veintitrés" => 23,
        "veinticuatro" => 24,
        "veinticinco" => 25,
        "veintiseis" | "veintiséis" => 26,
        "veintisiete" => 27,
        "veintiocho" => 28,
        "veintinueve" => 29,
        other => return tens_word(other),
    };
    Some(n)
}

fn tens_word(word: &str) -> Option<u32> {
    let n = match word {
        "veinte" => 20,
        "treinta" => 30,
        "cuarenta" => 40,
        "cincuenta" => 50,
        "sesenta" => 60,
        "setenta" => 70,
        "ochenta" => 80,
        "noventa" => 90,
        _ => return None,
    };
    Some(n)
}
