//! Character-level cleanup passes.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::text::spelled_number;

lazy_static! {
    // "dos (2) meses", "treinta y seis (36) meses"
    static ref SPELLED_WITH_DIGITS: Regex = Regex::new(
        r"(?i)\b((?:[a-záéíóúñ]+\s+y\s+)?[a-záéíóúñ]+)\s*\(\s*(\d{1,3})\s*\)\s*(meses|mes|d[ií]as|d[ií]a|años|año|semanas|semana|horas|hora)\b"
    ).unwrap();
    static ref DECIMAL_PERCENT: Regex = Regex::new(r"(\d+),(\d{1,2})\s*%").unwrap();
    static ref SPACED_CURRENCY: Regex = Regex::new(r"\$\s+(\d)").unwrap();
}

/// Map typographic characters to their plain forms.
pub fn canonicalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' => out.push('"'),
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' => out.push('\''),
            '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}' | '\u{2212}' => out.push('-'),
            '\u{FB00}' => out.push_str("ff"),
            '\u{FB01}' => out.push_str("fi"),
            '\u{FB02}' => out.push_str("fl"),
            '\u{FB03}' => out.push_str("ffi"),
            '\u{FB04}' => out.push_str("ffl"),
            '\u{FB05}' | '\u{FB06}' => out.push_str("st"),
            '\u{00A0}' | '\u{202F}' | '\u{2007}' => out.push(' '),
            '\u{00AD}' | '\u{200B}' | '\u{FEFF}' => {}
            '\u{2026}' => out.push_str("..."),
            other => out.push(other),
        }
    }
    out
}

/// Join words split across a line break with a trailing hyphen.
///
/// `alnum-<newline>alnum` becomes `alnumalnum`. Spaces and tabs on either
/// side of the line break are skipped. The scan looks at the
/// already-emitted output, so chains like `a-\nb-\nc` join fully.
pub fn dehyphenate(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '-' && out.chars().last().is_some_and(char::is_alphanumeric) {
            if let Some(next) = continuation(&chars, i + 1) {
                i = next;
                continue;
            }
        }
        out.push(c);
        i += 1;
    }
    out
}

/// Index of the word that continues after a hyphen at `from - 1`, if the
/// hyphen ends its line.
fn continuation(chars: &[char], from: usize) -> Option<usize> {
    let is_blank = |c: &char| *c == ' ' || *c == '\t';
    let mut i = from;
    while chars.get(i).is_some_and(is_blank) {
        i += 1;
    }
    match (chars.get(i), chars.get(i + 1)) {
        (Some('\r'), Some('\n')) => i += 2,
        (Some('\r'), _) | (Some('\n'), _) => i += 1,
        _ => return None,
    }
    while chars.get(i).is_some_and(is_blank) {
        i += 1;
    }
    chars.get(i).is_some_and(|c| c.is_alphanumeric()).then_some(i)
}

/// Normalize line endings and collapse horizontal whitespace per line.
///
/// Form feeds are kept on a line of their own so page splitting can see them.
pub fn collapse_whitespace(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut lines: Vec<String> = Vec::new();
    for raw_line in unified.split('\n') {
        let mut pieces = raw_line.split('\x0C').peekable();
        while let Some(piece) = pieces.next() {
            lines.push(collapse_line(piece));
            if pieces.peek().is_some() {
                lines.push("\x0C".to_string());
            }
        }
    }
    lines.join("\n")
}

fn collapse_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut pending_space = false;
    for c in line.chars() {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(c);
    }
    out
}

/// Rewrite number, percentage and currency notations into one form.
pub fn semantic(text: &str) -> String {
    let spelled = SPELLED_WITH_DIGITS.replace_all(text, |caps: &Captures| {
        let digits: u32 = caps[2].parse().unwrap_or(0);
        match spelled_number(&caps[1]) {
            Some(n) if n == digits => format!("{} {}", digits, &caps[3]),
            _ => caps[0].to_string(),
        }
    });
    let percent = DECIMAL_PERCENT.replace_all(&spelled, "${1}.${2}%");
    SPACED_CURRENCY.replace_all(&percent, "$$${1}").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize() {
        assert_eq!(
            canonicalize("\u{201C}o\u{FB01}cina\u{201D} \u{2013} art\u{00AD}\u{00A0}5\u{2026}"),
            "\"oficina\" - art 5..."
        );
    }

    #[test]
    fn test_dehyphenate_variants() {
        assert_eq!(dehyphenate("pala-\nbra"), "palabra");
        assert_eq!(dehyphenate("pala-\r\nbra"), "palabra");
        assert_eq!(dehyphenate("a-\nb-\nc"), "abc");
        assert_eq!(dehyphenate("alqui- \nler"), "alquiler");
        assert_eq!(dehyphenate("alqui-\n    ler"), "alquiler");
        assert_eq!(dehyphenate("alqui-\t\r\n\tler"), "alquiler");
        assert_eq!(dehyphenate("guion - \nsuelto"), "guion - \nsuelto");
        assert_eq!(dehyphenate("fin-\n\nnuevo"), "fin-\n\nnuevo");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(
            collapse_whitespace("  uno\t\t dos  \r\ntres\rcuatro "),
            "uno dos\ntres\ncuatro"
        );
        assert_eq!(collapse_whitespace("a\x0Cb"), "a\n\x0C\nb");
    }

    #[test]
    fn test_semantic_spelled_numbers() {
        assert_eq!(semantic("un (1) mes de alquiler"), "1 mes de alquiler");
        assert_eq!(semantic("DOS (2) MESES"), "2 MESES");
        assert_eq!(semantic("treinta y seis (36) meses"), "36 meses");
        // mismatch is kept as written
        assert_eq!(semantic("dos (3) meses"), "dos (3) meses");
    }

    #[test]
    fn test_semantic_percent_and_currency() {
        assert_eq!(semantic("interés del 12,5 % mensual"), "interés del 12.5% mensual");
        assert_eq!(semantic("la suma de $ 150.000"), "la suma de $150.000");
    }
}
