//! Shared detection patterns for rules.
//!
//! Negation lookup, lease/service vocabulary and extraction of periods and
//! percentages. Every helper takes byte offsets into normalized text and
//! slices through [`crate::text`], so multi-byte characters are safe.

use lazy_static::lazy_static;
use regex::Regex;

use crate::text::{floor_boundary, slice_around, slice_before, spelled_number};

lazy_static! {
    // =========================================================================
    // NEGATION
    // =========================================================================

    /// Lexical markers that negate or carve out the clause that follows
    static ref NEGATION: Regex = Regex::new(
        r"(?i)\b(?:no|sin|nunca|ni|jam[aá]s|queda\s+prohibid[oa]|excepto|salvo)\b"
    ).unwrap();

    /// "sin perjuicio" reads as "without prejudice to", not a negation
    static ref SIN_PERJUICIO_TAIL: Regex = Regex::new(r"(?i)^\s+perjuicio\b").unwrap();

    /// "no se aplicará interés", "no devengarán intereses", "sin intereses"
    static ref INTEREST_DENIED: Regex = Regex::new(
        r"(?i)\bno\s+(?:se\s+)?(?:aplic|deveng|cobr|gener)a(?:r(?:[áa]n?)?|n)?\s+(?:ning[uú]n\s+)?inter[eé]s(?:es)?\b|\bsin\s+inter[eé]s(?:es)?\b"
    ).unwrap();

    // =========================================================================
    // CONTEXT VOCABULARY
    // =========================================================================

    /// Lease and rent-price vocabulary
    static ref LEASE_TERMS: Regex = Regex::new(
        r"(?i)\b(?:alquiler\w*|canon|precio|renta|locaci[oó]n|locador\w*|locatari\w*|inquilin\w*|arrendamiento\w*|arrendatari\w*|inmueble|vivienda)\b"
    ).unwrap();

    /// Consumer-service vocabulary
    static ref SERVICE_TERMS: Regex = Regex::new(
        r"(?i)\b(?:servicios?|suscripci[oó]n\w*|suscriptor\w*|plan(?:es)?|proveedor\w*|prestador\w*|abonos?|abonad[oa]s?|baja|alta|portabilidad|usuari[oa]s?|cliente\w*|consumidor\w*|telefon[ií]a|internet|tv|cable|streaming|m[oó]vil|paquete)\b"
    ).unwrap();

    // =========================================================================
    // MAGNITUDES
    // =========================================================================

    /// "dos (2) meses", "24 meses", "treinta y seis meses", "un año"
    static ref PERIOD: Regex = Regex::new(
        r"(?i)\b(?:[a-záéíóúñ]+\s*\(\s*(?P<paren>\d{1,3})\s*\)|(?P<digits>\d{1,3})|(?P<words>[a-záéíóúñ]+(?:\s+y\s+[a-záéíóúñ]+)?))\s*(?P<unit>meses|mes|d[ií]as|d[ií]a|años|año)\b"
    ).unwrap();

    /// "10%", "12.5 %", "10 por ciento"
    static ref PERCENT: Regex = Regex::new(
        r"(?i)(?P<num>\d{1,3}(?:[.,]\d{1,2})?)\s*(?:%|por\s*ciento)"
    ).unwrap();
}

/// True when a negating marker appears in the `window` bytes before `index`.
///
/// "sin perjuicio" is ignored.
pub fn has_negation_near(text: &str, index: usize, window: usize) -> bool {
    let before = slice_before(text, index, window);
    let base = floor_boundary(text, index) - before.len();
    NEGATION.find_iter(before).any(|m| {
        if !m.as_str().eq_ignore_ascii_case("sin") {
            return true;
        }
        let tail = text.get(base + m.end()..).unwrap_or_default();
        !SIN_PERJUICIO_TAIL.is_match(tail)
    })
}

/// Explicit wording that no interest accrues.
pub fn denies_interest(text: &str) -> bool {
    INTEREST_DENIED.is_match(text)
}

/// Lease or rent vocabulary within `radius` bytes of `index`.
pub fn lease_terms_near(text: &str, index: usize, radius: usize) -> bool {
    LEASE_TERMS.is_match(slice_around(text, index, radius))
}

/// Lease or rent vocabulary anywhere in the text.
pub fn mentions_lease(text: &str) -> bool {
    LEASE_TERMS.is_match(text)
}

/// Service-provider vocabulary anywhere in the text.
pub fn mentions_service(text: &str) -> bool {
    SERVICE_TERMS.is_match(text)
}

/// Unit of a [`Period`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodUnit {
    Days,
    Months,
    Years,
}

/// A span of time written in a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub value: u32,
    pub unit: PeriodUnit,
    /// Byte offset of the phrase within the searched slice
    pub start: usize,
}

impl Period {
    /// Length in whole months; days are divided by 30 and rounded.
    pub fn months(&self) -> u32 {
        match self.unit {
            PeriodUnit::Days => (self.value + 15) / 30,
            PeriodUnit::Months => self.value,
            PeriodUnit::Years => self.value.saturating_mul(12),
        }
    }

    /// Length in months without rounding days away.
    pub fn months_exact(&self) -> f64 {
        match self.unit {
            PeriodUnit::Days => f64::from(self.value) / 30.0,
            _ => f64::from(self.months()),
        }
    }
}

/// Every period phrase in `text`, in order of appearance.
pub fn periods(text: &str) -> Vec<Period> {
    PERIOD
        .captures_iter(text)
        .filter_map(|caps| {
            let value = if let Some(n) = caps.name("paren").or_else(|| caps.name("digits")) {
                n.as_str().parse::<u32>().ok()?
            } else {
                let words = caps.name("words")?.as_str();
                spelled_number(words).or_else(|| {
                    // "pagos y dos meses": only the last word is the number
                    words.rsplit(char::is_whitespace).next().and_then(spelled_number)
                })?
            };
            if value == 0 {
                return None;
            }
            let unit = caps.name("unit")?.as_str().to_lowercase();
            let unit = if unit.starts_with("mes") {
                PeriodUnit::Months
            } else if unit.starts_with('d') {
                PeriodUnit::Days
            } else {
                PeriodUnit::Years
            };
            Some(Period {
                value,
                unit,
                start: caps.get(0)?.start(),
            })
        })
        .collect()
}

/// Every percentage in `text`.
pub fn percents(text: &str) -> Vec<f64> {
    PERCENT
        .captures_iter(text)
        .filter_map(|caps| caps.name("num")?.as_str().replace(',', ".").parse().ok())
        .collect()
}

/// True when `text` contains a percentage.
pub fn has_percent(text: &str) -> bool {
    PERCENT.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negation_before_anchor() {
        let text = "No se aplicarán intereses punitorios.";
        let idx = text.find("intereses").unwrap();
        assert!(has_negation_near(text, idx, 60));

        let text = "El locatario pagará intereses punitorios.";
        let idx = text.find("intereses").unwrap();
        assert!(!has_negation_near(text, idx, 60));
    }

    #[test]
    fn test_interest_denial_in_every_tense() {
        assert!(denies_interest("no se aplicará interés punitorio"));
        assert!(denies_interest("No se aplicarán intereses punitorios"));
        assert!(denies_interest("el saldo no devengará intereses"));
        assert!(denies_interest("no se cobran intereses"));
        assert!(denies_interest("cuotas sin interés"));
        assert!(!denies_interest("se aplicará interés punitorio del 2% por mes"));
        assert!(!denies_interest("si no paga, se cobrarán intereses"));
    }

    #[test]
    fn test_sin_perjuicio_is_not_negation() {
        let text = "Sin perjuicio de lo anterior, se aplicará una multa.";
        let idx = text.find("multa").unwrap();
        assert!(!has_negation_near(text, idx, 60));

        let text = "El servicio se presta sin multa alguna.";
        let idx = text.find("multa").unwrap();
        assert!(has_negation_near(text, idx, 60));
    }

    #[test]
    fn test_negation_is_whole_word() {
        // "nominal" and "sinergia" contain markers as prefixes only
        let text = "valor nominal y sinergia del plan de ajuste";
        let idx = text.find("ajuste").unwrap();
        assert!(!has_negation_near(text, idx, 60));
    }

    #[test]
    fn test_periods_in_all_forms() {
        let found = periods("un plazo de 24 meses, luego dos (2) años y treinta y seis meses y 90 días");
        let values: Vec<(u32, PeriodUnit)> = found.iter().map(|p| (p.value, p.unit)).collect();
        assert_eq!(
            values,
            [
                (24, PeriodUnit::Months),
                (2, PeriodUnit::Years),
                (36, PeriodUnit::Months),
                (90, PeriodUnit::Days),
            ]
        );
        assert_eq!(found[1].months(), 24);
        assert_eq!(found[3].months(), 3);
    }

    #[test]
    fn test_period_words_with_conjunction_prefix() {
        let found = periods("gastos y dos meses");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].value, 2);
    }

    #[test]
    fn test_percents() {
        assert_eq!(percents("un 3% mensual y 12,5 % anual"), vec![3.0, 12.5]);
        assert!(has_percent("10 por ciento"));
        assert!(!has_percent("sin porcentaje"));
    }

    #[test]
    fn test_context_vocabulary() {
        assert!(mentions_lease("El LOCATARIO abonará el canon"));
        assert!(!mentions_lease("El usuario contrata el servicio"));
        assert!(mentions_service("El usuario contrata el servicio"));
    }
}
