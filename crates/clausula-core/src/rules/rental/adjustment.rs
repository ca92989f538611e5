//! Rent adjustment rules.
//!
//! `alquiler-ajuste-periodicidad` checks the adjustment interval against the
//! regime in force: Ley 27.551 allows yearly adjustments only, Ley 27.737
//! requires six-month intervals, and DNU 70/2023 leaves it to the parties.
//! `alquiler-indexacion` reports the index clause itself.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_json::json;

use crate::finding::{Finding, FindingBuilder, Magnitude};
use crate::legal::{Country, LegalContext, Regime};
use crate::rules::ids;
use crate::rules::patterns::{has_negation_near, has_percent, lease_terms_near};
use crate::scoring::score;
use crate::text::{bounds_around, slice_around, spelled_number};
use crate::tuning::{DEFAULT_CONFIDENCE_THRESHOLD, NEGATION_WINDOW};
use crate::types::{LegalBasis, RuleKind, Severity};

lazy_static! {
    static ref ADJUSTMENT_TRIGGER: Regex = Regex::new(
        r"(?i)\b(?:ajuste|ajustar\w*|reajuste|actualizaci[oó]n|actualizar\w*|indexaci[oó]n|readecuaci[oó]n|revisi[oó]n|incremento|incrementar|aumento|aumentar)\b"
    ).unwrap();
    static ref INDEXATION_TRIGGER: Regex = Regex::new(
        r"(?i)\b(?:ajuste|ajustar\w*|reajuste|actualizaci[oó]n|actualizar\w*|indexaci[oó]n|readecuaci[oó]n|revisi[oó]n|variaci[oó]n|incremento|incrementar|aumento|aumentar)\b"
    ).unwrap();

    /// Interval phrases near a trigger, most specific first. `None` means
    /// the count is captured in `n`.
    static ref PERIODICITY: Vec<(Regex, Option<u32>)> = vec![
        (Regex::new(r"(?i)\bcada\s+(?P<n>\d{1,2}|[a-záéíóúñ]+)\s*mes(?:es)?\b").unwrap(), None),
        (Regex::new(r"(?i)\ba\s+los?\s+(?P<n>\d{1,2}|[a-záéíóúñ]+)\s*mes(?:es)?\b").unwrap(), None),
        (Regex::new(r"(?i)\b(?:a\s+partir\s+de|transcurridos?|cumplidos?)\s+(?:los?\s+)?(?P<n>\d{1,2}|[a-záéíóúñ]+)\s*mes(?:es)?\b").unwrap(), None),
        (Regex::new(r"(?i)\b(?:para\s+los\s+restantes|durante\s+los\s+siguientes|(?:durante|por)\s+los\s+pr[oó]ximos)\s+(?P<n>\d{1,2}|[a-záéíóúñ]+)\s*mes(?:es)?\b").unwrap(), None),
        (Regex::new(r"(?i)\bsemestral\w*\b").unwrap(), Some(6)),
        (Regex::new(r"(?i)\banual\w*\b").unwrap(), Some(12)),
        (Regex::new(r"(?i)\bmensual\w*\b").unwrap(), Some(1)),
        (Regex::new(r"(?i)\btrimestral\w*\b").unwrap(), Some(3)),
        (Regex::new(r"(?i)\bbimestral\w*\b").unwrap(), Some(2)),
        (Regex::new(r"(?i)\b(?:primer|segundo|1(?:er)?|2(?:do)?|1º|2º)\s+semestre\b").unwrap(), Some(6)),
        (Regex::new(r"(?i)\bcada\s+semestre\b").unwrap(), Some(6)),
    ];

    /// Interval phrases that stand on their own anywhere in the text.
    static ref PERIODICITY_FALLBACK: Vec<(Regex, Option<u32>)> = vec![
        (Regex::new(r"(?i)\b(?:para\s+los\s+restantes|durante\s+los\s+siguientes|(?:durante|por)\s+los\s+pr[oó]ximos)\s+(?P<n>\d{1,2}|[a-záéíóúñ]+)\s*mes(?:es)?\b").unwrap(), None),
        (Regex::new(r"(?i)\ba\s+los?\s+(?P<n>\d{1,2})\s*mes(?:es)?\b").unwrap(), None),
        (Regex::new(r"(?i)\bcada\s+(?P<n>\d{1,2})\s*mes(?:es)?\b").unwrap(), None),
        (Regex::new(r"(?i)\bsemestral\w*\b").unwrap(), Some(6)),
        (Regex::new(r"(?i)\banual\w*\b").unwrap(), Some(12)),
        (Regex::new(r"(?i)\b(?:primer|segundo|1(?:er)?|2(?:do)?|1º|2º)\s+semestre\b").unwrap(), Some(6)),
    ];

    static ref INDEX_REFERENCE: Regex = Regex::new(
        r"(?i)\b(?:ipc|uvas?|inflaci[oó]n|icl|ripte|coef(?:iciente)?|casa\s+propia|salarios?|[íi]ndices?|bcra|indec)\b"
    ).unwrap();
    static ref PLACEHOLDER_INDEX: Regex = Regex::new(
        r"(?i)\b(?:[íi]ndice|coef(?:iciente)?)\b.*?\ba\s+(?:definir|determinar|acordar|convenir|elecci[oó]n|criterio)\b"
    ).unwrap();
    static ref PERIOD_WORD: Regex = Regex::new(
        r"(?i)\b(?:mensual|bimestral|trimestral|semestral|anual)\w*\b|\bcada\s+\d+\s*mes(?:es)?\b"
    ).unwrap();
}

const PERIODICITY_RADIUS: usize = 480;
const PERCENT_RADIUS: usize = 420;
const INDEX_RADIUS: usize = 260;

/// Interval in months and the offset the finding anchors on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Periodicity {
    months: u32,
    index: usize,
}

fn interval_months(caps: &Captures, fixed: Option<u32>) -> Option<u32> {
    if let Some(months) = fixed {
        return Some(months);
    }
    let n = caps.name("n")?.as_str();
    n.parse::<u32>()
        .ok()
        .or_else(|| spelled_number(n))
        .filter(|m| *m > 0)
}

fn first_interval(table: &[(Regex, Option<u32>)], text: &str) -> Option<(u32, usize)> {
    table.iter().find_map(|(re, fixed)| {
        re.captures_iter(text).find_map(|caps| {
            let months = interval_months(&caps, *fixed)?;
            Some((months, caps.get(0)?.start()))
        })
    })
}

fn detect_periodicity(text: &str) -> Option<Periodicity> {
    if let Some(trigger) = ADJUSTMENT_TRIGGER.find(text) {
        let (start, end) = bounds_around(text, trigger.start(), PERIODICITY_RADIUS);
        if let Some((months, _)) = first_interval(&PERIODICITY, &text[start..end]) {
            return Some(Periodicity {
                months,
                index: trigger.start(),
            });
        }
    }
    first_interval(&PERIODICITY_FALLBACK, text).map(|(months, index)| Periodicity { months, index })
}

fn percent_near(text: &str, index: usize, radius: usize) -> bool {
    let around = slice_around(text, index, radius);
    around.contains('%') || has_percent(around)
}

/// Adjustment interval not allowed by the regime in force.
pub fn adjustment_periodicity(text: &str) -> Vec<Finding> {
    let ctx = LegalContext::resolve(text);
    if ctx.country != Country::Ar {
        return Vec::new();
    }
    let limit = match ctx.regime {
        Regime::Ley27551 => 12,
        Regime::Ley27737 => 6,
        _ => return Vec::new(),
    };

    let Some(periodicity) = detect_periodicity(text) else {
        return Vec::new();
    };
    let violates = match ctx.regime {
        Regime::Ley27551 => periodicity.months < limit,
        _ => periodicity.months != limit,
    };
    if !violates {
        return Vec::new();
    }

    let index = periodicity.index;
    let has_pct = percent_near(text, index, PERCENT_RADIUS);
    let confidence = score(&[
        (lease_terms_near(text, index, 300), 1.3),
        (true, 1.0),
        (has_pct, 1.0),
        (!has_negation_near(text, index, NEGATION_WINDOW), 0.8),
    ]);
    if confidence < DEFAULT_CONFIDENCE_THRESHOLD {
        return Vec::new();
    }

    let short = periodicity.months < limit;
    let severity = if short || has_pct {
        Severity::High
    } else {
        Severity::Medium
    };
    let basis = if ctx.regime == Regime::Ley27551 {
        LegalBasis::ar("Ley 27.551", "Ajuste anual del canon según el índice ICL.")
    } else {
        LegalBasis::ar(
            "Ley 27.737",
            "Ajuste semestral según el Coeficiente Casa Propia.",
        )
    };

    vec![FindingBuilder::new(ids::RENTAL_ADJUSTMENT_PERIODICITY, "Periodicidad de ajuste no permitida")
        .description(format!(
            "El canon se ajusta cada {} meses; el régimen {} exige ajustes cada {} meses.",
            periodicity.months, ctx.regime, limit
        ))
        .severity(severity)
        .kind(RuleKind::Legal)
        .confidence(confidence)
        .at(index, 320)
        .legal_context(&ctx)
        .magnitude(Magnitude::months(periodicity.months))
        .legal_basis(basis)
        .bullets(&[
            "Verificá la fecha de firma: define qué régimen de ajuste aplica.",
            "Pedí que el ajuste respete la periodicidad legal.",
            "Evitá porcentajes fijos de aumento si el régimen exige un índice.",
        ])
        .keywords(&["ajuste", "actualización", "meses", "semestral", "anual", "%"])
        .extra("explicitPercent", json!(has_pct))
        .build()]
}

/// Rent indexation clause.
pub fn indexation(text: &str) -> Vec<Finding> {
    let ctx = LegalContext::resolve(text);
    if ctx.country != Country::Ar {
        return Vec::new();
    }
    let Some(m) = INDEXATION_TRIGGER.find(text) else {
        return Vec::new();
    };
    let index = m.start();
    if has_negation_near(text, index, NEGATION_WINDOW) {
        return Vec::new();
    }

    let around = slice_around(text, index, INDEX_RADIUS);
    let index_ref = INDEX_REFERENCE.is_match(around);
    let placeholder = PLACEHOLDER_INDEX.is_match(around);
    let has_period = PERIOD_WORD.is_match(around);
    let has_pct = around.contains('%') || has_percent(around);

    let confidence = score(&[
        (lease_terms_near(text, index, 240), 1.3),
        (index_ref || placeholder, 1.1),
        (true, 0.8),
    ]);
    if confidence < 0.65 {
        return Vec::new();
    }

    let severity = if (index_ref || placeholder) && (has_period || has_pct) {
        Severity::Medium
    } else {
        Severity::Low
    };

    vec![FindingBuilder::new(ids::RENTAL_INDEXATION, "Actualización o indexación del canon")
        .description(
            "Se menciona una cláusula de ajuste. Verificá el índice de referencia, la periodicidad y si existen topes.",
        )
        .severity(severity)
        .kind(RuleKind::Legal)
        .confidence(confidence)
        .at(index, 300)
        .legal_context(&ctx)
        .legal_basis(LegalBasis::ar(
            "Ley 27.551",
            "Actualización del canon locativo por índice oficial.",
        ))
        .legal_basis(LegalBasis::ar(
            "DNU 70/2023",
            "Libertad de pacto del índice para contratos posteriores.",
        ))
        .keywords(&["ajuste", "indexación", "IPC", "ICL", "RIPTE", "UVA", "índice"])
        .extra("indexReference", json!(index_ref))
        .extra("placeholderIndex", json!(placeholder))
        .build()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    fn norm(raw: &str) -> String {
        normalize(raw).unwrap().text().to_string()
    }

    #[test]
    fn test_quarterly_adjustment_under_27551() {
        let text = norm("Buenos Aires, 01/08/2021. El canon locativo se ajustará cada tres (3) meses según ICL.");
        let found = adjustment_periodicity(&text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].months(), Some(3.0));
        assert_eq!(found[0].severity, Severity::High);
    }

    #[test]
    fn test_yearly_adjustment_allowed_under_27551() {
        let text = norm("Buenos Aires, 01/08/2021. El canon locativo tendrá un ajuste anual según ICL.");
        assert!(adjustment_periodicity(&text).is_empty());
    }

    #[test]
    fn test_yearly_adjustment_violates_27737() {
        let text = norm("Argentina, 01/11/2023. El alquiler se actualizará cada 12 meses por Casa Propia.");
        let found = adjustment_periodicity(&text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::Medium);
    }

    #[test]
    fn test_skipped_under_dnu() {
        let text = norm("Buenos Aires, 01/03/2024. El alquiler se actualizará cada 3 meses.");
        assert!(adjustment_periodicity(&text).is_empty());
    }

    #[test]
    fn test_spelled_interval_in_fallback() {
        let text = "Para los restantes seis meses el canon se fija en $ 100.";
        assert_eq!(
            first_interval(&PERIODICITY_FALLBACK, text).map(|(m, _)| m),
            Some(6)
        );
    }

    #[test]
    fn test_indexation_with_ipc_and_ripte() {
        let text = norm("Para los restantes seis meses, el canon mensual se actualizará conforme la variación del IPC y RIPTE publicada por el BCRA.");
        let found = indexation(&text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::Medium);
    }

    #[test]
    fn test_negated_indexation_does_not_fire() {
        let text = norm("En Argentina, no habrá actualización del canon durante el primer año.");
        assert!(indexation(&text).is_empty());
    }
}
