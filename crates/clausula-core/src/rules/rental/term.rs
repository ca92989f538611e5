//! Lease term rules: statutory minimum, informative duration and the
//! temporary-lease inconsistency.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;

use super::lease_context_near;
use crate::finding::{Finding, FindingBuilder, Magnitude};
use crate::legal::{Country, LeaseKind, LegalContext, Regime};
use crate::rules::ids;
use crate::rules::patterns::{has_negation_near, lease_terms_near, periods, Period, PeriodUnit};
use crate::scoring::score;
use crate::text::{slice_after, slice_around};
use crate::tuning::{DEFAULT_CONFIDENCE_THRESHOLD, NEGATION_WINDOW, SIGNAL_WINDOW};
use crate::types::{LegalBasis, RuleKind, Severity};

lazy_static! {
    static ref TERM_TRIGGER: Regex = Regex::new(r"(?i)\b(?:plazo|duraci[oó]n|vigencia)\b").unwrap();
    static ref DURATION_TRIGGER: Regex =
        Regex::new(r"(?i)\b(?:duraci[oó]n|vigencia|pr[oó]rroga|reconducci[oó]n)\b").unwrap();

    static ref TEMPORARY_LEASE: Regex = Regex::new(r"(?i)\blocaci[oó]n\s+temporaria\b").unwrap();
    static ref HOUSING_PURPOSE: Regex = Regex::new(r"(?i)\b(?:destino|uso)\s+(?:de\s+)?vivienda\b").unwrap();
    static ref ONE_YEAR_TERM: Regex = Regex::new(
        r"(?i)\b(?:plazo|duraci[oó]n)\b[^\n]{0,80}?\b(?:1|un|uno)\s*(?:\(\s*1\s*\)\s*)?(?:año|anio)\b|\b12\s+mes(?:es)?\b"
    ).unwrap();
}

/// Statutory minimum for housing leases under Ley 27.551 and Ley 27.737.
const MIN_TERM_MONTHS: u32 = 36;
const TRIGGER_DISTANCE: usize = 300;

fn is_term(p: &Period) -> bool {
    matches!(p.unit, PeriodUnit::Months | PeriodUnit::Years)
}

/// Duration in months and its absolute offset, preferring one written right
/// after a term trigger.
fn find_duration(text: &str) -> Option<(u32, usize, bool)> {
    for trigger in TERM_TRIGGER.find_iter(text) {
        let after = slice_after(text, trigger.start(), TRIGGER_DISTANCE);
        if let Some(p) = periods(after).into_iter().find(is_term) {
            return Some((p.months(), trigger.start() + p.start, true));
        }
    }
    periods(text)
        .into_iter()
        .find(is_term)
        .map(|p| (p.months(), p.start, false))
}

/// Housing lease shorter than the 36-month statutory minimum.
pub fn minimum_term(text: &str) -> Vec<Finding> {
    let ctx = LegalContext::resolve(text);
    if ctx.country != Country::Ar {
        return Vec::new();
    }
    if matches!(ctx.lease_kind, LeaseKind::Temporaria | LeaseKind::Comercial) {
        return Vec::new();
    }
    if !matches!(ctx.regime, Regime::Ley27551 | Regime::Ley27737) {
        return Vec::new();
    }
    let Some(trigger) = TERM_TRIGGER.find(text) else {
        return Vec::new();
    };
    let Some((months, index, near_trigger)) = find_duration(text) else {
        return Vec::new();
    };
    if months >= MIN_TERM_MONTHS {
        return Vec::new();
    }

    let confidence = score(&[
        (true, 1.0),
        (lease_terms_near(text, index, 200), 1.2),
        (!has_negation_near(text, index, NEGATION_WINDOW), 0.8),
        (near_trigger || index.abs_diff(trigger.start()) <= TRIGGER_DISTANCE, 1.0),
    ]);

    let mut builder = FindingBuilder::new(ids::RENTAL_MINIMUM_TERM, "Duración inferior al mínimo legal")
        .description(format!(
            "La duración indicada es de {} meses, por debajo del mínimo de {} meses para locaciones de vivienda.",
            months, MIN_TERM_MONTHS
        ))
        .severity(Severity::High)
        .kind(RuleKind::Legal)
        .confidence(confidence)
        .at(index, 240)
        .legal_context(&ctx)
        .magnitude(Magnitude::months(months))
        .legal_basis(LegalBasis::ar(
            "Ley 27.551 / CCyC",
            "Plazo mínimo de 36 meses para inmuebles destinados a vivienda.",
        ))
        .bullets(&[
            "La duración mínima para vivienda es de 36 meses.",
            "Confirmá que la cláusula de vigencia respete el régimen de la fecha de firma.",
        ])
        .keywords(&["plazo", "duración", "vigencia", "meses", "años"]);
    if ctx.regime == Regime::Ley27737 {
        builder = builder.legal_basis(LegalBasis::ar(
            "Ley 27.737",
            "Mantiene el mínimo de 36 meses con cambios transitorios.",
        ));
    }
    vec![builder.build()]
}

/// Informative duration and renewal clause.
pub fn duration(text: &str) -> Vec<Finding> {
    let ctx = LegalContext::resolve(text);
    if ctx.country != Country::Ar {
        return Vec::new();
    }
    let Some(m) = DURATION_TRIGGER.find(text) else {
        return Vec::new();
    };
    let index = m.start();

    let period = periods(slice_around(text, index, SIGNAL_WINDOW))
        .into_iter()
        .find(is_term);
    let confidence = score(&[
        (lease_context_near(text, index, 220), 1.2),
        (period.is_some(), 1.0),
        (!has_negation_near(text, index, NEGATION_WINDOW), 0.8),
    ]);
    if confidence < DEFAULT_CONFIDENCE_THRESHOLD {
        return Vec::new();
    }

    let mut builder = FindingBuilder::new(ids::RENTAL_DURATION, "Duración y prórroga")
        .description(
            "Revisá que el plazo cumpla los mínimos legales y cómo operan la prórroga y el preaviso.",
        )
        .severity(Severity::Low)
        .kind(RuleKind::Legal)
        .confidence(confidence)
        .at(index, 260)
        .legal_context(&ctx)
        .bullets(&[
            "Controlá que el plazo no sea menor al legal.",
            "Verificá si hay prórroga automática al vencimiento.",
            "Chequeá si exigen preaviso para terminar el contrato.",
        ])
        .keywords(&["duración", "vigencia", "prórroga", "reconducción", "preaviso"]);
    if let Some(p) = period {
        builder = builder.magnitude(Magnitude::months(p.months()));
    }
    vec![builder.build()]
}

/// Temporary lease that also declares a housing purpose and a one-year term.
pub fn temporary_inconsistency(text: &str) -> Vec<Finding> {
    let Some(temporary) = TEMPORARY_LEASE.find(text) else {
        return Vec::new();
    };
    if !HOUSING_PURPOSE.is_match(text) || !ONE_YEAR_TERM.is_match(text) {
        return Vec::new();
    }

    vec![FindingBuilder::new(
        ids::RENTAL_TEMPORARY_INCONSISTENCY,
        "Inconsistencia: locación temporaria con destino vivienda y plazo de un año",
    )
    .description(
        "Se declara una locación temporaria pero también destino vivienda y un plazo de un año. La calificación puede no sostenerse.",
    )
    .severity(Severity::Medium)
    .confidence(0.75)
    .at(temporary.start(), 300)
    .keywords(&["locación temporaria", "vivienda", "plazo 1 año"])
    .extra("housingPurpose", json!(true))
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
    fn test_minimum_term_under_27551() {
        let text = norm("Buenos Aires, 15/03/2021. Contrato de locación de vivienda. El plazo de la locación será de dos (2) años, con un alquiler mensual de $ 100.000.");
        let found = minimum_term(&text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::High);
        assert_eq!(found[0].months(), Some(24.0));
    }

    #[test]
    fn test_minimum_term_respected() {
        let text = norm("Argentina, 15/03/2021. El plazo de la locación será de 36 meses. Alquiler de $ 100.000.");
        assert!(minimum_term(&text).is_empty());
    }

    #[test]
    fn test_minimum_term_skipped_under_dnu_and_for_temporary() {
        let dnu = norm("Argentina, 10/02/2024. El plazo de la locación será de 24 meses. Alquiler de $ 100.000.");
        assert!(minimum_term(&dnu).is_empty());

        let temporary = norm("Argentina, 15/03/2021. Locación temporaria por turismo. El plazo será de 2 meses. Alquiler de $ 100.000.");
        assert!(minimum_term(&temporary).is_empty());
    }

    #[test]
    fn test_duration_one_year() {
        let text = norm("Contrato de locación en Argentina con duración de un (1) año calendario a partir de la firma.");
        let found = duration(&text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::Low);
        assert_eq!(found[0].months(), Some(12.0));
    }

    #[test]
    fn test_temporary_inconsistency() {
        let text = "LOCACIÓN TEMPORARIA. El inmueble tendrá destino vivienda. El plazo será de un (1) año.";
        let found = temporary_inconsistency(text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].index, Some(0));

        let consistent = "LOCACIÓN TEMPORARIA por turismo. El plazo será de 15 días.";
        assert!(temporary_inconsistency(consistent).is_empty());
    }
}
