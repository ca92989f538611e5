//! Employment contract rules (Ley de Contrato de Trabajo).

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;

use crate::finding::{Finding, FindingBuilder, Magnitude};
use crate::legal::{Country, LegalContext};
use crate::rules::ids;
use crate::rules::patterns::{has_negation_near, periods, PeriodUnit};
use crate::scoring::score;
use crate::text::slice_around;
use crate::tuning::{DEFAULT_CONFIDENCE, DEFAULT_CONFIDENCE_THRESHOLD};
use crate::types::{LegalBasis, RuleKind, Severity};

lazy_static! {
    static ref EMPLOYMENT: Regex = Regex::new(
        r"(?i)\b(?:empleador\w*|emplead[oa]s?|trabajador\w*|relaci[oó]n\s+de\s+dependencia|lct|legajo|remuneraci[oó]n\w*|salario\w*)\b"
    ).unwrap();
    static ref PROBATION: Regex = Regex::new(
        r"(?i)\bper[ií]odo\s+de\s+prueba\b|\bper[ií]odo\s+probatorio\b|\bprueba\s+laboral\b"
    ).unwrap();
}

/// Statutory ceiling for indefinite-term contracts (LCT art. 92 bis).
const MAX_PROBATION_MONTHS: f64 = 3.0;
const NEGATION_PENALTY: f64 = 0.25;

/// Probation period, high above the three-month ceiling.
pub fn probation_period(text: &str) -> Vec<Finding> {
    if !EMPLOYMENT.is_match(text) {
        return Vec::new();
    }
    let ctx = LegalContext::resolve(text);
    if ctx.country == Country::Es {
        return Vec::new();
    }
    let Some(m) = PROBATION.find(text) else {
        return Vec::new();
    };
    let index = m.start();

    let period = periods(slice_around(text, index, 240))
        .into_iter()
        .find(|p| matches!(p.unit, PeriodUnit::Days | PeriodUnit::Months));
    let months = period.map(|p| p.months_exact());
    let exceeds = months.is_some_and(|m| m > MAX_PROBATION_MONTHS);
    let negated = has_negation_near(text, index, 160);

    let heuristic = score(&[
        (!negated, 0.8),
        (months.is_some(), 0.6),
        (exceeds, 0.6),
    ]);
    let boost = match months {
        Some(m) if m > MAX_PROBATION_MONTHS => 0.25,
        Some(m) if (m - MAX_PROBATION_MONTHS).abs() < f64::EPSILON => 0.1,
        _ => 0.0,
    };
    let mut confidence = DEFAULT_CONFIDENCE + boost + (heuristic - DEFAULT_CONFIDENCE).max(0.0);
    if negated {
        confidence -= NEGATION_PENALTY;
    }
    let confidence = confidence.min(1.0);
    if confidence < DEFAULT_CONFIDENCE_THRESHOLD {
        return Vec::new();
    }

    let (title, description) = if exceeds {
        (
            "Período de prueba superior al tope legal (art. 92 bis)",
            "El período de prueba supera el máximo legal de tres meses (art. 92 bis LCT). Revisá su validez y adecuá la redacción.",
        )
    } else {
        (
            "Período de prueba (verificar límites legales, art. 92 bis)",
            "Se menciona un período de prueba. En Argentina es de hasta tres meses para contratos por tiempo indeterminado.",
        )
    };

    let mut builder = FindingBuilder::new(ids::EMPLOYMENT_PROBATION, title)
        .description(description)
        .severity(if exceeds { Severity::High } else { Severity::Medium })
        .kind(RuleKind::Legal)
        .confidence(confidence)
        .at(index, 320)
        .context(Country::Ar, ctx.regime)
        .legal_basis(
            LegalBasis::ar("LCT 20.744", "Período de prueba de hasta tres (3) meses.")
                .with_article("art. 92 bis")
                .with_link("https://www.argentina.gob.ar/normativa/nacional/ley-20744-25552/actualizacion"),
        )
        .bullets(&[
            "Verificá que no exceda tres meses en contratos por tiempo indeterminado.",
            "Aclará la cobertura de seguridad social durante el período.",
            "Evitá renovaciones encubiertas del período de prueba.",
        ])
        .keywords(&["período de prueba", "92 bis", "LCT", "tres meses"])
        .extra("heuristicConfidence", json!(heuristic));
    if let Some(p) = period {
        builder = builder.magnitude(match p.unit {
            PeriodUnit::Days => Magnitude::days(p.value),
            _ => Magnitude::months(p.months()),
        });
    }
    vec![builder.build()]
}
