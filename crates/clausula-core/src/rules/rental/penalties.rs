//! Early termination, penalty clauses and late-payment interest in leases.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;

use super::lease_context_near;
use crate::finding::{Finding, FindingBuilder, Magnitude};
use crate::legal::{Country, LegalContext};
use crate::rules::ids;
use crate::rules::patterns::{denies_interest, has_negation_near, percents};
use crate::scoring::score;
use crate::text::slice_around;
use crate::tuning::{DEFAULT_CONFIDENCE_THRESHOLD, NEGATION_WINDOW};
use crate::types::{LegalBasis, RuleKind, Severity};

lazy_static! {
    static ref TERMINATION: Regex = Regex::new(
        r"(?i)\b(?:desistim\w*|resoluci[oó]n|rescisi[oó]n|preaviso|penalizaci[oó]n|multa|indemnizaci[oó]n)\b"
    ).unwrap();
    static ref TERMINATION_TERMS: Regex = Regex::new(
        r"(?i)\b(?:terminaci[oó]n|finalizaci[oó]n|baja|preaviso\s+de\s+\d+|d[ií]as)\b"
    ).unwrap();
    static ref TERMINATION_AMOUNTS: Regex = Regex::new(
        r"(?i)\$\s?\d|\d+\s*%|\bporcentaje\b|\bmes(?:es)?\s+de\s+alquiler\b"
    ).unwrap();

    static ref PENALTY_ANCHOR: Regex = Regex::new(
        r"(?i)\bindemnizaci[oó]n\s+por\s+ocupaci[oó]n\s+ileg[íi]tima\b|\bcl[áa]usula\s+penal\b|\bocupaci[oó]n\s+ileg[íi]tima\b"
    ).unwrap();
    static ref RENT: Regex = Regex::new(r"(?i)\b(?:alquiler|canon|renta|precio)\b").unwrap();
    static ref RENT_MULTIPLIER: Regex = Regex::new(
        r"(?i)\bdos\s+veces\b|\bel\s+doble\b|\b\d{1,2}\s*veces\b|\b[23]x\b"
    ).unwrap();
    static ref DOUBLE_RENT: Regex = Regex::new(r"(?i)\bel\s+doble\s+del?\s+(?:alquiler|canon)\b").unwrap();
    static ref DAILY_PERCENT: Regex = Regex::new(
        r"(?i)\d{1,3}(?:[.,]\d{1,2})?\s*%.*?\b(?:por\s+d[ií]a|diari[oa])\b"
    ).unwrap();
    static ref WILL_NOT_APPLY: Regex = Regex::new(r"(?i)\bno\s+(?:se\s+)?aplicar[áa]n?\b").unwrap();

    static ref INTEREST: Regex = Regex::new(r"(?i)\binter[eé]s(?:es)?\b").unwrap();
    static ref INTEREST_KIND: Regex = Regex::new(r"(?i)\b(?:punitori|moratori)\w*").unwrap();
    static ref INTEREST_FREQUENCY: Regex = Regex::new(
        r"(?i)\b(?:diari[oa]s?|mensual\w*|por\s+d[ií]a|por\s+mes)\b"
    ).unwrap();
    static ref INTEREST_CAP: Regex = Regex::new(
        r"(?i)\b(?:tope|m[aá]ximo|no\s+exceder[áa]n?|cap)\b"
    ).unwrap();
}

/// Early termination, notice and penalty terms.
pub fn early_termination(text: &str) -> Vec<Finding> {
    let ctx = LegalContext::resolve(text);
    if ctx.country != Country::Ar {
        return Vec::new();
    }
    let Some(m) = TERMINATION.find(text) else {
        return Vec::new();
    };
    let index = m.start();
    let around = slice_around(text, index, 280);

    let confidence = score(&[
        (lease_context_near(text, index, 220), 1.2),
        (
            TERMINATION_TERMS.is_match(around) || TERMINATION_AMOUNTS.is_match(around),
            1.0,
        ),
        (!has_negation_near(text, index, NEGATION_WINDOW), 0.8),
    ]);
    if confidence < DEFAULT_CONFIDENCE_THRESHOLD {
        return Vec::new();
    }

    vec![FindingBuilder::new(ids::RENTAL_EARLY_TERMINATION, "Desistimiento, resolución o penalidad")
        .description(
            "Puede haber preavisos o penalidades por terminar antes. Revisá proporcionalidad, importes y si están permitidos.",
        )
        .severity(Severity::Medium)
        .kind(RuleKind::Legal)
        .confidence(confidence)
        .at(index, 280)
        .legal_context(&ctx)
        .legal_basis(LegalBasis::ar(
            "CCyC",
            "Resolución anticipada de la locación por el locatario.",
        )
        .with_article("art. 1221"))
        .bullets(&[
            "Verificá si hay obligación de preaviso y de cuántos días.",
            "Chequeá penalidades por terminar antes del plazo.",
            "Compará los importes con lo permitido en la ley.",
        ])
        .keywords(&["desistimiento", "resolución", "penalidad", "multa", "preaviso"])
        .build()]
}

/// Penalty clause, with high impact when it multiplies the rent or accrues
/// a daily percentage.
pub fn penalty_clause(text: &str) -> Vec<Finding> {
    let ctx = LegalContext::resolve(text);
    if !ctx.is_ar_or_unknown() {
        return Vec::new();
    }
    let Some(m) = PENALTY_ANCHOR.find(text).or_else(|| RENT.find(text)) else {
        return Vec::new();
    };
    let index = m.start();
    let around = slice_around(text, index, 320);

    if has_negation_near(text, index, NEGATION_WINDOW) || WILL_NOT_APPLY.is_match(around) {
        return Vec::new();
    }

    let rent_multiplier = (RENT_MULTIPLIER.is_match(around) && RENT.is_match(around))
        || DOUBLE_RENT.is_match(around);
    let daily_percent = DAILY_PERCENT.is_match(around);
    let explicit = PENALTY_ANCHOR.is_match(around);
    if !(explicit || rent_multiplier || daily_percent) {
        return Vec::new();
    }

    let high = rent_multiplier || daily_percent;
    let (title, description) = if high {
        (
            "Cláusula penal u ocupación ilegítima de alto impacto",
            "Se detecta una penalidad elevada, como el doble del alquiler o un porcentaje diario. Revisá proporcionalidad y acumulación con otros cargos.",
        )
    } else {
        (
            "Cláusula penal",
            "Se menciona una cláusula penal. Verificá condiciones, proporcionalidad y compatibilidad legal.",
        )
    };

    vec![FindingBuilder::new(ids::RENTAL_PENALTY_CLAUSE, title)
        .description(description)
        .severity(if high { Severity::High } else { Severity::Medium })
        .kind(RuleKind::Legal)
        .confidence(if high { 0.85 } else { 0.7 })
        .at(index, 300)
        .legal_context(&ctx)
        .legal_basis(LegalBasis::ar(
            "CCyC",
            "Los jueces pueden reducir penas desproporcionadas.",
        )
        .with_article("art. 794"))
        .keywords(&["cláusula penal", "ocupación ilegítima", "doble del alquiler", "% diario"])
        .extra("rentMultiplier", json!(rent_multiplier))
        .extra("dailyPercent", json!(daily_percent))
        .build()]
}

/// Late-payment interest in a lease.
pub fn late_interest(text: &str) -> Vec<Finding> {
    let ctx = LegalContext::resolve(text);
    if ctx.country != Country::Ar {
        return Vec::new();
    }
    let Some(m) = INTEREST.find(text) else {
        return Vec::new();
    };
    let index = m.start();
    let around = slice_around(text, index, 300);
    if denies_interest(around) {
        return Vec::new();
    }

    let rates = percents(around);
    let has_percent = !rates.is_empty();
    let has_frequency = INTEREST_FREQUENCY.is_match(around);
    let has_kind = INTEREST_KIND.is_match(around);
    let has_cap = INTEREST_CAP.is_match(around);

    let confidence = score(&[
        (lease_context_near(text, index, 220), 1.2),
        (has_percent || has_frequency || has_kind, 1.0),
        (!has_negation_near(text, index, NEGATION_WINDOW), 0.8),
    ]);
    if confidence < DEFAULT_CONFIDENCE_THRESHOLD {
        return Vec::new();
    }

    let high = (has_percent || has_frequency) && !has_cap;
    let (title, description) = if high {
        (
            "Intereses moratorios con posible exceso",
            "Intereses con porcentaje o frecuencia y sin tope claro. Revisá proporcionalidad y acumulación con otros cargos.",
        )
    } else {
        (
            "Intereses moratorios",
            "Se prevén intereses por mora. Verificá porcentaje, base de cálculo, tope y acumulación.",
        )
    };

    let mut builder = FindingBuilder::new(ids::RENTAL_LATE_INTEREST, title)
        .description(description)
        .severity(if high { Severity::High } else { Severity::Medium })
        .kind(RuleKind::Legal)
        .confidence(confidence)
        .at(index, 300)
        .legal_context(&ctx)
        .bullets(&[
            "Confirmá el porcentaje y la base de cálculo.",
            "Revisá si existe un tope y cómo está redactado.",
            "Chequeá la frecuencia y si se acumula con otros cargos.",
        ])
        .keywords(&["interés", "punitorio", "moratorio", "%", "tope", "diario", "mensual"]);
    if let Some(rate) = rates.first() {
        builder = builder.magnitude(Magnitude::percent(*rate));
    }
    vec![builder.build()]
}
