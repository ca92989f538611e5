//! Security deposit rules.
//!
//! `alquiler-deposito-un-mes` sums the months demanded as deposit and flags
//! anything above one month. `alquiler-fianza` is the informative variant
//! for Argentine contracts that mention a deposit without a hard breach.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;

use super::lease_context_near;
use crate::finding::{Finding, FindingBuilder, Magnitude};
use crate::legal::{Country, LegalContext, Regime};
use crate::rules::ids;
use crate::rules::patterns::{has_negation_near, lease_terms_near, mentions_lease, periods, PeriodUnit};
use crate::scoring::score;
use crate::text::{bounds_around, slice_around};
use crate::tuning::{DEFAULT_CONFIDENCE_THRESHOLD, NEGATION_WINDOW};
use crate::types::{LegalBasis, RuleKind, Severity};

lazy_static! {
    static ref ANCHOR: Regex = Regex::new(
        r"(?i)\b(?:dep[oó]sito(?:\s+(?:en|de)\s+garant[ií]a)?|fianza|garant[ií]a)\b"
    ).unwrap();
    static ref BANK_CONTEXT: Regex = Regex::new(
        r"(?i)\bbancari[oa]s?\b|\bcuenta\s+(?:bancaria|sueldo)\b|\bplazo\s+fijo\b|\bcaja\s+de\s+ahorros?\b"
    ).unwrap();
    /// "equivalente al primer mes", "primer (1º) mes"
    static ref FIRST_MONTH: Regex = Regex::new(
        r"(?i)\bequivalente\s+al\s+primer\s+mes\b|\bprimer(?:o)?\s*(?:\(\s*1\s*[ºo°]?\s*\)\s*)?mes\b"
    ).unwrap();
    static ref AMOUNT: Regex = Regex::new(
        r"(?i)\$\s*\d|\b(?:pesos|ars|usd|d[oó]lares)\b|\b\d{1,2}\s*mes(?:es)?\b|\bequivalente\b"
    ).unwrap();
}

const MONTHS_RADIUS: usize = 240;
const BANK_RADIUS: usize = 140;
const LEASE_RADIUS: usize = 200;

/// Deposit anchors and the months they demand.
#[derive(Debug, Default)]
struct DepositScan {
    first_index: Option<usize>,
    anchors: usize,
    /// Start offsets of month phrases already counted
    counted: Vec<usize>,
    months: u32,
}

fn is_bank_deposit(text: &str, index: usize) -> bool {
    BANK_CONTEXT.is_match(slice_around(text, index, BANK_RADIUS))
}

/// The month phrase closest after an anchor, as `(absolute offset, months)`.
fn months_near(text: &str, index: usize) -> Option<(usize, u32)> {
    let (start, end) = bounds_around(text, index, MONTHS_RADIUS);
    let around = &text[start..end];
    if let Some(p) = periods(around).into_iter().find(|p| p.unit == PeriodUnit::Months) {
        return Some((start + p.start, p.value));
    }
    FIRST_MONTH.find(around).map(|m| (start + m.start(), 1))
}

fn scan_deposits(text: &str) -> DepositScan {
    let mut scan = DepositScan::default();
    for m in ANCHOR.find_iter(text) {
        if is_bank_deposit(text, m.start()) {
            continue;
        }
        scan.anchors += 1;
        scan.first_index.get_or_insert(m.start());
        if let Some((at, months)) = months_near(text, m.start()) {
            // two anchors around one "2 meses" demand two months, not four
            if !scan.counted.contains(&at) {
                scan.counted.push(at);
                scan.months += months;
            }
        }
    }
    scan
}

fn deposit_bases(ctx: &LegalContext) -> Vec<LegalBasis> {
    let mut bases = vec![LegalBasis::ar(
        "Ley 27.551 / CCyC",
        "El depósito en garantía no puede superar el primer mes de alquiler.",
    )
    .with_article("art. 1196")];
    match ctx.regime_assuming_ar() {
        Regime::Ley27737 => bases.push(LegalBasis::ar(
            "Ley 27.737",
            "Mantiene el tope de un mes para el depósito en vivienda.",
        )),
        Regime::Dnu70_2023 => bases.push(LegalBasis::ar(
            "DNU 70/2023",
            "Desreguló los alquileres; verificá la fecha de firma del contrato.",
        )),
        _ => {}
    }
    bases
}

/// Deposit demanding more than one month of rent.
pub fn deposit_one_month(text: &str) -> Vec<Finding> {
    let ctx = LegalContext::resolve(text);
    if !ctx.is_ar_or_unknown() || !mentions_lease(text) {
        return Vec::new();
    }

    let scan = scan_deposits(text);
    let Some(index) = scan.first_index else {
        return Vec::new();
    };

    let talks_lease = lease_terms_near(text, index, LEASE_RADIUS);
    let negated = has_negation_near(text, index, NEGATION_WINDOW);
    let confidence = score(&[
        (talks_lease, 1.3),
        (scan.months > 0, 1.0),
        (!negated, 0.8),
    ]);
    if scan.months == 0 && confidence < DEFAULT_CONFIDENCE_THRESHOLD {
        return Vec::new();
    }

    let severity = if scan.months > 1 {
        Severity::High
    } else {
        Severity::Medium
    };
    let title = if scan.months > 1 {
        "Depósito en garantía superior a un mes"
    } else {
        "Depósito en garantía"
    };
    let description = if scan.months > 1 {
        format!(
            "Se exige un depósito equivalente a {} meses. La normativa de locación limita el depósito al primer mes de alquiler.",
            scan.months
        )
    } else {
        "El contrato prevé un depósito en garantía. Verificá que no supere un mes de alquiler y cómo se devuelve.".to_string()
    };

    let mut builder = FindingBuilder::new(ids::RENTAL_DEPOSIT, title)
        .description(description)
        .severity(severity)
        .kind(RuleKind::Legal)
        .confidence(confidence)
        .at(index, 260)
        .legal_context(&ctx)
        .bullets(&[
            "Pedí que el depósito no supere un mes de alquiler.",
            "Acordá por escrito cuándo y cómo se devuelve.",
            "Guardá el comprobante de entrega.",
        ])
        .keywords(&["depósito", "garantía", "fianza", "mes"])
        .extra("anchors", json!(scan.anchors));
    for basis in deposit_bases(&ctx) {
        builder = builder.legal_basis(basis);
    }
    if scan.months > 0 {
        builder = builder.magnitude(Magnitude::months(scan.months));
    }
    vec![builder.build()]
}

/// Informative deposit or guarantee mention in an Argentine lease.
pub fn guarantee_deposit(text: &str) -> Vec<Finding> {
    let ctx = LegalContext::resolve(text);
    if ctx.country != Country::Ar {
        return Vec::new();
    }
    let Some(m) = ANCHOR.find(text) else {
        return Vec::new();
    };
    let index = m.start();
    if is_bank_deposit(text, index) {
        return Vec::new();
    }

    let around = slice_around(text, index, MONTHS_RADIUS);
    let mentions_amount = AMOUNT.is_match(around) || FIRST_MONTH.is_match(around);
    let lease = lease_context_near(text, index, LEASE_RADIUS);
    let negated = has_negation_near(text, index, NEGATION_WINDOW);
    let confidence = score(&[(lease, 1.2), (mentions_amount, 1.0), (!negated, 0.8)]);
    if confidence < DEFAULT_CONFIDENCE_THRESHOLD {
        return Vec::new();
    }

    let mut builder = FindingBuilder::new(ids::RENTAL_GUARANTEE, "Cláusula de fianza o depósito")
        .description(
            "El contrato menciona una fianza o depósito. Revisá el monto, la moneda y las condiciones de devolución.",
        )
        .severity(if mentions_amount {
            Severity::Medium
        } else {
            Severity::Low
        })
        .kind(RuleKind::Legal)
        .confidence(confidence)
        .at(index, 240)
        .legal_context(&ctx)
        .legal_basis(LegalBasis::ar(
            "CCyC",
            "Depósito en garantía de la locación y su devolución al finalizar.",
        ))
        .keywords(&["fianza", "depósito", "garantía", "devolución"]);
    if let Some((_, months)) = months_near(text, index) {
        builder = builder.magnitude(Magnitude::months(months));
    }
    vec![builder.build()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    fn run(raw: &str) -> Vec<Finding> {
        let doc = normalize(raw).unwrap();
        deposit_one_month(doc.text())
    }

    #[test]
    fn test_one_month_is_medium_with_magnitude() {
        let found = run("El LOCATARIO entregará en concepto de depósito de garantía el equivalente a un (1) mes de alquiler, a restituirse al finalizar el contrato.");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].months(), Some(1.0));
        assert_eq!(found[0].severity, Severity::Medium);
        assert_eq!(found[0].meta.kind, RuleKind::Legal);
    }

    #[test]
    fn test_several_months_is_high() {
        let found = run("El inquilino deposita en garantía el equivalente a dos meses del alquiler pactado.");
        assert_eq!(found[0].months(), Some(2.0));
        assert_eq!(found[0].severity, Severity::High);

        let found = run("Depósito en garantía: equivalente a 3 meses del canon locativo.");
        assert_eq!(found[0].months(), Some(3.0));
    }

    #[test]
    fn test_shared_month_phrase_counted_once() {
        // "depósito" and "garantía" both sit next to the same phrase
        let found = run("El locatario entrega un depósito y una garantía de 2 meses de alquiler.");
        assert_eq!(found[0].months(), Some(2.0));
    }

    #[test]
    fn test_amount_without_months_still_fires() {
        let found = run("En concepto de depósito en garantía el LOCATARIO abona PESOS SETENTA Y CINCO MIL ($ 75.000,00) del alquiler, en dos cuotas.");
        assert_eq!(found.len(), 1);
        assert!(found[0].months().is_none());
        assert!(found[0].confidence() >= 0.6);
    }

    #[test]
    fn test_bank_deposits_are_ignored() {
        assert!(run("Se efectuará un depósito bancario para abrir la cuenta sueldo del empleado.").is_empty());
        assert!(run("El locador constituirá un depósito bancario a plazo fijo con el alquiler.").is_empty());
    }

    #[test]
    fn test_needs_lease_vocabulary() {
        assert!(run("El proveedor exige una garantía de 2 meses de servicio.").is_empty());
    }

    #[test]
    fn test_guarantee_deposit_is_argentine_only() {
        let ar = "Ciudad de Buenos Aires, Argentina. El locatario entrega una fianza de $ 50.000 por el alquiler.";
        let doc = normalize(ar).unwrap();
        let found = guarantee_deposit(doc.text());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::Medium);

        let unknown = "El locatario entrega una fianza por el alquiler del inmueble.";
        assert!(guarantee_deposit(unknown).is_empty());
    }
}
