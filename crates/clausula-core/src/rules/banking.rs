//! Banking and credit rules: penalty interest and foreign-currency payment.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;

use crate::finding::{Finding, FindingBuilder, Magnitude};
use crate::legal::{Country, LegalContext};
use crate::rules::ids;
use crate::rules::patterns::{denies_interest, has_negation_near, percents};
use crate::scoring::score;
use crate::text::slice_around;
use crate::tuning::DEFAULT_CONFIDENCE_THRESHOLD;
use crate::types::{RuleKind, Severity};

lazy_static! {
    // =========================================================================
    // PENALTY INTEREST
    // =========================================================================

    static ref INTEREST: Regex = Regex::new(r"(?i)\binter[eé]s(?:es)?\b").unwrap();
    static ref QUALIFIER: Regex = Regex::new(r"(?i)\b(?:punitori\w*|moratori\w*|por\s+mora)\b").unwrap();
    static ref ACCRUAL_VERB: Regex =
        Regex::new(r"(?i)\b(?:devengar\w*|aplicar\w*|cobrar\w*|generar\w*)").unwrap();
    static ref RATE_ABBREVIATION: Regex = Regex::new(r"\b(?:TEM|TNA|TEA)\b").unwrap();
    static ref MONTHLY: Regex = Regex::new(r"(?i)\b(?:mensual(?:es)?|por\s+mes)\b").unwrap();
    static ref CAP: Regex = Regex::new(r"(?i)\b(?:tope|m[aá]ximo|cap)\b").unwrap();
    static ref NO_CAP: Regex = Regex::new(r"(?i)\bsin\s+(?:tope|m[aá]ximo|cap)\b").unwrap();

    // =========================================================================
    // FOREIGN CURRENCY
    // =========================================================================

    static ref FOREIGN_CURRENCY: Regex = Regex::new(
        r"(?i)\bd[oó]lares?\b|\busd\b|\bu\$d|\bmoneda\s+extranjera\b|\btipo\s+de\s+cambio\b|\bcotizaci[oó]n\b"
    ).unwrap();
    static ref PAYMENT_TERMS: Regex = Regex::new(
        r"(?i)\b(?:precio|canon|alquiler\w*|cuotas?|pagos?|saldo|capital|pr[eé]stamo|importe|monto)\b"
    ).unwrap();
    static ref DEMANDS_USD: Regex = Regex::new(
        r"(?i)\b(?:deber[aá]\s+pagar|se\s+pagar[aá]|obligatoriamente)\b.*(?:\bd[oó]lares\b|\busd\b|\bu\$d)"
    ).unwrap();
    static ref EXCHANGE_RATE: Regex = Regex::new(
        r"(?i)\b(?:tipo\s+de\s+cambio|cotizaci[oó]n|bna|bcra|mep|oficial|vendedor|comprador)\b"
    ).unwrap();
    static ref RATE_REFERENCE: Regex = Regex::new(
        r"(?i)\b(?:referencia|seg[uú]n\s+cotizaci[oó]n|al\s+tipo\s+de\s+cambio\s+del?\s+(?:bna|bcra|mep)|equivalente\s+a)\b"
    ).unwrap();
    static ref PESO_ALTERNATIVE: Regex = Regex::new(
        r"(?i)\bpagar\s+en\s+pesos?\b|\bars\b|\bmoneda\s+de\s+curso\s+legal\b"
    ).unwrap();
}

/// Penalty or late-payment interest in a credit agreement.
///
/// Needs a strong combination: a qualifier with a rate, period or accrual
/// verb, or a percentage with a monthly period. An explicit "no interest"
/// wording suppresses the rule.
pub fn penalty_interest(text: &str) -> Vec<Finding> {
    let ctx = LegalContext::resolve(text);
    if !ctx.is_ar_or_unknown() {
        return Vec::new();
    }
    let Some(m) = INTEREST.find(text) else {
        return Vec::new();
    };
    let index = m.start();
    let around = slice_around(text, index, 320);
    if denies_interest(around) {
        return Vec::new();
    }

    let rates = percents(around);
    let has_pct = !rates.is_empty();
    let has_qualifier = QUALIFIER.is_match(around);
    let has_verb = ACCRUAL_VERB.is_match(around);
    let has_month = MONTHLY.is_match(around);
    let has_abbreviation = RATE_ABBREVIATION.is_match(around);

    let strong = (has_qualifier && (has_pct || has_abbreviation || has_month || has_verb))
        || (has_pct && has_month);
    if !strong {
        return Vec::new();
    }

    let no_clear_cap = NO_CAP.is_match(around) || !CAP.is_match(around);
    let high = ((has_pct && has_month) || has_abbreviation) && no_clear_cap;
    let (title, description) = if high {
        (
            "Intereses punitorios o moratorios con posible exceso",
            "Intereses con tasa mensual o abreviaturas (TEM/TNA/TEA) sin tope claro. Revisá base de cálculo y acumulación.",
        )
    } else {
        (
            "Intereses punitorios o moratorios",
            "Se mencionan intereses punitorios o moratorios. Verificá porcentaje, base de cálculo, periodicidad y topes.",
        )
    };

    let mut builder = FindingBuilder::new(ids::BANKING_PENALTY_INTEREST, title)
        .description(description)
        .severity(if high { Severity::High } else { Severity::Medium })
        .kind(RuleKind::Legal)
        .confidence(if high { 0.9 } else { 0.7 })
        .at(index, 300)
        .context(Country::Ar, ctx.regime_assuming_ar())
        .keywords(&["interés", "punitorio", "moratorio", "%", "mensual", "TEM", "TNA", "TEA"])
        .extra("noClearCap", json!(no_clear_cap));
    if let Some(rate) = rates.first() {
        builder = builder.magnitude(Magnitude::percent(*rate));
    }
    vec![builder.build()]
}

/// Payment in foreign currency or tied to an exchange rate.
pub fn foreign_currency(text: &str) -> Vec<Finding> {
    let ctx = LegalContext::resolve(text);
    if ctx.country != Country::Ar {
        return Vec::new();
    }
    let Some(m) = FOREIGN_CURRENCY.find(text) else {
        return Vec::new();
    };
    let index = m.start();
    let around = slice_around(text, index, 320);

    let demands_usd = DEMANDS_USD.is_match(around);
    let mentions_rate = EXCHANGE_RATE.is_match(around);
    let sets_reference = RATE_REFERENCE.is_match(around);
    let allows_pesos = PESO_ALTERNATIVE.is_match(around);

    let confidence = score(&[
        (PAYMENT_TERMS.is_match(slice_around(text, index, 220)), 1.2),
        (demands_usd || mentions_rate || allows_pesos, 1.0),
        (!has_negation_near(text, index, 150), 0.8),
    ]);
    if confidence < DEFAULT_CONFIDENCE_THRESHOLD {
        return Vec::new();
    }

    let high = demands_usd && !(mentions_rate && sets_reference) && !allows_pesos;
    let description = if high {
        "Se exige el pago en dólares sin alternativa en pesos ni tipo de cambio de referencia. Revisá validez, riesgos y restricciones."
    } else {
        "Se pacta el pago o una referencia en dólares. Verificá el tipo de cambio, la fecha de conversión y si podés pagar en pesos."
    };

    vec![FindingBuilder::new(ids::BANKING_FOREIGN_CURRENCY, "Pago en moneda extranjera / tipo de cambio")
        .description(description)
        .severity(if high { Severity::High } else { Severity::Medium })
        .kind(RuleKind::Legal)
        .confidence(confidence)
        .at(index, 320)
        .legal_context(&ctx)
        .bullets(&[
            "Identificá cómo se determina el tipo de cambio (BNA, BCRA, MEP).",
            "Chequeá si podés pagar en pesos y con qué cotización.",
            "Controlá diferencias a tu cargo y la fecha de referencia.",
        ])
        .keywords(&["dólar", "USD", "tipo de cambio", "cotización", "BNA", "BCRA", "MEP", "ARS"])
        .build()]
}
