//! Rules that apply to every contract family.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;

use crate::finding::{Finding, FindingBuilder};
use crate::legal::{Country, LegalContext};
use crate::rules::ids;
use crate::rules::patterns::has_negation_near;
use crate::scoring::score;
use crate::text::{bounds_around, slice_around};
use crate::tuning::DEFAULT_CONFIDENCE_THRESHOLD;
use crate::types::{LegalBasis, RuleKind, Severity};

lazy_static! {
    static ref WAIVER: Regex = Regex::new(
        r"(?i)\brenunciar?\s+a\b|\beximir?\s+de\s+responsabilidad\b|\bexime\s+de\s+responsabilidad\b|\bexoneraci[oó]n\s+de\s+responsabilidad\b|\bindemnidad\s+amplia\b"
    ).unwrap();
    static ref GUARANTOR: Regex = Regex::new(
        r"(?i)\b(?:garante|fiador|fianza|deudor\s+solidari[oa]|principal\s+pagador)\b"
    ).unwrap();
    static ref TYPICAL_GUARANTOR_WAIVER: Regex =
        Regex::new(r"(?i)\b(?:excusi[oó]n|divisi[oó]n|orden|prelaci[oó]n)\b").unwrap();
    static ref ABUSIVE_WAIVER: Regex = Regex::new(
        r"(?i)\brenunciar?\s+a\s+(?:iniciar|interponer|promover)\s+(?:acciones?|reclamos?)\b|\brenunciar?\s+al?\s+derecho\s+de\s+defensa\b|\brenunciar?\s+a\s+recursos?\b|\bapelaci[oó]n\b|\brenunciar?\s+a\s+cualquier\s+(?:reclamo|derecho|acci[oó]n)\b|\bindemnidad\s+amplia\b|\bexoneraci[oó]n\s+total\s+de\s+responsabilidad\b"
    ).unwrap();
}

/// Classification of a waiver clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WaiverKind {
    /// Limits actions, defence or appeals
    Abusive,
    /// Guarantor benefits such as excusión or división
    GuarantorTypical,
    Generic,
}

impl WaiverKind {
    fn as_str(self) -> &'static str {
        match self {
            WaiverKind::Abusive => "abusive",
            WaiverKind::GuarantorTypical => "guarantor-typical",
            WaiverKind::Generic => "generic",
        }
    }
}

/// Absolute offset of the first `re` match within `radius` of `index`.
fn match_near(re: &Regex, text: &str, index: usize, radius: usize) -> Option<usize> {
    let (start, end) = bounds_around(text, index, radius);
    re.find(&text[start..end]).map(|m| start + m.start())
}

/// Waivers of rights or liability.
pub fn rights_waiver(text: &str) -> Vec<Finding> {
    let ctx = LegalContext::resolve(text);
    if ctx.country == Country::Es {
        return Vec::new();
    }
    let Some(m) = WAIVER.find(text) else {
        return Vec::new();
    };
    let base = m.start();
    let negated = has_negation_near(text, base, 150);

    let guarantor = GUARANTOR.is_match(slice_around(text, base, 220));
    let around = slice_around(text, base, 260);
    let typical = TYPICAL_GUARANTOR_WAIVER.is_match(around);
    let abusive = ABUSIVE_WAIVER.is_match(around);

    let confidence = score(&[
        (true, 1.0),
        (abusive, 1.2),
        (guarantor, 1.0),
        (!negated, 0.8),
    ]);
    if confidence < DEFAULT_CONFIDENCE_THRESHOLD && !abusive {
        return Vec::new();
    }

    let kind = if abusive {
        WaiverKind::Abusive
    } else if guarantor && typical {
        WaiverKind::GuarantorTypical
    } else {
        WaiverKind::Generic
    };
    let index = match kind {
        WaiverKind::Abusive => match_near(&ABUSIVE_WAIVER, text, base, 300),
        WaiverKind::GuarantorTypical => match_near(&TYPICAL_GUARANTOR_WAIVER, text, base, 300),
        WaiverKind::Generic => None,
    }
    .unwrap_or(base);

    let (severity, title, description, bullets): (Severity, &str, &str, &[&str]) = match kind {
        WaiverKind::Abusive => (
            Severity::High,
            "Renuncia amplia de derechos (potencialmente abusiva)",
            "Se observan renuncias que podrían afectar derechos irrenunciables (defensa, acciones o recursos). Revisá su compatibilidad con el marco legal.",
            &[
                "Si limita iniciar acciones, la defensa o los recursos, tratala como potencialmente abusiva.",
                "Revisá si hay reciprocidad para la otra parte.",
                "Consultá su validez frente a la normativa de consumo.",
            ],
        ),
        WaiverKind::GuarantorTypical => (
            Severity::Low,
            "Renuncia del garante a beneficios (excusión, división, orden)",
            "Renuncia típica del garante. Es habitual en garantías personales; revisá su alcance.",
            &[
                "Confirmá que la renuncia aplica solo al garante.",
                "Verificá la coherencia con 'principal pagador'.",
            ],
        ),
        WaiverKind::Generic => (
            Severity::Medium,
            "Renuncia o limitación de derechos (revisar alcance)",
            "Se detecta una cláusula de renuncia o exoneración. Verificá su alcance y que no limite derechos irrenunciables.",
            &[
                "Identificá si la renuncia restringe reclamos o garantías básicas.",
                "Buscá cláusulas espejo de responsabilidad de la otra parte.",
            ],
        ),
    };

    vec![FindingBuilder::new(ids::RIGHTS_WAIVER, title)
        .description(description)
        .severity(severity)
        .kind(RuleKind::Legal)
        .confidence(confidence)
        .at(index, 320)
        .legal_context(&ctx)
        .legal_basis(LegalBasis::ar(
            "CCyC (garantías personales)",
            "Las renuncias del fiador a excusión, división u orden son frecuentes; evaluá su alcance.",
        ))
        .legal_basis(LegalBasis::ar(
            "Ley 24.240 (Defensa del Consumidor)",
            "Las cláusulas que impiden acciones, defensa o recursos pueden ser abusivas.",
        ))
        .bullets(bullets)
        .keywords(&["renuncia", "responsabilidad", "exoneración", "indemnidad", "garante", "excusión", "defensa"])
        .extra("subtype", json!(kind.as_str()))
        .build()]
}
