//! Personal-data transfer and profiling (Ley 25.326).
//!
//! Several detectors look at the same clause from different angles. The
//! rule keeps the strongest reading so one clause yields one finding.

use lazy_static::lazy_static;
use regex::Regex;

use crate::finding::{Finding, FindingBuilder};
use crate::legal::{Country, LegalContext};
use crate::rules::ids;
use crate::rules::patterns::has_negation_near;
use crate::text::slice_around;
use crate::types::{LegalBasis, RuleKind, Severity};

lazy_static! {
    static ref PROFILING: Regex = Regex::new(r"(?i)\b(?:perfilad[oa]|profiling)\b").unwrap();
    static ref PROFILING_SCOPE: Regex = Regex::new(
        r"(?i)\b(?:marketing|publicidad|promoci[oó]n|tercer[oa]s?\s+(?:partes?|personas?)|proveedores?)\b"
    ).unwrap();
    static ref LEGAL_BASE: Regex = Regex::new(
        r"(?i)\b(?:inter[eé]s\s+leg[ií]timo|leg[ií]timo\s+inter[eé]s|consentimiento|autorizo|autorizaci[oó]n|base\s+legal|opt-?in|opt-?out)\b"
    ).unwrap();

    static ref ACTION: Regex =
        Regex::new(r"(?i)\b(?:cesi[oó]n|ceder|transferir|transferencia|compartir|comunicar)\b").unwrap();
    static ref DATA: Regex = Regex::new(r"(?i)\bdatos?\b").unwrap();
    static ref SCOPE: Regex = Regex::new(
        r"(?i)\b(?:tercer(?:o|os)|terceras?\s+(?:partes?|personas?)|fines?\s+comerciales?|marketing|publicidad)\b"
    ).unwrap();

    static ref DIRECT_CESSION: Regex = Regex::new(
        r"(?is)\bcesi[oó]n(?:\s+de)?\s+datos\b.{0,250}\b(?:tercer(?:o|os)|terceras?\s+(?:partes?|personas?)|fines?\s+comerciales?|marketing|publicidad)\b"
    ).unwrap();
    static ref DIRECT_TRANSFER: Regex = Regex::new(
        r"(?is)\btransferencias?\s+de\s+datos\b.{0,250}\b(?:tercer(?:o|os)|terceras?\s+(?:partes?|personas?)|fines?\s+comerciales?|marketing|publicidad)\b"
    ).unwrap();

    static ref DATA_ANCHOR: Regex = Regex::new(
        r"(?i)\b(?:(?:datos\s+personales?|informaci[oó]n\s+personal|datos\s+del\s+usuario).{0,80}\b(?:cesi[oó]n|ceder|transferir|transferencia|compartir|comunicar)\b|cesi[oó]n\s+de\s+datos|transferencia\s+de\s+datos|compartir\s+datos|comunicar\s+datos)\b"
    ).unwrap();
    static ref THIRD_PARTIES: Regex = Regex::new(
        r"(?i)\b(?:tercer(?:o|os)|terceras?\s+(?:partes?|personas?)|proveedores?|encargados?|grupo\s+empresarial|filiales|afiliadas?)\b"
    ).unwrap();
    static ref COMMERCIAL_USE: Regex = Regex::new(
        r"(?i)\b(?:fines?\s+comerciales?|comerciales?|marketing|publicidad|promoci[oó]n|perfilado|profiling)\b"
    ).unwrap();
    static ref INTERNATIONAL: Regex = Regex::new(
        r"(?i)\b(?:transferencias?\s+internacional(?:es)?|fuera\s+del\s+pa[ií]s|extranjero|otras?\s+jurisdicci[oó]n)\b"
    ).unwrap();
    static ref LIMITATIONS: Regex = Regex::new(
        r"(?i)\b(?:finalidad|limitad[oa]s?|plazo\s+de\s+conservaci[oó]n|minimizaci[oó]n|pseudonimizaci[oó]n|anonimizaci[oó]n)\b"
    ).unwrap();
    static ref RIGHTS: Regex = Regex::new(
        r"(?i)\bderechos?\s+(?:arco|acceso|rectificaci[oó]n|supresi[oó]n|oposici[oó]n|portabilidad)\b"
    ).unwrap();
    static ref RIGHTS_CHANNEL: Regex = Regex::new(
        r"(?i)\b(?:correo\s+electr[oó]nico|domicilio|formulario|canal|portal)\b.*\b(?:solicitud|ejercer)\b"
    ).unwrap();
}

const DATA_NEGATION_WINDOW: usize = 160;

fn data_protection_basis() -> [LegalBasis; 2] {
    [
        LegalBasis::ar(
            "Ley 25.326",
            "Protección de datos personales: consentimiento, finalidad, derechos ARCO y transferencias.",
        ),
        LegalBasis::ar("Decreto 1558/2001", "Reglamentación de la Ley 25.326."),
    ]
}

fn transfer_finding(ctx: &LegalContext, index: usize, title: &str, severity: Severity, confidence: f64) -> FindingBuilder {
    let [law, decree] = data_protection_basis();
    FindingBuilder::new(ids::SERVICES_DATA_TRANSFER, title)
        .severity(severity)
        .kind(RuleKind::Legal)
        .confidence(confidence)
        .at(index, 300)
        .context(Country::Ar, ctx.regime)
        .legal_basis(law)
        .legal_basis(decree)
        .keywords(&["cesión de datos", "transferencia", "terceros", "fines comerciales", "marketing", "publicidad", "ARCO"])
}

/// Profiling of users, with or without commercial purposes.
fn profiling(text: &str, ctx: &LegalContext) -> Option<Finding> {
    let index = PROFILING.find(text)?.start();
    let around = slice_around(text, index, 280);
    let negated = has_negation_near(text, index, DATA_NEGATION_WINDOW);
    let scoped = PROFILING_SCOPE.is_match(around);

    let mut confidence: f64 = 0.7;
    if scoped {
        confidence += 0.1;
    }
    if LEGAL_BASE.is_match(around) {
        confidence += 0.05;
    }
    if negated {
        confidence -= 0.25;
    }
    let severity = match (negated, scoped) {
        (true, _) => Severity::Low,
        (false, true) => Severity::High,
        (false, false) => Severity::Medium,
    };
    let (title, description) = if scoped {
        (
            "Perfilado de usuarios con posibles fines comerciales",
            "Se detecta perfilado de usuarios con posibles fines comerciales o de marketing. Verificá consentimiento, opt-out o base legal.",
        )
    } else {
        (
            "Perfilado de usuarios (verificar base legal)",
            "Se detecta perfilado de usuarios. Confirmá la base legal (consentimiento o interés legítimo) y el derecho de oposición.",
        )
    };
    Some(
        transfer_finding(ctx, index, title, severity, confidence.clamp(0.4, 0.98))
            .description(description)
            .bullets(&[
                "Identificá la finalidad del perfilado.",
                "Exigí consentimiento válido u otra base legal y un canal de oposición.",
                "Revisá plazos y transferencias a terceros.",
            ])
            .build(),
    )
}

/// A transfer verb, the word "datos" and a third-party or commercial scope,
/// in any order. Falls back to the fixed phrasings.
fn explicit_transfer(text: &str, ctx: &LegalContext) -> Option<Finding> {
    let (index, base_confidence) = if ACTION.is_match(text) && DATA.is_match(text) && SCOPE.is_match(text) {
        (ACTION.find(text)?.start(), 0.96)
    } else if let Some(m) = DIRECT_CESSION.find(text) {
        (m.start(), 0.96)
    } else {
        (DIRECT_TRANSFER.find(text)?.start(), 0.95)
    };
    let negated = has_negation_near(text, index, DATA_NEGATION_WINDOW);
    let (severity, confidence) = if negated {
        (Severity::Medium, 0.85)
    } else {
        (Severity::High, base_confidence)
    };
    Some(
        transfer_finding(
            ctx,
            index,
            "Cesión o transferencia de datos a terceros (fines comerciales)",
            severity,
            confidence,
        )
        .description(
            "Se detecta cesión o transferencia de datos a terceros o con fines comerciales. Verificá consentimiento, finalidad, derecho de oposición y transferencias.",
        )
        .bullets(&[
            "¿Quiénes son los terceros y con qué finalidad usan tus datos?",
            "Si hay fines comerciales, debe haber consentimiento válido y opt-out.",
            "Pedí plazos de conservación y un canal para ejercer tus derechos.",
        ])
        .build(),
    )
}

/// Broad wording around personal data, graded by scope and safeguards.
fn data_anchors(text: &str, ctx: &LegalContext) -> Vec<Finding> {
    DATA_ANCHOR
        .find_iter(text)
        .filter_map(|m| {
            let index = m.start();
            let around = slice_around(text, index, 300);

            let third_parties = THIRD_PARTIES.is_match(around);
            let commercial = COMMERCIAL_USE.is_match(around);
            let international = INTERNATIONAL.is_match(around);
            let safeguards = LIMITATIONS.is_match(around)
                || RIGHTS.is_match(around)
                || RIGHTS_CHANNEL.is_match(around);
            let negated = has_negation_near(text, index, DATA_NEGATION_WINDOW);

            let mut confidence: f64 = 0.55;
            for (present, weight) in [
                (third_parties, 0.25),
                (commercial, 0.25),
                (international, 0.10),
                (LEGAL_BASE.is_match(around), 0.05),
                (safeguards, 0.05),
                (negated, -0.25),
            ] {
                if present {
                    confidence += weight;
                }
            }
            if confidence < 0.4 {
                return None;
            }

            let broad = (third_parties || commercial || international) && !safeguards;
            let severity = match (negated, broad) {
                (true, _) => Severity::Low,
                (false, true) => Severity::High,
                (false, false) => Severity::Medium,
            };
            let (title, description) = if broad {
                (
                    "Cesión de datos amplia (revisar base legal y límites)",
                    "Hay señales de cesión o comercialización de datos sin límites ni derechos claros. Verificá base legal, finalidad y plazos.",
                )
            } else {
                (
                    "Tratamiento o cesión de datos (verificar alcance)",
                    "El contrato menciona tratamiento o cesión de datos. Confirmá base legal, finalidad, derechos ARCO y plazos de conservación.",
                )
            };
            Some(
                transfer_finding(ctx, index, title, severity, confidence.min(1.0))
                    .description(description)
                    .bullets(&[
                        "Identificá si se ceden datos a terceros y con qué finalidad.",
                        "Chequeá plazos de conservación y cómo ejercer tus derechos.",
                        "Si hay transferencias internacionales, pedí garantías adecuadas.",
                    ])
                    .build(),
            )
        })
        .collect()
}

/// Data transfer to third parties and profiling.
pub fn data_transfer(text: &str) -> Vec<Finding> {
    let ctx = LegalContext::resolve(text);
    let mut candidates: Vec<Finding> = profiling(text, &ctx)
        .into_iter()
        .chain(explicit_transfer(text, &ctx))
        .collect();
    candidates.extend(data_anchors(text, &ctx));

    candidates
        .into_iter()
        .max_by(|a, b| a.cmp_rank(b).then_with(|| b.index.cmp(&a.index)))
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cession_to_third_parties_is_high() {
        let text = "El proveedor podrá realizar cesión de datos a terceros con fines comerciales.";
        let found = data_transfer(text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::High);
        assert!(found[0].confidence() >= 0.95);
        assert_eq!(found[0].meta.legal_basis.len(), 2);
    }

    #[test]
    fn test_profiling_with_legitimate_interest() {
        let text = "Se autoriza el perfilado con base en el interés legítimo del responsable.";
        let found = data_transfer(text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::Medium);
        assert!((found[0].confidence() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_negated_transfer_is_downgraded() {
        let text = "El proveedor no realizará cesión de datos a terceros.";
        let found = data_transfer(text);
        assert_eq!(found[0].severity, Severity::Medium);
    }

    #[test]
    fn test_generic_service_clauses_pass() {
        assert!(data_transfer("Las partes acuerdan la prestación del servicio conforme a la ley aplicable.").is_empty());
        assert!(data_transfer("El cliente podrá contactar soporte por correo electrónico para consultas generales.").is_empty());
    }
}
