//! Tenant obligations: expenses, inspections, guarantors and venue.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;

use super::lease_context_near;
use crate::finding::{Finding, FindingBuilder};
use crate::legal::{Country, LegalContext};
use crate::rules::ids;
use crate::rules::patterns::has_negation_near;
use crate::scoring::score;
use crate::text::slice_around;
use crate::tuning::{DEFAULT_CONFIDENCE_THRESHOLD, NEGATION_WINDOW};
use crate::types::{LegalBasis, RuleKind, Severity};

lazy_static! {
    static ref EXPENSES: Regex = Regex::new(
        r"(?i)\b(?:expensas?|extraordinari\w*|suministros?|agua|luz|gas|comunidad|consorcio|impuestos?|abl|municipal(?:es)?)\b"
    ).unwrap();
    static ref TO_TENANT: Regex = Regex::new(
        r"(?i)\ba\s*cargo\s+del?\s+(?:inquilin[oa]|locatari[oa])\b|\bpagar[áa]\s+el?\s+(?:inquilin[oa]|locatari[oa])\b|\bser[áa]\s+responsable\s+el?\s+(?:inquilin[oa]|locatari[oa])\b"
    ).unwrap();
    static ref TO_LANDLORD: Regex = Regex::new(
        r"(?i)\ba\s*cargo\s+del?\s+(?:propietari[oa]|locador[a]?)\b|\bpagar[áa]\s+el?\s+(?:propietari[oa]|locador[a]?)\b|\bser[áa]\s+responsable\s+el?\s+(?:propietari[oa]|locador[a]?)\b"
    ).unwrap();
    static ref EXTRAORDINARY: Regex = Regex::new(r"(?i)\bextraordinari[ao]s?\b").unwrap();
    static ref OWNER_TAXES: Regex = Regex::new(
        r"(?i)\babl\b|\bimpuestos?\s+(?:municipales?|inmobiliarios?)\b"
    ).unwrap();

    static ref INSPECTION: Regex = Regex::new(r"(?i)\b(?:inspecci[oó]n|visitas?|ingreso|acceso)\b").unwrap();
    static ref ANY_TIME: Regex = Regex::new(
        r"(?i)\ben\s+cualquier\s+momento\b|\blibre\s+acceso\b|\bsin\s+(?:previo\s+)?(?:pre)?aviso\b|\bpermanente\b"
    ).unwrap();
    static ref SHORT_NOTICE: Regex = Regex::new(r"(?i)\b(?:24|48)\s*h(?:oras|s)?\b").unwrap();

    static ref GUARANTOR: Regex = Regex::new(
        r"(?i)\bgarante\s+solidari[oa]\b|\bfiador\w*\b|\bcodeudor\s+solidari[oa]\b"
    ).unwrap();
    static ref WAIVES_EXCUSSION: Regex = Regex::new(
        r"(?i)\brenuncia\w*[^\n]{0,40}?\b(?:excusi[oó]n|exclusi[oó]n)\b"
    ).unwrap();
    static ref WAIVES_DIVISION: Regex = Regex::new(r"(?i)\brenuncia\w*[^\n]{0,40}?\bdivisi[oó]n\b").unwrap();
    static ref WAIVES_NOTICE: Regex = Regex::new(
        r"(?i)\brenuncia\w*[^\n]{0,40}?\b(?:notificaci[oó]n|aviso)\b"
    ).unwrap();
    /// Solidarity beyond the "garante solidario" label itself
    static ref EXPLICIT_SOLIDARITY: Regex = Regex::new(
        r"(?i)\bsolidariamente\b|\ben\s+forma\s+solidaria\b|\bincondicional\w*\b|\birrevocable\w*\b|\bprincipal\s+pagador\b"
    ).unwrap();

    static ref VENUE: Vec<Regex> = vec![
        Regex::new(r"(?i)\bjurisdicci[oó]n\b").unwrap(),
        Regex::new(r"(?i)\bcompetencia\s+(?:judicial|territorial)\b").unwrap(),
        Regex::new(r"(?i)\b(?:tribunales|juzgados)\s+(?:ordinarios\s+)?de\s+\w+").unwrap(),
        Regex::new(r"(?i)\brenuncia\w*\s+a\s+(?:cualquier\s+)?(?:otro\s+)?(?:fuero|jurisdicci[oó]n)\b").unwrap(),
        Regex::new(r"(?i)\bdomicilio\s+constituid[oa]\b").unwrap(),
    ];
}

/// Allocation of building expenses, utilities and taxes.
pub fn expenses(text: &str) -> Vec<Finding> {
    let ctx = LegalContext::resolve(text);
    if ctx.country != Country::Ar {
        return Vec::new();
    }
    let Some(m) = EXPENSES.find(text) else {
        return Vec::new();
    };
    let index = m.start();
    let around = slice_around(text, index, 300);

    let to_tenant = TO_TENANT.is_match(around);
    let to_landlord = TO_LANDLORD.is_match(around);
    let confidence = score(&[
        (lease_context_near(text, index, 220), 1.2),
        (to_tenant || to_landlord, 1.0),
        (!has_negation_near(text, index, NEGATION_WINDOW), 0.8),
    ]);
    if confidence < DEFAULT_CONFIDENCE_THRESHOLD {
        return Vec::new();
    }

    let shifted = to_tenant && (EXTRAORDINARY.is_match(around) || OWNER_TAXES.is_match(around));
    let description = if shifted {
        "Se cargan al inquilino gastos que suelen corresponder al propietario, como expensas extraordinarias o impuestos del inmueble."
    } else {
        "Revisá qué paga cada parte (expensas, servicios, consorcio) y que quede claro en el contrato."
    };

    vec![FindingBuilder::new(ids::RENTAL_EXPENSES, "Gastos, expensas y suministros")
        .description(description)
        .severity(if shifted { Severity::Medium } else { Severity::Low })
        .kind(RuleKind::Legal)
        .confidence(confidence)
        .at(index, 300)
        .legal_context(&ctx)
        .legal_basis(LegalBasis::ar(
            "CCyC",
            "Las expensas extraordinarias y los impuestos que gravan el inmueble corresponden al locador.",
        )
        .with_article("art. 1209"))
        .bullets(&[
            "Chequeá si te cargan expensas extraordinarias.",
            "Verificá qué servicios están incluidos (agua, luz, gas).",
            "Aclarar quién paga ABL e impuestos inmobiliarios.",
        ])
        .keywords(&["expensas", "extraordinarias", "suministros", "impuestos", "ABL", "consorcio"])
        .extra("toTenant", json!(to_tenant))
        .extra("toLandlord", json!(to_landlord))
        .build()]
}

/// Landlord access to the property without reasonable notice.
pub fn inspections(text: &str) -> Vec<Finding> {
    let Some(m) = INSPECTION.find(text) else {
        return Vec::new();
    };
    let index = m.start();
    let around = slice_around(text, index, 320);

    let any_time = ANY_TIME.is_match(around);
    let short_notice = SHORT_NOTICE.is_match(around);
    if !(any_time || short_notice) {
        return Vec::new();
    }
    let confidence = score(&[
        (true, 1.0),
        (any_time || short_notice, 1.0),
        (!has_negation_near(text, index, NEGATION_WINDOW), 0.8),
    ]);
    if confidence < DEFAULT_CONFIDENCE_THRESHOLD {
        return Vec::new();
    }

    let title = if any_time {
        "Inspecciones sin aviso o en cualquier momento"
    } else {
        "Inspecciones con preaviso muy corto"
    };
    vec![FindingBuilder::new(ids::RENTAL_INSPECTIONS, title)
        .description(
            "El locador se reserva el ingreso al inmueble con poca o ninguna anticipación. Pedí días y horarios razonables con aviso previo.",
        )
        .severity(if any_time { Severity::High } else { Severity::Medium })
        .confidence(confidence)
        .at(index, 320)
        .bullets(&[
            "Acordá un preaviso razonable antes de cada visita.",
            "Limitá las visitas a días y horarios hábiles.",
        ])
        .keywords(&["inspección", "visita", "acceso", "preaviso"])
        .build()]
}

/// Joint guarantor and the benefits it renounces.
pub fn joint_guarantor(text: &str) -> Vec<Finding> {
    let Some(m) = GUARANTOR.find(text) else {
        return Vec::new();
    };

    let renunciations: Vec<&str> = [
        (&*WAIVES_EXCUSSION, "excusión"),
        (&*WAIVES_DIVISION, "división"),
        (&*WAIVES_NOTICE, "notificación"),
    ]
    .iter()
    .filter(|(re, _)| re.is_match(text))
    .map(|(_, label)| *label)
    .collect();
    let strong = EXPLICIT_SOLIDARITY.is_match(text);

    let severity = if renunciations.len() >= 2 || strong {
        Severity::High
    } else {
        Severity::Medium
    };
    let mut keywords = vec!["garante", "fiador", "codeudor", "solidario"];
    keywords.extend(renunciations.iter().copied());

    vec![FindingBuilder::new(ids::RENTAL_JOINT_GUARANTOR, "Garante solidario con renuncia a beneficios")
        .description(
            "Se detecta un garante, fiador o codeudor solidario. Revisá si renuncia a los beneficios de excusión, división o notificación.",
        )
        .severity(severity)
        .confidence(0.75)
        .at(m.start(), 300)
        .legal_basis(LegalBasis::ar(
            "CCyC",
            "Fianza: beneficios de excusión y división del fiador.",
        )
        .with_article("arts. 1583 y 1589"))
        .keywords(&keywords)
        .extra("renunciations", json!(renunciations))
        .build()]
}

/// Agreed venue and forum renunciation.
pub fn jurisdiction(text: &str) -> Vec<Finding> {
    let Some(index) = VENUE.iter().filter_map(|re| re.find(text)).map(|m| m.start()).min() else {
        return Vec::new();
    };

    vec![FindingBuilder::new(ids::RENTAL_JURISDICTION, "Jurisdicción o competencia pactada")
        .description("El contrato fija tribunales o competencia y puede renunciar a otros fueros.")
        .severity(Severity::Low)
        .confidence(0.7)
        .at(index, 300)
        .keywords(&["jurisdicción", "competencia", "tribunales", "fuero", "renuncia"])
        .build()]
}

/// Renounced guarantor benefits recorded on a guarantor finding.
pub fn renunciation_count(finding: &Finding) -> usize {
    finding
        .meta
        .extra
        .get("renunciations")
        .and_then(|v| v.as_array())
        .map_or(0, Vec::len)
}
