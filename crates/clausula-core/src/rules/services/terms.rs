//! Lock-in penalties, automatic renewal, venue and notification clauses.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;

use super::reads_like_lease;
use crate::finding::{Finding, FindingBuilder, Magnitude};
use crate::legal::{Country, LegalContext};
use crate::rules::ids;
use crate::rules::patterns::{has_negation_near, mentions_service, percents, periods, PeriodUnit};
use crate::scoring::score;
use crate::text::slice_around;
use crate::tuning::DEFAULT_CONFIDENCE_THRESHOLD;
use crate::types::Severity;

lazy_static! {
    // =========================================================================
    // LOCK-IN
    // =========================================================================

    static ref LOCK_IN: Regex = Regex::new(
        r"(?i)\b(?:permanencia|penalizaci[oó]n|multa|resarcimiento|punitori[oa]s?)\b"
    ).unwrap();
    static ref MENTIONS_TERM: Regex =
        Regex::new(r"(?i)\b(?:plazo|m[ií]nim[oa]|mes(?:es)?|a[nñ]os?)\b").unwrap();
    static ref MENTIONS_AMOUNT: Regex = Regex::new(
        r"(?i)\$\s?\d|\d+\s*%|\b(?:porcentaje|tarifa|cargo|coste|costo)\b"
    ).unwrap();

    // =========================================================================
    // AUTOMATIC RENEWAL
    // =========================================================================

    static ref RENEWAL: Regex = Regex::new(
        r"(?i)\b(?:renovaci[oó]n\s+autom[aá]tica|pr[oó]rroga\s+autom[aá]tica|t[aá]cita\s+reconducci[oó]n|reconducci[oó]n)\b"
    ).unwrap();
    static ref PRE_NOTICE: Regex =
        Regex::new(r"(?i)\b(?:preaviso|aviso\s+previo|con\s+\d+\s*d[ií]as)\b").unwrap();
    static ref NOTICE_DAYS: Regex = Regex::new(r"(?i)\b(\d{1,3})\s*d[ií]as?\b").unwrap();
    static ref CANCELLATION: Regex = Regex::new(
        r"(?i)\b(?:baja|resoluci[oó]n|rescisi[oó]n|desistimiento)\b"
    ).unwrap();
    static ref SILENCE: Regex = Regex::new(
        r"(?i)\bsilencio\s+del\s+usuario\b|\bsi\s+el\s+usuario\s+no\s+manifiesta\b|\ben\s+caso\s+de\s+no\s+oposici[oó]n\b|\bfalta\s+de\s+oposici[oó]n\b"
    ).unwrap();

    // =========================================================================
    // VENUE AND ARBITRATION
    // =========================================================================

    static ref VENUE: Regex = Regex::new(
        r"(?i)\b(?:jurisdicci[oó]n|competencia|arbitraje|tribunal(?:es)?|fuero)\b"
    ).unwrap();
    static ref DISTANT_VENUE: Regex = Regex::new(
        r"(?i)\b(?:fuera\s+de\s+(?:su\s+)?domicilio|otra\s+ciudad|otra\s+provincia)\b"
    ).unwrap();
    static ref MANDATORY_ARBITRATION: Regex = Regex::new(
        r"(?i)\barbitraje\b.*\b(?:obligatorio|exclusivo|vinculante)\b"
    ).unwrap();
    static ref FORUM_WAIVER: Regex = Regex::new(
        r"(?i)\brenunci\w*\s+(?:al|a\s+(?:cualquier|todo)\s+otro|a\s+otro)\s+fuero\b|\brenunci\w*\s+a\s+reclamar\s+ante\s+tribunales\b"
    ).unwrap();

    // =========================================================================
    // NOTIFICATIONS
    // =========================================================================

    static ref NOTICE_ANCHOR: Regex = Regex::new(
        r"(?i)\b(?:notificaci[oó]n(?:es)?|domicilio\s+especial|correo\s+electr[oó]nico|e-?mail|whatsapp|carta\s+documento|plataforma|telegram|sms|tel[eé]fono)\b"
    ).unwrap();
    static ref CHANNEL: Regex = Regex::new(
        r"(?i)\b(?:correo\s+electr[oó]nico|e-?mail|whatsapp|carta\s+documento|plataforma|domicilio\s+especial|telegram|sms|tel[eé]fono)\b"
    ).unwrap();
    static ref ANY_CHANNEL: Regex = Regex::new(
        r"(?i)\bcualquier\s+medio(?:\s+fehaciente)?\b|\bcualquiera\s+de\s+los\s+siguientes\b|\by/o\b"
    ).unwrap();
    static ref EXCLUSIVE: Regex =
        Regex::new(r"(?i)\b(?:exclusiv(?:a|amente)|s[oó]lo|[uú]nicamente)\b").unwrap();
    static ref VIA: Regex = Regex::new(r"(?i)\b(?:por|v[ií]a)\b").unwrap();
    static ref ONLY_VALID: Regex = Regex::new(r"(?i)\bser[aá]n?\s+v[aá]lidas?\s+s[oó]lo\b").unwrap();
    static ref DOMICILE_CHANGE: Regex = Regex::new(
        r"(?i)\bpodr[aá]\s+(?:modificar|cambiar)\s+el\s+domicilio\b|\bel\s+domicilio\s+(?:podr[aá]\s+ser|ser[aá])\s+modificad[oa]\b"
    ).unwrap();
    static ref RIGID_DOMICILE: Regex = Regex::new(
        r"(?i)\bdomicilio\s+constituid[oa]\s+(?:irrevocable|inmodificable)\b|\bs[oó]lo\s+ser[aá]\s+v[aá]lid[oa]\s+en\s+el\s+domicilio\s+indicado\b"
    ).unwrap();
    static ref SHORT_DEADLINE: Regex = Regex::new(
        r"(?i)\b(?:24|48)\s*h(?:oras|s)?\b.{0,40}\b(?:responder|impugnar|presentar|contestar|notificar|oponerse)\b|\b(?:responder|impugnar|presentar|contestar|oponerse)\b.{0,40}\b(?:24|48)\s*h(?:oras|s)?\b"
    ).unwrap();
}

const LOCK_IN_THRESHOLD: f64 = 0.65;

/// Months or percent of the early-exit penalty near `index`.
fn penalty_near(text: &str, index: usize) -> (Option<u32>, Option<f64>) {
    let around = slice_around(text, index, 260);
    let months = periods(around)
        .into_iter()
        .find(|p| p.unit == PeriodUnit::Months)
        .map(|p| p.value);
    if months.is_some() {
        return (months, None);
    }
    (None, percents(around).into_iter().next())
}

/// Minimum-stay commitment or early-exit penalty in a service plan.
pub fn lock_in(text: &str) -> Vec<Finding> {
    let Some(m) = LOCK_IN.find(text) else {
        return Vec::new();
    };
    if !mentions_service(text) || reads_like_lease(text) {
        return Vec::new();
    }
    let ctx = LegalContext::resolve(text);
    let index = m.start();
    let around = slice_around(text, index, 260);
    let (months, percent) = penalty_near(text, index);

    let confidence = score(&[
        (true, 1.3),
        (
            MENTIONS_TERM.is_match(around)
                || MENTIONS_AMOUNT.is_match(around)
                || months.is_some()
                || percent.is_some(),
            1.0,
        ),
        (!has_negation_near(text, index, 140), 0.8),
    ]);
    if confidence < LOCK_IN_THRESHOLD {
        return Vec::new();
    }

    let high = months.is_some_and(|m| m >= 2) || percent.is_some_and(|p| p >= 50.0);
    let mut builder = FindingBuilder::new(ids::SERVICES_LOCK_IN, "Posible cláusula de permanencia o penalización")
        .description(
            "Se detectan términos de permanencia o penalización. Revisá importes, porcentajes y plazos mínimos, y si hay baja sin costo ante cambios del proveedor.",
        )
        .severity(if high { Severity::High } else { Severity::Medium })
        .confidence(confidence)
        .at(index, 260)
        .context(Country::Ar, ctx.regime)
        .bullets(&[
            "Confirmá si existe un plazo mínimo de permanencia.",
            "Chequeá penalidades por baja anticipada (monto o porcentaje).",
            "Revisá cuándo podés terminar sin costo.",
        ])
        .keywords(&["permanencia", "penalización", "multa", "resarcimiento", "baja", "plan"]);
    if let Some(months) = months {
        builder = builder.magnitude(Magnitude::months(months));
    } else if let Some(percent) = percent {
        builder = builder.magnitude(Magnitude::percent(percent));
    }
    vec![builder.build()]
}

/// Automatic renewal, high when the notice is under ten days or silence
/// renews the contract.
pub fn automatic_renewal(text: &str) -> Vec<Finding> {
    let Some(m) = RENEWAL.find(text) else {
        return Vec::new();
    };
    let ctx = LegalContext::resolve(text);
    let index = m.start();
    let around = slice_around(text, index, 280);

    let pre_notice = PRE_NOTICE.is_match(around);
    let notice_days = NOTICE_DAYS
        .captures(around)
        .and_then(|c| c.get(1)?.as_str().parse::<u32>().ok());
    let cancellation = CANCELLATION.is_match(around);
    let silence = SILENCE.is_match(around);

    let confidence = score(&[
        (true, 1.0),
        (pre_notice || cancellation || silence, 1.0),
        (!has_negation_near(text, index, 150), 0.8),
    ]);
    if confidence < DEFAULT_CONFIDENCE_THRESHOLD {
        return Vec::new();
    }

    let high = notice_days.is_some_and(|d| d < 10) || (silence && !pre_notice);
    let description = if high {
        "Prevé renovación automática con preaviso muy corto o basada en el silencio del usuario. Revisá plazos y canales para oponerte."
    } else {
        "Puede renovarse sin acción del usuario. Revisá el preaviso, la forma de baja y los cambios de precio en la renovación."
    };

    let mut builder = FindingBuilder::new(ids::SERVICES_AUTOMATIC_RENEWAL, "Renovación automática")
        .description(description)
        .severity(if high { Severity::High } else { Severity::Medium })
        .confidence(confidence)
        .at(index, 280)
        .context(Country::Ar, ctx.regime)
        .bullets(&[
            "Confirmá si se renueva automáticamente sin aviso.",
            "Chequeá el plazo y el canal de preaviso para pedir la baja.",
            "Verificá si el precio puede cambiar en la renovación.",
            "Revisá si la falta de respuesta activa la renovación.",
        ])
        .keywords(&["renovación automática", "prórroga", "reconducción", "preaviso", "baja", "silencio"])
        .extra("renewsOnSilence", json!(silence));
    if let Some(days) = notice_days {
        builder = builder.magnitude(Magnitude::days(days));
    }
    vec![builder.build()]
}

/// Venue, mandatory arbitration and forum waivers.
pub fn jurisdiction_arbitration(text: &str) -> Vec<Finding> {
    let Some(m) = VENUE.find(text) else {
        return Vec::new();
    };
    let ctx = LegalContext::resolve(text);
    let index = m.start();
    let around = slice_around(text, index, 260);

    let distant = DISTANT_VENUE.is_match(around);
    let mandatory = MANDATORY_ARBITRATION.is_match(around);
    let waiver = FORUM_WAIVER.is_match(around);

    let confidence = score(&[
        (true, 1.0),
        (distant || mandatory || waiver, 1.0),
        (!has_negation_near(text, index, 150), 0.8),
    ]);
    if confidence < DEFAULT_CONFIDENCE_THRESHOLD {
        return Vec::new();
    }

    let severity = if mandatory && waiver {
        Severity::High
    } else if distant || mandatory {
        Severity::Medium
    } else {
        Severity::Low
    };
    let description = if severity == Severity::High {
        "Se impone arbitraje obligatorio con renuncia al fuero. Puede limitar tus opciones para reclamar."
    } else {
        "Revisá si la cláusula impone tribunales lejanos o arbitraje obligatorio que dificulte reclamar."
    };
    let country = match ctx.country {
        Country::Unknown => Country::Ar,
        other => other,
    };

    vec![FindingBuilder::new(ids::SERVICES_JURISDICTION_ARBITRATION, "Jurisdicción / arbitraje")
        .description(description)
        .severity(severity)
        .confidence(confidence)
        .at(index, 260)
        .context(country, ctx.regime)
        .bullets(&[
            "Chequeá si el contrato impone un tribunal fuera de tu localidad.",
            "Verificá si el arbitraje es obligatorio o voluntario.",
            "Revisá quién cubre los costos del arbitraje.",
        ])
        .keywords(&["jurisdicción", "competencia", "arbitraje", "tribunal", "fuero", "renuncia"])
        .build()]
}

/// Single notification channel, rigid domicile or 24/48 hour deadlines.
pub fn notifications(text: &str) -> Vec<Finding> {
    let Some(m) = NOTICE_ANCHOR.find(text) else {
        return Vec::new();
    };
    let ctx = LegalContext::resolve(text);
    let index = m.start();
    let around = slice_around(text, index, 360);

    let multi_channel = CHANNEL.find_iter(around).count() >= 2 || ANY_CHANNEL.is_match(around);
    let one_way =
        (EXCLUSIVE.is_match(around) && VIA.is_match(around)) || ONLY_VALID.is_match(around);
    let domicile_change = DOMICILE_CHANGE.is_match(around);
    let rigid_domicile = RIGID_DOMICILE.is_match(around) && !domicile_change;
    let short_deadline = SHORT_DEADLINE.is_match(around);

    let restrictive = one_way || short_deadline || rigid_domicile;
    if !restrictive {
        return Vec::new();
    }
    if multi_channel && !short_deadline && !rigid_domicile && !one_way {
        return Vec::new();
    }

    let confidence = score(&[
        (restrictive, 1.0),
        (!multi_channel, 0.6),
        (!domicile_change, 0.6),
        (!has_negation_near(text, index, 160), 0.8),
    ]);
    if confidence < DEFAULT_CONFIDENCE_THRESHOLD {
        return Vec::new();
    }

    let high = one_way && short_deadline && !multi_channel;
    let (title, description) = if high {
        (
            "Notificaciones restrictivas con plazo exiguo",
            "Se limita la notificación a un solo canal y se fijan plazos muy cortos para responder. Puede dificultar tu defensa.",
        )
    } else {
        (
            "Notificaciones o domicilios potencialmente restrictivos",
            "La cláusula de notificaciones podría ser restrictiva (canal único, domicilio rígido o plazos breves). Revisá vías alternativas y plazos.",
        )
    };

    vec![FindingBuilder::new(ids::SERVICES_NOTIFICATIONS, title)
        .description(description)
        .severity(if high { Severity::High } else { Severity::Medium })
        .confidence(confidence)
        .at(index, 360)
        .legal_context(&ctx)
        .bullets(&[
            "Verificá si admite varias vías (email, carta documento, plataforma).",
            "Chequeá que los plazos de respuesta sean razonables.",
            "Confirmá si el domicilio especial es modificable.",
        ])
        .keywords(&["notificación", "exclusiva", "únicamente", "24h", "48h", "domicilio especial", "y/o"])
        .build()]
}
