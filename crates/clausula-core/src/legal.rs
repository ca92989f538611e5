//! Legal context resolution.
//!
//! Infers country, currency, lease subtype and contract date from the
//! normalized text, and maps them to the regulatory regime a rule should
//! evaluate under. Resolution is a pure function of the text, so rules call
//! [`LegalContext::resolve`] on their own.
//!
//! Argentine regime cutovers:
//!
//! | From | Regime |
//! |------|--------|
//! | (earlier) | `PRE_27551` |
//! | 2020-07-01 | `LEY_27551` |
//! | 2023-10-18 | `LEY_27737` |
//! | 2023-12-21 | `DNU_70_2023` |
//!
//! A document with no recognizable date resolves to the newest regime.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Country {
    #[serde(rename = "AR")]
    Ar,
    #[serde(rename = "ES")]
    Es,
    Unknown,
}

/// Regulatory regime governing a lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Regime {
    #[serde(rename = "PRE_27551")]
    Pre27551,
    #[serde(rename = "LEY_27551")]
    Ley27551,
    #[serde(rename = "LEY_27737")]
    Ley27737,
    #[serde(rename = "DNU_70_2023")]
    Dnu70_2023,
    #[serde(rename = "ES_LAU")]
    EsLau,
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl Regime {
    pub fn as_str(self) -> &'static str {
        match self {
            Regime::Pre27551 => "PRE_27551",
            Regime::Ley27551 => "LEY_27551",
            Regime::Ley27737 => "LEY_27737",
            Regime::Dnu70_2023 => "DNU_70_2023",
            Regime::EsLau => "ES_LAU",
            Regime::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaseKind {
    Permanente,
    Temporaria,
    Comercial,
    Desconocido,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Ars,
    Eur,
    Unknown,
}

/// Jurisdiction, regime and related facts inferred from a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalContext {
    pub country: Country,
    pub regime: Regime,
    pub lease_kind: LeaseKind,
    pub currency: Currency,
    pub contract_date: Option<NaiveDate>,
    /// Regime cited explicitly in the text, if any
    pub hinted_regime: Option<Regime>,
}

lazy_static! {
    static ref DATE_DMY: Regex =
        Regex::new(r"\b(\d{1,2})[/.\-](\d{1,2})[/.\-](\d{2,4})\b").unwrap();
    static ref DATE_YMD: Regex =
        Regex::new(r"\b(\d{4})[/.\-](\d{1,2})[/.\-](\d{1,2})\b").unwrap();
    static ref DATE_LONG: Regex =
        Regex::new(r"(?i)\b(\d{1,2})\s+de\s+([a-záéíóú]+)\s+de\s+(\d{4})\b").unwrap();

    static ref EUR: Regex = Regex::new(r"€\s*\d|\d\s*€").unwrap();
    static ref ARS_WORD: Regex = Regex::new(r"(?i)\b(?:ars|pesos?)\b|\bar\$").unwrap();
    static ref DOLLAR_AMOUNT: Regex = Regex::new(r"\$\s*\d").unwrap();

    static ref ES_SIGNALS: Regex = Regex::new(
        r"(?i)€|\bibi\b|\bcomunidad aut[oó]noma\b|\blau\b|\barrendamientos urbanos\b|\bine\b"
    ).unwrap();
    static ref AR_SIGNALS: Regex = Regex::new(
        r"(?i)\b(?:caba|provincia de|argentina|dni|cuit|cuil|bcra|icl|ripte)\b|\bley\s*27\.?551\b|\b27\.?737\b"
    ).unwrap();

    static ref TEMPORARY: Regex = Regex::new(
        r"(?i)\blocaci[oó]n\s+tempor[aá]ria\b|\bcontrato\s+temporari[oa]\b|\bturismo\b|\btemporada\b"
    ).unwrap();
    static ref COMMERCIAL: Regex =
        Regex::new(r"(?i)\bcomercial\b|\blocal\b|\boficina\b|\bindustrial\b").unwrap();
    static ref PERMANENT: Regex =
        Regex::new(r"(?i)\bvivienda\s+(?:habitual|permanente)\b").unwrap();

    static ref HINT_DNU: Regex = Regex::new(r"(?i)\bdnu\s*70\s*/?\s*2023\b").unwrap();
    static ref HINT_27737: Regex = Regex::new(r"(?i)\bley\s*(?:n[°º]\s*)?27\.?737\b").unwrap();
    static ref HINT_27551: Regex = Regex::new(r"(?i)\bley\s*(?:n[°º]\s*)?27\.?551\b").unwrap();
}

/// Effective dates of the Argentine lease regimes, oldest first.
fn ar_cutovers() -> [(NaiveDate, Regime); 3] {
    // constant, valid calendar dates
    let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN);
    [
        (date(2020, 7, 1), Regime::Ley27551),
        (date(2023, 10, 18), Regime::Ley27737),
        (date(2023, 12, 21), Regime::Dnu70_2023),
    ]
}

impl LegalContext {
    /// Resolve the legal context of a normalized contract text.
    pub fn resolve(text: &str) -> Self {
        let contract_date = extract_contract_date(text);
        let currency = detect_currency(text);
        let country = detect_country(text);
        let lease_kind = detect_lease_kind(text);
        let hinted_regime = hinted_ar_regime(text);

        let regime = match country {
            Country::Es => Regime::EsLau,
            Country::Ar => hinted_regime.unwrap_or_else(|| regime_for_date(contract_date)),
            Country::Unknown => Regime::Unknown,
        };

        Self {
            country,
            regime,
            lease_kind,
            currency,
            contract_date,
            hinted_regime,
        }
    }

    /// Regime for rules that treat an undetected country as Argentina.
    pub fn regime_assuming_ar(&self) -> Regime {
        match self.country {
            Country::Unknown => self
                .hinted_regime
                .unwrap_or_else(|| regime_for_date(self.contract_date)),
            _ => self.regime,
        }
    }

    /// True unless the text carries Spanish signals.
    pub fn is_ar_or_unknown(&self) -> bool {
        self.country != Country::Es
    }
}

/// Map a contract date to the Argentine regime in force on that day.
pub fn regime_for_date(date: Option<NaiveDate>) -> Regime {
    let Some(date) = date else {
        return Regime::Dnu70_2023;
    };
    ar_cutovers()
        .iter()
        .rev()
        .find(|(from, _)| date >= *from)
        .map(|(_, regime)| *regime)
        .unwrap_or(Regime::Pre27551)
}

/// First valid calendar date found, trying each pattern in priority order.
pub fn extract_contract_date(text: &str) -> Option<NaiveDate> {
    first_valid(&DATE_DMY, text, |c| {
        let year = expand_year(&c[3])?;
        ymd(year, &c[2], &c[1])
    })
    .or_else(|| first_valid(&DATE_YMD, text, |c| ymd(c[1].parse().ok()?, &c[2], &c[3])))
    .or_else(|| {
        first_valid(&DATE_LONG, text, |c| {
            let month = month_number(&c[2])?;
            let day = c[1].parse().ok()?;
            NaiveDate::from_ymd_opt(c[3].parse().ok()?, month, day)
        })
    })
}

fn first_valid(
    re: &Regex,
    text: &str,
    parse: impl Fn(&Captures) -> Option<NaiveDate>,
) -> Option<NaiveDate> {
    re.captures_iter(text).find_map(|c| parse(&c))
}

fn expand_year(raw: &str) -> Option<i32> {
    match raw.len() {
        2 => format!("20{}", raw).parse().ok(),
        4 => raw.parse().ok(),
        _ => None,
    }
}

fn ymd(year: i32, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month.parse().ok()?, day.parse().ok()?)
}

fn month_number(name: &str) -> Option<u32> {
    let n = match name.to_lowercase().as_str() {
        "enero" => 1,
        "febrero" => 2,
        "marzo" => 3,
        "abril" => 4,
        "mayo" => 5,
        "junio" => 6,
        "julio" => 7,
        "agosto" => 8,
        "septiembre" | "setiembre" => 9,
        "octubre" => 10,
        "noviembre" => 11,
        "diciembre" => 12,
        _ => return None,
    };
    Some(n)
}

fn detect_currency(text: &str) -> Currency {
    if EUR.is_match(text) {
        Currency::Eur
    } else if ARS_WORD.is_match(text) || DOLLAR_AMOUNT.is_match(text) {
        Currency::Ars
    } else {
        Currency::Unknown
    }
}

fn detect_country(text: &str) -> Country {
    if ES_SIGNALS.is_match(text) {
        Country::Es
    } else if AR_SIGNALS.is_match(text) || ARS_WORD.is_match(text) || DOLLAR_AMOUNT.is_match(text)
    {
        Country::Ar
    } else {
        Country::Unknown
    }
}

fn detect_lease_kind(text: &str) -> LeaseKind {
    if TEMPORARY.is_match(text) {
        LeaseKind::Temporaria
    } else if COMMERCIAL.is_match(text) {
        LeaseKind::Comercial
    } else if PERMANENT.is_match(text) {
        LeaseKind::Permanente
    } else {
        LeaseKind::Desconocido
    }
}

fn hinted_ar_regime(text: &str) -> Option<Regime> {
    if HINT_DNU.is_match(text) {
        Some(Regime::Dnu70_2023)
    } else if HINT_27737.is_match(text) {
        Some(Regime::Ley27737)
    } else if HINT_27551.is_match(text) {
        Some(Regime::Ley27551)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_regime_cutovers() {
        assert_eq!(regime_for_date(date(2020, 6, 30)), Regime::Pre27551);
        assert_eq!(regime_for_date(date(2020, 7, 1)), Regime::Ley27551);
        assert_eq!(regime_for_date(date(2023, 10, 17)), Regime::Ley27551);
        assert_eq!(regime_for_date(date(2023, 10, 18)), Regime::Ley27737);
        assert_eq!(regime_for_date(date(2023, 12, 20)), Regime::Ley27737);
        assert_eq!(regime_for_date(date(2023, 12, 21)), Regime::Dnu70_2023);
        assert_eq!(regime_for_date(None), Regime::Dnu70_2023);
    }

    #[test]
    fn test_date_patterns_in_priority_order() {
        assert_eq!(extract_contract_date("firmado el 15/03/2021"), date(2021, 3, 15));
        assert_eq!(extract_contract_date("firmado el 15-03-21"), date(2021, 3, 15));
        assert_eq!(extract_contract_date("fecha 2022.11.05"), date(2022, 11, 5));
        assert_eq!(
            extract_contract_date("a los 3 de Setiembre de 2022"),
            date(2022, 9, 3)
        );
        // invalid calendar dates are skipped
        assert_eq!(
            extract_contract_date("31/02/2021 y luego 01/08/2021"),
            date(2021, 8, 1)
        );
        assert_eq!(extract_contract_date("sin fecha"), None);
    }

    #[test]
    fn test_resolve_ar_by_date() {
        let ctx = LegalContext::resolve(
            "Contrato de locación en CABA, firmado el 10/01/2022, alquiler de $ 100.000",
        );
        assert_eq!(ctx.country, Country::Ar);
        assert_eq!(ctx.currency, Currency::Ars);
        assert_eq!(ctx.regime, Regime::Ley27551);
    }

    #[test]
    fn test_explicit_hint_wins_over_date() {
        let ctx = LegalContext::resolve(
            "Locación en la Provincia de Córdoba del 10/01/2022 conforme Ley 27.737",
        );
        assert_eq!(ctx.regime, Regime::Ley27737);
        assert_eq!(ctx.hinted_regime, Some(Regime::Ley27737));
    }

    #[test]
    fn test_spanish_contract() {
        let ctx = LegalContext::resolve(
            "Contrato sujeto a la Ley de Arrendamientos Urbanos. Renta de 900 € mensuales.",
        );
        assert_eq!(ctx.country, Country::Es);
        assert_eq!(ctx.regime, Regime::EsLau);
        assert_eq!(ctx.currency, Currency::Eur);
    }

    #[test]
    fn test_spanish_signals_are_whole_words() {
        // "ine" inside "determine" and "lau" inside "claudia" are not signals
        let ctx = LegalContext::resolve("Claudia determine la fecha");
        assert_eq!(ctx.country, Country::Unknown);
        assert_eq!(ctx.regime, Regime::Unknown);
        assert_eq!(ctx.regime_assuming_ar(), Regime::Dnu70_2023);
    }

    #[test]
    fn test_lease_kind() {
        assert_eq!(
            LegalContext::resolve("locación temporaria con fines de turismo").lease_kind,
            LeaseKind::Temporaria
        );
        assert_eq!(
            LegalContext::resolve("destinado a oficina").lease_kind,
            LeaseKind::Comercial
        );
        assert_eq!(
            LegalContext::resolve("destinado a vivienda permanente").lease_kind,
            LeaseKind::Permanente
        );
    }

    #[test]
    fn test_regime_serializes_upper_snake() {
        assert_eq!(
            serde_json::to_string(&Regime::Dnu70_2023).unwrap(),
            "\"DNU_70_2023\""
        );
        assert_eq!(serde_json::to_string(&Country::Ar).unwrap(), "\"AR\"");
    }
}
