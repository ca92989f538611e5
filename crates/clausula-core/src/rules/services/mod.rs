//! Rules for consumer services: plans, subscriptions and their terms of use.

mod data;
mod terms;

use lazy_static::lazy_static;
use regex::Regex;

pub use data::data_transfer;
pub use terms::{automatic_renewal, jurisdiction_arbitration, lock_in, notifications};

lazy_static! {
    /// Wording that marks the document as a lease rather than a service
    static ref LEASE_DOCUMENT: Regex = Regex::new(
        r"(?i)\b(?:locaci[oó]n|alquiler\w*|locador[a]?|locatari[oa]|inmueble|vivienda|departamento|casa|garant[ií]a|dep[oó]sito|fianza)\b"
    ).unwrap();
}

/// True when the text reads like a lease, which service rules must not
/// double-report.
fn reads_like_lease(text: &str) -> bool {
    LEASE_DOCUMENT.is_match(text)
}
