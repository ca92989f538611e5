//! Rules for residential and commercial leases (`alquiler`).

mod adjustment;
mod deposit;
mod obligations;
mod penalties;
mod term;

use lazy_static::lazy_static;
use regex::Regex;

use super::patterns::lease_terms_near;
use crate::text::slice_around;

pub use adjustment::{adjustment_periodicity, indexation};
pub use deposit::{deposit_one_month, guarantee_deposit};
pub use obligations::{expenses, inspections, joint_guarantor, jurisdiction, renunciation_count};
pub use penalties::{early_termination, late_interest, penalty_clause};
pub use term::{duration, minimum_term, temporary_inconsistency};

lazy_static! {
    static ref CONTRACT_TERMS: Regex = Regex::new(r"(?i)\b(?:contrato|arrendamiento)\b").unwrap();
}

/// Lease vocabulary or a generic contract mention near `index`.
fn lease_context_near(text: &str, index: usize, radius: usize) -> bool {
    lease_terms_near(text, index, radius) || CONTRACT_TERMS.is_match(slice_around(text, index, radius))
}
