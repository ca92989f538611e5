//! Rule registry.
//!
//! Every rule is a pure function over normalized text. The registry is an
//! immutable, ordered list of [`RuleEntry`] values grouped by contract
//! family; the engine selects from it per [`RuleGroup`].

pub mod banking;
pub mod employment;
pub mod global;
pub mod patterns;
pub mod rental;
pub mod services;

use lazy_static::lazy_static;
use std::fmt;

use crate::finding::Finding;
use crate::types::RuleGroup;

/// External rule and topic identifiers.
pub mod ids {
    pub const RENTAL_DEPOSIT: &str = "alquiler-deposito-un-mes";
    pub const RENTAL_GUARANTEE: &str = "alquiler-fianza";
    pub const RENTAL_MINIMUM_TERM: &str = "alquiler-plazo-minimo";
    pub const RENTAL_DURATION: &str = "alquiler-duracion";
    pub const RENTAL_ADJUSTMENT_PERIODICITY: &str = "alquiler-ajuste-periodicidad";
    pub const RENTAL_INDEXATION: &str = "alquiler-indexacion";
    pub const RENTAL_EARLY_TERMINATION: &str = "alquiler-desistimiento";
    pub const RENTAL_EXPENSES: &str = "alquiler-gastos";
    pub const RENTAL_PENALTY_CLAUSE: &str = "alquiler-clausula-penal";
    pub const RENTAL_JOINT_GUARANTOR: &str = "alquiler-garante-solidario";
    pub const RENTAL_JURISDICTION: &str = "alquiler-jurisdiccion";
    pub const RENTAL_TEMPORARY_INCONSISTENCY: &str = "alquiler-inconsistencia-temporaria";
    pub const RENTAL_INSPECTIONS: &str = "alquiler-inspecciones";
    pub const RENTAL_LATE_INTEREST: &str = "alquiler-intereses-moratorios";

    pub const SERVICES_LOCK_IN: &str = "servicios-plan-permanencia";
    pub const SERVICES_DATA_TRANSFER: &str = "servicios-datos-cesion";
    pub const SERVICES_JURISDICTION_ARBITRATION: &str = "servicios-jurisdiccion-arbitraje";
    pub const SERVICES_AUTOMATIC_RENEWAL: &str = "servicios-renovacion-automatica";
    pub const SERVICES_NOTIFICATIONS: &str = "servicios-notificaciones";

    pub const EMPLOYMENT_PROBATION: &str = "laboral-periodo-prueba";

    pub const BANKING_PENALTY_INTEREST: &str = "bancario-intereses-punitorios";
    pub const BANKING_FOREIGN_CURRENCY: &str = "bancario-moneda-extranjera";

    pub const RIGHTS_WAIVER: &str = "renuncia-derechos";

    // Merge topics
    pub const TOPIC_DEPOSIT: &str = "alquiler-deposito";
    pub const TOPIC_SERVICES_JURISDICTION: &str = "servicios-jurisdiccion";
    pub const TOPIC_PENALTY_INTEREST: &str = "intereses-punitorios";
    pub const TOPIC_TERM: &str = "alquiler-plazo";
}

/// Signature shared by every rule.
pub type RuleFn = fn(&str) -> Vec<Finding>;

/// A registered rule.
#[derive(Clone, Copy)]
pub struct RuleEntry {
    /// External identifier; every finding the rule emits carries it
    pub id: &'static str,
    pub group: RuleGroup,
    pub run: RuleFn,
}

impl RuleEntry {
    const fn new(id: &'static str, group: RuleGroup, run: RuleFn) -> Self {
        Self { id, group, run }
    }
}

impl fmt::Debug for RuleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleEntry")
            .field("id", &self.id)
            .field("group", &self.group)
            .finish_non_exhaustive()
    }
}

lazy_static! {
    /// All rules, in evaluation order.
    pub static ref REGISTRY: Vec<RuleEntry> = {
        use RuleGroup::*;
        vec![
            RuleEntry::new(ids::RENTAL_MINIMUM_TERM, Rental, rental::minimum_term),
            RuleEntry::new(ids::RENTAL_DEPOSIT, Rental, rental::deposit_one_month),
            RuleEntry::new(ids::RENTAL_GUARANTEE, Rental, rental::guarantee_deposit),
            RuleEntry::new(ids::RENTAL_ADJUSTMENT_PERIODICITY, Rental, rental::adjustment_periodicity),
            RuleEntry::new(ids::RENTAL_INDEXATION, Rental, rental::indexation),
            RuleEntry::new(ids::RENTAL_DURATION, Rental, rental::duration),
            RuleEntry::new(ids::RENTAL_EARLY_TERMINATION, Rental, rental::early_termination),
            RuleEntry::new(ids::RENTAL_EXPENSES, Rental, rental::expenses),
            RuleEntry::new(ids::RENTAL_PENALTY_CLAUSE, Rental, rental::penalty_clause),
            RuleEntry::new(ids::RENTAL_JOINT_GUARANTOR, Rental, rental::joint_guarantor),
            RuleEntry::new(ids::RENTAL_JURISDICTION, Rental, rental::jurisdiction),
            RuleEntry::new(ids::RENTAL_TEMPORARY_INCONSISTENCY, Rental, rental::temporary_inconsistency),
            RuleEntry::new(ids::RENTAL_INSPECTIONS, Rental, rental::inspections),
            RuleEntry::new(ids::RENTAL_LATE_INTEREST, Rental, rental::late_interest),
            RuleEntry::new(ids::SERVICES_LOCK_IN, Services, services::lock_in),
            RuleEntry::new(ids::SERVICES_DATA_TRANSFER, Services, services::data_transfer),
            RuleEntry::new(ids::SERVICES_JURISDICTION_ARBITRATION, Services, services::jurisdiction_arbitration),
            RuleEntry::new(ids::SERVICES_AUTOMATIC_RENEWAL, Services, services::automatic_renewal),
            RuleEntry::new(ids::SERVICES_NOTIFICATIONS, Services, services::notifications),
            RuleEntry::new(ids::EMPLOYMENT_PROBATION, Employment, employment::probation_period),
            RuleEntry::new(ids::BANKING_PENALTY_INTEREST, Banking, banking::penalty_interest),
            RuleEntry::new(ids::BANKING_FOREIGN_CURRENCY, Banking, banking::foreign_currency),
            RuleEntry::new(ids::RIGHTS_WAIVER, Global, global::rights_waiver),
        ]
    };
}

/// Look up a registered rule by id.
pub fn find(id: &str) -> Option<&'static RuleEntry> {
    REGISTRY.iter().find(|entry| entry.id == id)
}

/// Rules registered under `group`, in registry order.
pub fn in_group(group: RuleGroup) -> impl Iterator<Item = &'static RuleEntry> {
    REGISTRY.iter().filter(move |entry| entry.group == group)
}
