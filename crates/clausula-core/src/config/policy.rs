//! Built-in rule policy.

use std::collections::BTreeMap;

use crate::rules::ids;
use crate::types::RuleGroup;

/// The default policy as shipped in policy/default.yaml.
pub const DEFAULT_POLICY_YAML: &str = include_str!("../../../../policy/default.yaml");

/// Rules enabled per group unless a configuration says otherwise.
///
/// Informative rental rules (guarantee mention, agreed venue, temporary
/// inconsistency, inspections) are registered but not enabled by default.
pub fn default_allow_list() -> BTreeMap<RuleGroup, Vec<String>> {
    let groups: [(RuleGroup, &[&str]); 5] = [
        (
            RuleGroup::Rental,
            &[
                ids::RENTAL_MINIMUM_TERM,
                ids::RENTAL_DEPOSIT,
                ids::RENTAL_ADJUSTMENT_PERIODICITY,
                ids::RENTAL_INDEXATION,
                ids::RENTAL_DURATION,
                ids::RENTAL_EARLY_TERMINATION,
                ids::RENTAL_EXPENSES,
                ids::RENTAL_PENALTY_CLAUSE,
                ids::RENTAL_JOINT_GUARANTOR,
                ids::RENTAL_LATE_INTEREST,
            ],
        ),
        (
            RuleGroup::Services,
            &[
                ids::SERVICES_LOCK_IN,
                ids::SERVICES_DATA_TRANSFER,
                ids::SERVICES_JURISDICTION_ARBITRATION,
                ids::SERVICES_AUTOMATIC_RENEWAL,
                ids::SERVICES_NOTIFICATIONS,
            ],
        ),
        (RuleGroup::Employment, &[ids::EMPLOYMENT_PROBATION]),
        (
            RuleGroup::Banking,
            &[ids::BANKING_PENALTY_INTEREST, ids::BANKING_FOREIGN_CURRENCY],
        ),
        (RuleGroup::Global, &[]),
    ];

    groups
        .into_iter()
        .map(|(group, rules)| (group, rules.iter().map(|id| id.to_string()).collect()))
        .collect()
}
