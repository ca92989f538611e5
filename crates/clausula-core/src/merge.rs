//! Topic merge and cross-rule escalation.
//!
//! Several rules can report the same underlying issue: two deposit rules,
//! a lease and a banking rule for punitive interest, two lease-term rules.
//! Merging maps their ids onto one topic id and keeps a single
//! representative per topic. Later passes only reclassify severity or
//! replace evidence; nothing here creates a finding.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

use crate::evidence::heading_section;
use crate::finding::Finding;
use crate::rules::ids;
use crate::rules::rental::renunciation_count;
use crate::types::Severity;

lazy_static! {
    static ref DEPOSIT_HEADING: Regex = Regex::new(r"(?i)dep[oó]sito|garant[ií]a").unwrap();
}

/// Topic id for a rule id; ids outside any topic map to themselves.
pub fn topic_for(id: &str) -> &str {
    match id {
        ids::RENTAL_DEPOSIT | ids::RENTAL_GUARANTEE => ids::TOPIC_DEPOSIT,
        ids::SERVICES_JURISDICTION_ARBITRATION => ids::TOPIC_SERVICES_JURISDICTION,
        ids::BANKING_PENALTY_INTEREST | ids::RENTAL_LATE_INTEREST => ids::TOPIC_PENALTY_INTEREST,
        ids::RENTAL_MINIMUM_TERM | ids::RENTAL_DURATION => ids::TOPIC_TERM,
        other => other,
    }
}

/// Id a finding was emitted with, before canonicalization.
pub fn original_id(finding: &Finding) -> &str {
    finding.meta.original_id.as_deref().unwrap_or(&finding.id)
}

fn canonicalize(finding: &Finding) -> Finding {
    let mut out = finding.clone();
    let topic = topic_for(&finding.id);
    if topic != finding.id {
        out.meta.original_id.get_or_insert_with(|| finding.id.clone());
        out.id = topic.to_string();
    }
    out
}

/// Merge two finding lists into one representative per topic.
///
/// Inputs are left untouched. The result is in output order.
pub fn merge(a: &[Finding], b: &[Finding]) -> Vec<Finding> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<Finding>> = HashMap::new();
    for finding in a.iter().chain(b) {
        let finding = canonicalize(finding);
        if !groups.contains_key(&finding.id) {
            order.push(finding.id.clone());
        }
        groups.entry(finding.id.clone()).or_default().push(finding);
    }

    let mut out: Vec<Finding> = order
        .into_iter()
        .filter_map(|topic| {
            let items = groups.remove(&topic)?;
            if topic == ids::TOPIC_DEPOSIT {
                pick_deposit(items)
            } else {
                pick_best(items)
            }
        })
        .collect();
    out.sort_by(Finding::cmp_output);
    out
}

fn pick_best(items: Vec<Finding>) -> Option<Finding> {
    items.into_iter().reduce(|best, next| {
        if next.cmp_rank(&best).is_gt() {
            next
        } else {
            best
        }
    })
}

/// Largest deposit wins; severity follows the number of months only.
fn pick_deposit(items: Vec<Finding>) -> Option<Finding> {
    let months = |f: &Finding| f.months().unwrap_or(0.0);
    let chosen = if items.iter().any(|f| months(f) > 0.0) {
        items.into_iter().reduce(|best, next| {
            if months(&next) > months(&best) {
                next
            } else {
                best
            }
        })
    } else {
        pick_best(items)
    }?;

    let severity = if months(&chosen) >= 2.0 {
        Severity::High
    } else {
        Severity::Low
    };
    Some(chosen.with_severity(severity))
}

/// Raise a deposit of at least one month to high when a guarantor renounces
/// two or more benefits.
pub fn escalate_with_guarantor(findings: Vec<Finding>) -> Vec<Finding> {
    let strong_guarantor = findings
        .iter()
        .any(|f| original_id(f) == ids::RENTAL_JOINT_GUARANTOR && renunciation_count(f) >= 2);
    if !strong_guarantor {
        return findings;
    }

    findings
        .into_iter()
        .map(|f| {
            if f.id == ids::TOPIC_DEPOSIT && f.months().unwrap_or(0.0) >= 1.0 {
                tracing::debug!(months = ?f.months(), "deposit escalated by guarantor renunciations");
                f.with_severity(Severity::High)
            } else {
                f
            }
        })
        .collect()
}

/// Replace deposit evidence with the clause it belongs to.
///
/// The clause runs from the nearest preceding heading that names a deposit
/// or guarantee up to the next heading.
pub fn align_deposit_evidence(text: &str, findings: Vec<Finding>) -> Vec<Finding> {
    findings
        .into_iter()
        .map(|mut f| {
            if f.id == ids::TOPIC_DEPOSIT {
                if let Some(section) = f
                    .index
                    .and_then(|index| heading_section(text, index, &DEPOSIT_HEADING))
                {
                    f.evidence = Some(section);
                }
            }
            f
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::fixtures::finding;
    use crate::finding::{FindingBuilder, Magnitude};
    use serde_json::json;

    fn deposit(id: &str, months: u32, severity: Severity) -> Finding {
        FindingBuilder::new(id, "Depósito")
            .severity(severity)
            .confidence(0.8)
            .magnitude(Magnitude::months(months))
            .build()
    }

    fn guarantor(renunciations: &[&str]) -> Finding {
        FindingBuilder::new(ids::RENTAL_JOINT_GUARANTOR, "Garante")
            .severity(Severity::Medium)
            .confidence(0.75)
            .extra("renunciations", json!(renunciations))
            .build()
    }

    #[test]
    fn test_topic_mapping() {
        assert_eq!(topic_for(ids::RENTAL_GUARANTEE), ids::TOPIC_DEPOSIT);
        assert_eq!(topic_for(ids::RENTAL_LATE_INTEREST), ids::TOPIC_PENALTY_INTEREST);
        assert_eq!(topic_for(ids::RENTAL_DURATION), ids::TOPIC_TERM);
        assert_eq!(topic_for(ids::RIGHTS_WAIVER), ids::RIGHTS_WAIVER);
    }

    #[test]
    fn test_deposit_topic_prefers_largest_magnitude() {
        let a = vec![deposit(ids::RENTAL_DEPOSIT, 1, Severity::Medium)];
        let b = vec![
            finding(ids::RENTAL_GUARANTEE, Severity::High, 0.9),
            deposit(ids::RENTAL_GUARANTEE, 3, Severity::Low),
        ];
        let merged = merge(&a, &b);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id, ids::TOPIC_DEPOSIT);
        assert_eq!(merged[0].months(), Some(3.0));
        assert_eq!(merged[0].severity, Severity::High);
        assert_eq!(merged[0].meta.original_id.as_deref(), Some(ids::RENTAL_GUARANTEE));
    }

    #[test]
    fn test_one_month_deposit_is_low() {
        let merged = merge(&[deposit(ids::RENTAL_DEPOSIT, 1, Severity::Medium)], &[]);
        assert_eq!(merged[0].severity, Severity::Low);
    }

    #[test]
    fn test_other_topics_keep_best() {
        let a = vec![finding(ids::RENTAL_LATE_INTEREST, Severity::Medium, 0.9)];
        let b = vec![finding(ids::BANKING_PENALTY_INTEREST, Severity::High, 0.7)];
        let merged = merge(&a, &b);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id, ids::TOPIC_PENALTY_INTEREST);
        assert_eq!(original_id(&merged[0]), ids::BANKING_PENALTY_INTEREST);
    }

    #[test]
    fn test_merge_does_not_touch_inputs() {
        let a = vec![deposit(ids::RENTAL_DEPOSIT, 1, Severity::Medium)];
        let _ = merge(&a, &[]);
        assert_eq!(a[0].id, ids::RENTAL_DEPOSIT);
        assert_eq!(a[0].severity, Severity::Medium);
    }

    #[test]
    fn test_guarantor_renunciations_escalate_deposit() {
        let merged = merge(
            &[
                deposit(ids::RENTAL_DEPOSIT, 1, Severity::Medium),
                guarantor(&["excusión", "división"]),
            ],
            &[],
        );
        let escalated = escalate_with_guarantor(merged);
        let dep = escalated.iter().find(|f| f.id == ids::TOPIC_DEPOSIT).unwrap();
        assert_eq!(dep.severity, Severity::High);
    }

    #[test]
    fn test_guarantor_without_renunciations_does_not_escalate() {
        let merged = merge(
            &[
                deposit(ids::RENTAL_DEPOSIT, 1, Severity::Medium),
                guarantor(&["excusión"]),
            ],
            &[],
        );
        let escalated = escalate_with_guarantor(merged);
        let dep = escalated.iter().find(|f| f.id == ids::TOPIC_DEPOSIT).unwrap();
        assert_eq!(dep.severity, Severity::Low);
    }

    #[test]
    fn test_heading_aligned_evidence() {
        let text = "CLÁUSULA OCTAVA – Destino\nEl inmueble se destinará a vivienda.\n\nCLÁUSULA NOVENA – Depósito en Garantía\nEl locatario entrega en concepto de depósito en garantía la suma equivalente a un (1) mes de alquiler.\n\nCLÁUSULA DÉCIMA – Expensas\nA cargo del locatario.";
        let index = text.find("entrega").unwrap();
        let mut dep = deposit(ids::RENTAL_DEPOSIT, 1, Severity::Medium);
        dep.index = Some(index);
        dep.evidence = Some("entrega".to_string());

        let aligned = align_deposit_evidence(text, merge(&[dep], &[]));
        let evidence = aligned[0].evidence.as_deref().unwrap();
        assert!(evidence.starts_with("CLÁUSULA NOVENA – Depósito en Garantía"));
        assert!(evidence.ends_with("un (1) mes de alquiler."));
    }
}
