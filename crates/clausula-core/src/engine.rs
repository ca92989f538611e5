//! Rule evaluation engine.
//!
//! The engine selects rules from the registry by group, runs each one in
//! isolation, repairs malformed output, derives evidence and returns a
//! ranked list with at most one finding per rule id.
//!
//! Pipeline per call:
//! 1. **Select**: the group's rules plus every global rule, narrowed by the
//!    allow-list when one is configured
//! 2. **Run**: a panicking rule is logged and contributes nothing
//! 3. **Validate**: confidence clamped, index snapped, id relabelled
//! 4. **Filter / dedup / rank**

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

use crate::config::EngineConfig;
use crate::evidence;
use crate::finding::Finding;
use crate::rules::{RuleEntry, REGISTRY};
use crate::scoring::clamp_confidence;
use crate::text::floor_boundary;
use crate::tuning::EVIDENCE_WINDOW;
use crate::types::RuleGroup;

/// Runs registered rules against normalized text.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Rules that run for `group`, in registry order.
    pub fn selected_rules(&self, group: RuleGroup) -> Vec<&'static RuleEntry> {
        let allowed = self.config.allowed(group);
        if allowed.is_empty() && group != RuleGroup::Global {
            tracing::warn!(group = %group, "empty allow-list, running every rule in the group");
        }

        let selected: Vec<&'static RuleEntry> = REGISTRY
            .iter()
            .filter(|entry| entry.group == group || entry.group == RuleGroup::Global)
            .filter(|entry| {
                allowed.is_empty()
                    || entry.group == RuleGroup::Global
                    || allowed.iter().any(|id| id == entry.id)
            })
            .collect();

        tracing::debug!(group = %group, selected = selected.len(), "rules selected");
        selected
    }

    /// Ids of the rules that run for `group`.
    pub fn selected_rule_ids(&self, group: RuleGroup) -> Vec<&'static str> {
        self.selected_rules(group)
            .into_iter()
            .map(|entry| entry.id)
            .collect()
    }

    /// Run the rules selected for `group` with the configured threshold.
    pub fn run_for_group(&self, text: &str, group: RuleGroup) -> Vec<Finding> {
        self.run_for_group_with_threshold(text, group, self.config.confidence_threshold)
    }

    pub fn run_for_group_with_threshold(
        &self,
        text: &str,
        group: RuleGroup,
        threshold: f64,
    ) -> Vec<Finding> {
        execute(text, &self.selected_rules(group), threshold)
    }

    /// Run the whole registry, for documents without a contract type.
    pub fn run_all(&self, text: &str) -> Vec<Finding> {
        self.run_all_with_threshold(text, self.config.confidence_threshold)
    }

    pub fn run_all_with_threshold(&self, text: &str, threshold: f64) -> Vec<Finding> {
        let all: Vec<&'static RuleEntry> = REGISTRY.iter().collect();
        tracing::debug!(selected = all.len(), "running full registry");
        execute(text, &all, threshold)
    }
}

/// Run the rules for `group` under the default configuration.
pub fn run_for_group(text: &str, group: RuleGroup, threshold: f64) -> Vec<Finding> {
    Engine::default().run_for_group_with_threshold(text, group, threshold)
}

/// Ids selected for `group` under the default configuration.
pub fn selected_rule_ids_for_group(group: RuleGroup) -> Vec<&'static str> {
    Engine::default().selected_rule_ids(group)
}

fn execute(text: &str, selected: &[&RuleEntry], threshold: f64) -> Vec<Finding> {
    let mut raw = Vec::new();
    for entry in selected {
        for finding in run_isolated(entry, text) {
            raw.push(sanitize(entry, finding, text));
        }
    }
    let produced = raw.len();
    let ranked = rank(raw, threshold);
    tracing::debug!(produced, kept = ranked.len(), threshold, "rule pass finished");
    ranked
}

fn run_isolated(entry: &RuleEntry, text: &str) -> Vec<Finding> {
    match panic::catch_unwind(AssertUnwindSafe(|| (entry.run)(text))) {
        Ok(findings) => findings,
        Err(_) => {
            tracing::warn!(rule = entry.id, "rule execution fault");
            Vec::new()
        }
    }
}

/// Repair a rule's output and fill in missing evidence.
fn sanitize(entry: &RuleEntry, mut finding: Finding, text: &str) -> Finding {
    if finding.id != entry.id {
        tracing::warn!(rule = entry.id, emitted = %finding.id, "finding relabelled with rule id");
        finding.id = entry.id.to_string();
    }

    finding.meta.confidence = clamp_confidence(finding.meta.confidence);

    let window = finding.window.unwrap_or(EVIDENCE_WINDOW);
    if let Some(index) = finding.index {
        let malformed = index > text.len() || !text.is_char_boundary(index);
        if malformed {
            tracing::warn!(rule = entry.id, index, len = text.len(), "malformed rule output");
            let snapped = floor_boundary(text, index);
            finding.index = Some(snapped);
            if finding.evidence.is_none() {
                finding.evidence = Some(evidence::paragraph_excerpt(text, snapped, window));
            }
        } else if finding.evidence.is_none() {
            finding.evidence = Some(evidence::derive(text, index, window));
        }
    }

    finding
}

/// Drop findings below `threshold`, keep the best per id, sort for output.
fn rank(findings: Vec<Finding>, threshold: f64) -> Vec<Finding> {
    let mut best: HashMap<String, Finding> = HashMap::new();
    for finding in findings {
        if finding.confidence() < threshold {
            continue;
        }
        match best.get(&finding.id) {
            Some(current) if !finding.cmp_rank(current).is_gt() => {}
            _ => {
                best.insert(finding.id.clone(), finding);
            }
        }
    }

    let mut out: Vec<Finding> = best.into_values().collect();
    out.sort_by(|a, b| a.cmp_output(b).then_with(|| a.id.cmp(&b.id)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::fixtures::finding;
    use crate::finding::FindingBuilder;
    use crate::rules::ids;
    use crate::types::Severity;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    const LEASE: &str = "Contrato de locación de vivienda celebrado en Buenos Aires, Argentina, el 15/03/2021. El plazo de la locación será de 24 meses. El LOCATARIO entregará en concepto de depósito de garantía el equivalente a dos (2) meses de alquiler. En caso de mora se aplicará un interés punitorio del 5% mensual.";

    fn panicking_rule(_: &str) -> Vec<Finding> {
        panic!("boom")
    }

    fn misbehaving_rule(text: &str) -> Vec<Finding> {
        vec![FindingBuilder::new("otro-id", "Fuera de rango")
            .confidence(0.9)
            .at(text.len() + 50, 40)
            .build()]
    }

    #[test]
    fn test_selection_includes_global_rules() {
        let selected = Engine::default().selected_rule_ids(RuleGroup::Employment);
        assert_eq!(selected, [ids::EMPLOYMENT_PROBATION, ids::RIGHTS_WAIVER]);
    }

    #[test]
    fn test_allow_list_narrows_group() {
        let selected = selected_rule_ids_for_group(RuleGroup::Rental);
        assert_eq!(selected.len(), 11);
        assert!(!selected.contains(&ids::RENTAL_INSPECTIONS));
        assert!(selected.contains(&ids::RIGHTS_WAIVER));
    }

    #[test]
    fn test_empty_allow_list_runs_whole_group() {
        let engine = Engine::new(EngineConfig {
            allow_list: BTreeMap::new(),
            ..EngineConfig::default()
        });
        assert!(engine.config().allowed(RuleGroup::Rental).is_empty());
        assert_eq!(engine.selected_rule_ids(RuleGroup::Rental).len(), 15);
    }

    #[test]
    fn test_run_all_ignores_allow_list() {
        let text = "El locador podrá ingresar al inmueble para realizar inspecciones con aviso previo. Contrato de locación de vivienda.";
        let engine = Engine::default();
        let grouped: Vec<String> = engine
            .run_for_group(text, RuleGroup::Rental)
            .into_iter()
            .map(|f| f.id)
            .collect();
        assert!(!grouped.iter().any(|id| id == ids::RENTAL_INSPECTIONS));
        assert!(engine.run_all(text).len() >= grouped.len());
    }

    #[test]
    fn test_panicking_rule_is_isolated() {
        let entry = RuleEntry {
            id: "prueba-panico",
            group: RuleGroup::Global,
            run: panicking_rule,
        };
        assert!(execute(LEASE, &[&entry], 0.0).is_empty());
    }

    #[test]
    fn test_malformed_output_is_repaired() {
        let entry = RuleEntry {
            id: "prueba-rango",
            group: RuleGroup::Global,
            run: misbehaving_rule,
        };
        let out = execute(LEASE, &[&entry], 0.0);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "prueba-rango");
        assert_eq!(out[0].index, Some(LEASE.len()));
        assert!(out[0].evidence.as_deref().is_some_and(|e| !e.is_empty()));
    }

    #[test]
    fn test_evidence_is_derived_from_index() {
        let out = run_for_group(LEASE, RuleGroup::Rental, 0.6);
        let deposit = out.iter().find(|f| f.id == ids::RENTAL_DEPOSIT).unwrap();
        assert!(deposit.evidence.as_deref().unwrap().contains("depósito de garantía"));
    }

    #[test]
    fn test_dedup_keeps_higher_ranked() {
        let out = rank(
            vec![
                finding("x", Severity::Medium, 0.7),
                finding("x", Severity::High, 0.65),
                finding("x", Severity::High, 0.6),
            ],
            0.6,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].severity, Severity::High);
        assert_eq!(out[0].confidence(), 0.65);
    }

    #[test]
    fn test_output_is_sorted() {
        let out = run_for_group(LEASE, RuleGroup::Rental, 0.0);
        for pair in out.windows(2) {
            assert!(!pair[0].cmp_output(&pair[1]).is_gt());
        }
    }

    proptest! {
        #[test]
        fn prop_threshold_is_monotonic(low in 0.0f64..1.0, delta in 0.0f64..0.5) {
            let high = (low + delta).min(1.0);
            let engine = Engine::default();
            let loose = engine.run_all_with_threshold(LEASE, low);
            let strict = engine.run_all_with_threshold(LEASE, high);
            prop_assert!(strict.len() <= loose.len());
            for f in &strict {
                prop_assert!(f.confidence() >= high);
                prop_assert!(loose.iter().any(|g| g.id == f.id));
            }
        }
    }
}
