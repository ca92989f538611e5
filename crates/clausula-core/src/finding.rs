//! Findings produced by rules.
//!
//! A finding is a value: rules build one with [`FindingBuilder`], the engine
//! validates it, and the merge layer consumes and re-emits findings without
//! mutating anything a caller still holds.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::legal::{Country, LegalContext, Regime};
use crate::scoring::{clamp_confidence, severity_for_confidence};
use crate::types::{LegalBasis, RuleKind, Severity};

/// Unit of an extracted numeric magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MagnitudeUnit {
    Months,
    Days,
    Percent,
}

/// A numeric value a rule extracted from the text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Magnitude {
    pub value: f64,
    pub unit: MagnitudeUnit,
}

impl Magnitude {
    pub fn months(value: u32) -> Self {
        Self {
            value: f64::from(value),
            unit: MagnitudeUnit::Months,
        }
    }

    pub fn days(value: u32) -> Self {
        Self {
            value: f64::from(value),
            unit: MagnitudeUnit::Days,
        }
    }

    pub fn percent(value: f64) -> Self {
        Self {
            value,
            unit: MagnitudeUnit::Percent,
        }
    }

    /// The value in months, if the unit is months.
    pub fn as_months(&self) -> Option<f64> {
        match self.unit {
            MagnitudeUnit::Months => Some(self.value),
            _ => None,
        }
    }
}

/// Typed metadata carried by every finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindingMeta {
    /// Legal limit or heuristic
    #[serde(rename = "type")]
    pub kind: RuleKind,

    /// Confidence in 0..1
    pub confidence: f64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub legal_basis: Vec<LegalBasis>,

    /// Actionable tips for the reader
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bullets: Vec<String>,

    /// Terms for UI highlighting
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnitude: Option<Magnitude>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<Country>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regime: Option<Regime>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph_index: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_index: Option<usize>,

    /// Rule id before topic canonicalization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_type_detected: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_type_confidence: Option<f64>,

    /// Rule-specific diagnostics
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl FindingMeta {
    fn new(kind: RuleKind, confidence: f64) -> Self {
        Self {
            kind,
            confidence,
            legal_basis: Vec::new(),
            bullets: Vec::new(),
            keywords: Vec::new(),
            magnitude: None,
            country: None,
            regime: None,
            paragraph_index: None,
            local_index: None,
            original_id: None,
            contract_type_detected: None,
            contract_type_confidence: None,
            extra: BTreeMap::new(),
        }
    }
}

/// A single detected risk with severity, confidence and evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub id: String,
    pub title: String,
    pub severity: Severity,
    pub description: String,

    /// Readable excerpt; derived from `index` when a rule leaves it empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,

    /// Raw matched fragment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Byte offset of the match in the normalized text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,

    /// Half-width for window evidence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<usize>,

    pub meta: FindingMeta,
}

impl Finding {
    pub fn confidence(&self) -> f64 {
        self.meta.confidence
    }

    /// Months extracted by the rule, if any.
    pub fn months(&self) -> Option<f64> {
        self.meta.magnitude.as_ref().and_then(Magnitude::as_months)
    }

    /// Compare by `(severity, confidence)`; `Greater` means `self` ranks higher.
    pub fn cmp_rank(&self, other: &Finding) -> Ordering {
        self.severity.cmp(&other.severity).then_with(|| {
            self.confidence()
                .partial_cmp(&other.confidence())
                .unwrap_or(Ordering::Equal)
        })
    }

    /// Output ordering: severity desc, confidence desc, legal before heuristic.
    pub fn cmp_output(&self, other: &Finding) -> Ordering {
        other
            .cmp_rank(self)
            .then_with(|| self.meta.kind.rank().cmp(&other.meta.kind.rank()))
    }

    /// Copy of this finding with a different severity.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

/// Fluent construction of findings inside rules.
///
/// When no explicit severity is set, [`FindingBuilder::build`] derives it
/// from the confidence band.
#[derive(Debug, Clone)]
pub struct FindingBuilder {
    id: String,
    title: String,
    description: String,
    severity: Option<Severity>,
    evidence: Option<String>,
    text: Option<String>,
    index: Option<usize>,
    window: Option<usize>,
    meta: FindingMeta,
}

impl FindingBuilder {
    /// Start building a finding for a rule id.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            severity: None,
            evidence: None,
            text: None,
            index: None,
            window: None,
            meta: FindingMeta::new(RuleKind::Heuristic, 0.0),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Business-rule severity; overrides the confidence band.
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn kind(mut self, kind: RuleKind) -> Self {
        self.meta.kind = kind;
        self
    }

    pub fn confidence(mut self, confidence: f64) -> Self {
        self.meta.confidence = clamp_confidence(confidence);
        self
    }

    /// Anchor the finding at a byte offset with an evidence window.
    pub fn at(mut self, index: usize, window: usize) -> Self {
        self.index = Some(index);
        self.window = Some(window);
        self
    }

    pub fn evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = Some(evidence.into());
        self
    }

    pub fn matched(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn legal_basis(mut self, basis: LegalBasis) -> Self {
        self.meta.legal_basis.push(basis);
        self
    }

    pub fn bullets(mut self, bullets: &[&str]) -> Self {
        self.meta.bullets = bullets.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn keywords(mut self, keywords: &[&str]) -> Self {
        self.meta.keywords = keywords.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn magnitude(mut self, magnitude: Magnitude) -> Self {
        self.meta.magnitude = Some(magnitude);
        self
    }

    /// Record the jurisdiction and regime the rule evaluated under.
    pub fn context(mut self, country: Country, regime: Regime) -> Self {
        self.meta.country = Some(country);
        self.meta.regime = Some(regime);
        self
    }

    /// Shorthand for [`FindingBuilder::context`] from a resolved context.
    pub fn legal_context(self, ctx: &LegalContext) -> Self {
        self.context(ctx.country, ctx.regime)
    }

    pub fn extra(mut self, key: &str, value: serde_json::Value) -> Self {
        self.meta.extra.insert(key.to_string(), value);
        self
    }

    /// Build the finding.
    pub fn build(self) -> Finding {
        let severity = self
            .severity
            .unwrap_or_else(|| severity_for_confidence(self.meta.confidence));
        Finding {
            id: self.id,
            title: self.title,
            severity,
            description: self.description,
            evidence: self.evidence,
            text: self.text,
            index: self.index,
            window: self.window,
            meta: self.meta,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::finding;
    use super::*;

    #[test]
    fn test_builder_derives_severity_from_band() {
        let f = FindingBuilder::new("x", "X").confidence(0.85).build();
        assert_eq!(f.severity, Severity::High);
        let f = FindingBuilder::new("x", "X").confidence(0.65).build();
        assert_eq!(f.severity, Severity::Medium);
    }

    #[test]
    fn test_builder_override_wins() {
        let f = FindingBuilder::new("x", "X")
            .confidence(0.95)
            .severity(Severity::Low)
            .build();
        assert_eq!(f.severity, Severity::Low);
    }

    #[test]
    fn test_output_order() {
        let mut v = vec![
            finding("a", Severity::Medium, 0.9),
            finding("b", Severity::High, 0.6),
            finding("c", Severity::Medium, 0.95),
        ];
        v.sort_by(Finding::cmp_output);
        let ids: Vec<_> = v.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, ["b", "c", "a"]);
    }

    #[test]
    fn test_legal_sorts_before_heuristic_on_tie() {
        let h = FindingBuilder::new("h", "H")
            .confidence(0.7)
            .kind(RuleKind::Heuristic)
            .build();
        let l = FindingBuilder::new("l", "L")
            .confidence(0.7)
            .kind(RuleKind::Legal)
            .build();
        let mut v = vec![h, l];
        v.sort_by(Finding::cmp_output);
        assert_eq!(v[0].id, "l");
    }

    #[test]
    fn test_meta_serializes_kind_as_type() {
        let f = FindingBuilder::new("x", "X")
            .kind(RuleKind::Legal)
            .confidence(0.7)
            .magnitude(Magnitude::months(2))
            .build();
        let json = serde_json::to_value(&f).unwrap();
        assert_eq!(json["meta"]["type"], "legal");
        assert_eq!(json["meta"]["magnitude"]["unit"], "months");
        assert!(json.get("evidence").is_none());
    }
}
