//! Core types shared by the normalizer, the rule engine and the merge layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity of a finding, ordered low < medium < high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        };
        f.write_str(s)
    }
}

/// Whether a rule encodes a hard legal limit or a good-practice heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Legal,
    Heuristic,
}

impl RuleKind {
    /// Rank used for ordering: legal findings sort before heuristic ones.
    pub(crate) fn rank(self) -> u8 {
        match self {
            RuleKind::Legal => 0,
            RuleKind::Heuristic => 1,
        }
    }
}

/// Contract-type family used to gate which rules run.
///
/// `Global` rules run for every group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RuleGroup {
    #[serde(rename = "alquiler")]
    Rental,
    #[serde(rename = "servicios")]
    Services,
    #[serde(rename = "laboral")]
    Employment,
    #[serde(rename = "bancario")]
    Banking,
    #[serde(rename = "global")]
    Global,
}

impl RuleGroup {
    /// All groups, in registry order.
    pub const ALL: [RuleGroup; 5] = [
        RuleGroup::Rental,
        RuleGroup::Services,
        RuleGroup::Employment,
        RuleGroup::Banking,
        RuleGroup::Global,
    ];

    /// The external (wire) name of the group.
    pub fn as_str(self) -> &'static str {
        match self {
            RuleGroup::Rental => "alquiler",
            RuleGroup::Services => "servicios",
            RuleGroup::Employment => "laboral",
            RuleGroup::Banking => "bancario",
            RuleGroup::Global => "global",
        }
    }
}

impl fmt::Display for RuleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "alquiler" | "rental" => Ok(RuleGroup::Rental),
            "servicios" | "services" => Ok(RuleGroup::Services),
            "laboral" | "employment" => Ok(RuleGroup::Employment),
            "bancario" | "banking" => Ok(RuleGroup::Banking),
            "global" => Ok(RuleGroup::Global),
            other => Err(format!("unknown rule group: {}", other)),
        }
    }
}

/// Contract type as reported by the upstream classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractKind {
    #[serde(rename = "alquiler")]
    Rental,
    #[serde(rename = "servicios")]
    Services,
    #[serde(rename = "laboral")]
    Employment,
    #[serde(rename = "bancario")]
    Banking,
    #[serde(rename = "otro")]
    Other,
}

impl ContractKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ContractKind::Rental => "alquiler",
            ContractKind::Services => "servicios",
            ContractKind::Employment => "laboral",
            ContractKind::Banking => "bancario",
            ContractKind::Other => "otro",
        }
    }

    /// The rule group this contract type selects, if any.
    ///
    /// `Other` has no group; callers run the whole registry instead.
    pub fn rule_group(self) -> Option<RuleGroup> {
        match self {
            ContractKind::Rental => Some(RuleGroup::Rental),
            ContractKind::Services => Some(RuleGroup::Services),
            ContractKind::Employment => Some(RuleGroup::Employment),
            ContractKind::Banking => Some(RuleGroup::Banking),
            ContractKind::Other => None,
        }
    }
}

impl From<RuleGroup> for ContractKind {
    fn from(group: RuleGroup) -> Self {
        match group {
            RuleGroup::Rental => ContractKind::Rental,
            RuleGroup::Services => ContractKind::Services,
            RuleGroup::Employment => ContractKind::Employment,
            RuleGroup::Banking => ContractKind::Banking,
            RuleGroup::Global => ContractKind::Other,
        }
    }
}

/// Classification produced by an external collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Detected contract type
    #[serde(rename = "type")]
    pub kind: ContractKind,

    /// Classifier confidence in 0..1
    pub confidence: f64,

    /// Human-readable reasons, passed through untouched
    #[serde(default)]
    pub reasons: Vec<String>,
}

impl Classification {
    /// Classification pinned to a group by the caller.
    pub fn pinned(group: RuleGroup) -> Self {
        Self {
            kind: group.into(),
            confidence: 1.0,
            reasons: vec![format!("group selected explicitly: {}", group)],
        }
    }

    /// Classification for a document whose type is unknown.
    pub fn unknown() -> Self {
        Self {
            kind: ContractKind::Other,
            confidence: 0.0,
            reasons: Vec::new(),
        }
    }
}

/// How the text of a document was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    #[serde(rename = "pdf-text")]
    PdfText,
    #[serde(rename = "pdf-ocr")]
    PdfOcr,
    #[serde(rename = "docx")]
    Docx,
    #[serde(rename = "txt")]
    PlainText,
}

/// A citation backing a legal finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalBasis {
    /// Statute or regulation, e.g. "Ley 27.551"
    pub law: String,

    /// Article reference, e.g. "art. 92 bis"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article: Option<String>,

    /// Short explanation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    /// Official source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    /// Jurisdiction code, e.g. "AR"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<String>,
}

impl LegalBasis {
    /// Argentine citation with a note.
    pub fn ar(law: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            law: law.into(),
            article: None,
            note: Some(note.into()),
            link: None,
            jurisdiction: Some("AR".to_string()),
        }
    }

    /// Attach an article reference.
    pub fn with_article(mut self, article: impl Into<String>) -> Self {
        self.article = Some(article.into());
        self
    }

    /// Attach an official link.
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}
