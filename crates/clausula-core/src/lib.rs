//! # clausula-core
//!
//! Deterministic risk analysis for Spanish-language contracts.
//!
//! Given the plain text of a rental, services, employment or banking
//! contract, this crate answers:
//! - Which clauses put the signer at risk?
//! - How sure is the analysis, and how severe is each risk?
//! - Where in the document is the evidence?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same input always produces same output
//! 2. **No model calls**: All analysis is pattern-based
//! 3. **Traceable**: Every finding carries its rule id, confidence and evidence
//! 4. **Isolated**: A faulty rule is logged and skipped, never fatal
//!
//! ## Example
//!
//! ```rust,ignore
//! use clausula_core::{analyze, Classification, EngineConfig, ExtractedDocument, RuleGroup};
//!
//! let document = ExtractedDocument::plain(std::fs::read_to_string("contrato.txt")?);
//! let classification = Classification::pinned(RuleGroup::Rental);
//! let analysis = analyze(&document, classification, &EngineConfig::default())?;
//!
//! for finding in &analysis.findings {
//!     println!("[{}] {}: {}", finding.severity, finding.id, finding.title);
//! }
//! ```

pub mod config;
pub mod engine;
pub mod evidence;
pub mod extract;
pub mod finding;
pub mod legal;
pub mod merge;
pub mod normalize;
pub mod rules;
pub mod scoring;
pub mod text;
pub mod tuning;
pub mod types;

// Re-export main types at crate root
pub use config::{ConfigError, EngineConfig};
pub use engine::{run_for_group, selected_rule_ids_for_group, Engine};
pub use extract::ExtractedDocument;
pub use finding::{Finding, FindingBuilder, FindingMeta, Magnitude, MagnitudeUnit};
pub use legal::{Country, Currency, LeaseKind, LegalContext, Regime};
pub use normalize::{
    normalize, normalize_with_limit, NormalizeError, NormalizedDocument, ParagraphLocation,
};
pub use types::{
    Classification, ContractKind, LegalBasis, RuleGroup, RuleKind, Severity, SourceKind,
};

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during analysis
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Text extraction failed: {reason}")]
    ExtractionFailure { reason: String },

    #[error(transparent)]
    Illegible(#[from] NormalizeError),
}

impl AnalysisError {
    /// Guidance for the person who uploaded the document.
    pub fn user_hint(&self) -> &'static str {
        match self {
            AnalysisError::ExtractionFailure { .. } => {
                "No se pudo leer el archivo como texto. Subí un PDF con texto o un .txt, o procesalo con OCR antes de analizarlo."
            }
            AnalysisError::Illegible(_) => {
                "No se pudo extraer texto legible. Si es un escaneo, activá OCR o subí un PDF con texto."
            }
        }
    }
}

/// Which rules ran and why the result may be empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDiagnostics {
    pub debug: bool,
    pub selected_rule_ids: Vec<String>,
    pub selected_count: usize,
    pub hint: String,
}

impl RuleDiagnostics {
    fn new(debug: bool, selected: Vec<&'static str>, findings: usize) -> Self {
        let hint = if selected.is_empty() {
            "No hay reglas seleccionadas: revisá la lista de reglas habilitadas o el tipo detectado."
        } else if findings == 0 {
            "Se ejecutaron reglas pero no encontraron coincidencias: revisá la normalización o el OCR."
        } else {
            "OK: hubo hallazgos."
        };
        Self {
            debug,
            selected_count: selected.len(),
            selected_rule_ids: selected.into_iter().map(str::to_string).collect(),
            hint: hint.to_string(),
        }
    }
}

/// Result of analyzing one document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    /// Ranked findings, one per topic
    pub findings: Vec<Finding>,
    /// Normalized text and paragraph mapping
    pub document: NormalizedDocument,
    pub classification: Classification,
    pub legal_context: LegalContext,
    pub diagnostics: RuleDiagnostics,
}

/// Analyze a document with the configured confidence threshold.
///
/// # Arguments
///
/// * `document` - Extracted plain text and its provenance
/// * `classification` - Contract type from the upstream classifier; `otro`
///   runs every registered rule
/// * `config` - Thresholds and allow-lists
///
/// # Returns
///
/// An [`Analysis`] with merged findings, or [`AnalysisError::Illegible`]
/// when too little text survives normalization.
pub fn analyze(
    document: &ExtractedDocument,
    classification: Classification,
    config: &EngineConfig,
) -> Result<Analysis, AnalysisError> {
    analyze_with_mode(document, classification, config, false)
}

/// Analyze with the lower debug threshold, to surface weak signals.
pub fn analyze_debug(
    document: &ExtractedDocument,
    classification: Classification,
    config: &EngineConfig,
) -> Result<Analysis, AnalysisError> {
    analyze_with_mode(document, classification, config, true)
}

fn analyze_with_mode(
    document: &ExtractedDocument,
    classification: Classification,
    config: &EngineConfig,
    debug: bool,
) -> Result<Analysis, AnalysisError> {
    let normalized = normalize_with_limit(&document.text, config.max_chars)?;
    let text = normalized.text();
    let legal_context = LegalContext::resolve(text);

    let engine = Engine::new(config.clone());
    let threshold = if debug {
        config.debug_threshold
    } else {
        config.confidence_threshold
    };
    let (selected, raw) = match classification.kind.rule_group() {
        Some(group) => (
            engine.selected_rule_ids(group),
            engine.run_for_group_with_threshold(text, group, threshold),
        ),
        None => (
            rules::REGISTRY.iter().map(|entry| entry.id).collect(),
            engine.run_all_with_threshold(text, threshold),
        ),
    };

    let merged = merge::merge(&raw, &[]);
    let escalated = merge::escalate_with_guarantor(merged);
    let mut findings = merge::align_deposit_evidence(text, escalated);
    findings.sort_by(Finding::cmp_output);

    for finding in &mut findings {
        if let Some(index) = finding.index {
            let location = normalized.locate_offset(index);
            finding.meta.paragraph_index = Some(location.paragraph_index);
            finding.meta.local_index = Some(location.local_index);
        }
        finding.meta.contract_type_detected = Some(classification.kind.as_str().to_string());
        finding.meta.contract_type_confidence = Some(classification.confidence);
    }

    tracing::debug!(
        contract_type = classification.kind.as_str(),
        raw = raw.len(),
        merged = findings.len(),
        "analysis finished"
    );

    let diagnostics = RuleDiagnostics::new(debug, selected, findings.len());
    Ok(Analysis {
        findings,
        document: normalized,
        classification,
        legal_context,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::ids;

    fn run(text: &str, group: RuleGroup) -> Analysis {
        analyze(
            &ExtractedDocument::plain(text),
            Classification::pinned(group),
            &EngineConfig::default(),
        )
        .unwrap()
    }

    fn deposit(analysis: &Analysis) -> Vec<&Finding> {
        analysis
            .findings
            .iter()
            .filter(|f| f.id == ids::TOPIC_DEPOSIT)
            .collect()
    }

    #[test]
    fn test_one_month_deposit_is_low() {
        let analysis = run(
            "El LOCATARIO entregará en concepto de depósito de garantía el equivalente a un (1) mes de alquiler",
            RuleGroup::Rental,
        );
        let found = deposit(&analysis);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].months(), Some(1.0));
        assert_eq!(found[0].severity, Severity::Low);
        assert_eq!(found[0].meta.original_id.as_deref(), Some(ids::RENTAL_DEPOSIT));
    }

    #[test]
    fn test_two_month_deposit_is_high() {
        let analysis = run(
            "El LOCATARIO entregará en concepto de depósito de garantía el equivalente a dos (2) meses de alquiler",
            RuleGroup::Rental,
        );
        let found = deposit(&analysis);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].months(), Some(2.0));
        assert_eq!(found[0].severity, Severity::High);
    }

    #[test]
    fn test_guarantor_renunciations_escalate_deposit() {
        let analysis = run(
            "CLÁUSULA 10 – Garante solidario\nJuan Pérez actúa como garante solidario y renuncia a los beneficios de excusión y división.\n\nCLÁUSULA 9 – Depósito en garantía\nEl depósito en garantía será equivalente a (1) mes de alquiler.",
            RuleGroup::Rental,
        );
        let found = deposit(&analysis);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::High);
        assert!(found[0]
            .evidence
            .as_deref()
            .unwrap()
            .starts_with("CLÁUSULA 9 - Depósito en garantía"));
    }

    #[test]
    fn test_guarantor_without_renunciations_does_not_escalate() {
        let analysis = run(
            "CLÁUSULA 10 – Garante solidario\nJuan Pérez actúa como garante solidario.\n\nCLÁUSULA 9 – Depósito en garantía\nEl depósito en garantía será equivalente a (1) mes de alquiler.",
            RuleGroup::Rental,
        );
        let found = deposit(&analysis);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::Low);
    }

    #[test]
    fn test_negated_punitive_interest_does_not_fire() {
        let analysis = run(
            "Contrato de locación de vivienda en CABA, Argentina. No se aplicarán intereses punitorios si el atraso del alquiler no supera 48 horas.",
            RuleGroup::Rental,
        );
        assert!(!analysis
            .findings
            .iter()
            .any(|f| f.id == ids::TOPIC_PENALTY_INTEREST));
    }

    #[test]
    fn test_affirmative_punitive_interest_fires() {
        let analysis = run(
            "Contrato de locación de vivienda en CABA, Argentina. En caso de mora en el pago del alquiler se aplicará interés punitorio del 2% por mes.",
            RuleGroup::Rental,
        );
        let found: Vec<&Finding> = analysis
            .findings
            .iter()
            .filter(|f| f.id == ids::TOPIC_PENALTY_INTEREST)
            .collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].meta.original_id.as_deref(), Some(ids::RENTAL_LATE_INTEREST));
        assert_eq!(found[0].severity, Severity::High);
    }

    #[test]
    fn test_findings_carry_location_and_contract_type() {
        let analysis = run(
            "Contrato de locación.\n\nEl LOCATARIO entregará en concepto de depósito de garantía el equivalente a dos (2) meses de alquiler.",
            RuleGroup::Rental,
        );
        let found = deposit(&analysis);
        assert_eq!(found[0].meta.paragraph_index, Some(1));
        assert_eq!(found[0].meta.contract_type_detected.as_deref(), Some("alquiler"));
        assert_eq!(found[0].meta.contract_type_confidence, Some(1.0));
    }

    #[test]
    fn test_unclassified_document_runs_every_rule() {
        let analysis = analyze(
            &ExtractedDocument::plain("Contrato de prestación de servicios entre las partes firmantes."),
            Classification::unknown(),
            &EngineConfig::default(),
        )
        .unwrap();
        assert_eq!(analysis.diagnostics.selected_count, rules::REGISTRY.len());
        assert!(analysis.findings.is_empty());
        assert!(analysis.diagnostics.hint.starts_with("Se ejecutaron reglas"));
    }

    #[test]
    fn test_debug_mode_is_reported() {
        let analysis = analyze_debug(
            &ExtractedDocument::plain("El período de prueba será de seis (6) meses para el trabajador."),
            Classification::pinned(RuleGroup::Employment),
            &EngineConfig::default(),
        )
        .unwrap();
        assert!(analysis.diagnostics.debug);
        assert_eq!(
            analysis.diagnostics.selected_rule_ids,
            [ids::EMPLOYMENT_PROBATION, ids::RIGHTS_WAIVER]
        );
    }

    #[test]
    fn test_configured_length_cap_applies() {
        let config = EngineConfig {
            max_chars: 40,
            ..EngineConfig::default()
        };
        let analysis = analyze(
            &ExtractedDocument::plain("Contrato de locación de vivienda. ".repeat(5)),
            Classification::pinned(RuleGroup::Rental),
            &config,
        )
        .unwrap();
        assert!(analysis.document.text().chars().count() <= 40);
        assert!(analysis.document.notes()[0].starts_with("truncated:"));
    }

    #[test]
    fn test_illegible_document() {
        let err = analyze(
            &ExtractedDocument::plain("   \n\n ... "),
            Classification::unknown(),
            &EngineConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::Illegible(_)));
        assert!(err.user_hint().contains("OCR"));
    }

    #[test]
    fn test_analysis_serializes() {
        let analysis = run(
            "El LOCATARIO entregará en concepto de depósito de garantía el equivalente a dos (2) meses de alquiler",
            RuleGroup::Rental,
        );
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["classification"]["type"], "alquiler");
        assert!(json["document"]["paragraphs"].is_array());
        assert!(json["diagnostics"]["selectedRuleIds"].is_array());

        let finding = serde_json::to_value(deposit(&analysis)[0]).unwrap();
        assert_eq!(finding["meta"]["originalId"], ids::RENTAL_DEPOSIT);
        assert_eq!(finding["meta"]["contractTypeDetected"], "alquiler");
    }
}
