//! Confidence scoring and the confidence-to-severity band.

use crate::tuning::{HIGH_BAND, MEDIUM_BAND};
use crate::types::Severity;

/// Weighted normalized average of boolean signals.
///
/// Each present signal contributes its weight; the sum is divided by the
/// total weight. Returns 0.0 when the total weight is not positive.
///
/// ```
/// use clausula_core::scoring::score;
///
/// let c = score(&[(true, 1.2), (true, 1.0), (false, 0.8)]);
/// assert!((c - 2.2 / 3.0).abs() < 1e-9);
/// ```
pub fn score(signals: &[(bool, f64)]) -> f64 {
    let graded: Vec<(f64, f64)> = signals
        .iter()
        .map(|&(present, weight)| (if present { 1.0 } else { 0.0 }, weight))
        .collect();
    score_graded(&graded)
}

/// Weighted normalized average of graded signals in 0..1.
pub fn score_graded(signals: &[(f64, f64)]) -> f64 {
    let total: f64 = signals.iter().map(|&(_, w)| w.max(0.0)).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let acc: f64 = signals
        .iter()
        .map(|&(v, w)| v.clamp(0.0, 1.0) * w.max(0.0))
        .sum();
    clamp_confidence(acc / total)
}

/// Clamp to 0..1, mapping non-finite values to 0.
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Generic severity band for a confidence value.
pub fn severity_for_confidence(confidence: f64) -> Severity {
    if confidence >= HIGH_BAND {
        Severity::High
    } else if confidence >= MEDIUM_BAND {
        Severity::Medium
    } else {
        Severity::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_all_present_is_one() {
        assert_eq!(score(&[(true, 1.3), (true, 1.0), (true, 0.8)]), 1.0);
    }

    #[test]
    fn test_score_empty_or_zero_weight() {
        assert_eq!(score(&[]), 0.0);
        assert_eq!(score(&[(true, 0.0)]), 0.0);
    }

    #[test]
    fn test_negation_weight_pulls_below_threshold() {
        // lease context present, no amount, negated
        let c = score(&[(true, 1.2), (false, 1.0), (false, 0.8)]);
        assert!(c < 0.6);
    }

    #[test]
    fn test_bands() {
        assert_eq!(severity_for_confidence(0.95), Severity::High);
        assert_eq!(severity_for_confidence(0.8), Severity::High);
        assert_eq!(severity_for_confidence(0.6), Severity::Medium);
        assert_eq!(severity_for_confidence(0.59), Severity::Low);
    }

    #[test]
    fn test_clamp_confidence() {
        assert_eq!(clamp_confidence(f64::NAN), 0.0);
        assert_eq!(clamp_confidence(1.7), 1.0);
        assert_eq!(clamp_confidence(-0.2), 0.0);
    }
}
