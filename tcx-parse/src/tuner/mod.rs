//! Precision Tuner
//!
//! Capped post-hoc correction of the continuous urgency score.
//!
//! # Scoring
//! The tier classifier's result becomes a base score:
//! - CRITICAL 0.90 (+0.02 per extra keyword, max 0.98)
//! - HIGH 0.70 (+0.03 per extra keyword, max 0.82)
//! - MEDIUM 0.50
//! - LOW 0.20
//!
//! # Passes
//! Three ordered passes (see `detectors::PASSES`). A pass runs only when the
//! pre-tuning score lies in its band, applies at most one correction (first
//! matching detector), and passes may stack. When the total magnitude exceeds
//! the cap, every adjustment is scaled down proportionally. The final score is
//! clamped to 0.0-1.0 and mapped back to a tier.

pub mod detectors;

use crate::registry::ConfigurationError;
use crate::text::TranscriptText;
use crate::types::{CorrectionRecord, UrgencyLevel};
use tracing::{debug, warn};

/// Default cap on Σ|adjustment| per transcript
pub const DEFAULT_CORRECTION_CAP: f64 = 0.40;

pub const CRITICAL_THRESHOLD: f64 = 0.85;
pub const HIGH_THRESHOLD: f64 = 0.65;
pub const MEDIUM_THRESHOLD: f64 = 0.35;

/// Base score for a classified tier
pub fn base_urgency_score(level: UrgencyLevel, hits: usize) -> f64 {
    let extra = hits.saturating_sub(1) as f64;
    match level {
        UrgencyLevel::Critical => (0.90 + 0.02 * extra).min(0.98),
        UrgencyLevel::High => (0.70 + 0.03 * extra).min(0.82),
        UrgencyLevel::Medium => 0.50,
        UrgencyLevel::Low => 0.20,
    }
}

/// Tier for a continuous score
pub fn tier_for_score(score: f64) -> UrgencyLevel {
    if score >= CRITICAL_THRESHOLD {
        UrgencyLevel::Critical
    } else if score >= HIGH_THRESHOLD {
        UrgencyLevel::High
    } else if score >= MEDIUM_THRESHOLD {
        UrgencyLevel::Medium
    } else {
        UrgencyLevel::Low
    }
}

/// Result of tuning one score
#[derive(Debug, Clone, PartialEq)]
pub struct TuningOutcome {
    pub base_score: f64,
    pub final_score: f64,
    pub tier: UrgencyLevel,
    /// Applied corrections with their (possibly rescaled) magnitudes
    pub corrections: Vec<CorrectionRecord>,
    /// True when the cap forced a proportional rescale
    pub capped: bool,
}

impl TuningOutcome {
    /// Outcome with no corrections applied
    pub fn untuned(base_score: f64) -> Self {
        let final_score = base_score.clamp(0.0, 1.0);
        Self {
            base_score,
            final_score,
            tier: tier_for_score(final_score),
            corrections: Vec::new(),
            capped: false,
        }
    }

    pub fn total_magnitude(&self) -> f64 {
        self.corrections.iter().map(|c| c.magnitude.abs()).sum()
    }
}

/// Band-scoped urgency corrector
#[derive(Debug, Clone)]
pub struct PrecisionTuner {
    cap: f64,
}

impl PrecisionTuner {
    /// Tuner with the given cap
    ///
    /// # Errors
    /// `ConfigurationError::InvalidConfig` when the cap is outside (0, 1].
    pub fn try_new(cap: f64) -> Result<Self, ConfigurationError> {
        if cap > 0.0 && cap <= 1.0 {
            Ok(Self { cap })
        } else {
            Err(ConfigurationError::InvalidConfig {
                id: "precision_tuner".to_string(),
                reason: format!("correction_cap must be within (0, 1], got {}", cap),
            })
        }
    }

    /// Tuner with the given cap; an out-of-range cap falls back to the
    /// default with a warning
    pub fn new(cap: f64) -> Self {
        Self::try_new(cap).unwrap_or_else(|err| {
            warn!(error = %err, cap = DEFAULT_CORRECTION_CAP, "Using default correction cap");
            Self {
                cap: DEFAULT_CORRECTION_CAP,
            }
        })
    }

    pub fn cap(&self) -> f64 {
        self.cap
    }

    pub fn tune(&self, text: &TranscriptText, base_score: f64) -> TuningOutcome {
        let mut corrections = Vec::new();

        for pass in detectors::PASSES {
            if !pass.in_band(base_score) {
                continue;
            }
            if let Some(detector) = pass.detectors.iter().find(|d| (d.test)(text)) {
                debug!(
                    pass = ?pass.pass,
                    detector = detector.name,
                    magnitude = detector.magnitude,
                    "Urgency correction matched"
                );
                corrections.push(CorrectionRecord {
                    pass: pass.pass,
                    detector: detector.name.to_string(),
                    magnitude: detector.magnitude,
                    reason: detector.reason.to_string(),
                });
            }
        }

        let total: f64 = corrections.iter().map(|c| c.magnitude.abs()).sum();
        let capped = total > self.cap;
        if capped {
            let scale = self.cap / total;
            for correction in &mut corrections {
                correction.magnitude *= scale;
            }
            debug!(total, cap = self.cap, scale, "Correction total capped");
        }

        let adjustment: f64 = corrections.iter().map(|c| c.magnitude).sum();
        let final_score = (base_score + adjustment).clamp(0.0, 1.0);

        TuningOutcome {
            base_score,
            final_score,
            tier: tier_for_score(final_score),
            corrections,
            capped,
        }
    }
}

impl Default for PrecisionTuner {
    fn default() -> Self {
        Self::new(DEFAULT_CORRECTION_CAP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TuningPass;

    #[test]
    fn test_base_scores() {
        assert!((base_urgency_score(UrgencyLevel::Critical, 1) - 0.90).abs() < 1e-9);
        assert!((base_urgency_score(UrgencyLevel::Critical, 10) - 0.98).abs() < 1e-9);
        assert!((base_urgency_score(UrgencyLevel::High, 2) - 0.73).abs() < 1e-9);
        assert!((base_urgency_score(UrgencyLevel::High, 10) - 0.82).abs() < 1e-9);
        assert!((base_urgency_score(UrgencyLevel::Medium, 0) - 0.50).abs() < 1e-9);
        assert!((base_urgency_score(UrgencyLevel::Low, 3) - 0.20).abs() < 1e-9);
    }

    #[test]
    fn test_base_scores_map_back_to_their_tier() {
        for level in [UrgencyLevel::Critical, UrgencyLevel::High, UrgencyLevel::Medium, UrgencyLevel::Low] {
            for hits in 0..6 {
                assert_eq!(tier_for_score(base_urgency_score(level, hits)), level);
            }
        }
    }

    #[test]
    fn test_thresholds() {
        assert_eq!(tier_for_score(0.85), UrgencyLevel::Critical);
        assert_eq!(tier_for_score(0.8499), UrgencyLevel::High);
        assert_eq!(tier_for_score(0.65), UrgencyLevel::High);
        assert_eq!(tier_for_score(0.35), UrgencyLevel::Medium);
        assert_eq!(tier_for_score(0.10), UrgencyLevel::Low);
    }

    #[test]
    fn test_high_boundary_promotes_medium() {
        let text = TranscriptText::new("I got an eviction notice and need $1,200");
        let outcome = PrecisionTuner::default().tune(&text, 0.50);
        assert_eq!(outcome.corrections.len(), 1);
        assert_eq!(outcome.corrections[0].pass, TuningPass::HighBoundary);
        assert!((outcome.final_score - 0.80).abs() < 1e-9);
        assert_eq!(outcome.tier, UrgencyLevel::High);
    }

    #[test]
    fn test_critical_boundary_promotes_high() {
        let text = TranscriptText::new("my surgery is scheduled for tomorrow, it is urgent");
        let outcome = PrecisionTuner::default().tune(&text, 0.70);
        assert_eq!(outcome.tier, UrgencyLevel::Critical);
        assert!((outcome.final_score - 0.90).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_band_score_untouched() {
        let text = TranscriptText::new("my surgery is scheduled for tomorrow");
        let outcome = PrecisionTuner::default().tune(&text, 0.90);
        assert!(outcome.corrections.is_empty());
        assert_eq!(outcome.final_score, 0.90);
    }

    #[test]
    fn test_stacked_corrections_are_capped() {
        // high pass (+0.30) and medium pass (-0.20) both fire on a 0.50 score
        let text = TranscriptText::new(
            "I was laid off and my kids need food, a new kitchen would be nice someday",
        );
        let outcome = PrecisionTuner::default().tune(&text, 0.50);
        assert_eq!(outcome.corrections.len(), 2);
        assert!(outcome.capped);
        assert!(outcome.total_magnitude() <= DEFAULT_CORRECTION_CAP + 1e-9);
        assert!((outcome.corrections[0].magnitude - 0.24).abs() < 1e-9);
        assert!((outcome.corrections[1].magnitude + 0.16).abs() < 1e-9);
        assert!((outcome.final_score - 0.58).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_cap_rejected() {
        for cap in [0.0, -0.1, 1.5, f64::NAN] {
            let err = PrecisionTuner::try_new(cap).unwrap_err();
            assert!(matches!(err, ConfigurationError::InvalidConfig { .. }));
            assert!(err.to_string().contains("correction_cap"));
        }
        assert_eq!(PrecisionTuner::try_new(1.0).unwrap().cap(), 1.0);
    }

    #[test]
    fn test_invalid_cap_falls_back_to_default() {
        assert_eq!(PrecisionTuner::new(0.0).cap(), DEFAULT_CORRECTION_CAP);
        assert_eq!(PrecisionTuner::new(1.5).cap(), DEFAULT_CORRECTION_CAP);
        assert_eq!(PrecisionTuner::new(0.25).cap(), 0.25);
    }

    #[test]
    fn test_final_score_clamped() {
        let text = TranscriptText::new("a new car would be nice to upgrade");
        let outcome = PrecisionTuner::new(1.0).tune(&text, 0.15);
        assert!(outcome.final_score >= 0.0 && outcome.final_score <= 1.0);
    }
}
