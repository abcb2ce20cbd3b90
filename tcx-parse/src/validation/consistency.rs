//! Output Consistency Validator
//!
//! Checks an `ExtractionOutput` for internal contradictions before it leaves
//! the engine.
//!
//! # Consistency Checks
//! 1. **Confidence Validity**: every confidence and the urgency score in 0.0-1.0
//! 2. **Name Plausibility**: no digits in an extracted name
//! 3. **Amount Bounds**: goal amount inside the configured bounds
//! 4. **Urgency Agreement**: tier equals the tier derived from the score
//! 5. **Evidence**: most fields resolved by defaults
//!
//! # Scoring Algorithm
//! - Start with score = 1.0
//! - Critical: -0.3, Major: -0.15, Minor: -0.05
//! - Final score clamped to 0.0-1.0
//!
//! # Status Determination
//! - Fail: any critical issue, or score below the warning threshold
//! - Pass: score >= pass threshold and no major issues
//! - Warning: otherwise

use super::amount::AmountBounds;
use super::{ValidationResult, ValidationStatus};
use crate::tuner::tier_for_score;
use crate::types::ExtractionOutput;
use serde_json::json;
use tracing::debug;

const CRITICAL_PENALTY: f32 = 0.3;
const MAJOR_PENALTY: f32 = 0.15;
const MINOR_PENALTY: f32 = 0.05;

/// Default-tier field count at which the output is flagged as low evidence
const LOW_EVIDENCE_DEFAULTS: usize = 4;

#[derive(Debug, Default)]
struct IssueTally {
    score: f32,
    issues: Vec<String>,
    critical: usize,
    major: usize,
    minor: usize,
}

impl IssueTally {
    fn new() -> Self {
        Self {
            score: 1.0,
            ..Default::default()
        }
    }

    fn critical(&mut self, issue: String) {
        self.score -= CRITICAL_PENALTY;
        self.critical += 1;
        self.issues.push(issue);
    }

    fn major(&mut self, issue: String) {
        self.score -= MAJOR_PENALTY;
        self.major += 1;
        self.issues.push(issue);
    }

    fn minor(&mut self, issue: String) {
        self.score -= MINOR_PENALTY;
        self.minor += 1;
        self.issues.push(issue);
    }
}

/// Consistency validator for engine output
#[derive(Debug, Clone)]
pub struct OutputValidator {
    bounds: AmountBounds,
    /// Minimum score threshold for Pass status
    pass_threshold: f32,
    /// Minimum score threshold for Warning status (below this is Fail)
    warning_threshold: f32,
}

impl OutputValidator {
    pub fn new(bounds: AmountBounds) -> Self {
        Self {
            bounds,
            pass_threshold: 0.8,
            warning_threshold: 0.5,
        }
    }

    pub fn with_thresholds(bounds: AmountBounds, pass_threshold: f32, warning_threshold: f32) -> Self {
        Self {
            bounds,
            pass_threshold,
            warning_threshold,
        }
    }

    pub fn validate(&self, output: &ExtractionOutput) -> ValidationResult {
        let mut tally = IssueTally::new();

        self.check_confidences(output, &mut tally);
        self.check_name(output, &mut tally);
        self.check_amount(output, &mut tally);
        self.check_urgency(output, &mut tally);
        self.check_evidence(output, &mut tally);

        let score = tally.score.clamp(0.0, 1.0);
        let status = if tally.critical > 0 {
            ValidationStatus::Fail
        } else if score >= self.pass_threshold && tally.major == 0 {
            ValidationStatus::Pass
        } else if score >= self.warning_threshold {
            ValidationStatus::Warning
        } else {
            ValidationStatus::Fail
        };

        debug!(
            status = ?status,
            score = score,
            critical = tally.critical,
            major = tally.major,
            minor = tally.minor,
            "Output validation complete"
        );

        let report = json!({
            "validator": "OutputValidator",
            "score": score,
            "status": format!("{:?}", status),
            "issue_counts": {
                "critical": tally.critical,
                "major": tally.major,
                "minor": tally.minor,
            },
        });

        ValidationResult {
            status,
            score,
            issues: tally.issues,
            report,
        }
    }

    fn check_confidences(&self, output: &ExtractionOutput, tally: &mut IssueTally) {
        let fields = [
            ("name", output.name.confidence),
            ("goalAmount", output.goal_amount.confidence),
            ("category", output.category.confidence),
            ("urgency", output.urgency.confidence),
            ("relationship", output.relationship.confidence),
            ("overall", output.confidence),
        ];
        for (field, confidence) in fields {
            if !(0.0..=1.0).contains(&confidence) {
                tally.critical(format!("Invalid {} confidence: {}", field, confidence));
            }
        }
        if !(0.0..=1.0).contains(&output.urgency_score) {
            tally.critical(format!("Urgency score out of range: {}", output.urgency_score));
        }
    }

    fn check_name(&self, output: &ExtractionOutput, tally: &mut IssueTally) {
        if let Some(name) = &output.name.value {
            if name.chars().any(|c| c.is_ascii_digit()) {
                tally.major(format!("Name contains digits: '{}'", name));
            }
        }
    }

    fn check_amount(&self, output: &ExtractionOutput, tally: &mut IssueTally) {
        if let Some(amount) = output.goal_amount.value {
            if !amount.is_finite() || !self.bounds.contains(amount) {
                tally.critical(format!(
                    "Goal amount {} outside bounds [{}, {}]",
                    amount, self.bounds.min, self.bounds.max
                ));
            }
        }
    }

    fn check_urgency(&self, output: &ExtractionOutput, tally: &mut IssueTally) {
        if let Some(level) = output.urgency.value {
            let derived = tier_for_score(output.urgency_score);
            if derived != level {
                tally.major(format!(
                    "Urgency tier {} disagrees with score {:.2} ({})",
                    level, output.urgency_score, derived
                ));
            }
        }
    }

    fn check_evidence(&self, output: &ExtractionOutput, tally: &mut IssueTally) {
        let defaults = output.fallback_count();
        if defaults >= LOW_EVIDENCE_DEFAULTS {
            tally.minor(format!(
                "{} of {} fields resolved by defaults",
                defaults,
                ExtractionOutput::FIELD_COUNT
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, FallbackTier, FieldResult, Relationship, UrgencyLevel};

    fn output() -> ExtractionOutput {
        ExtractionOutput {
            parser_id: "test".to_string(),
            name: FieldResult::new(Some("John Smith".to_string()), 0.95, FallbackTier::Primary, "my_name_is"),
            goal_amount: FieldResult::new(Some(5000.0), 0.95, FallbackTier::Primary, "currency"),
            category: FieldResult::new(Some(Category::Healthcare), 0.7, FallbackTier::Secondary, "keyword_table"),
            urgency: FieldResult::new(Some(UrgencyLevel::High), 0.8, FallbackTier::Primary, "keyword_tier"),
            urgency_score: 0.70,
            relationship: FieldResult::new(Some(Relationship::Myself), 0.7, FallbackTier::Secondary, "self_reference"),
            corrections: Vec::new(),
            warnings: Vec::new(),
            confidence: 0.82,
        }
    }

    #[test]
    fn test_consistent_output_passes() {
        let result = OutputValidator::new(AmountBounds::default()).validate(&output());
        assert_eq!(result.status, ValidationStatus::Pass);
        assert!(result.issues.is_empty());
        assert_eq!(result.report["validator"], "OutputValidator");
    }

    #[test]
    fn test_out_of_bounds_amount_fails() {
        let mut out = output();
        out.goal_amount.value = Some(10.0);
        let result = OutputValidator::new(AmountBounds::default()).validate(&out);
        assert_eq!(result.status, ValidationStatus::Fail);
    }

    #[test]
    fn test_tier_score_mismatch_warns() {
        let mut out = output();
        out.urgency_score = 0.9;
        let result = OutputValidator::new(AmountBounds::default()).validate(&out);
        assert_eq!(result.status, ValidationStatus::Warning);
        assert_eq!(result.issues.len(), 1);
    }

    #[test]
    fn test_name_with_digits_is_major() {
        let mut out = output();
        out.name.value = Some("R2D2".to_string());
        let result = OutputValidator::new(AmountBounds::default()).validate(&out);
        assert_eq!(result.status, ValidationStatus::Warning);
    }

    #[test]
    fn test_invalid_confidence_is_critical() {
        let mut out = output();
        out.confidence = 1.4;
        let result = OutputValidator::new(AmountBounds::default()).validate(&out);
        assert_eq!(result.status, ValidationStatus::Fail);
        assert!(result.issues[0].contains("overall"));
    }
}
