//! Amount bounds and sanity re-validation
//!
//! Bound application never raises: anything unusable becomes `None`.

use super::confidence::{amount_confidence, amount_tier, CLAMPED_AMOUNT_CONFIDENCE};
use crate::extractors::AmountCandidate;
use crate::types::{FallbackTier, FieldResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_MIN_AMOUNT: f64 = 50.0;
pub const DEFAULT_MAX_AMOUNT: f64 = 1_000_000.0;

/// Accepted goal-amount range (inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmountBounds {
    #[serde(default = "default_min")]
    pub min: f64,
    #[serde(default = "default_max")]
    pub max: f64,
}

fn default_min() -> f64 {
    DEFAULT_MIN_AMOUNT
}

fn default_max() -> f64 {
    DEFAULT_MAX_AMOUNT
}

impl Default for AmountBounds {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_AMOUNT,
            max: DEFAULT_MAX_AMOUNT,
        }
    }
}

impl AmountBounds {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Re-validate a numeric amount against `bounds`
///
/// Non-finite, non-positive and sub-minimum values become `None`; values
/// above the maximum clamp down to it.
pub fn validate_amount(value: f64, bounds: &AmountBounds) -> Option<f64> {
    if !value.is_finite() || value <= 0.0 || value < bounds.min {
        return None;
    }
    Some(value.min(bounds.max))
}

/// Parse a loosely formatted amount ("$5,000", "5000.00", "2.5k")
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .to_ascii_lowercase()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' ' | '_'))
        .collect();
    let cleaned = cleaned.trim_end_matches("usd").trim_end_matches("dollars");

    let (digits, factor) = if let Some(stripped) = cleaned.strip_suffix('k') {
        (stripped, 1_000.0)
    } else if let Some(stripped) = cleaned.strip_suffix('m') {
        (stripped, 1_000_000.0)
    } else {
        (cleaned, 1.0)
    };

    let value = digits.parse::<f64>().ok()? * factor;
    if value.is_finite() && value > 0.0 {
        Some(value)
    } else {
        None
    }
}

/// Apply bounds to the selected candidate and score it
pub fn bound_candidate(candidate: Option<AmountCandidate>, bounds: &AmountBounds) -> FieldResult<f64> {
    let Some(candidate) = candidate else {
        return FieldResult::missing("no_amount_mention");
    };

    match validate_amount(candidate.value, bounds) {
        None => {
            debug!(value = candidate.value, min = bounds.min, "Amount below minimum, dropped");
            FieldResult::missing("below_minimum")
        }
        Some(value) if value < candidate.value => {
            debug!(value = candidate.value, max = bounds.max, "Amount clamped to maximum");
            FieldResult::new(
                Some(value),
                CLAMPED_AMOUNT_CONFIDENCE,
                FallbackTier::Secondary,
                "clamped_to_max",
            )
        }
        Some(value) => FieldResult::new(
            Some(value),
            amount_confidence(candidate.kind, candidate.intent),
            amount_tier(&candidate),
            candidate.kind.as_str(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::{AmountKind, GoalIntent};

    fn candidate(value: f64) -> AmountCandidate {
        AmountCandidate {
            value,
            start: 0,
            end: 1,
            kind: AmountKind::Currency,
            intent: GoalIntent::Strong,
        }
    }

    #[test]
    fn test_validate_amount() {
        let bounds = AmountBounds::default();
        assert_eq!(validate_amount(10.0, &bounds), None);
        assert_eq!(validate_amount(-5.0, &bounds), None);
        assert_eq!(validate_amount(f64::NAN, &bounds), None);
        assert_eq!(validate_amount(f64::INFINITY, &bounds), None);
        assert_eq!(validate_amount(500.0, &bounds), Some(500.0));
        assert_eq!(validate_amount(5_000_000.0, &bounds), Some(1_000_000.0));
    }

    #[test]
    fn test_parse_amount_loose_strings() {
        assert_eq!(parse_amount("$5,000"), Some(5000.0));
        assert_eq!(parse_amount("5000.00"), Some(5000.0));
        assert_eq!(parse_amount("2.5k"), Some(2500.0));
        assert_eq!(parse_amount(" $1,200 USD "), Some(1200.0));
        assert_eq!(parse_amount("lots"), None);
        assert_eq!(parse_amount("-20"), None);
        assert_eq!(parse_amount(""), None);
    }

    #[test]
    fn test_bound_candidate() {
        let bounds = AmountBounds::default();

        let field = bound_candidate(Some(candidate(10.0)), &bounds);
        assert!(field.value.is_none());

        let field = bound_candidate(Some(candidate(2_000_000.0)), &bounds);
        assert_eq!(field.value, Some(1_000_000.0));
        assert!((field.confidence - 0.5).abs() < 1e-6);

        let field = bound_candidate(Some(candidate(5000.0)), &bounds);
        assert_eq!(field.value, Some(5000.0));
        assert!((field.confidence - 0.95).abs() < 1e-6);
        assert_eq!(field.tier, FallbackTier::Primary);
    }

    #[test]
    fn test_bounds_deserialize_with_defaults() {
        let bounds: AmountBounds = serde_json::from_str(r#"{"min": 100.0}"#).unwrap();
        assert_eq!(bounds.min, 100.0);
        assert_eq!(bounds.max, DEFAULT_MAX_AMOUNT);
    }
}
