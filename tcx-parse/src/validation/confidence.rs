//! Per-field confidence heuristics
//!
//! Converts extractor candidates into `FieldResult`s. Confidence reflects the
//! quality of the pattern that matched, not a probability.

use crate::extractors::{
    AmountCandidate, AmountKind, CategoryMatch, GoalIntent, NameMatch, NamePattern,
    RelationshipEvidence, RelationshipMatch, UrgencyMatch,
};
use crate::types::{Category, FallbackTier, FieldResult, Relationship, UrgencyLevel};

/// Overall-confidence weights
pub const WEIGHT_CATEGORY: f32 = 0.25;
pub const WEIGHT_AMOUNT: f32 = 0.25;
pub const WEIGHT_NAME: f32 = 0.20;
pub const WEIGHT_URGENCY: f32 = 0.20;
pub const WEIGHT_RELATIONSHIP: f32 = 0.10;

/// Confidence of a range midpoint before intent adjustments
pub const RANGE_BASE_CONFIDENCE: f32 = 0.75;
/// Confidence of an amount clamped down to the configured maximum
pub const CLAMPED_AMOUNT_CONFIDENCE: f32 = 0.5;
/// Multiplier for amounts mentioned without goal intent
pub const NO_INTENT_PENALTY: f32 = 0.7;

pub fn name_pattern_confidence(pattern: NamePattern) -> (f32, FallbackTier) {
    match pattern {
        NamePattern::MyNameIs => (0.95, FallbackTier::Primary),
        NamePattern::CallMe => (0.85, FallbackTier::Primary),
        NamePattern::IAm => (0.80, FallbackTier::Primary),
        NamePattern::TitlePrefix => (0.75, FallbackTier::Secondary),
        NamePattern::ThisIs => (0.70, FallbackTier::Secondary),
        NamePattern::LeadingHere => (0.60, FallbackTier::Secondary),
    }
}

pub fn name_field(found: Option<NameMatch>) -> FieldResult<String> {
    match found {
        Some(m) => {
            let (confidence, tier) = name_pattern_confidence(m.pattern);
            FieldResult::new(Some(m.value), confidence, tier, m.pattern.as_str())
        }
        None => FieldResult::missing("no_name_pattern"),
    }
}

/// Confidence for an in-bounds amount candidate
pub fn amount_confidence(kind: AmountKind, intent: GoalIntent) -> f32 {
    let base = match kind {
        AmountKind::Currency => 0.90,
        AmountKind::Dollars => 0.85,
        AmountKind::Magnitude | AmountKind::Spelled => 0.80,
        AmountKind::Range => RANGE_BASE_CONFIDENCE,
        AmountKind::Bare => 0.70,
    };

    let adjusted = match intent {
        GoalIntent::Strong => (base + 0.05).min(0.95),
        GoalIntent::Weak => base,
        GoalIntent::None => base * NO_INTENT_PENALTY,
    };
    adjusted.clamp(0.0, 1.0)
}

pub fn amount_tier(candidate: &AmountCandidate) -> FallbackTier {
    match (candidate.kind, candidate.intent) {
        (AmountKind::Currency | AmountKind::Dollars, GoalIntent::Strong | GoalIntent::Weak) => {
            FallbackTier::Primary
        }
        _ => FallbackTier::Secondary,
    }
}

pub fn category_field(found: &CategoryMatch) -> FieldResult<Category> {
    let (confidence, tier) = match found.hits {
        0 => (0.3, FallbackTier::Default),
        1 => (0.7, FallbackTier::Secondary),
        2 => (0.8, FallbackTier::Primary),
        _ => (0.9, FallbackTier::Primary),
    };
    let source = if found.hits == 0 { "default" } else { "keyword_table" };
    FieldResult::new(Some(found.category), confidence, tier, source)
}

pub fn urgency_field(found: &UrgencyMatch) -> FieldResult<UrgencyLevel> {
    if found.hits == 0 {
        return FieldResult::new(Some(found.level), 0.4, FallbackTier::Default, "default");
    }
    let extra = (found.hits - 1) as f32;
    let confidence = (0.8 + 0.05 * extra).min(0.95);
    FieldResult::new(Some(found.level), confidence, FallbackTier::Primary, "keyword_tier")
}

pub fn relationship_field(found: &RelationshipMatch) -> FieldResult<Relationship> {
    let (confidence, tier, source) = match found.evidence {
        RelationshipEvidence::Beneficiary => (0.85, FallbackTier::Primary, "beneficiary_phrase"),
        RelationshipEvidence::SelfReference => (0.7, FallbackTier::Secondary, "self_reference"),
        RelationshipEvidence::Default => (0.5, FallbackTier::Default, "default"),
    };
    FieldResult::new(Some(found.relationship), confidence, tier, source)
}

/// Weighted mean of field confidences, clamped to 0.0-1.0
pub fn overall_confidence(
    name: &FieldResult<String>,
    amount: &FieldResult<f64>,
    category: &FieldResult<Category>,
    urgency: &FieldResult<UrgencyLevel>,
    relationship: &FieldResult<Relationship>,
) -> f32 {
    let weighted = WEIGHT_CATEGORY * category.confidence
        + WEIGHT_AMOUNT * amount.confidence
        + WEIGHT_NAME * name.confidence
        + WEIGHT_URGENCY * urgency.confidence
        + WEIGHT_RELATIONSHIP * relationship.confidence;
    weighted.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_one() {
        let sum = WEIGHT_CATEGORY + WEIGHT_AMOUNT + WEIGHT_NAME + WEIGHT_URGENCY + WEIGHT_RELATIONSHIP;
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_amount_confidence_rules() {
        assert!((amount_confidence(AmountKind::Currency, GoalIntent::Strong) - 0.95).abs() < 1e-6);
        assert!((amount_confidence(AmountKind::Range, GoalIntent::Weak) - 0.75).abs() < 1e-6);
        assert!((amount_confidence(AmountKind::Currency, GoalIntent::None) - 0.63).abs() < 1e-6);
    }

    #[test]
    fn test_category_confidence_by_hits() {
        let field = category_field(&CategoryMatch { category: Category::Housing, hits: 1 });
        assert!((field.confidence - 0.7).abs() < 1e-6);
        let field = category_field(&CategoryMatch { category: Category::Housing, hits: 5 });
        assert!((field.confidence - 0.9).abs() < 1e-6);
        let field = category_field(&CategoryMatch { category: Category::Other, hits: 0 });
        assert!((field.confidence - 0.3).abs() < 1e-6);
        assert_eq!(field.tier, FallbackTier::Default);
    }

    #[test]
    fn test_urgency_confidence_capped() {
        let field = urgency_field(&UrgencyMatch { level: UrgencyLevel::High, hits: 10 });
        assert!((field.confidence - 0.95).abs() < 1e-6);
        let field = urgency_field(&UrgencyMatch { level: UrgencyLevel::Medium, hits: 0 });
        assert!((field.confidence - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_overall_confidence_missing_fields_contribute_zero() {
        let name = FieldResult::<String>::missing("none");
        let amount = FieldResult::<f64>::missing("none");
        let category = FieldResult::new(Some(Category::Other), 1.0, FallbackTier::Primary, "t");
        let urgency = FieldResult::new(Some(UrgencyLevel::Medium), 1.0, FallbackTier::Primary, "t");
        let relationship = FieldResult::new(Some(Relationship::Myself), 1.0, FallbackTier::Primary, "t");
        let overall = overall_confidence(&name, &amount, &category, &urgency, &relationship);
        assert!((overall - 0.55).abs() < 1e-6);
    }
}
