//! Field comparators and weighted case scoring
//!
//! # Weights
//! category 0.25, amount 0.25, name 0.20, urgency 0.20, completeness 0.10.
//! Relationship accuracy is compared and reported but carries no weight.

use crate::dataset::TestCase;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tcx_parse::validation::{names_match_exact, names_match_fuzzy};
use tcx_parse::{Category, ExtractionOutput, Relationship, UrgencyLevel};

pub const WEIGHT_CATEGORY: f64 = 0.25;
pub const WEIGHT_AMOUNT: f64 = 0.25;
pub const WEIGHT_NAME: f64 = 0.20;
pub const WEIGHT_URGENCY: f64 = 0.20;
pub const WEIGHT_COMPLETENESS: f64 = 0.10;

const SCORE_SCALE: f64 = 1e6;

// ============================================================================
// Synonym Folding
// ============================================================================

fn canonical_token(raw: &str) -> String {
    raw.trim().to_ascii_uppercase().replace([' ', '-'], "_")
}

/// Fold a category label (including common synonyms) to a `Category`
pub fn fold_category(raw: &str) -> Option<Category> {
    let token = canonical_token(raw);
    let folded = match token.as_str() {
        "MEDICAL" | "HEALTH" | "HEALTH_CARE" | "MEDICINE" => Category::Healthcare,
        "SHELTER" | "RENT" | "HOMELESSNESS" | "HOUSING_ASSISTANCE" => Category::Housing,
        "JOB" | "JOBS" | "WORK" | "EMPLOYMENT_ASSISTANCE" => Category::Employment,
        "UTILITY" | "BILLS" => Category::Utilities,
        "GROCERIES" | "FOOD_ASSISTANCE" => Category::Food,
        "TRANSPORT" | "CAR" | "VEHICLE" => Category::Transportation,
        "SCHOOL" | "TUITION" => Category::Education,
        "DISASTER" | "DISASTER_RELIEF" => Category::Emergency,
        "DOMESTIC_VIOLENCE" | "VIOLENCE" => Category::Safety,
        "COURT" | "LEGAL_FEES" => Category::Legal,
        "CHILDCARE" | "CHILD_CARE" => Category::Family,
        "MISC" | "GENERAL" | "UNKNOWN" => Category::Other,
        _ => return token.parse().ok(),
    };
    Some(folded)
}

/// Fold an urgency label (including common synonyms) to an `UrgencyLevel`
pub fn fold_urgency(raw: &str) -> Option<UrgencyLevel> {
    let token = canonical_token(raw);
    let folded = match token.as_str() {
        "EMERGENCY" | "IMMEDIATE" | "SEVERE" => UrgencyLevel::Critical,
        "URGENT" | "ELEVATED" => UrgencyLevel::High,
        "NORMAL" | "MODERATE" | "STANDARD" => UrgencyLevel::Medium,
        "MINIMAL" | "NONE" | "NOT_URGENT" => UrgencyLevel::Low,
        _ => return token.parse().ok(),
    };
    Some(folded)
}

// ============================================================================
// Comparators
// ============================================================================

/// Category match against the expected label plus any per-case synonyms
pub fn category_matches(expected: &str, synonyms: &[String], actual: Option<Category>) -> bool {
    let Some(actual) = actual else {
        return false;
    };
    std::iter::once(expected)
        .chain(synonyms.iter().map(String::as_str))
        .filter_map(fold_category)
        .any(|accepted| accepted == actual)
}

pub fn urgency_matches(expected: &str, actual: Option<UrgencyLevel>) -> bool {
    match (fold_urgency(expected), actual) {
        (Some(expected), Some(actual)) => expected == actual,
        _ => false,
    }
}

/// Amount match within a tolerance window
///
/// Tolerance ≤ 1.0 is a fraction of the expected value; > 1.0 is absolute
/// dollars. Null matches only null.
pub fn amount_matches(expected: Option<f64>, actual: Option<f64>, tolerance: f64) -> bool {
    match (expected, actual) {
        (None, None) => true,
        (Some(expected), Some(actual)) => {
            let window = if tolerance <= 1.0 {
                expected.abs() * tolerance
            } else {
                tolerance
            };
            (actual - expected).abs() <= window + 1e-9
        }
        _ => false,
    }
}

/// Name match: exact (trimmed, case-insensitive) or fuzzy when allowed
pub fn name_matches(expected: Option<&str>, actual: Option<&str>, allow_fuzzy: bool) -> bool {
    match (expected, actual) {
        (None, None) => true,
        (Some(expected), Some(actual)) => {
            names_match_exact(expected, actual) || (allow_fuzzy && names_match_fuzzy(expected, actual))
        }
        _ => false,
    }
}

/// Relationship match; `None` when the case carries no expectation
pub fn relationship_matches(expected: Option<&str>, actual: Option<Relationship>) -> Option<bool> {
    let expected = Relationship::from_str(expected?).ok()?;
    Some(actual == Some(expected))
}

fn canonical_field(field: &str) -> String {
    let compact: String = field
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    match compact.as_str() {
        "amount" | "goalamount" => "goalAmount".to_string(),
        "urgency" | "urgencylevel" => "urgencyLevel".to_string(),
        "relationship" | "beneficiaryrelationship" => "beneficiaryRelationship".to_string(),
        _ => compact,
    }
}

/// Agreement between expected and actual missing-field sets
///
/// 1 − |symmetric difference| / |union|; two empty sets agree fully.
pub fn completeness(expected_missing: &[String], actual_missing: &[String]) -> f64 {
    let expected: BTreeSet<String> = expected_missing.iter().map(|f| canonical_field(f)).collect();
    let actual: BTreeSet<String> = actual_missing.iter().map(|f| canonical_field(f)).collect();

    let union = expected.union(&actual).count();
    if union == 0 {
        return 1.0;
    }
    let difference = expected.symmetric_difference(&actual).count();
    1.0 - difference as f64 / union as f64
}

// ============================================================================
// Case Score
// ============================================================================

/// Per-field comparison outcome for one case
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMatches {
    pub name: bool,
    pub category: bool,
    pub urgency_level: bool,
    pub goal_amount: bool,
    /// Missing-field agreement (0.0-1.0)
    pub completeness: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beneficiary_relationship: Option<bool>,
}

impl FieldMatches {
    /// Compare one output against its labeled case
    pub fn compare(case: &TestCase, output: &ExtractionOutput, default_tolerance: f64) -> Self {
        let expected = &case.expected;
        let tolerance = case.strictness.amount_tolerance.unwrap_or(default_tolerance);

        Self {
            name: name_matches(
                expected.name.as_deref(),
                output.name.value.as_deref(),
                case.strictness.allow_fuzzy_name,
            ),
            category: category_matches(
                &expected.category,
                &case.strictness.category_synonyms,
                output.category.value,
            ),
            urgency_level: urgency_matches(&expected.urgency_level, output.urgency.value),
            goal_amount: amount_matches(expected.goal_amount, output.goal_amount.value, tolerance),
            completeness: completeness(&expected.missing_fields, &output.missing_fields()),
            beneficiary_relationship: relationship_matches(
                expected.beneficiary_relationship.as_deref(),
                output.relationship.value,
            ),
        }
    }

    /// Weighted score (0.0-1.0), rounded to six decimals
    pub fn weighted_score(&self) -> f64 {
        let hit = |matched: bool| if matched { 1.0 } else { 0.0 };
        let score = WEIGHT_CATEGORY * hit(self.category)
            + WEIGHT_AMOUNT * hit(self.goal_amount)
            + WEIGHT_NAME * hit(self.name)
            + WEIGHT_URGENCY * hit(self.urgency_level)
            + WEIGHT_COMPLETENESS * self.completeness;
        round_score(score).clamp(0.0, 1.0)
    }
}

fn round_score(score: f64) -> f64 {
    (score * SCORE_SCALE).round() / SCORE_SCALE
}

/// Letter grade for a weighted score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub const ALL: [Grade; 5] = [Grade::A, Grade::B, Grade::C, Grade::D, Grade::F];

    pub fn from_score(score: f64) -> Self {
        if score >= 0.90 {
            Grade::A
        } else if score >= 0.80 {
            Grade::B
        } else if score >= 0.70 {
            Grade::C
        } else if score >= 0.60 {
            Grade::D
        } else {
            Grade::F
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
