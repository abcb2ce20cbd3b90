//! Failure bucket classification
//!
//! Each failed comparison maps to one bucket, chosen by which comparator
//! failed and the direction of the mismatch (missing, false positive or
//! wrong value).

use crate::dataset::TestCase;
use crate::scoring::FieldMatches;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tcx_parse::ExtractionOutput;

/// Failure category for one comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureBucket {
    NameMissing,
    NameIncorrect,
    NameFalsePositive,
    CategoryMisclassification,
    AmountMissing,
    AmountFalsePositive,
    AmountIncorrect,
    UrgencyMisclassification,
    SystemError,
}

impl FailureBucket {
    pub const ALL: [FailureBucket; 9] = [
        FailureBucket::NameMissing,
        FailureBucket::NameIncorrect,
        FailureBucket::NameFalsePositive,
        FailureBucket::CategoryMisclassification,
        FailureBucket::AmountMissing,
        FailureBucket::AmountFalsePositive,
        FailureBucket::AmountIncorrect,
        FailureBucket::UrgencyMisclassification,
        FailureBucket::SystemError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureBucket::NameMissing => "NAME_MISSING",
            FailureBucket::NameIncorrect => "NAME_INCORRECT",
            FailureBucket::NameFalsePositive => "NAME_FALSE_POSITIVE",
            FailureBucket::CategoryMisclassification => "CATEGORY_MISCLASSIFICATION",
            FailureBucket::AmountMissing => "AMOUNT_MISSING",
            FailureBucket::AmountFalsePositive => "AMOUNT_FALSE_POSITIVE",
            FailureBucket::AmountIncorrect => "AMOUNT_INCORRECT",
            FailureBucket::UrgencyMisclassification => "URGENCY_MISCLASSIFICATION",
            FailureBucket::SystemError => "SYSTEM_ERROR",
        }
    }
}

impl fmt::Display for FailureBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailureBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        FailureBucket::ALL
            .iter()
            .copied()
            .find(|b| b.as_str() == upper)
            .ok_or_else(|| format!("unknown failure bucket '{}'", s))
    }
}

fn presence_bucket(
    expected_present: bool,
    actual_present: bool,
    missing: FailureBucket,
    false_positive: FailureBucket,
    incorrect: FailureBucket,
) -> FailureBucket {
    match (expected_present, actual_present) {
        (true, false) => missing,
        (false, true) => false_positive,
        _ => incorrect,
    }
}

/// Buckets for every failed comparison of one case
pub fn classify_failures(
    case: &TestCase,
    output: &ExtractionOutput,
    matches: &FieldMatches,
) -> Vec<FailureBucket> {
    let mut buckets = Vec::new();

    if !matches.name {
        buckets.push(presence_bucket(
            case.expected.name.is_some(),
            output.name.is_present(),
            FailureBucket::NameMissing,
            FailureBucket::NameFalsePositive,
            FailureBucket::NameIncorrect,
        ));
    }
    if !matches.category {
        buckets.push(FailureBucket::CategoryMisclassification);
    }
    if !matches.goal_amount {
        buckets.push(presence_bucket(
            case.expected.goal_amount.is_some(),
            output.goal_amount.is_present(),
            FailureBucket::AmountMissing,
            FailureBucket::AmountFalsePositive,
            FailureBucket::AmountIncorrect,
        ));
    }
    if !matches.urgency_level {
        buckets.push(FailureBucket::UrgencyMisclassification);
    }

    buckets
}
