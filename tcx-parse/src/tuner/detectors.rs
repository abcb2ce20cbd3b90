//! Narrative-pattern detectors
//!
//! Each detector is a pure boolean test over the normalized transcript:
//! either a direct phrase match or co-occurrence of two keyword groups.

use crate::text::TranscriptText;
use crate::types::TuningPass;

/// One correction rule inside a pass
#[derive(Clone, Copy)]
pub struct Detector {
    pub name: &'static str,
    /// Signed score adjustment applied on a match
    pub magnitude: f64,
    pub reason: &'static str,
    pub test: fn(&TranscriptText) -> bool,
}

/// A band-scoped correction pass
#[derive(Clone, Copy)]
pub struct PassSpec {
    pub pass: TuningPass,
    /// Half-open score band [low, high) tested against the pre-tuning score
    pub band: (f64, f64),
    /// Detectors tried in order; the first match applies
    pub detectors: &'static [Detector],
}

impl PassSpec {
    pub fn in_band(&self, score: f64) -> bool {
        score >= self.band.0 && score < self.band.1
    }
}

fn co_occur(text: &TranscriptText, left: &[&str], right: &[&str]) -> bool {
    text.contains_any(left) && text.contains_any(right)
}

const NEAR_TERM: &[&str] = &[
    "tomorrow", "tonight", "this week", "next week", "in two days", "in three days",
    "in a few days", "next few days", "by friday", "end of the week", "48 hours", "24 hours",
    "days left", "monday", "scheduled",
];

pub fn imminent_medical_procedure(text: &TranscriptText) -> bool {
    co_occur(
        text,
        &["surgery", "operation", "procedure", "transplant", "chemo", "chemotherapy", "dialysis"],
        NEAR_TERM,
    )
}

pub fn immediate_housing_loss(text: &TranscriptText) -> bool {
    co_occur(
        text,
        &[
            "evicted", "eviction", "kicked out", "lose our home", "lose my home", "foreclosure",
            "locks changed", "on the street",
        ],
        NEAR_TERM,
    )
}

pub fn life_threatening_crisis(text: &TranscriptText) -> bool {
    text.contains_any(&[
        "life or death", "life-threatening", "life threatening", "could die", "might die",
        "going to die", "won't survive", "not survive", "intensive care", "icu", "overdose",
    ])
}

pub fn job_loss_with_dependents(text: &TranscriptText) -> bool {
    co_occur(
        text,
        &["lost my job", "laid off", "fired", "unemployed", "lost our income", "out of work"],
        &[
            "kids", "children", "my son", "my daughter", "family", "baby", "dependents",
            "my wife", "my husband",
        ],
    )
}

pub fn impending_eviction(text: &TranscriptText) -> bool {
    text.contains_any(&[
        "eviction notice", "facing eviction", "being evicted", "evict us", "evict me",
        "behind on rent", "late on rent", "can't pay rent", "cannot pay rent", "months behind",
    ])
}

pub fn medical_expense_urgency(text: &TranscriptText) -> bool {
    co_occur(
        text,
        &["medical bills", "hospital bills", "medication", "prescription", "treatment", "surgery"],
        &["can't afford", "cannot afford", "due", "overdue", "running out", "behind", "collections"],
    )
}

pub fn utility_shutoff(text: &TranscriptText) -> bool {
    co_occur(
        text,
        &["shut off", "shutoff", "disconnect", "disconnected", "disconnection", "cut off"],
        &["electric", "electricity", "power", "water", "gas", "heat", "utility", "utilities", "lights"],
    )
}

pub fn essential_vehicle_for_work(text: &TranscriptText) -> bool {
    co_occur(
        text,
        &["car", "vehicle", "truck"],
        &[
            "get to work", "for work", "commute", "to my job", "keep my job", "drive to work",
            "get to my job",
        ],
    )
}

pub fn general_improvement(text: &TranscriptText) -> bool {
    text.contains_any(&[
        "would be nice", "upgrade", "renovate", "renovation", "remodel", "new furniture",
        "vacation", "nicer", "improve my", "dream", "treat myself",
    ])
}

const CRISIS_WORDS: &[&str] = &[
    "eviction", "evicted", "shut off", "emergency", "hospital", "collections", "foreclosure",
    "lawsuit", "garnished",
];

pub fn debt_consolidation_without_crisis(text: &TranscriptText) -> bool {
    text.contains_any(&["consolidate", "consolidation", "credit card debt", "pay off debt", "pay off my credit"])
        && !text.contains_any(CRISIS_WORDS)
}

pub const CRITICAL_BOUNDARY_DETECTORS: &[Detector] = &[
    Detector {
        name: "imminent_medical_procedure",
        magnitude: 0.20,
        reason: "medical procedure scheduled in the near term",
        test: imminent_medical_procedure,
    },
    Detector {
        name: "immediate_housing_loss",
        magnitude: 0.20,
        reason: "loss of housing within days",
        test: immediate_housing_loss,
    },
    Detector {
        name: "life_threatening_crisis",
        magnitude: 0.20,
        reason: "life-threatening situation described",
        test: life_threatening_crisis,
    },
];

pub const HIGH_BOUNDARY_DETECTORS: &[Detector] = &[
    Detector {
        name: "job_loss_with_dependents",
        magnitude: 0.30,
        reason: "job loss with dependents",
        test: job_loss_with_dependents,
    },
    Detector {
        name: "impending_eviction",
        magnitude: 0.30,
        reason: "eviction pending",
        test: impending_eviction,
    },
    Detector {
        name: "medical_expense_urgency",
        magnitude: 0.30,
        reason: "unaffordable or overdue medical expense",
        test: medical_expense_urgency,
    },
    Detector {
        name: "utility_shutoff",
        magnitude: 0.30,
        reason: "utility shutoff threatened",
        test: utility_shutoff,
    },
];

pub const MEDIUM_PRECISION_DETECTORS: &[Detector] = &[
    Detector {
        name: "essential_vehicle_for_work",
        magnitude: 0.10,
        reason: "vehicle needed to keep working",
        test: essential_vehicle_for_work,
    },
    Detector {
        name: "general_improvement",
        magnitude: -0.20,
        reason: "improvement rather than need",
        test: general_improvement,
    },
    Detector {
        name: "debt_consolidation_without_crisis",
        magnitude: -0.20,
        reason: "debt consolidation with no crisis",
        test: debt_consolidation_without_crisis,
    },
];

/// Passes in application order
pub const PASSES: &[PassSpec] = &[
    PassSpec {
        pass: TuningPass::CriticalBoundary,
        band: (0.65, 0.85),
        detectors: CRITICAL_BOUNDARY_DETECTORS,
    },
    PassSpec {
        pass: TuningPass::HighBoundary,
        band: (0.35, 0.65),
        detectors: HIGH_BOUNDARY_DETECTORS,
    },
    PassSpec {
        pass: TuningPass::MediumPrecision,
        band: (0.15, 0.65),
        detectors: MEDIUM_PRECISION_DETECTORS,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> TranscriptText {
        TranscriptText::new(s)
    }

    #[test]
    fn test_co_occurrence_detectors() {
        assert!(imminent_medical_procedure(&t("my surgery is scheduled for next week")));
        assert!(!imminent_medical_procedure(&t("I had surgery two years ago")));
        assert!(job_loss_with_dependents(&t("I was laid off and have three kids")));
        assert!(!job_loss_with_dependents(&t("I was laid off last month")));
        assert!(utility_shutoff(&t("they will shut off the electric on friday")));
    }

    #[test]
    fn test_phrase_detectors() {
        assert!(life_threatening_crisis(&t("the doctor said it is life or death")));
        assert!(impending_eviction(&t("I got an eviction notice")));
        assert!(general_improvement(&t("a new couch would be nice")));
    }

    #[test]
    fn test_debt_consolidation_requires_no_crisis() {
        assert!(debt_consolidation_without_crisis(&t("I want to consolidate my credit card debt")));
        assert!(!debt_consolidation_without_crisis(&t(
            "I need to consolidate debt before the foreclosure"
        )));
    }

    #[test]
    fn test_band_membership_is_half_open() {
        let pass = &PASSES[0];
        assert!(pass.in_band(0.65));
        assert!(pass.in_band(0.84));
        assert!(!pass.in_band(0.85));
    }
}
