//! Beneficiary Relationship Classifier
//!
//! Looks for beneficiary-context phrases ("for my son", "my mother needs",
//! "on behalf of my neighbor"). The earliest phrase wins. Without one, an
//! explicit self reference ("for myself", "I need") marks `myself`; otherwise
//! the default is `myself` at low confidence.

use crate::text::TranscriptText;
use crate::types::Relationship;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

pub const FAMILY_TERMS: &[&str] = &[
    "son", "daughter", "mother", "mom", "father", "dad", "husband", "wife", "brother", "sister",
    "child", "children", "kids", "kid", "baby", "grandmother", "grandma", "grandfather",
    "grandpa", "aunt", "uncle", "niece", "nephew", "cousin", "family", "fiance", "fiancee",
    "partner", "granddaughter", "grandson", "parents", "stepson", "stepdaughter", "twins",
];

pub const OTHER_TERMS: &[&str] = &[
    "neighbor", "neighbour", "friend", "coworker", "co-worker", "colleague", "roommate",
    "community", "classmate", "client", "boss", "teammate", "pastor", "student", "students",
];

const SELF_PHRASES: &[&str] = &[
    "for myself", "for me", "i need", "i'm struggling", "help me", "i can't afford",
    "i cannot afford", "my own",
];

/// How the relationship was determined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipEvidence {
    /// A beneficiary-context phrase named someone
    Beneficiary,
    /// The speaker explicitly referred to themself
    SelfReference,
    /// No evidence; default applies
    Default,
}

/// Relationship classification result
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipMatch {
    pub relationship: Relationship,
    pub evidence: RelationshipEvidence,
}

fn alternation(terms: &[&str]) -> String {
    terms
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|")
}

/// Beneficiary context: family terms land in groups 1 and 3, other terms in 2 and 4
static BENEFICIARY: Lazy<Regex> = Lazy::new(|| {
    let family = alternation(FAMILY_TERMS);
    let other = alternation(OTHER_TERMS);
    let lead = r"(?:for|help|helping|support|supporting|on behalf of|raise money for|raising money for|take care of|taking care of|care for)";
    let verbs = r"(?:needs|need|is|has|was|needed|can't|cannot|lost|got|requires|had|just|been)";
    Regex::new(&format!(
        r"\b(?:{lead}\s+(?:my|our|a|the)\s+(?:(?:little|young|elderly|old|best|older|younger|disabled|sick)\s+)?(?:({family})|({other}))\b|(?:my|our)\s+(?:({family})|({other}))(?:'s)?\s+{verbs}\b)"
    ))
    .expect("valid regex")
});

/// Classify the beneficiary relationship
pub fn classify_relationship(text: &TranscriptText) -> RelationshipMatch {
    if let Some(caps) = BENEFICIARY.captures(&text.lower) {
        let relationship = if caps.get(1).is_some() || caps.get(3).is_some() {
            Relationship::FamilyMember
        } else {
            Relationship::Other
        };
        debug!(
            relationship = %relationship,
            phrase = caps.get(0).map_or("", |m| m.as_str()),
            "Beneficiary phrase matched"
        );
        return RelationshipMatch {
            relationship,
            evidence: RelationshipEvidence::Beneficiary,
        };
    }

    if text.contains_any(SELF_PHRASES) {
        return RelationshipMatch {
            relationship: Relationship::Myself,
            evidence: RelationshipEvidence::SelfReference,
        };
    }

    RelationshipMatch {
        relationship: Relationship::Myself,
        evidence: RelationshipEvidence::Default,
    }
}
