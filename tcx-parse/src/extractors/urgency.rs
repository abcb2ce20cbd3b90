//! Urgency Tier Classifier
//!
//! Ordered keyword tiers CRITICAL > HIGH > LOW; MEDIUM when nothing matches.
//! A keyword preceded by a negator ("not urgent", "isn't an emergency") does
//! not count toward its tier.

use crate::text::TranscriptText;
use crate::types::UrgencyLevel;
use tracing::debug;

pub const CRITICAL_KEYWORDS: &[&str] = &[
    "emergency", "life threatening", "life-threatening", "immediately", "right now",
    "in danger", "dying", "critical condition", "critical", "suicidal", "tonight",
    "by tomorrow", "within 24 hours", "nowhere to sleep", "no food left",
];

pub const HIGH_KEYWORDS: &[&str] = &[
    "urgent", "urgently", "asap", "as soon as possible", "this week", "eviction notice",
    "shutoff notice", "shut off", "overdue", "past due", "final notice", "deadline",
    "running out", "quickly", "desperate", "desperately",
];

pub const LOW_KEYWORDS: &[&str] = &[
    "whenever", "no rush", "not urgent", "isn't urgent", "eventually", "someday",
    "in the future", "when possible", "no hurry", "flexible", "sometime", "long term",
    "next year",
];

/// Priority-ordered (tier, keyword set) table
pub const URGENCY_TABLE: &[(UrgencyLevel, &[&str])] = &[
    (UrgencyLevel::Critical, CRITICAL_KEYWORDS),
    (UrgencyLevel::High, HIGH_KEYWORDS),
    (UrgencyLevel::Low, LOW_KEYWORDS),
];

/// Tier classification result
#[derive(Debug, Clone, PartialEq)]
pub struct UrgencyMatch {
    pub level: UrgencyLevel,
    /// Distinct affirmed keywords of the winning tier (0 for default)
    pub hits: usize,
}

/// Keywords from `keywords` occurring at least once without a negator
pub fn affirmed_keywords<'a>(text: &TranscriptText, keywords: &[&'a str]) -> Vec<&'a str> {
    keywords
        .iter()
        .copied()
        .filter(|k| !text.affirmed_positions(k).is_empty())
        .collect()
}

/// Classify the urgency tier
pub fn classify_urgency(text: &TranscriptText) -> UrgencyMatch {
    for (level, keywords) in URGENCY_TABLE {
        let hits = affirmed_keywords(text, keywords);
        if !hits.is_empty() {
            debug!(level = %level, keywords = ?hits, "Urgency tier matched");
            return UrgencyMatch {
                level: *level,
                hits: hits.len(),
            };
        }
    }

    UrgencyMatch {
        level: UrgencyLevel::Medium,
        hits: 0,
    }
}
