//! Goal Amount Extractor
//!
//! Collects every monetary mention in the transcript, discards the ones whose
//! context marks them as something other than a fundraising goal, then picks
//! one by intent.
//!
//! # Candidate Rules (claim order)
//! 1. Ranges: "between X and Y", "$X-$Y", "$X to $Y" → midpoint
//! 2. Currency-prefixed: `$5,000`, `$2.5k`
//! 3. "N dollars" / "N bucks"
//! 4. Numeric magnitudes: `5k`, `5 thousand`, `3 grand`
//! 5. Spelled-out numbers with a magnitude or a following "dollars"
//! 6. Bare numbers (3+ digits or comma-grouped), kept only with strong intent
//!
//! A later rule never claims text already claimed by an earlier one, so range
//! members are not counted individually.
//!
//! # Non-goal Filters
//! Hourly wages, ages, calendar years and street addresses.
//!
//! # Selection
//! Strong intent (need/raise/goal/asking) beats weak intent (cost/owe/bill);
//! within a group the earliest mention wins; with no intent anywhere the
//! largest non-bare mention wins. Bounds are applied later by validation.

use crate::text::{
    floor_char_boundary, following_words, is_number_word, parse_number_words, preceding_words,
    sentence_bounds, TranscriptText,
};
use crate::types::ExtractError;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

/// How a candidate amount was phrased
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountKind {
    Range,
    Currency,
    Dollars,
    Magnitude,
    Spelled,
    Bare,
}

impl AmountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AmountKind::Range => "range",
            AmountKind::Currency => "currency",
            AmountKind::Dollars => "dollars",
            AmountKind::Magnitude => "magnitude",
            AmountKind::Spelled => "spelled",
            AmountKind::Bare => "bare",
        }
    }
}

/// Goal-intent context around a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GoalIntent {
    None,
    Weak,
    Strong,
}

/// One monetary mention that survived the non-goal filters
#[derive(Debug, Clone, PartialEq)]
pub struct AmountCandidate {
    pub value: f64,
    /// Byte span in the normalized transcript
    pub start: usize,
    pub end: usize,
    pub kind: AmountKind,
    pub intent: GoalIntent,
}

const NUM: &str = r"(\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)";
const MAG: &str = r"(?:\s*(k|thousand|grand|million)\b)?";

static BETWEEN_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\bbetween\s+(\$)?\s?{NUM}{MAG}\s+and\s+(\$)?\s?{NUM}{MAG}(\s*(?:dollars|bucks))?"
    ))
    .expect("valid regex")
});
static SPAN_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?:(\$)\s?|\b){NUM}{MAG}\s*(?:-|–|to)\s*(\$)?\s?{NUM}{MAG}(\s*(?:dollars|bucks))?"
    ))
    .expect("valid regex")
});
static CURRENCY: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"\$\s?{NUM}{MAG}")).expect("valid regex"));
static DOLLARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\b{NUM}{MAG}\s*(?:dollars|bucks|usd)\b")).expect("valid regex")
});
static MAGNITUDE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\b{NUM}\s*(k|thousand|grand|million)\b")).expect("valid regex")
});
static BARE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d{3,}(?:\.\d+)?)\b").expect("valid regex")
});
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z][a-z\-]*").expect("valid regex"));

const STRONG_BEFORE: &[&str] = &[
    "need", "needs", "needed", "raise", "raising", "goal", "asking", "ask for", "require",
    "requires", "required", "hoping for", "hope to get", "looking for", "trying to get",
    "request", "requesting",
];
const WEAK_BEFORE: &[&str] = &[
    "cost", "costs", "owe", "owes", "owed", "bill", "bills", "due", "behind", "charge",
    "charges", "fee", "fees", "price", "total", "payment", "balance", "deposit",
];
const STRONG_AFTER: &[&str] = &[
    "is what i need",
    "is all i need",
    "is my goal",
    "is the goal",
    "to cover",
    "would help",
    "would cover",
];

const WAGE_AFTER: &[&str] = &["per hour", "an hour", "a hour", "/hr", "/hour", "/ hr", "per hr", "hourly", "an hr"];
const WAGE_BEFORE: &[&str] = &[
    "make", "makes", "making", "made", "earn", "earns", "earning", "earned", "paid", "wage",
    "wages", "salary", "income",
];
const WAGE_FILLER: &[&str] = &["about", "around", "only", "like", "roughly", "just", "maybe"];
const AGE_AFTER: &[&str] = &["years old", "year old", "-year-old", "year-old", "yrs old", "years of age"];
const STREET_SUFFIXES: &[&str] = &[
    "street", "st", "avenue", "ave", "road", "rd", "lane", "ln", "drive", "boulevard", "blvd",
    "court", "circle", "terrace", "highway", "hwy", "parkway",
];

/// Window (bytes) searched before a candidate for intent phrases
const INTENT_WINDOW_BEFORE: usize = 60;
/// Window (bytes) searched after a candidate for filter and intent phrases
const CONTEXT_WINDOW_AFTER: usize = 30;

/// Extract the goal amount candidate
///
/// # Errors
/// `ExtractError` when a numeric mention cannot be converted (e.g. overflow of
/// a spelled-out number). The engine recovers this as a missing field.
pub fn extract_amount(text: &TranscriptText) -> Result<Option<AmountCandidate>, ExtractError> {
    let candidates = collect_candidates(text)?;
    Ok(select(candidates))
}

/// Every goal-plausible monetary mention, in text order
pub fn collect_candidates(text: &TranscriptText) -> Result<Vec<AmountCandidate>, ExtractError> {
    let lower = text.lower.as_str();
    let mut claimed: Vec<(usize, usize)> = Vec::new();
    let mut raw: Vec<(f64, usize, usize, AmountKind)> = Vec::new();

    for regex in [&*BETWEEN_RANGE, &*SPAN_RANGE] {
        for caps in regex.captures_iter(lower) {
            let Some(whole) = caps.get(0) else { continue };
            if overlaps(&claimed, whole.start(), whole.end()) {
                continue;
            }
            if let Some(value) = range_midpoint(&caps)? {
                claimed.push((whole.start(), whole.end()));
                raw.push((value, whole.start(), whole.end(), AmountKind::Range));
            }
        }
    }

    let simple: [(&Regex, AmountKind); 3] = [
        (&*CURRENCY, AmountKind::Currency),
        (&*DOLLARS, AmountKind::Dollars),
        (&*MAGNITUDE, AmountKind::Magnitude),
    ];
    for (regex, kind) in simple {
        for caps in regex.captures_iter(lower) {
            let Some(whole) = caps.get(0) else { continue };
            if overlaps(&claimed, whole.start(), whole.end()) {
                continue;
            }
            let number = parse_num(caps.get(1).map_or("", |m| m.as_str()))?;
            let value = apply_magnitude(number, caps.get(2).map(|m| m.as_str()));
            claimed.push((whole.start(), whole.end()));
            raw.push((value, whole.start(), whole.end(), kind));
        }
    }

    for (value, start, end) in spelled_amounts(lower)? {
        if !overlaps(&claimed, start, end) {
            claimed.push((start, end));
            raw.push((value, start, end, AmountKind::Spelled));
        }
    }

    for m in BARE.find_iter(lower) {
        if overlaps(&claimed, m.start(), m.end()) {
            continue;
        }
        // "$" directly before means the currency rule already owns it
        if lower[..m.start()].ends_with('$') {
            continue;
        }
        let value = parse_num(m.as_str())?;
        claimed.push((m.start(), m.end()));
        raw.push((value, m.start(), m.end(), AmountKind::Bare));
    }

    raw.sort_by_key(|(_, start, _, _)| *start);

    let mut candidates = Vec::new();
    for (value, start, end, kind) in raw {
        if !value.is_finite() {
            return Err(ExtractError::Overflow(lower[start..end].to_string()));
        }
        if let Some(reason) = non_goal_reason(text, value, start, end, kind) {
            debug!(value, reason, "Discarded non-goal amount");
            continue;
        }
        let intent = goal_intent(text, start, end);
        if kind == AmountKind::Bare && intent != GoalIntent::Strong {
            continue;
        }
        debug!(value, kind = kind.as_str(), intent = ?intent, "Amount candidate");
        candidates.push(AmountCandidate {
            value,
            start,
            end,
            kind,
            intent,
        });
    }

    Ok(candidates)
}

/// Pick the goal among filtered candidates
pub fn select(candidates: Vec<AmountCandidate>) -> Option<AmountCandidate> {
    for intent in [GoalIntent::Strong, GoalIntent::Weak] {
        if let Some(found) = candidates
            .iter()
            .filter(|c| c.intent == intent)
            .min_by_key(|c| c.start)
        {
            return Some(found.clone());
        }
    }

    candidates
        .into_iter()
        .filter(|c| c.kind != AmountKind::Bare)
        .max_by(|a, b| a.value.total_cmp(&b.value))
}

fn overlaps(claimed: &[(usize, usize)], start: usize, end: usize) -> bool {
    claimed.iter().any(|&(s, e)| start < e && s < end)
}

fn parse_num(raw: &str) -> Result<f64, ExtractError> {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    cleaned
        .parse::<f64>()
        .map_err(|_| ExtractError::InvalidNumber(raw.to_string()))
}

fn magnitude_factor(mag: &str) -> f64 {
    match mag {
        "k" | "thousand" | "grand" => 1_000.0,
        "million" => 1_000_000.0,
        _ => 1.0,
    }
}

fn apply_magnitude(value: f64, mag: Option<&str>) -> f64 {
    value * mag.map_or(1.0, magnitude_factor)
}

/// Midpoint of a range match, or `None` when it is not a money range
///
/// Capture layout: 1 `$`, 2 low, 3 low magnitude, 4 `$`, 5 high,
/// 6 high magnitude, 7 trailing "dollars".
fn range_midpoint(caps: &Captures<'_>) -> Result<Option<f64>, ExtractError> {
    let (Some(lo_raw), Some(hi_raw)) = (caps.get(2), caps.get(5)) else {
        return Ok(None);
    };

    let lo_mag = caps.get(3).map(|m| m.as_str());
    let hi_mag = caps.get(6).map(|m| m.as_str());
    let is_money = caps.get(1).is_some()
        || caps.get(4).is_some()
        || caps.get(7).is_some()
        || lo_mag.is_some()
        || hi_mag.is_some();
    if !is_money {
        return Ok(None);
    }

    let hi = apply_magnitude(parse_num(hi_raw.as_str())?, hi_mag);
    let mut lo = apply_magnitude(parse_num(lo_raw.as_str())?, lo_mag);

    // "between 5 and 10 thousand": the shared magnitude applies to both ends
    if lo_mag.is_none() {
        if let Some(mag) = hi_mag {
            let scaled = lo * magnitude_factor(mag);
            if scaled < hi {
                lo = scaled;
            }
        }
    }

    if hi <= lo {
        return Ok(None);
    }

    Ok(Some((lo + hi) / 2.0))
}

/// Spelled-out amounts as (value, start, end)
fn spelled_amounts(lower: &str) -> Result<Vec<(f64, usize, usize)>, ExtractError> {
    let words: Vec<(usize, usize, &str)> = WORD
        .find_iter(lower)
        .map(|m| (m.start(), m.end(), m.as_str()))
        .collect();

    let mut found = Vec::new();
    let mut i = 0;
    while i < words.len() {
        let word = words[i].2;
        if word != "a" && !is_number_word(word) {
            i += 1;
            continue;
        }

        let slice: Vec<&str> = words[i..].iter().map(|w| w.2).collect();
        let Some(parsed) = parse_number_words(&slice)? else {
            i += 1;
            continue;
        };

        let last = i + parsed.consumed - 1;
        let start = words[i].0;
        let mut end = words[last].1;
        let followed_by_dollars = words
            .get(last + 1)
            .map_or(false, |w| matches!(w.2, "dollars" | "bucks"));
        if followed_by_dollars {
            end = words[last + 1].1;
        }

        if parsed.has_magnitude || followed_by_dollars {
            found.push((parsed.value as f64, start, end));
        }
        i = last + 1;
    }

    Ok(found)
}

fn window_after(lower: &str, end: usize) -> &str {
    let stop = floor_char_boundary(lower, end + CONTEXT_WINDOW_AFTER);
    lower[end..stop].trim_start_matches(|c: char| c.is_whitespace() || c == ',')
}

/// Why a candidate is not a goal amount, if it is not
fn non_goal_reason(
    text: &TranscriptText,
    value: f64,
    start: usize,
    end: usize,
    kind: AmountKind,
) -> Option<&'static str> {
    let lower = text.lower.as_str();
    let after = window_after(lower, end);
    let before = preceding_words(lower, start, 3);

    // Hourly wage
    if WAGE_AFTER.iter().any(|p| after.starts_with(p)) {
        return Some("hourly_wage");
    }
    let meaningful = before.iter().position(|w| !WAGE_FILLER.contains(&w.as_str()));
    if let Some(idx) = meaningful {
        let wage_verb = WAGE_BEFORE.contains(&before[idx].as_str());
        if wage_verb && !is_goal_to_make(text, &before, idx, start, end) {
            return Some("earnings");
        }
    }

    // Age
    if AGE_AFTER.iter().any(|p| after.starts_with(p)) {
        return Some("age");
    }
    match (before.first().map(String::as_str), before.get(1).map(String::as_str)) {
        (Some("age" | "aged" | "ages"), _) | (Some("of"), Some("age")) => return Some("age"),
        _ => {}
    }

    // Calendar year
    if kind == AmountKind::Bare
        && value.fract() == 0.0
        && (1900.0..=2099.0).contains(&value)
        && !lower[start..end].contains(',')
    {
        return Some("calendar_year");
    }

    // Street address
    if !matches!(kind, AmountKind::Currency | AmountKind::Range) {
        let next = following_words(lower, end, 3);
        if next.iter().any(|w| STREET_SUFFIXES.contains(&w.trim_end_matches('.'))) {
            return Some("street_address");
        }
        match (before.first().map(String::as_str), before.get(1).map(String::as_str)) {
            (Some("at"), Some("live" | "lives" | "living" | "located" | "stay" | "staying"))
            | (Some("address"), _)
            | (Some("is"), Some("address")) => return Some("street_address"),
            _ => {}
        }
    }

    None
}

/// "need to make $1,200": an infinitive wage verb under strong goal intent
/// names the target, not earnings
fn is_goal_to_make(text: &TranscriptText, before: &[String], verb: usize, start: usize, end: usize) -> bool {
    before.get(verb + 1).map_or(false, |w| w == "to") && goal_intent(text, start, end) == GoalIntent::Strong
}

/// Intent context for a candidate, limited to its own sentence
fn goal_intent(text: &TranscriptText, start: usize, end: usize) -> GoalIntent {
    let lower = text.lower.as_str();
    let (sentence_start, sentence_end) = sentence_bounds(lower, start);

    let window_start = floor_char_boundary(lower, start.saturating_sub(INTENT_WINDOW_BEFORE).max(sentence_start));
    let before = &lower[window_start..start];

    let after_stop = floor_char_boundary(lower, (end + CONTEXT_WINDOW_AFTER).min(sentence_end.max(end)));
    let after = lower[end..after_stop].trim_start_matches(|c: char| c.is_whitespace() || c == ',');

    let has = |window: &str, phrases: &[&str]| {
        phrases
            .iter()
            .any(|p| !crate::text::find_phrase(window, p).is_empty())
    };

    if has(before, STRONG_BEFORE) || STRONG_AFTER.iter().any(|p| after.starts_with(p)) {
        GoalIntent::Strong
    } else if has(before, WEAK_BEFORE) {
        GoalIntent::Weak
    } else {
        GoalIntent::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount_of(s: &str) -> Option<f64> {
        extract_amount(&TranscriptText::new(s)).unwrap().map(|c| c.value)
    }

    #[test]
    fn test_currency_with_intent() {
        assert_eq!(amount_of("Hi, my name is John Smith and I need $5,000 for medical bills"), Some(5000.0));
    }

    #[test]
    fn test_currency_magnitude_suffix() {
        assert_eq!(amount_of("I'm trying to raise $2.5k for my car"), Some(2500.0));
        assert_eq!(amount_of("we need 3 grand for the deposit"), Some(3000.0));
    }

    #[test]
    fn test_spelled_out_amounts() {
        assert_eq!(amount_of("I need fifteen hundred dollars for rent"), Some(1500.0));
        assert_eq!(amount_of("we need two thousand five hundred to fix the roof"), Some(2500.0));
    }

    #[test]
    fn test_range_midpoint_and_members_not_double_counted() {
        let text = TranscriptText::new("I need between $2,000 and $3,000 for surgery");
        let candidates = collect_candidates(&text).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].kind, AmountKind::Range);
        assert_eq!(candidates[0].value, 2500.0);

        assert_eq!(amount_of("I need $500-$1,500 for repairs"), Some(1000.0));
        assert_eq!(amount_of("I need between 5 and 10 thousand dollars"), Some(7500.0));
    }

    #[test]
    fn test_hourly_wage_filtered() {
        assert_eq!(amount_of("I make $25 per hour but need help with bills"), None);
        assert_eq!(amount_of("I earn $18 an hour and I need $1,200 for rent"), Some(1200.0));
    }

    #[test]
    fn test_goal_after_need_to_make() {
        assert_eq!(amount_of("I need to make $1,200 for rent this month"), Some(1200.0));
        assert_eq!(amount_of("We need to make about $5,000 to cover the surgery"), Some(5000.0));
        // no goal intent: still earnings
        assert_eq!(amount_of("I have to make $600 a week to get by"), None);
        assert_eq!(amount_of("I only make $1,800 a month and need help"), None);
    }

    #[test]
    fn test_age_year_and_address_filtered() {
        assert_eq!(amount_of("my son is 12 years old and needs $800 for braces"), Some(800.0));
        assert_eq!(amount_of("since 2019 I have needed help, the bill is $950"), Some(950.0));
        assert_eq!(amount_of("I live at 4500 Oak Street and need $700"), Some(700.0));
    }

    #[test]
    fn test_strong_intent_beats_weak() {
        assert_eq!(
            amount_of("The repair costs $3,000 but I need $1,500 to cover my part"),
            Some(1500.0)
        );
    }

    #[test]
    fn test_weak_intent_beats_no_intent() {
        assert_eq!(amount_of("I have $40 left and the bill is $600"), Some(600.0));
    }

    #[test]
    fn test_largest_without_intent() {
        assert_eq!(amount_of("there was $200 and then $900 gone"), Some(900.0));
    }

    #[test]
    fn test_bare_number_needs_strong_intent() {
        assert_eq!(amount_of("we need 1,200 for the deposit"), Some(1200.0));
        assert_eq!(amount_of("there were 300 people at the event"), None);
    }

    #[test]
    fn test_after_intent_phrase() {
        let text = TranscriptText::new("$900 is what I need for the car");
        let found = extract_amount(&text).unwrap().unwrap();
        assert_eq!(found.value, 900.0);
        assert_eq!(found.intent, GoalIntent::Strong);
    }

    #[test]
    fn test_no_amount() {
        assert_eq!(amount_of("I just need someone to talk to"), None);
    }
}
