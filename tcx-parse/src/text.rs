//! Normalized transcript text and lexical helpers
//!
//! `TranscriptText` keeps the whitespace-collapsed original next to an
//! ASCII-lowercased copy. Lowercasing is ASCII-only so byte offsets found in
//! `lower` are valid in `original`, which the name extractor relies on to
//! recover capitalization.

use crate::types::ExtractError;

/// Maximum transcript length (characters) processed by the engine
pub const MAX_TRANSCRIPT_CHARS: usize = 20_000;

/// Words that negate a following keyword
const NEGATORS: &[&str] = &["not", "no", "isn't", "never", "don't", "doesn't", "wasn't", "aren't"];

/// Transcript prepared for rule matching
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptText {
    /// Whitespace-collapsed transcript
    pub original: String,
    /// ASCII-lowercased copy of `original` (same byte offsets)
    pub lower: String,
}

impl TranscriptText {
    pub fn new(raw: &str) -> Self {
        let original = collapse_whitespace(raw);
        let lower = original.to_ascii_lowercase();
        Self { original, lower }
    }

    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }

    /// True when `phrase` (lowercase) occurs on word boundaries
    pub fn contains_phrase(&self, phrase: &str) -> bool {
        !find_phrase(&self.lower, phrase).is_empty()
    }

    /// True when any of `phrases` occurs on word boundaries
    pub fn contains_any(&self, phrases: &[&str]) -> bool {
        phrases.iter().any(|p| self.contains_phrase(p))
    }

    /// Byte offsets of every word-bounded occurrence of `phrase`
    pub fn phrase_positions(&self, phrase: &str) -> Vec<usize> {
        find_phrase(&self.lower, phrase)
    }

    /// Word-bounded occurrences of `phrase` that are not negated
    pub fn affirmed_positions(&self, phrase: &str) -> Vec<usize> {
        find_phrase(&self.lower, phrase)
            .into_iter()
            .filter(|&pos| !self.is_negated(pos))
            .collect()
    }

    /// True when one of the two words before `pos` is a negator
    pub fn is_negated(&self, pos: usize) -> bool {
        preceding_words(&self.lower, pos, 2)
            .iter()
            .any(|w| NEGATORS.contains(&w.as_str()))
    }

    /// Byte range of the sentence containing `pos`
    pub fn sentence_bounds(&self, pos: usize) -> (usize, usize) {
        sentence_bounds(&self.lower, pos)
    }
}

/// Collapse runs of whitespace to single spaces and trim
pub fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to `max_chars` characters on a char boundary
///
/// Returns the (possibly shortened) text and whether truncation happened.
pub fn truncate_chars(raw: &str, max_chars: usize) -> (&str, bool) {
    match raw.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (&raw[..byte_idx], true),
        None => (raw, false),
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '\''
}

/// Word-bounded occurrences of `phrase` in `haystack`
pub fn find_phrase(haystack: &str, phrase: &str) -> Vec<usize> {
    if phrase.is_empty() {
        return Vec::new();
    }

    let mut positions = Vec::new();
    let mut from = 0;
    while let Some(rel) = haystack[from..].find(phrase) {
        let start = from + rel;
        let end = start + phrase.len();

        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !is_word_char(c) || !phrase.starts_with(is_word_char));
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !is_word_char(c) || !phrase.ends_with(is_word_char));

        if before_ok && after_ok {
            positions.push(start);
        }

        from = start + phrase.chars().next().map_or(1, char::len_utf8);
    }
    positions
}

/// Up to `count` words immediately before `pos`, nearest first
pub fn preceding_words(haystack: &str, pos: usize, count: usize) -> Vec<String> {
    haystack[..pos]
        .split(|c: char| !is_word_char(c))
        .filter(|w| !w.is_empty())
        .rev()
        .take(count)
        .map(str::to_string)
        .collect()
}

/// Up to `count` words immediately after `pos`, nearest first
pub fn following_words(haystack: &str, pos: usize, count: usize) -> Vec<String> {
    haystack[pos..]
        .split(|c: char| !is_word_char(c) && c != '-')
        .filter(|w| !w.is_empty())
        .take(count)
        .map(str::to_string)
        .collect()
}

/// Byte range of the sentence containing `pos`
///
/// Sentences end at `.`, `!` or `?` followed by whitespace (or end of text),
/// so decimal points and abbreviations inside numbers do not split.
pub fn sentence_bounds(haystack: &str, pos: usize) -> (usize, usize) {
    let bytes = haystack.as_bytes();
    let is_terminator = |i: usize| {
        matches!(bytes[i], b'.' | b'!' | b'?')
            && bytes.get(i + 1).map_or(true, |b| b.is_ascii_whitespace())
    };

    let mut start = 0;
    for i in (0..pos.min(bytes.len())).rev() {
        if is_terminator(i) {
            start = i + 1;
            break;
        }
    }

    let mut end = bytes.len();
    for i in pos..bytes.len() {
        if is_terminator(i) {
            end = i;
            break;
        }
    }

    (start, end)
}

/// Clamp a byte offset back to the nearest char boundary at or before it
pub fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    if idx >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

// ============================================================================
// Spelled-out Numbers
// ============================================================================

fn unit_value(word: &str) -> Option<u64> {
    let value = match word {
        "zero" => 0,
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        "thirteen" => 13,
        "fourteen" => 14,
        "fifteen" => 15,
        "sixteen" => 16,
        "seventeen" => 17,
        "eighteen" => 18,
        "nineteen" => 19,
        _ => return None,
    };
    Some(value)
}

fn tens_value(word: &str) -> Option<u64> {
    let value = match word {
        "twenty" => 20,
        "thirty" => 30,
        "forty" => 40,
        "fifty" => 50,
        "sixty" => 60,
        "seventy" => 70,
        "eighty" => 80,
        "ninety" => 90,
        _ => return None,
    };
    Some(value)
}

fn magnitude_value(word: &str) -> Option<u64> {
    match word {
        "hundred" => Some(100),
        "thousand" | "grand" => Some(1_000),
        "million" => Some(1_000_000),
        _ => None,
    }
}

/// True when `word` can take part in a spelled-out number
pub fn is_number_word(word: &str) -> bool {
    word.split('-').all(|part| {
        unit_value(part).is_some() || tens_value(part).is_some() || magnitude_value(part).is_some()
    })
}

/// A spelled-out number parsed from a word sequence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpelledNumber {
    pub value: u64,
    /// Number of words consumed
    pub consumed: usize,
    /// True when a magnitude word (hundred/thousand/million) was used
    pub has_magnitude: bool,
}

/// Parse a spelled-out number at the start of `words` (lowercase)
///
/// Accepts a leading "a" ("a thousand"), hyphenated tens ("twenty-five") and
/// "and" between number words ("one hundred and fifty"). Returns `Ok(None)`
/// when `words` does not start with a number.
///
/// # Errors
/// `ExtractError::Overflow` when the value does not fit in `u64`.
pub fn parse_number_words(words: &[&str]) -> Result<Option<SpelledNumber>, ExtractError> {
    let mut total: u64 = 0;
    let mut current: u64 = 0;
    let mut consumed = 0;
    let mut seen_number = false;
    let mut has_magnitude = false;

    let overflow = || ExtractError::Overflow(words.join(" "));

    for (i, raw) in words.iter().enumerate() {
        let word = raw.trim_matches(|c: char| !c.is_alphanumeric() && c != '-');

        if word == "a" && i == 0 {
            // "a" only counts when a magnitude follows
            let next = words.get(1).map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()));
            if next.and_then(magnitude_value).is_some() {
                current = 1;
                consumed = 1;
                continue;
            }
            return Ok(None);
        }

        if word == "and" && seen_number {
            let next = words.get(i + 1).map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '-'));
            if next.map_or(false, is_number_word) {
                consumed = i + 1;
                continue;
            }
            break;
        }

        if !is_number_word(word) || word.is_empty() {
            break;
        }

        for part in word.split('-') {
            if let Some(v) = unit_value(part).or_else(|| tens_value(part)) {
                current = current.checked_add(v).ok_or_else(overflow)?;
            } else if let Some(m) = magnitude_value(part) {
                has_magnitude = true;
                let base = current.max(1);
                if m == 100 {
                    current = base.checked_mul(m).ok_or_else(overflow)?;
                } else {
                    let scaled = base.checked_mul(m).ok_or_else(overflow)?;
                    total = total.checked_add(scaled).ok_or_else(overflow)?;
                    current = 0;
                }
            }
        }
        seen_number = true;
        consumed = i + 1;
    }

    if !seen_number {
        return Ok(None);
    }

    let value = total.checked_add(current).ok_or_else(overflow)?;
    Ok(Some(SpelledNumber {
        value,
        consumed,
        has_magnitude,
    }))
}
