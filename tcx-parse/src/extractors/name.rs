//! Name Extractor
//!
//! Finds the speaker's name from self-introduction phrases.
//!
//! # Pattern Cascade (priority = list order)
//! 1. `my name is` / `my name's`
//! 2. `call me`
//! 3. `I'm` / `I am` followed by a capitalized word
//! 4. Title prefix (`Mr`, `Mrs`, `Ms`, `Miss`, `Dr`) near the start
//! 5. `this is` followed by a capitalized word
//! 6. Leading `X here`
//!
//! A candidate is the run of tokens after the phrase, ending at a stop word or
//! clause punctuation. Candidates longer than three tokens, or containing a
//! blacklisted word (places, organizations, common non-name words), are
//! rejected and the cascade moves on.

use crate::text::TranscriptText;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Maximum tokens in an accepted name
pub const MAX_NAME_TOKENS: usize = 3;

/// Title-prefixed names are only accepted this close to the start
const TITLE_WINDOW_BYTES: usize = 80;

/// Name pattern that produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePattern {
    MyNameIs,
    CallMe,
    IAm,
    TitlePrefix,
    ThisIs,
    LeadingHere,
}

impl NamePattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            NamePattern::MyNameIs => "my_name_is",
            NamePattern::CallMe => "call_me",
            NamePattern::IAm => "i_am",
            NamePattern::TitlePrefix => "title_prefix",
            NamePattern::ThisIs => "this_is",
            NamePattern::LeadingHere => "leading_here",
        }
    }

    /// Patterns whose candidate must start with a capitalized word
    fn requires_capital(&self) -> bool {
        !matches!(self, NamePattern::MyNameIs | NamePattern::CallMe)
    }
}

/// Accepted name candidate
#[derive(Debug, Clone, PartialEq)]
pub struct NameMatch {
    /// Title-cased name, nickname-expanded when enabled
    pub value: String,
    pub pattern: NamePattern,
    /// True when a nickname table entry rewrote the first name
    pub expanded: bool,
}

static MY_NAME_IS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bmy name(?: is|'s| was)\s+").expect("valid regex"));
static CALL_ME: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:call me|known as)\s+").expect("valid regex"));
static I_AM: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:i'm|i am|im)\s+").expect("valid regex"));
static TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:mr|mrs|ms|miss|dr)\.?\s+").expect("valid regex"));
static THIS_IS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bthis is\s+").expect("valid regex"));
static LEADING_HERE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?:hi|hello|hey)[,.!]?\s+)?([a-z][a-z'\-]*(?:\s+[a-z][a-z'\-]*)?)\s+here\b")
        .expect("valid regex")
});

/// Words that end a name candidate
static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "and", "but", "so", "or", "i", "i'm", "im", "my", "me", "we", "our", "from", "the", "a",
        "an", "with", "who", "need", "needs", "am", "is", "was", "are", "here", "calling", "to",
        "for", "of", "in", "at", "on", "this", "that", "it", "have", "has", "had", "just", "um",
        "uh", "like", "because", "since", "if", "then", "please", "thank", "thanks",
        "hello", "hi", "hey", "today", "currently", "really", "also", "live", "living", "work",
        "working", "by", "as", "its", "it's", "when", "where", "while", "about", "you", "your",
    ]
    .into_iter()
    .collect()
});

/// Words that can never be part of a name
static NON_NAME_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // states of being after "I'm"
        "sorry", "not", "very", "so", "struggling", "homeless", "unemployed", "single", "going",
        "trying", "looking", "writing", "reaching", "okay", "ok", "fine", "good", "worried",
        "desperate", "behind", "sick", "pregnant", "disabled", "married", "divorced", "widowed",
        "new", "late", "afraid", "unable", "able", "having", "getting", "being", "asking",
        "hoping", "needing", "raising", "scared", "tired", "broke", "stuck", "facing", "out",
        "currently", "still", "also", "really", "here", "there", "back", "now", "help", "mother",
        "father", "mom", "dad", "veteran", "student", "nurse", "teacher", "parent", "grandmother",
        "caregiver", "in", "at", "on", "up", "down", "calling", "reaching", "hi", "hello", "someone",
        "somebody", "everyone", "nobody", "anyone", "sure", "glad", "happy", "sad", "grateful",
        "thankful", "overwhelmed", "ready", "due", "owed", "short", "about", "almost",
        // places
        "texas", "california", "florida", "ohio", "georgia", "michigan", "arizona", "nevada",
        "oregon", "chicago", "houston", "phoenix", "detroit", "atlanta", "seattle", "boston",
        "denver", "america", "usa", "mexico", "canada", "downtown",
        // organizations and institutions
        "hospital", "church", "school", "university", "college", "county", "city", "state",
        "bank", "medicaid", "medicare", "fema", "gofundme", "walmart", "amazon", "google",
        "goodwill", "clinic", "shelter", "department", "office", "company", "god", "jesus",
    ]
    .into_iter()
    .collect()
});

/// Multi-word places and organizations
const NON_NAME_PHRASES: &[&str] = &[
    "new york",
    "los angeles",
    "san francisco",
    "san diego",
    "new jersey",
    "new mexico",
    "north carolina",
    "south carolina",
    "red cross",
    "united way",
    "salvation army",
    "social security",
];

/// Informal first name → formal first name
static NICKNAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("mike", "Michael"),
        ("mikey", "Michael"),
        ("bob", "Robert"),
        ("bobby", "Robert"),
        ("rob", "Robert"),
        ("bill", "William"),
        ("billy", "William"),
        ("jim", "James"),
        ("jimmy", "James"),
        ("joe", "Joseph"),
        ("joey", "Joseph"),
        ("tom", "Thomas"),
        ("tommy", "Thomas"),
        ("dave", "David"),
        ("dan", "Daniel"),
        ("danny", "Daniel"),
        ("chris", "Christopher"),
        ("matt", "Matthew"),
        ("nick", "Nicholas"),
        ("tony", "Anthony"),
        ("steve", "Steven"),
        ("rick", "Richard"),
        ("dick", "Richard"),
        ("liz", "Elizabeth"),
        ("beth", "Elizabeth"),
        ("betty", "Elizabeth"),
        ("kate", "Katherine"),
        ("katie", "Katherine"),
        ("jen", "Jennifer"),
        ("jenny", "Jennifer"),
        ("sue", "Susan"),
        ("suzy", "Susan"),
        ("patty", "Patricia"),
        ("sam", "Samuel"),
        ("alex", "Alexander"),
        ("ben", "Benjamin"),
        ("andy", "Andrew"),
        ("ed", "Edward"),
        ("eddie", "Edward"),
        ("greg", "Gregory"),
        ("jeff", "Jeffrey"),
        ("jon", "Jonathan"),
        ("josh", "Joshua"),
        ("ken", "Kenneth"),
        ("larry", "Lawrence"),
        ("pete", "Peter"),
        ("ron", "Ronald"),
        ("tim", "Timothy"),
        ("maggie", "Margaret"),
        ("peggy", "Margaret"),
        ("abby", "Abigail"),
        ("becky", "Rebecca"),
        ("cathy", "Catherine"),
        ("debbie", "Deborah"),
        ("jess", "Jessica"),
        ("mandy", "Amanda"),
        ("vicky", "Victoria"),
        ("barb", "Barbara"),
        ("chuck", "Charles"),
        ("charlie", "Charles"),
        ("hank", "Henry"),
    ]
    .into_iter()
    .collect()
});

/// Extract the speaker's name
///
/// Returns `None` when no pattern yields an acceptable candidate.
pub fn extract_name(text: &TranscriptText, nickname_expansion: bool) -> Option<NameMatch> {
    let cascade: [(NamePattern, &Lazy<Regex>); 5] = [
        (NamePattern::MyNameIs, &MY_NAME_IS),
        (NamePattern::CallMe, &CALL_ME),
        (NamePattern::IAm, &I_AM),
        (NamePattern::TitlePrefix, &TITLE),
        (NamePattern::ThisIs, &THIS_IS),
    ];

    for (pattern, regex) in cascade {
        for m in regex.find_iter(&text.lower) {
            if pattern == NamePattern::TitlePrefix && m.start() > TITLE_WINDOW_BYTES {
                break;
            }
            if let Some(tokens) = collect_tokens(&text.original, m.end(), pattern.requires_capital()) {
                if let Some(found) = accept(tokens, pattern, nickname_expansion) {
                    debug!(pattern = pattern.as_str(), name = %found.value, "Name extracted");
                    return Some(found);
                }
            }
        }
    }

    if let Some(caps) = LEADING_HERE.captures(&text.lower) {
        if let Some(group) = caps.get(1) {
            let tokens: Vec<&str> = text.original[group.start()..group.end()].split_whitespace().collect();
            if tokens.iter().all(|t| starts_uppercase(t)) {
                if let Some(found) = accept(tokens, NamePattern::LeadingHere, nickname_expansion) {
                    debug!(pattern = found.pattern.as_str(), name = %found.value, "Name extracted");
                    return Some(found);
                }
            }
        }
    }

    None
}

/// Collect name tokens starting at byte offset `from` of `original`
///
/// Returns `None` when the first token is missing or (if required) not
/// capitalized, or when more than `MAX_NAME_TOKENS` tokens precede the
/// first stop.
fn collect_tokens(original: &str, from: usize, require_capital: bool) -> Option<Vec<&str>> {
    let mut tokens = Vec::new();
    let mut rest = &original[from..];

    loop {
        let trimmed = rest.trim_start();
        let token_len = trimmed
            .char_indices()
            .find(|(_, c)| !(c.is_alphabetic() || *c == '\'' || *c == '-'))
            .map_or(trimmed.len(), |(i, _)| i);

        if token_len == 0 {
            break;
        }

        let token = trimmed[..token_len].trim_matches(|c| c == '\'' || c == '-');
        if token.is_empty() || STOP_WORDS.contains(token.to_ascii_lowercase().as_str()) {
            break;
        }

        // Required capitalization applies to every token; a lowercase word ends the name
        if require_capital && !starts_uppercase(token) {
            break;
        }

        tokens.push(token);
        if tokens.len() > MAX_NAME_TOKENS {
            return None;
        }

        rest = &trimmed[token_len..];
        // Clause punctuation or a non-space separator ends the name
        if !rest.starts_with(' ') {
            break;
        }
    }

    if tokens.is_empty() {
        None
    } else {
        Some(tokens)
    }
}

fn accept(tokens: Vec<&str>, pattern: NamePattern, nickname_expansion: bool) -> Option<NameMatch> {
    if tokens.is_empty() || tokens.len() > MAX_NAME_TOKENS {
        return None;
    }
    if tokens[0].chars().count() < 2 {
        return None;
    }

    let lowered: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();
    if lowered.iter().any(|t| NON_NAME_WORDS.contains(t.as_str())) {
        return None;
    }
    let joined = lowered.join(" ");
    if NON_NAME_PHRASES.iter().any(|p| joined.contains(p)) {
        return None;
    }

    let mut parts: Vec<String> = tokens.iter().map(|t| title_case(t)).collect();
    let mut expanded = false;
    if nickname_expansion {
        if let Some(formal) = NICKNAMES.get(lowered[0].as_str()) {
            parts[0] = (*formal).to_string();
            expanded = true;
        }
    }

    Some(NameMatch {
        value: parts.join(" "),
        pattern,
        expanded,
    })
}

/// Formal first name for an informal one ("mike" → "Michael")
pub fn formal_name(first: &str) -> Option<&'static str> {
    NICKNAMES.get(first.to_lowercase().as_str()).copied()
}

fn starts_uppercase(token: &str) -> bool {
    token.chars().next().map_or(false, char::is_uppercase)
}

/// Title-case a token unless it already carries mixed case ("McDonald")
pub fn title_case(token: &str) -> String {
    let has_upper = token.chars().any(char::is_uppercase);
    let has_lower = token.chars().any(char::is_lowercase);
    if has_upper && has_lower && starts_uppercase(token) {
        return token.to_string();
    }

    let mut out = String::with_capacity(token.len());
    let mut capitalize_next = true;
    for c in token.chars() {
        if capitalize_next {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        capitalize_next = c == '-';
    }
    out
}
