//! Category Classifier
//!
//! Keyword tables are declared in priority order; the first category whose
//! keyword set matches the transcript wins. Default: `OTHER`.

use crate::text::TranscriptText;
use crate::types::Category;
use tracing::debug;

pub const SAFETY_KEYWORDS: &[&str] = &[
    "domestic violence", "abuse", "abused", "abusive", "abuser", "unsafe", "stalking",
    "stalker", "threatened", "threatening", "assault", "assaulted", "restraining order",
    "fleeing", "escape", "trafficking", "violence", "violent", "harassment", "in danger",
];

pub const LEGAL_KEYWORDS: &[&str] = &[
    "lawyer", "attorney", "court", "legal", "lawsuit", "custody", "immigration", "bail",
    "deportation", "legal fees", "sued", "probation", "citizenship", "visa",
];

pub const HEALTHCARE_KEYWORDS: &[&str] = &[
    "medical", "hospital", "surgery", "doctor", "medication", "medicine", "prescription",
    "prescriptions", "treatment", "cancer", "chemo", "chemotherapy", "therapy", "health",
    "dental", "dentist", "insulin", "diagnosis", "diagnosed", "clinic", "emergency room",
    "illness", "injury", "injured", "disease", "transplant", "physical therapy", "braces",
];

pub const EMERGENCY_KEYWORDS: &[&str] = &[
    "emergency", "fire", "flood", "flooded", "hurricane", "tornado", "disaster", "earthquake",
    "accident", "crisis", "lost everything", "burned down", "storm",
];

pub const HOUSING_KEYWORDS: &[&str] = &[
    "rent", "eviction", "evicted", "evict", "homeless", "housing", "apartment", "landlord",
    "mortgage", "foreclosure", "shelter", "place to live", "security deposit", "lease", "roof",
    "motel",
];

pub const UTILITIES_KEYWORDS: &[&str] = &[
    "electric", "electricity", "electric bill", "gas bill", "water bill", "utility",
    "utilities", "power bill", "heating", "shutoff", "shut off", "disconnected",
    "disconnection", "internet bill", "phone bill",
];

pub const FOOD_KEYWORDS: &[&str] = &[
    "food", "groceries", "grocery", "hungry", "meals", "food stamps", "pantry", "starving",
    "baby formula", "feed my", "nothing to eat",
];

pub const TRANSPORTATION_KEYWORDS: &[&str] = &[
    "car", "vehicle", "transportation", "bus pass", "truck", "transmission", "tires",
    "commute", "mechanic", "car repair", "auto", "bus fare",
];

pub const EDUCATION_KEYWORDS: &[&str] = &[
    "school", "tuition", "college", "university", "textbooks", "classes", "degree",
    "education", "student", "certification", "semester", "scholarship", "course",
];

pub const EMPLOYMENT_KEYWORDS: &[&str] = &[
    "job", "employment", "unemployed", "laid off", "fired", "interview", "career",
    "work uniform", "tools for work", "lost my job", "job training", "hired",
];

pub const FAMILY_KEYWORDS: &[&str] = &[
    "family", "children", "kids", "baby", "daughter", "son", "childcare", "child care",
    "funeral", "daycare", "newborn", "diapers", "burial",
];

/// Priority-ordered (category, keyword set) table
pub const CATEGORY_TABLE: &[(Category, &[&str])] = &[
    (Category::Safety, SAFETY_KEYWORDS),
    (Category::Legal, LEGAL_KEYWORDS),
    (Category::Healthcare, HEALTHCARE_KEYWORDS),
    (Category::Emergency, EMERGENCY_KEYWORDS),
    (Category::Housing, HOUSING_KEYWORDS),
    (Category::Utilities, UTILITIES_KEYWORDS),
    (Category::Food, FOOD_KEYWORDS),
    (Category::Transportation, TRANSPORTATION_KEYWORDS),
    (Category::Education, EDUCATION_KEYWORDS),
    (Category::Employment, EMPLOYMENT_KEYWORDS),
    (Category::Family, FAMILY_KEYWORDS),
];

/// Classification result
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryMatch {
    pub category: Category,
    /// Distinct keywords of the winning set found in the text (0 for default)
    pub hits: usize,
}

/// Keywords from `keywords` present in the transcript
pub fn matching_keywords<'a>(text: &TranscriptText, keywords: &[&'a str]) -> Vec<&'a str> {
    keywords
        .iter()
        .copied()
        .filter(|k| text.contains_phrase(k))
        .collect()
}

/// Classify the transcript into a category
pub fn classify_category(text: &TranscriptText) -> CategoryMatch {
    for (category, keywords) in CATEGORY_TABLE {
        let hits = matching_keywords(text, keywords);
        if !hits.is_empty() {
            debug!(category = %category, keywords = ?hits, "Category matched");
            return CategoryMatch {
                category: *category,
                hits: hits.len(),
            };
        }
    }

    CategoryMatch {
        category: Category::Other,
        hits: 0,
    }
}
