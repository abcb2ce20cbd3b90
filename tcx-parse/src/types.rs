//! Core Types and Trait Definitions for tcx-parse
//!
//! Defines the field vocabulary produced by the extraction pipeline and the
//! `TranscriptParser` seam every parser backend implements:
//! - **Extractors:** per-field rule cascades (name, amount, category, urgency, relationship)
//! - **Validation:** confidence scoring and sanity re-validation
//! - **Tuning:** capped correction of the continuous urgency score
//!
//! # Architecture
//! One transcript in, one `ExtractionOutput` out. No state is shared between
//! calls, so independent transcripts can be parsed on any thread.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Field Vocabulary
// ============================================================================

/// Campaign category, declared in classification priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Safety,
    Legal,
    Healthcare,
    Emergency,
    Housing,
    Utilities,
    Food,
    Transportation,
    Education,
    Employment,
    Family,
    Other,
}

impl Category {
    /// All categories in priority order
    pub const ALL: [Category; 12] = [
        Category::Safety,
        Category::Legal,
        Category::Healthcare,
        Category::Emergency,
        Category::Housing,
        Category::Utilities,
        Category::Food,
        Category::Transportation,
        Category::Education,
        Category::Employment,
        Category::Family,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Safety => "SAFETY",
            Category::Legal => "LEGAL",
            Category::Healthcare => "HEALTHCARE",
            Category::Emergency => "EMERGENCY",
            Category::Housing => "HOUSING",
            Category::Utilities => "UTILITIES",
            Category::Food => "FOOD",
            Category::Transportation => "TRANSPORTATION",
            Category::Education => "EDUCATION",
            Category::Employment => "EMPLOYMENT",
            Category::Family => "FAMILY",
            Category::Other => "OTHER",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == upper)
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

/// Discrete urgency tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UrgencyLevel {
    Critical,
    High,
    Medium,
    Low,
}

impl UrgencyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            UrgencyLevel::Critical => "CRITICAL",
            UrgencyLevel::High => "HIGH",
            UrgencyLevel::Medium => "MEDIUM",
            UrgencyLevel::Low => "LOW",
        }
    }
}

impl fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UrgencyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CRITICAL" => Ok(UrgencyLevel::Critical),
            "HIGH" => Ok(UrgencyLevel::High),
            "MEDIUM" => Ok(UrgencyLevel::Medium),
            "LOW" => Ok(UrgencyLevel::Low),
            _ => Err(format!("unknown urgency level '{}'", s)),
        }
    }
}

/// Who the campaign benefits, relative to the speaker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    Myself,
    FamilyMember,
    Other,
}

impl Relationship {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relationship::Myself => "myself",
            Relationship::FamilyMember => "family_member",
            Relationship::Other => "other",
        }
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Relationship {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "myself" | "self" => Ok(Relationship::Myself),
            "family_member" | "family" => Ok(Relationship::FamilyMember),
            "other" => Ok(Relationship::Other),
            _ => Err(format!("unknown relationship '{}'", s)),
        }
    }
}

/// Which extraction strategy produced a field
///
/// Informational only; nothing branches on it after extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackTier {
    /// A high-quality rule matched
    Primary,
    /// A weaker rule matched
    Secondary,
    /// Nothing matched; the field holds its default (or null)
    Default,
}

// ============================================================================
// Extraction Output
// ============================================================================

/// One extracted field with its confidence and provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldResult<T> {
    /// Extracted value (None when the field could not be extracted)
    pub value: Option<T>,
    /// Confidence score (0.0-1.0)
    pub confidence: f32,
    /// Strategy tier that produced the value
    pub tier: FallbackTier,
    /// Rule that produced the value
    pub source: String,
}

impl<T> FieldResult<T> {
    /// Create new field result with clamped confidence (0.0-1.0)
    pub fn new(value: Option<T>, confidence: f32, tier: FallbackTier, source: impl Into<String>) -> Self {
        Self {
            value,
            confidence: confidence.clamp(0.0, 1.0),
            tier,
            source: source.into(),
        }
    }

    /// Field that could not be extracted
    pub fn missing(source: impl Into<String>) -> Self {
        Self::new(None, 0.0, FallbackTier::Default, source)
    }

    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }
}

/// Which tuning pass produced a correction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TuningPass {
    CriticalBoundary,
    HighBoundary,
    MediumPrecision,
}

/// One applied urgency adjustment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionRecord {
    pub pass: TuningPass,
    pub detector: String,
    /// Signed adjustment applied to the urgency score (after any rescaling)
    pub magnitude: f64,
    pub reason: String,
}

/// Engine result for one transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionOutput {
    /// Parser configuration that produced this output
    pub parser_id: String,
    pub name: FieldResult<String>,
    pub goal_amount: FieldResult<f64>,
    pub category: FieldResult<Category>,
    pub urgency: FieldResult<UrgencyLevel>,
    /// Continuous urgency score (0.0-1.0) the tier was derived from
    pub urgency_score: f64,
    pub relationship: FieldResult<Relationship>,
    /// Precision-tuner adjustments applied to the urgency score
    #[serde(default)]
    pub corrections: Vec<CorrectionRecord>,
    /// Recovered extraction faults and validation issues
    #[serde(default)]
    pub warnings: Vec<String>,
    /// Overall confidence (0.0-1.0)
    pub confidence: f32,
}

impl ExtractionOutput {
    /// Field names (dataset spelling) that were not extracted
    pub fn missing_fields(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if !self.name.is_present() {
            missing.push("name".to_string());
        }
        if !self.goal_amount.is_present() {
            missing.push("goalAmount".to_string());
        }
        if !self.category.is_present() {
            missing.push("category".to_string());
        }
        if !self.urgency.is_present() {
            missing.push("urgencyLevel".to_string());
        }
        missing
    }

    /// Number of fields resolved by the default tier
    pub fn fallback_count(&self) -> usize {
        [
            self.name.tier,
            self.goal_amount.tier,
            self.category.tier,
            self.urgency.tier,
            self.relationship.tier,
        ]
        .iter()
        .filter(|tier| **tier == FallbackTier::Default)
        .count()
    }

    /// Number of fields that carry a fallback tier
    pub const FIELD_COUNT: usize = 5;
}

// ============================================================================
// Parser Seam
// ============================================================================

/// A transcript parser backend
///
/// The rule engine implements this trait; an external backend can be injected
/// through the registry. Implementations must be pure with respect to the
/// transcript: same input, same output.
///
/// # Example
/// ```rust,ignore
/// use tcx_parse::types::TranscriptParser;
///
/// let output = parser.parse("Hi, my name is John Smith and I need $5,000")?;
/// assert_eq!(output.name.value.as_deref(), Some("John Smith"));
/// ```
pub trait TranscriptParser: Send + Sync {
    /// Identifier of the configuration this parser runs
    fn id(&self) -> &str;

    /// Parse one transcript
    ///
    /// # Errors
    /// Returns `ParseError` only when the backend as a whole fails; individual
    /// field faults are recovered inside the output.
    fn parse(&self, transcript: &str) -> Result<ExtractionOutput, ParseError>;
}

/// Whole-parser failure
#[derive(Debug, Error)]
pub enum ParseError {
    /// Backend could not produce an output
    #[error("Backend error: {0}")]
    Backend(String),

    /// Internal processing error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Single-field extraction failure (recovered by the engine)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExtractError {
    /// Numeric text could not be converted
    #[error("Invalid number '{0}'")]
    InvalidNumber(String),

    /// Value out of representable range
    #[error("Numeric overflow: {0}")]
    Overflow(String),
}

// ============================================================================
// Tests
// ============================================================================
