//! Confidence & Validation
//!
//! - **confidence** - per-field confidence heuristics and the overall weighted mean
//! - **amount** - amount bounds, sanity re-validation, loose amount parsing
//! - **consistency** - `OutputValidator` scoring of finished outputs
//! - **fuzzy** - name similarity for evaluation (never alters output)

pub mod amount;
pub mod confidence;
pub mod consistency;
pub mod fuzzy;

pub use amount::{parse_amount, validate_amount, AmountBounds};
pub use consistency::OutputValidator;
pub use fuzzy::{name_similarity, names_match_exact, names_match_fuzzy};

use serde::{Deserialize, Serialize};

/// Validation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationStatus {
    /// Validation passed
    Pass,
    /// Validation passed with warnings
    Warning,
    /// Validation failed
    Fail,
}

/// Validation result with score, issues and a JSON report
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub status: ValidationStatus,
    /// Consistency score (0.0-1.0)
    pub score: f32,
    pub issues: Vec<String>,
    pub report: serde_json::Value,
}
