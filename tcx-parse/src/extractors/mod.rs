//! Field Extractors
//!
//! Pure rule cascades that turn a normalized transcript into candidate field
//! values. Extractors never assign final confidence; `validation::confidence`
//! scores the candidates they return.
//!
//! # Extractors
//! 1. **name** - self-introduction and title-prefixed phrases
//! 2. **amount** - all monetary mentions, non-goal filtering, intent selection
//! 3. **category** - priority-ordered keyword tables
//! 4. **urgency** - keyword tiers with negation suppression
//! 5. **relationship** - beneficiary-context phrases

pub mod amount;
pub mod category;
pub mod name;
pub mod relationship;
pub mod urgency;

pub use amount::{extract_amount, AmountCandidate, AmountKind, GoalIntent};
pub use category::{classify_category, CategoryMatch};
pub use name::{extract_name, NameMatch, NamePattern};
pub use relationship::{classify_relationship, RelationshipEvidence, RelationshipMatch};
pub use urgency::{classify_urgency, UrgencyMatch};
