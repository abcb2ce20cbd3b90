//! tcx-parse: transcript campaign field extraction
//!
//! Converts a spoken-word fundraising narrative into structured campaign
//! fields (name, goal amount, category, urgency, beneficiary relationship).
//!
//! # Pipeline
//! - **extractors** - per-field rule cascades
//! - **validation** - confidence heuristics, bounds, consistency checks
//! - **tuner** - capped correction of the continuous urgency score
//! - **registry** - versioned parser configurations, fail-fast resolution
//! - **engine** - the `RuleEngine` tying the stages together
//!
//! # Example
//! ```rust,ignore
//! use tcx_parse::{build_parser, ParserRegistry};
//!
//! let registry = ParserRegistry::builtin();
//! let config = registry.resolve("RuleBased_v1")?;
//! let parser = build_parser(&config, None)?;
//! let output = parser.parse("Hi, my name is John Smith and I need $5,000 for medical bills")?;
//! ```

pub mod engine;
pub mod extractors;
pub mod registry;
pub mod text;
pub mod tuner;
pub mod types;
pub mod validation;

pub use engine::RuleEngine;
pub use registry::{
    build_parser, ConfigurationError, Enhancements, ParserBackend, ParserConfig, ParserRegistry,
};
pub use types::{
    Category, CorrectionRecord, ExtractError, ExtractionOutput, FallbackTier, FieldResult,
    ParseError, Relationship, TranscriptParser, TuningPass, UrgencyLevel,
};
