//! Rule Engine
//!
//! Runs the extraction pipeline for one transcript:
//! normalize → extract fields → score confidence → tune urgency (optional)
//! → validate output.
//!
//! Field faults are recovered here: the field becomes null with confidence 0,
//! a warning is recorded and logged, and extraction continues.

use crate::extractors::{
    classify_category, classify_relationship, classify_urgency, extract_amount, extract_name,
};
use crate::registry::ParserConfig;
use crate::text::{truncate_chars, TranscriptText, MAX_TRANSCRIPT_CHARS};
use crate::tuner::{base_urgency_score, PrecisionTuner, TuningOutcome};
use crate::types::{ExtractionOutput, FieldResult, ParseError, TranscriptParser};
use crate::validation::amount::bound_candidate;
use crate::validation::confidence::{
    category_field, name_field, overall_confidence, relationship_field, urgency_field,
};
use crate::validation::{OutputValidator, ValidationStatus};
use tracing::{debug, warn};

/// Pattern-based transcript parser
#[derive(Debug, Clone)]
pub struct RuleEngine {
    config: ParserConfig,
    tuner: Option<PrecisionTuner>,
    validator: OutputValidator,
}

impl RuleEngine {
    pub fn new(config: ParserConfig) -> Self {
        let tuner = config
            .enhancements
            .precision_tuning
            .then(|| PrecisionTuner::new(config.enhancements.correction_cap));
        let validator = OutputValidator::new(config.amount_bounds);
        Self {
            config,
            tuner,
            validator,
        }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Extract structured fields from one transcript
    ///
    /// Never fails; recovered problems are listed in `warnings`.
    pub fn extract(&self, transcript: &str) -> ExtractionOutput {
        let mut warnings = Vec::new();

        let (input, truncated) = truncate_chars(transcript, MAX_TRANSCRIPT_CHARS);
        if truncated {
            warn!(
                parser = %self.config.id,
                chars = transcript.chars().count(),
                limit = MAX_TRANSCRIPT_CHARS,
                "Transcript truncated"
            );
            warnings.push(format!("Transcript truncated to {} characters", MAX_TRANSCRIPT_CHARS));
        }

        let text = TranscriptText::new(input);
        if text.is_empty() {
            warnings.push("Transcript is empty".to_string());
        }

        let name = name_field(extract_name(&text, self.config.enhancements.nickname_expansion));

        let goal_amount = match extract_amount(&text) {
            Ok(candidate) => bound_candidate(candidate, &self.config.amount_bounds),
            Err(e) => {
                warn!(parser = %self.config.id, field = "goalAmount", error = %e, "Extraction failed, field left empty");
                warnings.push(format!("goalAmount extraction failed: {}", e));
                FieldResult::missing("extraction_failed")
            }
        };

        let category = category_field(&classify_category(&text));

        let urgency_match = classify_urgency(&text);
        let mut urgency = urgency_field(&urgency_match);
        let base_score = base_urgency_score(urgency_match.level, urgency_match.hits);
        let outcome = match &self.tuner {
            Some(tuner) => tuner.tune(&text, base_score),
            None => TuningOutcome::untuned(base_score),
        };
        if Some(outcome.tier) != urgency.value {
            debug!(
                from = ?urgency.value,
                to = %outcome.tier,
                base = outcome.base_score,
                tuned = outcome.final_score,
                "Urgency tier adjusted by tuning"
            );
            urgency.value = Some(outcome.tier);
            urgency.source = "precision_tuner".to_string();
        }

        let relationship = relationship_field(&classify_relationship(&text));

        let confidence = overall_confidence(&name, &goal_amount, &category, &urgency, &relationship);

        let mut output = ExtractionOutput {
            parser_id: self.config.id.clone(),
            name,
            goal_amount,
            category,
            urgency,
            urgency_score: outcome.final_score,
            relationship,
            corrections: outcome.corrections,
            warnings,
            confidence,
        };

        let validation = self.validator.validate(&output);
        if validation.status == ValidationStatus::Fail {
            warn!(
                parser = %self.config.id,
                score = validation.score,
                issues = ?validation.issues,
                "Extraction output failed consistency validation"
            );
            output.warnings.extend(validation.issues);
        }

        debug!(
            parser = %self.config.id,
            name = ?output.name.value,
            amount = ?output.goal_amount.value,
            category = ?output.category.value,
            urgency = ?output.urgency.value,
            confidence = output.confidence,
            "Extraction complete"
        );

        output
    }
}

impl TranscriptParser for RuleEngine {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn parse(&self, transcript: &str) -> Result<ExtractionOutput, ParseError> {
        Ok(self.extract(transcript))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ParserRegistry;
    use crate::types::{Category, Relationship, UrgencyLevel};

    fn engine(id: &str) -> RuleEngine {
        RuleEngine::new(ParserRegistry::builtin().resolve(id).unwrap())
    }

    #[test]
    fn test_full_extraction() {
        let output = engine("RuleBased_v1")
            .extract("Hi, my name is John Smith and I need $5,000 for medical bills urgently");

        assert_eq!(output.name.value.as_deref(), Some("John Smith"));
        assert_eq!(output.category.value, Some(Category::Healthcare));
        assert_eq!(output.urgency.value, Some(UrgencyLevel::High));
        assert_eq!(output.goal_amount.value, Some(5000.0));
        assert_eq!(output.relationship.value, Some(Relationship::Myself));
        assert!(output.corrections.is_empty());
        assert!(output.warnings.is_empty());
        assert!(output.confidence > 0.7);
    }

    #[test]
    fn test_empty_transcript_defaults() {
        let output = engine("RuleBased_v1").extract("   ");
        assert!(output.name.value.is_none());
        assert!(output.goal_amount.value.is_none());
        assert_eq!(output.category.value, Some(Category::Other));
        assert_eq!(output.urgency.value, Some(UrgencyLevel::Medium));
        assert_eq!(output.relationship.value, Some(Relationship::Myself));
        assert!(output.warnings.iter().any(|w| w.contains("empty")));
    }

    #[test]
    fn test_overflowing_number_is_recovered() {
        let transcript = format!("I need {} dollars", vec!["hundred"; 12].join(" "));
        let output = engine("RuleBased_v1").extract(&transcript);
        assert!(output.goal_amount.value.is_none());
        assert_eq!(output.goal_amount.confidence, 0.0);
        assert!(output.warnings.iter().any(|w| w.contains("goalAmount")));
    }

    #[test]
    fn test_long_transcript_truncated_with_warning() {
        let transcript = "help ".repeat(MAX_TRANSCRIPT_CHARS);
        let output = engine("RuleBased_v1").extract(&transcript);
        assert!(output.warnings.iter().any(|w| w.contains("truncated")));
    }

    #[test]
    fn test_tuned_engine_records_corrections() {
        let transcript = "My name is Ana Ruiz. I got an eviction notice and need $1,200 for rent.";
        let baseline = engine("RuleBased_v1").extract(transcript);
        let tuned = engine("RuleBased_v2_Tuned").extract(transcript);

        // "eviction notice" is a HIGH keyword and no critical-boundary detector fires
        assert_eq!(baseline.urgency.value, Some(UrgencyLevel::High));
        assert_eq!(tuned.urgency.value, Some(UrgencyLevel::High));

        let transcript = "My name is Ana Ruiz. We are behind on rent and need $1,200.";
        let baseline = engine("RuleBased_v1").extract(transcript);
        let tuned = engine("RuleBased_v2_Tuned").extract(transcript);
        assert_eq!(baseline.urgency.value, Some(UrgencyLevel::Medium));
        assert_eq!(tuned.urgency.value, Some(UrgencyLevel::High));
        assert_eq!(tuned.corrections.len(), 1);
        assert_eq!(tuned.corrections[0].detector, "impending_eviction");
    }

    #[test]
    fn test_parse_trait_uses_config_id() {
        let parser: &dyn TranscriptParser = &engine("RuleBased_v2_Strict");
        assert_eq!(parser.id(), "RuleBased_v2_Strict");
        let output = parser.parse("I need $600 for groceries").unwrap();
        assert_eq!(output.parser_id, "RuleBased_v2_Strict");
    }
}
