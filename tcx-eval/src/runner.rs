//! Evaluation Runner
//!
//! Runs every test case through one parser, scores it and buckets its
//! failures.
//!
//! # Concurrency
//! Cases run on the blocking pool (`spawn_blocking`) under
//! `futures::stream::buffer_unordered(max_concurrency)`. Results are put back
//! in dataset order before returning.
//!
//! # Fault Isolation
//! A `ParseError` or a panic inside the parser becomes a `SYSTEM_ERROR` result
//! with score 0; the batch always continues.

use crate::buckets::{classify_failures, FailureBucket};
use crate::dataset::TestCase;
use crate::scoring::{fold_category, FieldMatches, Grade};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tcx_common::time::duration_millis;
use tcx_parse::{Category, ExtractionOutput, ParserConfig, TranscriptParser};
use tracing::{debug, error, info, warn};

/// Comparison of one parser output with its labeled case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub case_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    /// Weighted score (0.0-1.0)
    pub score: f64,
    pub passed: bool,
    pub grade: Grade,
    pub field_matches: FieldMatches,
    pub failure_buckets: Vec<FailureBucket>,
    pub execution_time_ms: f64,
    /// Folded expected category (absent when the label is unrecognized)
    #[serde(default)]
    pub expected_category: Option<Category>,
    #[serde(default)]
    pub output: Option<ExtractionOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EvaluationResult {
    /// Score one successfully parsed case
    pub fn scored(
        case: &TestCase,
        output: ExtractionOutput,
        config: &ParserConfig,
        execution_time_ms: f64,
    ) -> Self {
        let field_matches = FieldMatches::compare(case, &output, config.amount_tolerance);
        let score = field_matches.weighted_score();
        let failure_buckets = classify_failures(case, &output, &field_matches);

        Self {
            case_id: case.id.clone(),
            description: case.description.clone(),
            difficulty: case.difficulty.clone(),
            score,
            passed: score >= config.pass_threshold,
            grade: Grade::from_score(score),
            field_matches,
            failure_buckets,
            execution_time_ms,
            expected_category: fold_category(&case.expected.category),
            output: Some(output),
            error: None,
        }
    }

    /// Result for a case whose parser failed or panicked
    pub fn system_error(case: &TestCase, error: impl Into<String>, execution_time_ms: f64) -> Self {
        Self {
            case_id: case.id.clone(),
            description: case.description.clone(),
            difficulty: case.difficulty.clone(),
            score: 0.0,
            passed: false,
            grade: Grade::F,
            field_matches: FieldMatches::default(),
            failure_buckets: vec![FailureBucket::SystemError],
            execution_time_ms,
            expected_category: fold_category(&case.expected.category),
            output: None,
            error: Some(error.into()),
        }
    }

    pub fn is_system_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Batch evaluator for one parser configuration
#[derive(Clone)]
pub struct EvaluationRunner {
    parser: Arc<dyn TranscriptParser>,
    config: ParserConfig,
    max_concurrency: usize,
}

impl EvaluationRunner {
    pub fn new(parser: Arc<dyn TranscriptParser>, config: ParserConfig) -> Self {
        let max_concurrency = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self {
            parser,
            config,
            max_concurrency,
        }
    }

    /// Bound the number of cases evaluated at once (minimum 1)
    pub fn with_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse and score one case on the current thread
    pub fn evaluate_case(parser: &dyn TranscriptParser, config: &ParserConfig, case: &TestCase) -> EvaluationResult {
        let start = Instant::now();
        let parsed = parser.parse(&case.transcript_text);
        let elapsed = duration_millis(start.elapsed());

        match parsed {
            Ok(output) => {
                let result = EvaluationResult::scored(case, output, config, elapsed);
                debug!(
                    case = %result.case_id,
                    score = result.score,
                    passed = result.passed,
                    buckets = ?result.failure_buckets,
                    "Case evaluated"
                );
                result
            }
            Err(e) => {
                warn!(case = %case.id, parser = %config.id, error = %e, "Parser failed on case");
                EvaluationResult::system_error(case, e.to_string(), elapsed)
            }
        }
    }

    /// Evaluate every case, returning results in dataset order
    pub async fn run(&self, cases: Vec<TestCase>) -> Vec<EvaluationResult> {
        let total = cases.len();
        info!(
            parser = %self.config.id,
            cases = total,
            concurrency = self.max_concurrency,
            "Starting evaluation"
        );
        let started = Instant::now();

        let mut results: Vec<(usize, EvaluationResult)> = stream::iter(cases.into_iter().enumerate())
            .map(|(index, case)| {
                let parser = Arc::clone(&self.parser);
                let config = self.config.clone();

                async move {
                    let start = Instant::now();
                    let fallback = case.clone();
                    let handle = tokio::task::spawn_blocking(move || {
                        Self::evaluate_case(parser.as_ref(), &config, &case)
                    });

                    let result = match handle.await {
                        Ok(result) => result,
                        Err(join_error) => {
                            let reason = if join_error.is_panic() {
                                panic_message(join_error.into_panic())
                            } else {
                                join_error.to_string()
                            };
                            error!(case = %fallback.id, error = %reason, "Case evaluation aborted");
                            EvaluationResult::system_error(
                                &fallback,
                                format!("Case evaluation aborted: {}", reason),
                                duration_millis(start.elapsed()),
                            )
                        }
                    };
                    (index, result)
                }
            })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        results.sort_by_key(|(index, _)| *index);
        let results: Vec<EvaluationResult> = results.into_iter().map(|(_, result)| result).collect();

        let passed = results.iter().filter(|r| r.passed).count();
        let system_errors = results.iter().filter(|r| r.is_system_error()).count();
        info!(
            parser = %self.config.id,
            total,
            passed,
            system_errors,
            elapsed_ms = duration_millis(started.elapsed()),
            "Evaluation completed"
        );

        results
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}
