//! Evaluation report model and artifact I/O
//!
//! One report per run, written as
//! `<reports_dir>/evaluation-report-<YYYYMMDDTHHMMSSZ>.json`. The history of
//! these files feeds the trend and fragile-case analyzers.
//!
//! # Sections
//! - summary, fieldAccuracy, categoryPerformance
//! - failureBuckets (frequency desc, then name)
//! - executionTime (min/max/avg/p95)
//! - gradeDistribution, recommendations, detailedResults

use crate::buckets::FailureBucket;
use crate::error::ReportError;
use crate::runner::EvaluationResult;
use crate::scoring::Grade;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tcx_common::time::artifact_stamp;
use tcx_parse::ExtractionOutput;
use tracing::{debug, info, warn};

pub const REPORT_PREFIX: &str = "evaluation-report-";
pub const REPORT_SUFFIX: &str = ".json";

/// Field accuracy below which a recommendation is raised
const FIELD_ACCURACY_FLOOR: f64 = 0.80;
/// Pass rate below which a recommendation is raised
const PASS_RATE_FLOOR: f64 = 0.70;
/// Average per-case time (ms) above which extraction is called slow
const SLOW_CASE_MS: f64 = 100.0;
/// Share of failing cases that makes one bucket dominant
const DOMINANT_BUCKET_SHARE: f64 = 0.40;

// ============================================================================
// Report Model
// ============================================================================

/// Run-level totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_cases: usize,
    pub pass_count: usize,
    pub fail_count: usize,
    pub pass_rate: f64,
    pub avg_execution_time_ms: f64,
    pub avg_confidence: f64,
    /// Share of extracted fields resolved by the default tier
    pub fallback_rate: f64,
}

/// Share of cases whose field matched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldAccuracy {
    pub name: f64,
    pub category: f64,
    pub urgency_level: f64,
    pub goal_amount: f64,
    /// Mean missing-field agreement
    pub completeness: f64,
    /// Over labeled cases only; absent when no case carries a label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beneficiary_relationship: Option<f64>,
}

impl FieldAccuracy {
    /// (field, accuracy) pairs for the compared fields
    pub fn entries(&self) -> Vec<(&'static str, f64)> {
        let mut entries = vec![
            ("name", self.name),
            ("category", self.category),
            ("urgencyLevel", self.urgency_level),
            ("goalAmount", self.goal_amount),
        ];
        if let Some(relationship) = self.beneficiary_relationship {
            entries.push(("beneficiaryRelationship", relationship));
        }
        entries
    }
}

/// Per expected-category accuracy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPerformance {
    pub total: usize,
    pub correct: usize,
    pub accuracy: f64,
}

/// Occurrences of one failure bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketCount {
    pub bucket: FailureBucket,
    pub count: usize,
}

/// Per-case execution time statistics (milliseconds)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionTimeStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub p95: f64,
}

impl ExecutionTimeStats {
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let min = sorted[0];
        let max = sorted[sorted.len() - 1];
        let avg = sorted.iter().sum::<f64>() / sorted.len() as f64;

        // Nearest-rank percentile
        let rank = (sorted.len() as f64 * 0.95).ceil() as usize;
        let p95 = sorted[rank.clamp(1, sorted.len()) - 1];

        Self { min, max, avg, p95 }
    }
}

/// Complete report for one evaluation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationReport {
    pub timestamp: DateTime<Utc>,
    pub parser_version: String,
    pub summary: Summary,
    pub field_accuracy: FieldAccuracy,
    pub category_performance: BTreeMap<String, CategoryPerformance>,
    pub failure_buckets: Vec<BucketCount>,
    pub execution_time: ExecutionTimeStats,
    pub grade_distribution: BTreeMap<String, usize>,
    pub recommendations: Vec<String>,
    pub detailed_results: Vec<EvaluationResult>,
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

impl EvaluationReport {
    /// Aggregate per-case results into a report
    ///
    /// Every aggregate is order-independent over `results`.
    pub fn build(parser_version: &str, timestamp: DateTime<Utc>, results: Vec<EvaluationResult>) -> Self {
        let total = results.len();
        let pass_count = results.iter().filter(|r| r.passed).count();
        let outputs: Vec<&ExtractionOutput> = results.iter().filter_map(|r| r.output.as_ref()).collect();

        let fallback_fields: usize = outputs.iter().map(|o| o.fallback_count()).sum();
        let summary = Summary {
            total_cases: total,
            pass_count,
            fail_count: total - pass_count,
            pass_rate: ratio(pass_count, total),
            avg_execution_time_ms: mean(results.iter().map(|r| r.execution_time_ms)),
            avg_confidence: mean(outputs.iter().map(|o| o.confidence as f64)),
            fallback_rate: ratio(fallback_fields, outputs.len() * ExtractionOutput::FIELD_COUNT),
        };

        let count = |f: fn(&EvaluationResult) -> bool| ratio(results.iter().filter(|r| f(r)).count(), total);
        let labeled: Vec<bool> = results
            .iter()
            .filter_map(|r| r.field_matches.beneficiary_relationship)
            .collect();
        let field_accuracy = FieldAccuracy {
            name: count(|r| r.field_matches.name),
            category: count(|r| r.field_matches.category),
            urgency_level: count(|r| r.field_matches.urgency_level),
            goal_amount: count(|r| r.field_matches.goal_amount),
            completeness: mean(results.iter().map(|r| r.field_matches.completeness)),
            beneficiary_relationship: (!labeled.is_empty())
                .then(|| ratio(labeled.iter().filter(|m| **m).count(), labeled.len())),
        };

        let mut category_performance: BTreeMap<String, CategoryPerformance> = BTreeMap::new();
        for result in &results {
            let key = result
                .expected_category
                .map_or_else(|| "UNRECOGNIZED".to_string(), |c| c.to_string());
            let entry = category_performance.entry(key).or_default();
            entry.total += 1;
            if result.field_matches.category {
                entry.correct += 1;
            }
        }
        for performance in category_performance.values_mut() {
            performance.accuracy = ratio(performance.correct, performance.total);
        }

        let failure_buckets = count_buckets(results.iter().flat_map(|r| r.failure_buckets.iter().copied()));

        let times: Vec<f64> = results.iter().map(|r| r.execution_time_ms).collect();
        let execution_time = ExecutionTimeStats::from_samples(&times);

        let mut grade_distribution: BTreeMap<String, usize> =
            Grade::ALL.iter().map(|g| (g.to_string(), 0)).collect();
        for result in &results {
            *grade_distribution.entry(result.grade.to_string()).or_insert(0) += 1;
        }

        let mut report = Self {
            timestamp,
            parser_version: parser_version.to_string(),
            summary,
            field_accuracy,
            category_performance,
            failure_buckets,
            execution_time,
            grade_distribution,
            recommendations: Vec::new(),
            detailed_results: results,
        };
        report.recommendations = report.derive_recommendations();
        report
    }

    /// Occurrences of a bucket in this report
    pub fn bucket_count(&self, bucket: FailureBucket) -> usize {
        self.failure_buckets
            .iter()
            .find(|b| b.bucket == bucket)
            .map_or(0, |b| b.count)
    }

    fn derive_recommendations(&self) -> Vec<String> {
        let mut recommendations = Vec::new();

        for (field, accuracy) in self.field_accuracy.entries() {
            if accuracy < FIELD_ACCURACY_FLOOR {
                recommendations.push(format!(
                    "Improve {} extraction: accuracy {:.1}% is below {:.0}%",
                    field,
                    accuracy * 100.0,
                    FIELD_ACCURACY_FLOOR * 100.0
                ));
            }
        }

        if let Some(top) = self.failure_buckets.first() {
            if self.summary.fail_count > 0
                && top.count as f64 >= self.summary.fail_count as f64 * DOMINANT_BUCKET_SHARE
            {
                recommendations.push(format!(
                    "{} is the dominant failure ({} occurrences across {} failing cases)",
                    top.bucket, top.count, self.summary.fail_count
                ));
            }
        }

        let false_positives = self.bucket_count(FailureBucket::AmountFalsePositive);
        if false_positives > 0 {
            recommendations.push(format!(
                "Tighten non-goal amount filters: {} amount false positives (wages, ages, years, addresses)",
                false_positives
            ));
        }

        let system_errors = self.bucket_count(FailureBucket::SystemError);
        if system_errors > 0 {
            recommendations.push(format!(
                "Investigate {} system errors; see the error field in detailedResults",
                system_errors
            ));
        }

        if self.summary.avg_execution_time_ms > SLOW_CASE_MS {
            recommendations.push(format!(
                "Extraction is slow: {:.1} ms average per case exceeds {:.0} ms",
                self.summary.avg_execution_time_ms, SLOW_CASE_MS
            ));
        }

        if self.summary.total_cases > 0 && self.summary.pass_rate < PASS_RATE_FLOOR {
            recommendations.push(format!(
                "Pass rate {:.1}% is below {:.0}%",
                self.summary.pass_rate * 100.0,
                PASS_RATE_FLOOR * 100.0
            ));
        }

        recommendations
    }

    /// Artifact file name for this report
    pub fn file_name(&self) -> String {
        format!("{}{}{}", REPORT_PREFIX, artifact_stamp(self.timestamp), REPORT_SUFFIX)
    }

    /// Write the report into `dir` (created if missing)
    pub fn write(&self, dir: &Path) -> Result<PathBuf, ReportError> {
        let path = dir.join(self.file_name());
        write_json(&path, self)?;
        info!(
            path = %path.display(),
            cases = self.summary.total_cases,
            pass_rate = self.summary.pass_rate,
            "Wrote evaluation report"
        );
        Ok(path)
    }

    pub fn load(path: &Path) -> Result<Self, ReportError> {
        let content = std::fs::read_to_string(path).map_err(|e| ReportError::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| ReportError::json(path, e))
    }
}

/// Bucket counts sorted by frequency (desc), then name
pub fn count_buckets(buckets: impl Iterator<Item = FailureBucket>) -> Vec<BucketCount> {
    let mut counts: BTreeMap<FailureBucket, usize> = BTreeMap::new();
    for bucket in buckets {
        *counts.entry(bucket).or_insert(0) += 1;
    }
    let mut sorted: Vec<BucketCount> = counts
        .into_iter()
        .map(|(bucket, count)| BucketCount { bucket, count })
        .collect();
    sorted.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.bucket.as_str().cmp(b.bucket.as_str())));
    sorted
}

// ============================================================================
// Artifact I/O
// ============================================================================

/// Serialize `value` as pretty JSON at `path`, creating parent directories
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ReportError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ReportError::io(parent, e))?;
    }
    let json = serde_json::to_string_pretty(value).map_err(|e| ReportError::json(path, e))?;
    std::fs::write(path, json).map_err(|e| ReportError::io(path, e))
}

/// Write a text artifact at `path`, creating parent directories
pub fn write_text(path: &Path, content: &str) -> Result<(), ReportError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ReportError::io(parent, e))?;
    }
    std::fs::write(path, content).map_err(|e| ReportError::io(path, e))
}

/// Report files in `dir`, sorted by name
///
/// A missing directory yields an empty list.
pub fn list_reports(dir: &Path) -> Result<Vec<PathBuf>, ReportError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| ReportError::io(dir, e))? {
        let entry = entry.map_err(|e| ReportError::io(dir, e))?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(REPORT_PREFIX) && name.ends_with(REPORT_SUFFIX) {
            paths.push(entry.path());
        }
    }
    paths.sort();
    Ok(paths)
}

/// Load every readable report in `dir`, oldest first
///
/// Unreadable or malformed files are skipped with a warning.
pub fn load_history(dir: &Path) -> Vec<EvaluationReport> {
    let paths = match list_reports(dir) {
        Ok(paths) => paths,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Cannot list reports, treating history as empty");
            return Vec::new();
        }
    };

    let mut reports: Vec<EvaluationReport> = paths
        .iter()
        .filter_map(|path| match EvaluationReport::load(path) {
            Ok(report) => Some(report),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable report");
                None
            }
        })
        .collect();
    reports.sort_by_key(|r| r.timestamp);
    debug!(dir = %dir.display(), reports = reports.len(), "Loaded report history");
    reports
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::FieldMatches;
    use chrono::TimeZone;

    fn result(id: &str, passed: bool, buckets: Vec<FailureBucket>, ms: f64) -> EvaluationResult {
        EvaluationResult {
            case_id: id.to_string(),
            description: String::new(),
            difficulty: None,
            score: if passed { 1.0 } else { 0.4 },
            passed,
            grade: if passed { Grade::A } else { Grade::F },
            field_matches: FieldMatches {
                name: !buckets.contains(&FailureBucket::NameMissing),
                category: true,
                urgency_level: true,
                goal_amount: !buckets.contains(&FailureBucket::AmountFalsePositive),
                completeness: 1.0,
                beneficiary_relationship: None,
            },
            failure_buckets: buckets,
            execution_time_ms: ms,
            expected_category: Some(tcx_parse::Category::Food),
            output: None,
            error: None,
        }
    }

    #[test]
    fn test_execution_time_stats() {
        let samples: Vec<f64> = (1..=20).map(f64::from).collect();
        let stats = ExecutionTimeStats::from_samples(&samples);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 20.0);
        assert!((stats.avg - 10.5).abs() < 1e-9);
        assert_eq!(stats.p95, 19.0);

        assert_eq!(ExecutionTimeStats::from_samples(&[]), ExecutionTimeStats::default());
        assert_eq!(ExecutionTimeStats::from_samples(&[3.0]).p95, 3.0);
    }

    #[test]
    fn test_bucket_sorting() {
        let counts = count_buckets(
            [
                FailureBucket::UrgencyMisclassification,
                FailureBucket::NameMissing,
                FailureBucket::AmountMissing,
                FailureBucket::NameMissing,
            ]
            .into_iter(),
        );
        let order: Vec<_> = counts.iter().map(|c| (c.bucket, c.count)).collect();
        assert_eq!(
            order,
            vec![
                (FailureBucket::NameMissing, 2),
                (FailureBucket::AmountMissing, 1),
                (FailureBucket::UrgencyMisclassification, 1),
            ]
        );
    }

    #[test]
    fn test_build_aggregates() {
        let at = Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap();
        let report = EvaluationReport::build(
            "RuleBased_v1",
            at,
            vec![
                result("a", true, vec![], 2.0),
                result("b", false, vec![FailureBucket::NameMissing], 4.0),
                result("c", false, vec![FailureBucket::NameMissing, FailureBucket::AmountFalsePositive], 6.0),
                result("d", true, vec![], 8.0),
            ],
        );

        assert_eq!(report.summary.total_cases, 4);
        assert_eq!(report.summary.pass_count, 2);
        assert!((report.summary.pass_rate - 0.5).abs() < 1e-9);
        assert!((report.summary.avg_execution_time_ms - 5.0).abs() < 1e-9);
        assert!((report.field_accuracy.name - 0.5).abs() < 1e-9);
        assert_eq!(report.failure_buckets[0].bucket, FailureBucket::NameMissing);
        assert_eq!(report.grade_distribution["A"], 2);
        assert_eq!(report.grade_distribution["C"], 0);
        assert_eq!(report.category_performance["FOOD"].total, 4);
        assert_eq!(report.file_name(), "evaluation-report-20260105T120000Z.json");

        assert!(report.recommendations.iter().any(|r| r.contains("NAME_MISSING")));
        assert!(report.recommendations.iter().any(|r| r.contains("false positives")));
        assert!(report.recommendations.iter().any(|r| r.contains("Pass rate")));
    }

    #[test]
    fn test_write_then_load_history() {
        let dir = tempfile::tempdir().unwrap();
        let early = Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2026, 2, 5, 12, 0, 0).unwrap();

        EvaluationReport::build("RuleBased_v1", late, vec![result("a", true, vec![], 1.0)])
            .write(dir.path())
            .unwrap();
        EvaluationReport::build("RuleBased_v1", early, vec![result("a", false, vec![FailureBucket::NameMissing], 1.0)])
            .write(dir.path())
            .unwrap();
        std::fs::write(dir.path().join("evaluation-report-broken.json"), "{").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let history = load_history(dir.path());
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].timestamp, early);
        assert_eq!(history[1].timestamp, late);
    }

    #[test]
    fn test_missing_reports_dir_is_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_history(&dir.path().join("nope")).is_empty());
    }
}
