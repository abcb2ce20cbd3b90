//! Fragile-Case Analyzer
//!
//! A case is fragile when it failed in at least two distinct historical runs.
//! Ranking: failure count (desc), latest failure (desc), case id.

use crate::buckets::FailureBucket;
use crate::error::ReportError;
use crate::report::{write_json, write_text, EvaluationReport};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_TOP_N: usize = 20;
pub const MIN_FAILING_RUNS: usize = 2;
pub const FRAGILE_JSON: &str = "fragile-cases.json";
pub const FRAGILE_MARKDOWN: &str = "fragile-cases.md";

/// A case failing across runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FragileCaseRecord {
    pub case_id: String,
    /// Number of distinct runs in which the case failed
    pub failure_count: usize,
    /// Distinct bucket types seen across those failures, sorted by name
    pub failure_buckets: Vec<FailureBucket>,
    pub last_failure_date: DateTime<Utc>,
}

/// Fragile-case artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FragileReport {
    pub generated_at: DateTime<Utc>,
    pub reports_analyzed: usize,
    pub cases: Vec<FragileCaseRecord>,
}

#[derive(Default)]
struct FailureHistory {
    runs: BTreeSet<usize>,
    buckets: BTreeSet<FailureBucket>,
    last_failure: Option<DateTime<Utc>>,
}

/// Fragile cases across `reports`, ranked and capped to `top_n`
pub fn find_fragile_cases(reports: &[EvaluationReport], top_n: usize) -> Vec<FragileCaseRecord> {
    let mut histories: BTreeMap<&str, FailureHistory> = BTreeMap::new();

    for (run, report) in reports.iter().enumerate() {
        for result in report.detailed_results.iter().filter(|r| !r.passed) {
            let history = histories.entry(result.case_id.as_str()).or_default();
            history.runs.insert(run);
            history.buckets.extend(result.failure_buckets.iter().copied());
            history.last_failure = history.last_failure.max(Some(report.timestamp));
        }
    }

    let mut cases: Vec<FragileCaseRecord> = histories
        .into_iter()
        .filter(|(_, history)| history.runs.len() >= MIN_FAILING_RUNS)
        .filter_map(|(case_id, history)| {
            let mut failure_buckets: Vec<FailureBucket> = history.buckets.into_iter().collect();
            failure_buckets.sort_by_key(|b| b.as_str());
            Some(FragileCaseRecord {
                case_id: case_id.to_string(),
                failure_count: history.runs.len(),
                failure_buckets,
                last_failure_date: history.last_failure?,
            })
        })
        .collect();

    cases.sort_by(|a, b| {
        b.failure_count
            .cmp(&a.failure_count)
            .then_with(|| b.last_failure_date.cmp(&a.last_failure_date))
            .then_with(|| a.case_id.cmp(&b.case_id))
    });
    cases.truncate(top_n);
    cases
}

impl FragileReport {
    pub fn build(reports: &[EvaluationReport], top_n: usize, now: DateTime<Utc>) -> Self {
        let cases = find_fragile_cases(reports, top_n);
        info!(reports = reports.len(), fragile = cases.len(), "Fragile-case analysis complete");
        Self {
            generated_at: now,
            reports_analyzed: reports.len(),
            cases,
        }
    }

    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# Fragile Cases\n\n");
        out.push_str(&format!("Generated: {}\n\n", self.generated_at.to_rfc3339()));
        out.push_str(&format!("Reports analyzed: {}\n\n", self.reports_analyzed));

        if self.cases.is_empty() {
            out.push_str("No case failed in more than one run.\n");
            return out;
        }

        out.push_str("| Case | Failures | Buckets | Last failure |\n");
        out.push_str("|---|---|---|---|\n");
        for case in &self.cases {
            let buckets: Vec<&str> = case.failure_buckets.iter().map(|b| b.as_str()).collect();
            out.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                case.case_id,
                case.failure_count,
                buckets.join(", "),
                case.last_failure_date.format("%Y-%m-%d %H:%M")
            ));
        }
        out
    }

    /// Write `fragile-cases.json` and `fragile-cases.md` into `dir`
    pub fn write(&self, dir: &Path) -> Result<(PathBuf, PathBuf), ReportError> {
        let json_path = dir.join(FRAGILE_JSON);
        let markdown_path = dir.join(FRAGILE_MARKDOWN);
        write_json(&json_path, self)?;
        write_text(&markdown_path, &self.to_markdown())?;
        Ok((json_path, markdown_path))
    }
}
