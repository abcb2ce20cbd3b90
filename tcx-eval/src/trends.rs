//! Trend Analyzer
//!
//! Reduces the report history to one data point per run and compares the
//! mean pass rate of the most recent window against the runs before it.
//!
//! Missing or thin history is never an error: the result is
//! `InsufficientData` with empty field and failure summaries.

use crate::buckets::FailureBucket;
use crate::error::ReportError;
use crate::report::{count_buckets, write_json, write_text, BucketCount, EvaluationReport, ExecutionTimeStats};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_WINDOW: usize = 3;
pub const DEFAULT_DEADBAND: f64 = 0.05;
pub const TREND_JSON: &str = "trend-analysis.json";
pub const TREND_MARKDOWN: &str = "trend-summary.md";

const LOW_CONFIDENCE: f64 = 0.6;
const HIGH_FALLBACK_USAGE: f64 = 0.3;
const SLOW_CASE_MS: f64 = 100.0;
const WEAK_FIELD: f64 = 0.8;
const FAILING_FIELD: f64 = 0.6;

/// One historical evaluation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendDataPoint {
    pub date: DateTime<Utc>,
    pub parser_version: String,
    pub total_cases: usize,
    pub pass_rate: f64,
    pub field_accuracy: BTreeMap<String, f64>,
    pub fallback_usage: f64,
    pub avg_confidence: f64,
    pub top_failure_buckets: Vec<BucketCount>,
    pub exec_time_stats: ExecutionTimeStats,
}

impl TrendDataPoint {
    /// Buckets kept per data point
    pub const TOP_BUCKETS: usize = 3;

    pub fn from_report(report: &EvaluationReport) -> Self {
        Self {
            date: report.timestamp,
            parser_version: report.parser_version.clone(),
            total_cases: report.summary.total_cases,
            pass_rate: report.summary.pass_rate,
            field_accuracy: report
                .field_accuracy
                .entries()
                .into_iter()
                .map(|(field, accuracy)| (field.to_string(), accuracy))
                .collect(),
            fallback_usage: report.summary.fallback_rate,
            avg_confidence: report.summary.avg_confidence,
            top_failure_buckets: report
                .failure_buckets
                .iter()
                .take(Self::TOP_BUCKETS)
                .cloned()
                .collect(),
            exec_time_stats: report.execution_time,
        }
    }
}

/// Direction of the pass rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Improving,
    Declining,
    Stable,
    InsufficientData,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Trend::Improving => "Improving",
            Trend::Declining => "Declining",
            Trend::Stable => "Stable",
            Trend::InsufficientData => "Insufficient data",
        };
        f.write_str(label)
    }
}

/// Recommendation priority, most pressing first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub priority: Priority,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldScore {
    pub field: String,
    pub accuracy: f64,
}

/// Computed analysis over the data points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendAnalysis {
    pub overall_trend: Trend,
    /// Mean pass rate of the recent window (absent with insufficient data)
    pub recent_pass_rate: Option<f64>,
    /// Mean pass rate of the runs before the window
    pub earlier_pass_rate: Option<f64>,
    pub best_field: Option<FieldScore>,
    pub worst_field: Option<FieldScore>,
    pub most_common_failure: Option<BucketCount>,
    pub recommendations: Vec<Recommendation>,
}

/// Trend artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendReport {
    pub last_updated: DateTime<Utc>,
    pub data_points: Vec<TrendDataPoint>,
    pub analysis: TrendAnalysis,
}

/// Windowed pass-rate trend analyzer
#[derive(Debug, Clone)]
pub struct TrendAnalyzer {
    window: usize,
    deadband: f64,
}

impl Default for TrendAnalyzer {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            deadband: DEFAULT_DEADBAND,
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

impl TrendAnalyzer {
    /// Analyzer with a custom window (minimum 1) and the default deadband
    pub fn with_window(window: usize) -> Self {
        Self {
            window: window.max(1),
            ..Self::default()
        }
    }

    /// Replace the deadband; negative values count as zero and non-finite
    /// values keep the default
    pub fn with_deadband(mut self, deadband: f64) -> Self {
        self.deadband = if deadband.is_finite() {
            deadband.max(0.0)
        } else {
            DEFAULT_DEADBAND
        };
        self
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn deadband(&self) -> f64 {
        self.deadband
    }

    /// Data points for every report, oldest first
    pub fn data_points(reports: &[EvaluationReport]) -> Vec<TrendDataPoint> {
        let mut points: Vec<TrendDataPoint> = reports.iter().map(TrendDataPoint::from_report).collect();
        points.sort_by_key(|p| p.date);
        points
    }

    /// Classify the pass-rate direction
    ///
    /// Returns the trend with the recent and earlier means when there is
    /// enough history.
    pub fn overall_trend(&self, points: &[TrendDataPoint]) -> (Trend, Option<f64>, Option<f64>) {
        if points.len() < self.window + 1 {
            return (Trend::InsufficientData, None, None);
        }

        let split = points.len() - self.window;
        let earlier: Vec<f64> = points[..split].iter().map(|p| p.pass_rate).collect();
        let recent: Vec<f64> = points[split..].iter().map(|p| p.pass_rate).collect();
        let (earlier, recent) = (mean(&earlier), mean(&recent));
        let delta = recent - earlier;

        let trend = if delta > self.deadband {
            Trend::Improving
        } else if delta < -self.deadband {
            Trend::Declining
        } else {
            Trend::Stable
        };
        (trend, Some(recent), Some(earlier))
    }

    pub fn analyze(&self, points: &[TrendDataPoint]) -> TrendAnalysis {
        let (overall_trend, recent_pass_rate, earlier_pass_rate) = self.overall_trend(points);

        let latest_fields: Vec<FieldScore> = points
            .last()
            .map(|p| {
                p.field_accuracy
                    .iter()
                    .map(|(field, accuracy)| FieldScore {
                        field: field.clone(),
                        accuracy: *accuracy,
                    })
                    .collect()
            })
            .unwrap_or_default();
        let best_field = latest_fields
            .iter()
            .max_by(|a, b| a.accuracy.total_cmp(&b.accuracy))
            .cloned();
        let worst_field = latest_fields
            .iter()
            .min_by(|a, b| a.accuracy.total_cmp(&b.accuracy))
            .cloned();

        let most_common_failure = count_buckets(points.iter().flat_map(|p| {
            p.top_failure_buckets
                .iter()
                .flat_map(|b| std::iter::repeat(b.bucket).take(b.count))
        }))
        .into_iter()
        .next();

        let mut analysis = TrendAnalysis {
            overall_trend,
            recent_pass_rate,
            earlier_pass_rate,
            best_field,
            worst_field,
            most_common_failure,
            recommendations: Vec::new(),
        };
        analysis.recommendations = self.recommendations(points, &analysis);
        analysis
    }

    fn recommendations(&self, points: &[TrendDataPoint], analysis: &TrendAnalysis) -> Vec<Recommendation> {
        let mut recommendations = Vec::new();
        let mut push = |priority: Priority, message: String| {
            recommendations.push(Recommendation { priority, message });
        };

        match (analysis.overall_trend, analysis.recent_pass_rate, analysis.earlier_pass_rate) {
            (Trend::Declining, Some(recent), Some(earlier)) => push(
                Priority::High,
                format!(
                    "Pass rate is declining: {:.1}% over the last {} runs vs {:.1}% before",
                    recent * 100.0,
                    self.window,
                    earlier * 100.0
                ),
            ),
            (Trend::Improving, Some(recent), Some(earlier)) => push(
                Priority::Low,
                format!(
                    "Pass rate is improving: {:.1}% over the last {} runs vs {:.1}% before",
                    recent * 100.0,
                    self.window,
                    earlier * 100.0
                ),
            ),
            (Trend::InsufficientData, _, _) => push(
                Priority::Low,
                format!(
                    "Only {} runs recorded; at least {} are needed for a trend",
                    points.len(),
                    self.window + 1
                ),
            ),
            _ => {}
        }

        if let Some(worst) = &analysis.worst_field {
            if worst.accuracy < WEAK_FIELD {
                let priority = if worst.accuracy < FAILING_FIELD {
                    Priority::High
                } else {
                    Priority::Medium
                };
                push(
                    priority,
                    format!(
                        "Focus on {} extraction: {:.1}% accuracy in the latest run",
                        worst.field,
                        worst.accuracy * 100.0
                    ),
                );
            }
        }

        if let Some(common) = &analysis.most_common_failure {
            let message = match common.bucket {
                FailureBucket::SystemError => format!(
                    "System errors recur across runs ({} total); check parser stability",
                    common.count
                ),
                bucket => format!("{} is the most common failure across runs ({} total)", bucket, common.count),
            };
            push(Priority::Medium, message);
        }

        if !points.is_empty() {
            let avg_confidence = mean(&points.iter().map(|p| p.avg_confidence).collect::<Vec<_>>());
            if avg_confidence < LOW_CONFIDENCE {
                push(
                    Priority::Medium,
                    format!("Average confidence {:.2} is below {:.2}", avg_confidence, LOW_CONFIDENCE),
                );
            }

            let fallback = mean(&points.iter().map(|p| p.fallback_usage).collect::<Vec<_>>());
            if fallback > HIGH_FALLBACK_USAGE {
                push(
                    Priority::Medium,
                    format!(
                        "{:.1}% of fields fall back to defaults; primary rules need coverage",
                        fallback * 100.0
                    ),
                );
            }

            let exec = mean(&points.iter().map(|p| p.exec_time_stats.avg).collect::<Vec<_>>());
            if exec > SLOW_CASE_MS {
                push(
                    Priority::Low,
                    format!("Average execution time {:.1} ms exceeds {:.0} ms", exec, SLOW_CASE_MS),
                );
            }
        }

        recommendations.sort_by_key(|r| r.priority);
        recommendations
    }

    /// Build the trend artifact from a report history
    pub fn report(&self, reports: &[EvaluationReport], now: DateTime<Utc>) -> TrendReport {
        let data_points = Self::data_points(reports);
        let analysis = self.analyze(&data_points);
        info!(
            runs = data_points.len(),
            trend = %analysis.overall_trend,
            "Trend analysis complete"
        );
        TrendReport {
            last_updated: now,
            data_points,
            analysis,
        }
    }
}

impl TrendReport {
    pub fn to_markdown(&self) -> String {
        let analysis = &self.analysis;
        let mut out = String::new();

        out.push_str("# Trend Summary\n\n");
        out.push_str(&format!("Last updated: {}\n\n", self.last_updated.to_rfc3339()));
        out.push_str(&format!("Runs analyzed: {}\n\n", self.data_points.len()));
        out.push_str(&format!("Overall trend: **{}**\n\n", analysis.overall_trend));

        if let Some(best) = &analysis.best_field {
            out.push_str(&format!("- Best field: {} ({:.1}%)\n", best.field, best.accuracy * 100.0));
        }
        if let Some(worst) = &analysis.worst_field {
            out.push_str(&format!("- Worst field: {} ({:.1}%)\n", worst.field, worst.accuracy * 100.0));
        }
        if let Some(common) = &analysis.most_common_failure {
            out.push_str(&format!("- Most common failure: {} ({})\n", common.bucket, common.count));
        }

        if !self.data_points.is_empty() {
            out.push_str("\n## Runs\n\n");
            out.push_str("| Date | Parser | Cases | Pass rate | Avg confidence |\n");
            out.push_str("|---|---|---|---|---|\n");
            for point in &self.data_points {
                out.push_str(&format!(
                    "| {} | {} | {} | {:.1}% | {:.2} |\n",
                    point.date.format("%Y-%m-%d %H:%M"),
                    point.parser_version,
                    point.total_cases,
                    point.pass_rate * 100.0,
                    point.avg_confidence
                ));
            }
        }

        if !analysis.recommendations.is_empty() {
            out.push_str("\n## Recommendations\n\n");
            for rec in &analysis.recommendations {
                out.push_str(&format!("- [{:?}] {}\n", rec.priority, rec.message));
            }
        }

        out
    }

    /// Write `trend-analysis.json` and `trend-summary.md` into `dir`
    pub fn write(&self, dir: &Path) -> Result<(PathBuf, PathBuf), ReportError> {
        let json_path = dir.join(TREND_JSON);
        let markdown_path = dir.join(TREND_MARKDOWN);
        write_json(&json_path, self)?;
        write_text(&markdown_path, &self.to_markdown())?;
        Ok((json_path, markdown_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn point(day: u32, pass_rate: f64) -> TrendDataPoint {
        TrendDataPoint {
            date: Utc.with_ymd_and_hms(2026, 3, day, 9, 0, 0).unwrap(),
            parser_version: "RuleBased_v1".to_string(),
            total_cases: 10,
            pass_rate,
            field_accuracy: BTreeMap::from([
                ("name".to_string(), 0.9),
                ("goalAmount".to_string(), 0.55),
                ("category".to_string(), 0.95),
            ]),
            fallback_usage: 0.1,
            avg_confidence: 0.8,
            top_failure_buckets: vec![BucketCount {
                bucket: FailureBucket::AmountIncorrect,
                count: 2,
            }],
            exec_time_stats: ExecutionTimeStats::default(),
        }
    }

    #[test]
    fn test_insufficient_data() {
        let analyzer = TrendAnalyzer::default();
        let points = vec![point(1, 0.5), point(2, 0.6), point(3, 0.7)];
        assert_eq!(analyzer.overall_trend(&points).0, Trend::InsufficientData);
        assert_eq!(analyzer.overall_trend(&[]).0, Trend::InsufficientData);
    }

    #[test]
    fn test_trend_direction_with_deadband() {
        let analyzer = TrendAnalyzer::default();

        let improving = vec![point(1, 0.50), point(2, 0.70), point(3, 0.72), point(4, 0.74)];
        assert_eq!(analyzer.overall_trend(&improving).0, Trend::Improving);

        let declining = vec![point(1, 0.90), point(2, 0.70), point(3, 0.72), point(4, 0.74)];
        assert_eq!(analyzer.overall_trend(&declining).0, Trend::Declining);

        let stable = vec![point(1, 0.70), point(2, 0.72), point(3, 0.70), point(4, 0.74)];
        assert_eq!(analyzer.overall_trend(&stable).0, Trend::Stable);
    }

    #[test]
    fn test_custom_deadband() {
        let stable = vec![point(1, 0.70), point(2, 0.72), point(3, 0.70), point(4, 0.74)];
        let tight = TrendAnalyzer::default().with_deadband(0.01);
        assert_eq!(tight.overall_trend(&stable).0, Trend::Improving);

        let improving = vec![point(1, 0.50), point(2, 0.70), point(3, 0.72), point(4, 0.74)];
        let wide = TrendAnalyzer::with_window(3).with_deadband(0.30);
        assert_eq!(wide.overall_trend(&improving).0, Trend::Stable);
        assert_eq!(wide.window(), 3);

        assert_eq!(TrendAnalyzer::default().with_deadband(-1.0).deadband(), 0.0);
        assert_eq!(TrendAnalyzer::default().with_deadband(f64::NAN).deadband(), DEFAULT_DEADBAND);
    }

    #[test]
    fn test_analysis_fields_and_recommendations() {
        let analyzer = TrendAnalyzer::default();
        let points = vec![point(1, 0.90), point(2, 0.70), point(3, 0.72), point(4, 0.74)];
        let analysis = analyzer.analyze(&points);

        assert_eq!(analysis.best_field.as_ref().unwrap().field, "category");
        assert_eq!(analysis.worst_field.as_ref().unwrap().field, "goalAmount");
        let common = analysis.most_common_failure.as_ref().unwrap();
        assert_eq!(common.bucket, FailureBucket::AmountIncorrect);
        assert_eq!(common.count, 8);

        // declining trend and a failing field are both high priority
        assert_eq!(analysis.recommendations[0].priority, Priority::High);
        assert_eq!(analysis.recommendations[1].priority, Priority::High);
        assert!(analysis
            .recommendations
            .windows(2)
            .all(|pair| pair[0].priority <= pair[1].priority));
    }

    #[test]
    fn test_empty_history_is_neutral() {
        let report = TrendAnalyzer::default().report(&[], Utc::now());
        assert_eq!(report.analysis.overall_trend, Trend::InsufficientData);
        assert!(report.analysis.best_field.is_none());
        assert!(report.analysis.most_common_failure.is_none());
        assert!(report.to_markdown().contains("Insufficient data"));
    }
}
