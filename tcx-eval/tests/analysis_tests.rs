//! History analysis tests: fragile cases and trends over written reports

use chrono::{DateTime, TimeZone, Utc};
use tcx_eval::fragile::{find_fragile_cases, FragileReport, FRAGILE_JSON, FRAGILE_MARKDOWN};
use tcx_eval::report::load_history;
use tcx_eval::scoring::FieldMatches;
use tcx_eval::trends::{TREND_JSON, TREND_MARKDOWN};
use tcx_eval::{EvaluationReport, EvaluationResult, FailureBucket, Grade, Trend, TrendAnalyzer};

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, d, 8, 30, 0).unwrap()
}

fn passing(id: &str) -> EvaluationResult {
    EvaluationResult {
        case_id: id.to_string(),
        description: String::new(),
        difficulty: None,
        score: 1.0,
        passed: true,
        grade: Grade::A,
        field_matches: FieldMatches {
            name: true,
            category: true,
            urgency_level: true,
            goal_amount: true,
            completeness: 1.0,
            beneficiary_relationship: None,
        },
        failure_buckets: Vec::new(),
        execution_time_ms: 1.5,
        expected_category: None,
        output: None,
        error: None,
    }
}

fn failing(id: &str, buckets: &[FailureBucket]) -> EvaluationResult {
    let mut result = passing(id);
    result.passed = false;
    result.score = 0.6;
    result.grade = Grade::D;
    result.field_matches.name = !buckets.contains(&FailureBucket::NameMissing);
    result.field_matches.goal_amount = !buckets.contains(&FailureBucket::AmountIncorrect);
    result.failure_buckets = buckets.to_vec();
    result
}

fn report(at: DateTime<Utc>, results: Vec<EvaluationResult>) -> EvaluationReport {
    EvaluationReport::build("RuleBased_v1", at, results)
}

// ============================================================================
// Fragile Cases
// ============================================================================

#[test]
fn test_missing_name_in_two_reports_is_fragile() {
    let reports = vec![
        report(day(1), vec![failing("tc-007", &[FailureBucket::NameMissing]), passing("tc-008")]),
        report(day(2), vec![passing("tc-007"), failing("tc-008", &[FailureBucket::AmountIncorrect])]),
        report(day(3), vec![failing("tc-007", &[FailureBucket::NameMissing]), passing("tc-008")]),
    ];

    let fragile = find_fragile_cases(&reports, 20);
    assert_eq!(fragile.len(), 1, "a single failure is not fragile");
    let case = &fragile[0];
    assert_eq!(case.case_id, "tc-007");
    assert_eq!(case.failure_count, 2);
    assert_eq!(case.failure_buckets, vec![FailureBucket::NameMissing]);
    assert_eq!(case.last_failure_date, day(3));
}

#[test]
fn test_fragile_ranking_and_cap() {
    let reports = vec![
        report(
            day(1),
            vec![
                failing("a", &[FailureBucket::NameMissing]),
                failing("b", &[FailureBucket::UrgencyMisclassification]),
                failing("c", &[FailureBucket::AmountIncorrect]),
            ],
        ),
        report(
            day(2),
            vec![
                failing("a", &[FailureBucket::AmountIncorrect]),
                failing("b", &[FailureBucket::UrgencyMisclassification]),
                passing("c"),
            ],
        ),
        report(
            day(3),
            vec![
                failing("a", &[FailureBucket::NameMissing]),
                passing("b"),
                failing("c", &[FailureBucket::CategoryMisclassification]),
            ],
        ),
    ];

    let fragile = find_fragile_cases(&reports, 20);
    let order: Vec<_> = fragile.iter().map(|c| (c.case_id.as_str(), c.failure_count)).collect();
    // "c" failed more recently than "b", so it ranks first among equal counts
    assert_eq!(order, vec![("a", 3), ("c", 2), ("b", 2)]);
    assert_eq!(
        fragile[0].failure_buckets,
        vec![FailureBucket::AmountIncorrect, FailureBucket::NameMissing]
    );

    assert_eq!(find_fragile_cases(&reports, 1).len(), 1);
}

#[test]
fn test_fragile_artifacts_written() {
    let dir = tempfile::tempdir().unwrap();
    let reports = vec![
        report(day(1), vec![failing("tc-007", &[FailureBucket::NameMissing])]),
        report(day(2), vec![failing("tc-007", &[FailureBucket::NameMissing])]),
    ];
    for r in &reports {
        r.write(dir.path()).unwrap();
    }

    let history = load_history(dir.path());
    assert_eq!(history.len(), 2);

    let fragile = FragileReport::build(&history, 20, Utc::now());
    fragile.write(dir.path()).unwrap();

    let json = std::fs::read_to_string(dir.path().join(FRAGILE_JSON)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["reportsAnalyzed"], 2);
    assert_eq!(value["cases"][0]["caseId"], "tc-007");
    assert_eq!(value["cases"][0]["failureBuckets"][0], "NAME_MISSING");

    let markdown = std::fs::read_to_string(dir.path().join(FRAGILE_MARKDOWN)).unwrap();
    assert!(markdown.contains("tc-007"));
}

// ============================================================================
// Trends
// ============================================================================

fn run_with_pass_rate(at: DateTime<Utc>, passed: usize) -> EvaluationReport {
    let results = (0..10)
        .map(|i| {
            let id = format!("tc-{i:03}");
            if i < passed {
                passing(&id)
            } else {
                failing(&id, &[FailureBucket::AmountIncorrect])
            }
        })
        .collect();
    report(at, results)
}

#[test]
fn test_declining_history_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    for (d, passed) in [(1, 9), (2, 9), (3, 6), (4, 6), (5, 6)] {
        run_with_pass_rate(day(d), passed).write(dir.path()).unwrap();
    }

    let history = load_history(dir.path());
    let trend = TrendAnalyzer::default().report(&history, Utc::now());

    assert_eq!(trend.data_points.len(), 5);
    assert_eq!(trend.analysis.overall_trend, Trend::Declining);
    assert_eq!(
        trend.analysis.most_common_failure.as_ref().map(|b| b.bucket),
        Some(FailureBucket::AmountIncorrect)
    );
    assert_eq!(trend.analysis.worst_field.as_ref().unwrap().field, "goalAmount");

    trend.write(dir.path()).unwrap();
    assert!(dir.path().join(TREND_JSON).exists());
    let markdown = std::fs::read_to_string(dir.path().join(TREND_MARKDOWN)).unwrap();
    assert!(markdown.contains("Declining"));
}

#[test]
fn test_missing_history_is_neutral() {
    let dir = tempfile::tempdir().unwrap();
    let history = load_history(&dir.path().join("never-created"));
    let trend = TrendAnalyzer::default().report(&history, Utc::now());
    assert_eq!(trend.analysis.overall_trend, Trend::InsufficientData);
    assert!(trend.data_points.is_empty());

    let fragile = FragileReport::build(&history, 20, Utc::now());
    assert!(fragile.cases.is_empty());
}
