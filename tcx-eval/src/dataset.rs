//! Labeled dataset loading
//!
//! One JSON object per line (JSONL). Blank lines are skipped; any malformed
//! line aborts loading with its 1-based line number.

use crate::error::DatasetError;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tcx_parse::validation::parse_amount;
use tracing::info;

/// One labeled dataset record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub id: String,
    #[serde(default)]
    pub description: String,
    pub transcript_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    pub expected: ExpectedFields,
    #[serde(default)]
    pub strictness: Strictness,
}

/// Ground-truth field values
///
/// Category and urgency are kept as written; comparators fold synonyms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedFields {
    #[serde(default)]
    pub name: Option<String>,
    pub category: String,
    pub urgency_level: String,
    #[serde(default, deserialize_with = "deserialize_goal_amount")]
    pub goal_amount: Option<f64>,
    #[serde(default)]
    pub missing_fields: Vec<String>,
    #[serde(default)]
    pub beneficiary_relationship: Option<String>,
}

/// Per-case comparison overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Strictness {
    /// Fraction of expected (≤ 1.0) or absolute dollars (> 1.0)
    #[serde(default)]
    pub amount_tolerance: Option<f64>,
    #[serde(default)]
    pub allow_fuzzy_name: bool,
    /// Additional acceptable categories
    #[serde(default)]
    pub category_synonyms: Vec<String>,
}

/// `goalAmount` as a number, a numeric string, or null
fn deserialize_goal_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawAmount {
        Number(f64),
        Text(String),
    }

    match Option::<RawAmount>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawAmount::Number(value)) => Ok(Some(value)),
        Some(RawAmount::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(RawAmount::Text(text)) => parse_amount(&text)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid goalAmount '{}'", text))),
    }
}

/// Parse JSONL content into test cases
pub fn parse_dataset(content: &str) -> Result<Vec<TestCase>, DatasetError> {
    let mut cases = Vec::new();
    let mut seen = HashSet::new();

    for (index, line) in content.lines().enumerate() {
        let line_number = index + 1;
        if line.trim().is_empty() {
            continue;
        }

        let case: TestCase = serde_json::from_str(line).map_err(|source| DatasetError::Malformed {
            line: line_number,
            source,
        })?;

        if !seen.insert(case.id.clone()) {
            return Err(DatasetError::DuplicateId {
                id: case.id,
                line: line_number,
            });
        }
        cases.push(case);
    }

    if cases.is_empty() {
        return Err(DatasetError::Empty);
    }
    Ok(cases)
}

/// Load a JSONL dataset file
pub fn load_dataset(path: &Path) -> Result<Vec<TestCase>, DatasetError> {
    let content = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let cases = parse_dataset(&content)?;
    info!(path = %path.display(), cases = cases.len(), "Loaded dataset");
    Ok(cases)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CASE: &str = r#"{"id":"tc-001","description":"basic","transcriptText":"Hi, my name is John Smith and I need $5,000","expected":{"name":"John Smith","category":"HEALTHCARE","urgencyLevel":"HIGH","goalAmount":5000,"missingFields":[],"beneficiaryRelationship":"myself"}}"#;

    #[test]
    fn test_parse_case_with_defaults() {
        let cases = parse_dataset(CASE).unwrap();
        assert_eq!(cases.len(), 1);
        let case = &cases[0];
        assert_eq!(case.expected.goal_amount, Some(5000.0));
        assert_eq!(case.expected.name.as_deref(), Some("John Smith"));
        assert!(!case.strictness.allow_fuzzy_name);
        assert!(case.strictness.amount_tolerance.is_none());
        assert!(case.difficulty.is_none());
    }

    #[test]
    fn test_goal_amount_forms() {
        let string = CASE.replace("\"goalAmount\":5000", "\"goalAmount\":\"$2,500\"");
        assert_eq!(parse_dataset(&string).unwrap()[0].expected.goal_amount, Some(2500.0));

        let null = CASE.replace("\"goalAmount\":5000", "\"goalAmount\":null");
        assert_eq!(parse_dataset(&null).unwrap()[0].expected.goal_amount, None);

        let absent = CASE.replace("\"goalAmount\":5000,", "");
        assert_eq!(parse_dataset(&absent).unwrap()[0].expected.goal_amount, None);

        let garbage = CASE.replace("\"goalAmount\":5000", "\"goalAmount\":\"lots\"");
        assert!(parse_dataset(&garbage).is_err());
    }

    #[test]
    fn test_blank_lines_skipped_and_bad_line_named() {
        let second = CASE.replace("tc-001", "tc-002");
        let content = format!("{}\n\n   \n{}\n", CASE, second);
        assert_eq!(parse_dataset(&content).unwrap().len(), 2);

        let content = format!("{}\n\n{{not json}}\n", CASE);
        match parse_dataset(&content) {
            Err(DatasetError::Malformed { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected malformed line error, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let content = format!("{}\n{}", CASE, CASE);
        assert!(matches!(
            parse_dataset(&content),
            Err(DatasetError::DuplicateId { line: 2, .. })
        ));
    }

    #[test]
    fn test_empty_dataset_rejected() {
        assert!(matches!(parse_dataset("\n\n"), Err(DatasetError::Empty)));
    }
}
