//! tcx-eval: evaluation and regression harness for transcript parsers
//!
//! Scores a parser configuration against a labeled JSONL dataset, writes a
//! timestamped report per run, and analyzes the accumulated report history
//! for accuracy trends and chronically failing cases.
//!
//! # Modules
//! - **dataset** - labeled test case loading
//! - **scoring** - field comparators, weighted score, grades
//! - **buckets** - failure classification
//! - **runner** - concurrent, fault-isolated batch evaluation
//! - **report** - run report model and artifact I/O
//! - **trends** - pass-rate trend analysis across runs
//! - **fragile** - cases failing across multiple runs

pub mod buckets;
pub mod dataset;
pub mod error;
pub mod fragile;
pub mod report;
pub mod runner;
pub mod scoring;
pub mod trends;

pub use buckets::FailureBucket;
pub use dataset::{load_dataset, parse_dataset, TestCase};
pub use error::{DatasetError, ReportError};
pub use fragile::{FragileCaseRecord, FragileReport};
pub use report::EvaluationReport;
pub use runner::{EvaluationResult, EvaluationRunner};
pub use scoring::{FieldMatches, Grade};
pub use trends::{Trend, TrendAnalyzer, TrendDataPoint, TrendReport};
