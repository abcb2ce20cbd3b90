//! tcx-eval - transcript parser evaluation driver
//!
//! Subcommands:
//! - `evaluate` - score a parser against a labeled dataset and write a report
//! - `trends` - analyze pass-rate trends across stored reports
//! - `fragile` - list cases failing in multiple stored reports
//! - `parsers` - list registered parser configurations
//! - `extract` - run one parser on a transcript and print the output

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tcx_common::config::{load_toml_config, CliOverrides, Settings, TomlConfig};
use tcx_eval::fragile::{FragileReport, DEFAULT_TOP_N};
use tcx_eval::report::load_history;
use tcx_eval::trends::{DEFAULT_DEADBAND, DEFAULT_WINDOW};
use tcx_eval::{load_dataset, EvaluationReport, EvaluationRunner, TrendAnalyzer};
use tcx_parse::{build_parser, ParserRegistry};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for tcx-eval
#[derive(Parser, Debug)]
#[command(name = "tcx-eval")]
#[command(about = "Evaluation harness for transcript campaign parsers")]
#[command(version)]
struct Args {
    /// TOML config file (overrides TCX_CONFIG and the user config path)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score a parser against a labeled JSONL dataset
    Evaluate {
        /// Labeled dataset (JSONL)
        #[arg(long)]
        dataset: Option<PathBuf>,

        /// Parser configuration identifier
        #[arg(long)]
        parser: Option<String>,

        /// Directory for report artifacts
        #[arg(long)]
        reports_dir: Option<PathBuf>,

        /// Exit nonzero when the pass rate falls below this value (0.0-1.0)
        #[arg(long)]
        min_pass_rate: Option<f64>,

        /// Maximum cases evaluated concurrently
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Analyze pass-rate trends across stored reports
    Trends {
        #[arg(long)]
        reports_dir: Option<PathBuf>,

        /// Number of recent runs compared against the earlier ones
        #[arg(long, default_value_t = DEFAULT_WINDOW)]
        window: usize,

        /// Pass-rate change treated as noise (0.05 = 5 percentage points)
        #[arg(long, default_value_t = DEFAULT_DEADBAND)]
        deadband: f64,
    },

    /// List cases that failed in more than one stored report
    Fragile {
        #[arg(long)]
        reports_dir: Option<PathBuf>,

        /// Maximum number of cases listed
        #[arg(long, default_value_t = DEFAULT_TOP_N)]
        top: usize,
    },

    /// List registered parser configurations grouped by system
    Parsers,

    /// Run one parser on a transcript and print the extraction as JSON
    Extract {
        #[arg(long)]
        parser: Option<String>,

        /// Transcript text
        text: String,
    },
}

fn init_tracing(toml: Option<&TomlConfig>) {
    let default_filter = match toml.map(|t| t.logging.level.as_str()) {
        Some(level) => format!("tcx_eval={level},tcx_parse={level},tcx_common={level}"),
        None => "tcx_eval=info,tcx_parse=info".to_string(),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Built-in parser configurations plus any declared in the TOML file
fn build_registry(toml: Option<&TomlConfig>) -> Result<ParserRegistry> {
    let mut registry = ParserRegistry::builtin();
    if let Some(toml) = toml {
        let added = registry
            .extend_from_config(toml)
            .context("Failed to register parser configs from TOML")?;
        if !added.is_empty() {
            info!(parsers = ?added, "Registered parser configs from TOML");
        }
    }
    Ok(registry)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let loaded = load_toml_config(args.config.as_deref()).context("Failed to load config file")?;
    let toml = loaded.as_ref().map(|(_, config)| config);
    init_tracing(toml);
    if let Some((path, _)) = &loaded {
        info!("Using config file {}", path.display());
    }

    let registry = build_registry(toml)?;

    match args.command {
        Command::Evaluate {
            dataset,
            parser,
            reports_dir,
            min_pass_rate,
            concurrency,
        } => {
            let overrides = CliOverrides {
                reports_dir,
                dataset_path: dataset,
                parser,
                min_pass_rate,
                max_concurrency: concurrency,
            };
            let settings = Settings::resolve(&overrides, toml).context("Invalid settings")?;
            evaluate(&registry, &settings).await
        }
        Command::Trends {
            reports_dir,
            window,
            deadband,
        } => {
            let settings = resolve_reports_only(reports_dir, toml)?;
            let analyzer = TrendAnalyzer::with_window(window).with_deadband(deadband);
            trends(&settings.reports_dir, &analyzer)
        }
        Command::Fragile { reports_dir, top } => {
            let settings = resolve_reports_only(reports_dir, toml)?;
            fragile(&settings.reports_dir, top)
        }
        Command::Parsers => {
            for (system, ids) in registry.systems() {
                println!("{}", system);
                for id in ids {
                    let config = registry.resolve(&id)?;
                    println!("  {:<24} {:<8} {:<9} {}", id, config.version, config.backend, config.description);
                }
            }
            Ok(())
        }
        Command::Extract { parser, text } => {
            let overrides = CliOverrides {
                parser,
                ..CliOverrides::default()
            };
            let settings = Settings::resolve(&overrides, toml).context("Invalid settings")?;
            let config = registry.resolve(&settings.parser)?;
            let parser = build_parser(&config, None)?;
            let output = parser.parse(&text)?;
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
    }
}

fn resolve_reports_only(reports_dir: Option<PathBuf>, toml: Option<&TomlConfig>) -> Result<Settings> {
    let overrides = CliOverrides {
        reports_dir,
        ..CliOverrides::default()
    };
    Settings::resolve(&overrides, toml).context("Invalid settings")
}

async fn evaluate(registry: &ParserRegistry, settings: &Settings) -> Result<()> {
    let dataset_path = settings
        .dataset_path
        .as_deref()
        .context("No dataset given: pass --dataset, set TCX_DATASET or dataset_path in the config file")?;

    // Resolve before loading anything so an unknown identifier fails fast
    let config = registry.resolve(&settings.parser)?;
    let parser = build_parser(&config, None)?;

    let cases = load_dataset(dataset_path)
        .with_context(|| format!("Failed to load dataset {}", dataset_path.display()))?;

    let runner = EvaluationRunner::new(parser, config.clone()).with_concurrency(settings.max_concurrency);
    let results = runner.run(cases).await;

    let report = EvaluationReport::build(&config.id, tcx_common::time::now(), results);
    let path = report
        .write(&settings.reports_dir)
        .context("Failed to write evaluation report")?;

    let summary = &report.summary;
    println!(
        "{}: {}/{} passed ({:.1}%), avg confidence {:.2}, avg {:.2} ms/case",
        config.id,
        summary.pass_count,
        summary.total_cases,
        summary.pass_rate * 100.0,
        summary.avg_confidence,
        summary.avg_execution_time_ms
    );
    for bucket in report.failure_buckets.iter().take(5) {
        println!("  {:<28} {}", bucket.bucket.as_str(), bucket.count);
    }
    for recommendation in &report.recommendations {
        println!("  - {}", recommendation);
    }
    println!("Report: {}", path.display());

    if summary.pass_rate < settings.min_pass_rate {
        bail!(
            "Pass rate {:.1}% is below the required {:.1}%",
            summary.pass_rate * 100.0,
            settings.min_pass_rate * 100.0
        );
    }
    Ok(())
}

fn trends(reports_dir: &Path, analyzer: &TrendAnalyzer) -> Result<()> {
    let history = load_history(reports_dir);
    let report = analyzer.report(&history, tcx_common::time::now());
    let (json, markdown) = report
        .write(reports_dir)
        .context("Failed to write trend artifacts")?;

    println!("Runs analyzed: {}", report.data_points.len());
    println!("Overall trend: {}", report.analysis.overall_trend);
    for rec in &report.analysis.recommendations {
        println!("  [{:?}] {}", rec.priority, rec.message);
    }
    println!("Artifacts: {}, {}", json.display(), markdown.display());
    Ok(())
}

fn fragile(reports_dir: &Path, top: usize) -> Result<()> {
    let history = load_history(reports_dir);
    let report = FragileReport::build(&history, top, tcx_common::time::now());
    let (json, markdown) = report
        .write(reports_dir)
        .context("Failed to write fragile-case artifacts")?;

    println!("Reports analyzed: {}", report.reports_analyzed);
    for case in &report.cases {
        println!("  {:<24} failed {} times", case.case_id, case.failure_count);
    }
    println!("Artifacts: {}, {}", json.display(), markdown.display());
    Ok(())
}
