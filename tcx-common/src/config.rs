//! Bootstrap configuration loading and setting resolution
//!
//! Every setting is resolved with the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file is never fatal: the resolver logs a warning and falls
//! through to compiled defaults. An explicitly requested file that does not
//! exist or does not parse is a configuration error.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Environment variable naming an explicit TOML config file
pub const ENV_CONFIG: &str = "TCX_CONFIG";
/// Environment variable overriding the report artifact directory
pub const ENV_REPORTS_DIR: &str = "TCX_REPORTS_DIR";
/// Environment variable overriding the dataset path
pub const ENV_DATASET: &str = "TCX_DATASET";
/// Environment variable overriding the parser identifier
pub const ENV_PARSER: &str = "TCX_PARSER";
/// Environment variable overriding the pass-rate floor
pub const ENV_MIN_PASS_RATE: &str = "TCX_MIN_PASS_RATE";
/// Environment variable overriding evaluation concurrency
pub const ENV_MAX_CONCURRENCY: &str = "TCX_MAX_CONCURRENCY";

/// Bootstrap configuration loaded from a TOML file
///
/// All fields are optional; anything absent falls through to the
/// environment or compiled defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Directory holding evaluation reports and trend artifacts
    #[serde(default)]
    pub reports_dir: Option<PathBuf>,

    /// Default labeled dataset (JSONL)
    #[serde(default)]
    pub dataset_path: Option<PathBuf>,

    /// Default parser identifier
    #[serde(default)]
    pub parser: Option<String>,

    /// Pass-rate floor below which the driver exits nonzero (0.0-1.0)
    #[serde(default)]
    pub min_pass_rate: Option<f64>,

    /// Maximum number of cases evaluated concurrently
    #[serde(default)]
    pub max_concurrency: Option<usize>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Additional parser registry entries (`[[parser_config]]` tables)
    ///
    /// Kept as raw tables; the parser registry owns their schema.
    #[serde(default, rename = "parser_config")]
    pub parser_configs: Vec<toml::Table>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Compiled default values used when no other source provides a setting
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub reports_dir: PathBuf,
    pub parser: String,
    pub min_pass_rate: f64,
    pub max_concurrency: usize,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn new() -> Self {
        let max_concurrency = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);

        Self {
            reports_dir: PathBuf::from("reports"),
            parser: "RuleBased_v1".to_string(),
            min_pass_rate: 0.70,
            max_concurrency,
            log_level: default_log_level(),
        }
    }
}

impl Default for CompiledDefaults {
    fn default() -> Self {
        Self::new()
    }
}

/// Default location of the user config file (`<config_dir>/tcx/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tcx").join("config.toml"))
}

/// Parse a TOML document into a [`TomlConfig`]
pub fn parse_toml_config(content: &str) -> Result<TomlConfig> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Load the TOML config file, if any
///
/// Priority: explicit path → `TCX_CONFIG` → default user config path.
/// Explicit and environment paths must exist; the default path is optional.
///
/// Returns the path that was loaded alongside the parsed config.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<Option<(PathBuf, TomlConfig)>> {
    let requested = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var(ENV_CONFIG).ok().map(PathBuf::from));

    if let Some(path) = requested {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            Error::Config(format!("Read TOML failed ({}): {}", path.display(), e))
        })?;
        let config = parse_toml_config(&content)?;
        info!("Loaded config from {}", path.display());
        return Ok(Some((path, config)));
    }

    match default_config_path() {
        Some(path) if path.exists() => {
            let content = std::fs::read_to_string(&path)?;
            let config = parse_toml_config(&content)?;
            info!("Loaded config from {}", path.display());
            Ok(Some((path, config)))
        }
        _ => {
            warn!("No config file found, using environment and compiled defaults");
            Ok(None)
        }
    }
}

/// Resolve one setting from CLI → ENV → TOML → default
///
/// Environment values that fail to parse are ignored with a warning.
pub fn resolve_setting<T>(cli: Option<T>, env_name: &str, toml: Option<T>, default: T) -> T
where
    T: FromStr,
{
    if let Some(value) = cli {
        debug!(setting = env_name, "Resolved from command line");
        return value;
    }

    if let Ok(raw) = std::env::var(env_name) {
        match raw.parse::<T>() {
            Ok(value) => {
                debug!(setting = env_name, "Resolved from environment");
                return value;
            }
            Err(_) => warn!(setting = env_name, value = %raw, "Ignoring unparseable environment value"),
        }
    }

    if let Some(value) = toml {
        debug!(setting = env_name, "Resolved from TOML");
        return value;
    }

    default
}

/// Command-line overrides handed to [`Settings::resolve`]
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub reports_dir: Option<PathBuf>,
    pub dataset_path: Option<PathBuf>,
    pub parser: Option<String>,
    pub min_pass_rate: Option<f64>,
    pub max_concurrency: Option<usize>,
}

/// Fully resolved evaluation settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub reports_dir: PathBuf,
    pub dataset_path: Option<PathBuf>,
    pub parser: String,
    pub min_pass_rate: f64,
    pub max_concurrency: usize,
    pub log_level: String,
}

impl Settings {
    /// Resolve every setting and validate ranges
    pub fn resolve(cli: &CliOverrides, toml: Option<&TomlConfig>) -> Result<Self> {
        let defaults = CompiledDefaults::new();

        let reports_dir = resolve_setting(
            cli.reports_dir.clone(),
            ENV_REPORTS_DIR,
            toml.and_then(|t| t.reports_dir.clone()),
            defaults.reports_dir,
        );

        let dataset_path = cli
            .dataset_path
            .clone()
            .or_else(|| std::env::var(ENV_DATASET).ok().map(PathBuf::from))
            .or_else(|| toml.and_then(|t| t.dataset_path.clone()));

        let parser = resolve_setting(
            cli.parser.clone(),
            ENV_PARSER,
            toml.and_then(|t| t.parser.clone()),
            defaults.parser,
        );

        let min_pass_rate = resolve_setting(
            cli.min_pass_rate,
            ENV_MIN_PASS_RATE,
            toml.and_then(|t| t.min_pass_rate),
            defaults.min_pass_rate,
        );

        let max_concurrency = resolve_setting(
            cli.max_concurrency,
            ENV_MAX_CONCURRENCY,
            toml.and_then(|t| t.max_concurrency),
            defaults.max_concurrency,
        );

        let log_level = toml
            .map(|t| t.logging.level.clone())
            .unwrap_or(defaults.log_level);

        let settings = Self {
            reports_dir,
            dataset_path,
            parser,
            min_pass_rate,
            max_concurrency,
            log_level,
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_pass_rate) {
            return Err(Error::Config(format!(
                "min_pass_rate must be within 0.0-1.0, got {}",
                self.min_pass_rate
            )));
        }
        if self.max_concurrency == 0 {
            return Err(Error::Config("max_concurrency must be at least 1".to_string()));
        }
        if self.parser.trim().is_empty() {
            return Err(Error::Config("parser identifier must not be empty".to_string()));
        }
        Ok(())
    }
}
