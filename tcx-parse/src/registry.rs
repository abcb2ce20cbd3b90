//! Parser Version Registry
//!
//! Maps configuration identifiers to validated `ParserConfig`s. Resolution is
//! a pure lookup: an unregistered identifier is an error naming every valid
//! identifier, and no default is ever substituted.
//!
//! # Built-in Configurations
//! - `RuleBased_v1` - pattern engine baseline
//! - `RuleBased_v2_Tuned` - baseline + precision tuning
//! - `RuleBased_v2_Strict` - baseline with tolerance 0.05 and pass threshold 0.85
//! - `ExternalReasoner_v1` - external backend (requires an injected provider)

use crate::engine::RuleEngine;
use crate::tuner::DEFAULT_CORRECTION_CAP;
use crate::types::TranscriptParser;
use crate::validation::AmountBounds;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tcx_common::config::TomlConfig;
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_AMOUNT_TOLERANCE: f64 = 0.10;
pub const DEFAULT_PASS_THRESHOLD: f64 = 0.75;

// ============================================================================
// Configuration Types
// ============================================================================

/// Configuration lookup or validation failure
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Requested identifier is not registered
    #[error("Unknown parser '{requested}'. Available parsers: {}", .available.join(", "))]
    UnknownParser {
        requested: String,
        available: Vec<String>,
    },

    /// Configuration failed validation
    #[error("Invalid parser config '{id}': {reason}")]
    InvalidConfig { id: String, reason: String },

    /// Identifier already registered
    #[error("Parser '{0}' is already registered")]
    DuplicateParser(String),

    /// Backend cannot be constructed
    #[error("Parser '{id}' requires the {backend} backend, but no provider was supplied")]
    BackendUnavailable { id: String, backend: ParserBackend },

    /// TOML document could not be parsed
    #[error("Parser config TOML error: {0}")]
    Toml(String),
}

/// Engine backing a configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParserBackend {
    /// Built-in rule engine
    #[default]
    Pattern,
    /// Injected external reasoning provider
    External,
}

impl fmt::Display for ParserBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParserBackend::Pattern => f.pad("pattern"),
            ParserBackend::External => f.pad("external"),
        }
    }
}

/// Optional behaviors layered on the baseline engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enhancements {
    /// Run the precision tuner on the urgency score
    #[serde(default)]
    pub precision_tuning: bool,
    /// Normalize informal first names
    #[serde(default = "default_true")]
    pub nickname_expansion: bool,
    /// Cap on Σ|adjustment| per transcript (0.0-1.0]
    #[serde(default = "default_correction_cap")]
    pub correction_cap: f64,
}

fn default_true() -> bool {
    true
}

fn default_correction_cap() -> f64 {
    DEFAULT_CORRECTION_CAP
}

fn default_amount_tolerance() -> f64 {
    DEFAULT_AMOUNT_TOLERANCE
}

fn default_pass_threshold() -> f64 {
    DEFAULT_PASS_THRESHOLD
}

impl Default for Enhancements {
    fn default() -> Self {
        Self {
            precision_tuning: false,
            nickname_expansion: true,
            correction_cap: DEFAULT_CORRECTION_CAP,
        }
    }
}

/// A named, versioned engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Registry identifier (e.g. `RuleBased_v1`)
    pub id: String,
    /// Parser family the identifier belongs to
    pub system: String,
    pub version: String,
    #[serde(default)]
    pub backend: ParserBackend,
    pub description: String,
    /// Default amount tolerance (fraction of expected) for evaluation
    #[serde(default = "default_amount_tolerance")]
    pub amount_tolerance: f64,
    /// Minimum weighted score for a case to pass
    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: f64,
    #[serde(default)]
    pub amount_bounds: AmountBounds,
    #[serde(default)]
    pub enhancements: Enhancements,
}

impl ParserConfig {
    /// Pattern-engine baseline shared by the built-in rule configurations
    fn rule_based(id: &str, version: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            system: "RuleBased".to_string(),
            version: version.to_string(),
            backend: ParserBackend::Pattern,
            description: description.to_string(),
            amount_tolerance: DEFAULT_AMOUNT_TOLERANCE,
            pass_threshold: DEFAULT_PASS_THRESHOLD,
            amount_bounds: AmountBounds::default(),
            enhancements: Enhancements::default(),
        }
    }

    /// Check completeness and ranges
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let invalid = |reason: String| ConfigurationError::InvalidConfig {
            id: self.id.clone(),
            reason,
        };

        for (field, value) in [
            ("id", &self.id),
            ("system", &self.system),
            ("version", &self.version),
            ("description", &self.description),
        ] {
            if value.trim().is_empty() {
                return Err(invalid(format!("{} must not be empty", field)));
            }
        }

        let in_unit = |v: f64| v > 0.0 && v <= 1.0;
        if !in_unit(self.amount_tolerance) {
            return Err(invalid(format!(
                "amount_tolerance must be within (0, 1], got {}",
                self.amount_tolerance
            )));
        }
        if !in_unit(self.pass_threshold) {
            return Err(invalid(format!(
                "pass_threshold must be within (0, 1], got {}",
                self.pass_threshold
            )));
        }
        if !in_unit(self.enhancements.correction_cap) {
            return Err(invalid(format!(
                "correction_cap must be within (0, 1], got {}",
                self.enhancements.correction_cap
            )));
        }

        let bounds = &self.amount_bounds;
        if !(bounds.min.is_finite() && bounds.max.is_finite() && bounds.min > 0.0 && bounds.min < bounds.max) {
            return Err(invalid(format!(
                "amount bounds must satisfy 0 < min < max, got [{}, {}]",
                bounds.min, bounds.max
            )));
        }

        Ok(())
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Registered parser configurations, keyed by identifier
#[derive(Debug, Clone, Default)]
pub struct ParserRegistry {
    configs: BTreeMap<String, ParserConfig>,
}

impl ParserRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in configurations
    pub fn builtin() -> Self {
        let baseline = ParserConfig::rule_based(
            "RuleBased_v1",
            "1.0.0",
            "Pattern engine baseline",
        );

        let mut tuned = ParserConfig::rule_based(
            "RuleBased_v2_Tuned",
            "2.0.0",
            "Pattern engine baseline with precision tuning of the urgency score",
        );
        tuned.enhancements.precision_tuning = true;

        let mut strict = ParserConfig::rule_based(
            "RuleBased_v2_Strict",
            "2.0.0",
            "Pattern engine baseline evaluated with strict tolerances",
        );
        strict.amount_tolerance = 0.05;
        strict.pass_threshold = 0.85;

        let mut external = ParserConfig::rule_based(
            "ExternalReasoner_v1",
            "1.0.0",
            "External reasoning backend supplied by the caller",
        );
        external.system = "ExternalReasoner".to_string();
        external.backend = ParserBackend::External;

        let mut registry = Self::new();
        for config in [baseline, tuned, strict, external] {
            registry.configs.insert(config.id.clone(), config);
        }
        registry
    }

    /// Resolve an identifier to its configuration
    ///
    /// # Errors
    /// `ConfigurationError::UnknownParser` listing the sorted valid identifiers.
    pub fn resolve(&self, id: &str) -> Result<ParserConfig, ConfigurationError> {
        match self.configs.get(id) {
            Some(config) => {
                debug!(parser = id, system = %config.system, "Resolved parser config");
                Ok(config.clone())
            }
            None => Err(ConfigurationError::UnknownParser {
                requested: id.to_string(),
                available: self.identifiers(),
            }),
        }
    }

    /// Validate and add a configuration
    pub fn register(&mut self, config: ParserConfig) -> Result<(), ConfigurationError> {
        config.validate()?;
        if self.configs.contains_key(&config.id) {
            return Err(ConfigurationError::DuplicateParser(config.id));
        }
        info!(parser = %config.id, system = %config.system, "Registered parser config");
        self.configs.insert(config.id.clone(), config);
        Ok(())
    }

    /// Sorted registered identifiers
    pub fn identifiers(&self) -> Vec<String> {
        self.configs.keys().cloned().collect()
    }

    /// Identifiers grouped by system
    pub fn systems(&self) -> BTreeMap<String, Vec<String>> {
        let mut systems: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for config in self.configs.values() {
            systems
                .entry(config.system.clone())
                .or_default()
                .push(config.id.clone());
        }
        systems
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// Register every `[[parser_config]]` table of a TOML document
    ///
    /// Returns the identifiers added.
    pub fn extend_from_toml(&mut self, content: &str) -> Result<Vec<String>, ConfigurationError> {
        #[derive(Deserialize)]
        struct Document {
            #[serde(default)]
            parser_config: Vec<toml::Table>,
        }

        let document: Document =
            toml::from_str(content).map_err(|e| ConfigurationError::Toml(e.to_string()))?;
        self.extend_from_tables(&document.parser_config)
    }

    /// Register the `[[parser_config]]` tables of a loaded bootstrap config
    pub fn extend_from_config(&mut self, config: &TomlConfig) -> Result<Vec<String>, ConfigurationError> {
        self.extend_from_tables(&config.parser_configs)
    }

    /// Register already-parsed parser tables
    pub fn extend_from_tables(&mut self, tables: &[toml::Table]) -> Result<Vec<String>, ConfigurationError> {
        let mut added = Vec::with_capacity(tables.len());
        for table in tables {
            let config: ParserConfig = toml::Value::Table(table.clone())
                .try_into()
                .map_err(|e: toml::de::Error| ConfigurationError::Toml(e.to_string()))?;
            added.push(config.id.clone());
            self.register(config)?;
        }
        Ok(added)
    }
}

/// Construct the parser for a configuration
///
/// Pattern configurations get a `RuleEngine`. External configurations get the
/// injected provider, or `BackendUnavailable` when none is supplied; the rule
/// engine never stands in for them.
pub fn build_parser(
    config: &ParserConfig,
    external: Option<Arc<dyn TranscriptParser>>,
) -> Result<Arc<dyn TranscriptParser>, ConfigurationError> {
    config.validate()?;
    match config.backend {
        ParserBackend::Pattern => Ok(Arc::new(RuleEngine::new(config.clone()))),
        ParserBackend::External => external.ok_or_else(|| ConfigurationError::BackendUnavailable {
            id: config.id.clone(),
            backend: config.backend,
        }),
    }
}
