//! Tests for configuration loading and setting resolution
//!
//! Covers:
//! - Priority order CLI → ENV → TOML → compiled default
//! - Missing default TOML file is not fatal
//! - Explicit TOML path that does not exist is a configuration error
//! - Range validation of resolved settings
//!
//! Tests that manipulate TCX_* environment variables are marked #[serial]
//! so they never race each other.

use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;
use tcx_common::config::{
    load_toml_config, parse_toml_config, resolve_setting, CliOverrides, CompiledDefaults,
    Settings, ENV_CONFIG, ENV_MAX_CONCURRENCY, ENV_PARSER, ENV_REPORTS_DIR,
};
use tcx_common::Error;

fn clear_env() {
    for var in [
        ENV_CONFIG,
        ENV_REPORTS_DIR,
        ENV_PARSER,
        ENV_MAX_CONCURRENCY,
        "TCX_DATASET",
        "TCX_MIN_PASS_RATE",
    ] {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_defaults_when_nothing_configured() {
    clear_env();

    let settings = Settings::resolve(&CliOverrides::default(), None).unwrap();
    let defaults = CompiledDefaults::new();

    assert_eq!(settings.reports_dir, defaults.reports_dir);
    assert_eq!(settings.parser, "RuleBased_v1");
    assert!(settings.dataset_path.is_none());
    assert_eq!(settings.log_level, "info");
}

#[test]
#[serial]
fn test_toml_overrides_defaults() {
    clear_env();

    let toml = parse_toml_config(
        r#"
        reports_dir = "/srv/tcx/reports"
        parser = "RuleBased_v2_Tuned"
        max_concurrency = 3
        "#,
    )
    .unwrap();

    let settings = Settings::resolve(&CliOverrides::default(), Some(&toml)).unwrap();
    assert_eq!(settings.reports_dir, PathBuf::from("/srv/tcx/reports"));
    assert_eq!(settings.parser, "RuleBased_v2_Tuned");
    assert_eq!(settings.max_concurrency, 3);
}

#[test]
#[serial]
fn test_env_overrides_toml() {
    clear_env();
    env::set_var(ENV_PARSER, "RuleBased_v2_Strict");
    env::set_var(ENV_REPORTS_DIR, "/tmp/tcx-env-reports");

    let toml = parse_toml_config("parser = \"RuleBased_v2_Tuned\"").unwrap();
    let settings = Settings::resolve(&CliOverrides::default(), Some(&toml)).unwrap();

    assert_eq!(settings.parser, "RuleBased_v2_Strict");
    assert_eq!(settings.reports_dir, PathBuf::from("/tmp/tcx-env-reports"));

    clear_env();
}

#[test]
#[serial]
fn test_cli_overrides_env() {
    clear_env();
    env::set_var(ENV_PARSER, "RuleBased_v2_Strict");

    let cli = CliOverrides {
        parser: Some("RuleBased_v1".to_string()),
        ..Default::default()
    };
    let settings = Settings::resolve(&cli, None).unwrap();
    assert_eq!(settings.parser, "RuleBased_v1");

    clear_env();
}

#[test]
#[serial]
fn test_unparseable_env_value_is_ignored() {
    clear_env();
    env::set_var(ENV_MAX_CONCURRENCY, "lots");

    let value = resolve_setting::<usize>(None, ENV_MAX_CONCURRENCY, Some(5), 1);
    assert_eq!(value, 5);

    clear_env();
}

#[test]
#[serial]
fn test_invalid_pass_rate_rejected() {
    clear_env();

    let cli = CliOverrides {
        min_pass_rate: Some(1.5),
        ..Default::default()
    };
    let err = Settings::resolve(&cli, None).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
#[serial]
fn test_zero_concurrency_rejected() {
    clear_env();

    let cli = CliOverrides {
        max_concurrency: Some(0),
        ..Default::default()
    };
    assert!(Settings::resolve(&cli, None).is_err());
}

#[test]
#[serial]
fn test_explicit_toml_path_loads() {
    clear_env();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "parser = \"RuleBased_v2_Tuned\"").unwrap();
    writeln!(file, "[logging]").unwrap();
    writeln!(file, "level = \"debug\"").unwrap();

    let (path, config) = load_toml_config(Some(file.path())).unwrap().unwrap();
    assert_eq!(path, file.path());
    assert_eq!(config.parser.as_deref(), Some("RuleBased_v2_Tuned"));
    assert_eq!(config.logging.level, "debug");
}

#[test]
#[serial]
fn test_explicit_missing_toml_is_error() {
    clear_env();

    let result = load_toml_config(Some(std::path::Path::new("/nonexistent/tcx/config.toml")));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_env_config_path_is_used() {
    clear_env();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "min_pass_rate = 0.9").unwrap();
    env::set_var(ENV_CONFIG, file.path());

    let (_, config) = load_toml_config(None).unwrap().unwrap();
    assert_eq!(config.min_pass_rate, Some(0.9));

    clear_env();
}
