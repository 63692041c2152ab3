//! Configuration loading tests
//!
//! Tests that manipulate MPA_CONFIG are marked with #[serial] so they do not race
//! each other on the process environment.

use mpa_common::config::{resolve_config_path, CollectorConfig, ThreadCheck, CONFIG_ENV_VAR};
use mpa_common::Error;
use serial_test::serial;
use std::env;
use std::io::Write;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_load_from_explicit_path() {
    env::remove_var(CONFIG_ENV_VAR);
    let file = write_config("thread_check = \"strict\"\nlegacy_callbacks = false\n");

    let config = CollectorConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.thread_check, ThreadCheck::Strict);
    assert!(!config.legacy_callbacks);
}

#[test]
#[serial]
fn test_env_var_used_when_no_cli_path() {
    let file = write_config("context_name = \"from-env\"\n");
    env::set_var(CONFIG_ENV_VAR, file.path());

    assert_eq!(resolve_config_path(None), Some(file.path().to_path_buf()));
    let config = CollectorConfig::load(None).unwrap();
    assert_eq!(config.context_name, "from-env");

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_cli_path_beats_env_var() {
    let env_file = write_config("context_name = \"from-env\"\n");
    let cli_file = write_config("context_name = \"from-cli\"\n");
    env::set_var(CONFIG_ENV_VAR, env_file.path());

    let config = CollectorConfig::load(Some(cli_file.path())).unwrap();
    assert_eq!(config.context_name, "from-cli");

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_missing_file_falls_back_to_defaults() {
    env::remove_var(CONFIG_ENV_VAR);
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does-not-exist.toml");

    let config = CollectorConfig::load(Some(&missing)).unwrap();
    assert_eq!(config, CollectorConfig::default());
}

#[test]
#[serial]
fn test_malformed_file_is_an_error() {
    env::remove_var(CONFIG_ENV_VAR);
    let file = write_config("legacy_callbacks = \"not a bool\"\n");

    let result = CollectorConfig::load(Some(file.path()));
    assert!(matches!(result, Err(Error::Toml(_))));
}
