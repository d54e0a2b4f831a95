//! Tests for configuration resolution, loading and atomic writes
//!
//! Tests that manipulate NFO_EDITOR_CONFIG are marked with #[serial] so they
//! never observe each other's environment.

use nfo_common::config::{
    load_config, load_toml_config, resolve_config_path, write_toml_config, BatchConfig,
    LoggingConfig, TomlConfig, CONFIG_ENV_VAR,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_defaults_match_documented_limits() {
    let batch = BatchConfig::default();
    assert_eq!(batch.max_workers, 10);
    assert_eq!(batch.max_scan_depth, 50);
    assert_eq!(batch.max_files_per_batch, 2000);
    assert_eq!(batch.max_concurrent_tasks, 5);
    assert_eq!(batch.task_ttl_seconds, 1800);
    assert_eq!(batch.cleanup_interval, 100);
    assert_eq!(batch.error_tail, 10);

    let config = TomlConfig::default();
    assert_eq!(config.bind_address, "127.0.0.1");
    assert!(config.browse_root.is_none());
    assert_eq!(config.logging.level, "info");
}

#[test]
#[serial]
fn test_env_var_used_when_no_cli_arg() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/from-env.toml");

    let resolved = resolve_config_path(None, CONFIG_ENV_VAR);
    assert_eq!(resolved, Some(PathBuf::from("/tmp/from-env.toml")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_cli_arg_overrides_env_var() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/from-env.toml");
    let cli = PathBuf::from("/tmp/from-cli.toml");

    let resolved = resolve_config_path(Some(&cli), CONFIG_ENV_VAR);
    assert_eq!(resolved, Some(cli));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_explicit_missing_file_is_error() {
    env::remove_var(CONFIG_ENV_VAR);
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("nope.toml");

    let result = load_config(Some(&missing));
    assert!(result.is_err(), "explicitly named file must exist");
}

#[test]
fn test_load_partial_file_fills_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
bind_address = "0.0.0.0"
browse_root = "/media/library"

[logging]
level = "debug"

[batch]
max_concurrent_tasks = 2
"#,
    )
    .unwrap();

    let config = load_toml_config(&path).unwrap();
    assert_eq!(config.bind_address, "0.0.0.0");
    assert_eq!(config.browse_root, Some(PathBuf::from("/media/library")));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.batch.max_concurrent_tasks, 2);
    assert_eq!(config.batch.max_files_per_batch, 2000);
}

#[test]
fn test_malformed_file_reports_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.toml");
    std::fs::write(&path, "port = \"not a number\"").unwrap();

    let err = load_toml_config(&path).unwrap_err();
    assert!(err.to_string().contains("Configuration error"));
}

#[test]
fn test_atomic_write_leaves_no_temp_file() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("nested").join("config.toml");

    let config = TomlConfig {
        port: 9000,
        logging: LoggingConfig {
            level: "warn".to_string(),
        },
        ..TomlConfig::default()
    };

    write_toml_config(&config, &target).unwrap();

    assert!(target.exists());
    assert!(!target.with_extension("toml.tmp").exists());

    let reloaded = load_toml_config(&target).unwrap();
    assert_eq!(reloaded, config);
}
