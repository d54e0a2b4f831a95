//! Configuration loading and resolution
//!
//! Bootstrap configuration comes from a single TOML file. Every field has a
//! built-in default, so a missing file is never fatal.
//!
//! Config file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. Platform config directory (`<config_dir>/nfo-editor/config.toml`)
//! 4. Built-in defaults (no file)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "NFO_EDITOR_CONFIG";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Address the HTTP server binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Restrict every requested path to this directory (optional)
    #[serde(default)]
    pub browse_root: Option<PathBuf>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Batch engine limits
    #[serde(default)]
    pub batch: BatchConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Batch engine and task registry limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Worker threads shared by every preview/apply
    pub max_workers: usize,
    /// Directory nesting ceiling for batch scans
    pub max_scan_depth: usize,
    /// Candidate file ceiling per batch
    pub max_files_per_batch: usize,
    /// Live task ceiling in the registry
    pub max_concurrent_tasks: usize,
    /// Task time-to-live in seconds
    pub task_ttl_seconds: u64,
    /// Run a TTL sweep every N successful adds
    pub cleanup_interval: u64,
    /// Number of recent errors included in status reports
    pub error_tail: usize,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            browse_root: None,
            logging: LoggingConfig::default(),
            batch: BatchConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_workers: 10,
            max_scan_depth: 50,
            max_files_per_batch: 2000,
            max_concurrent_tasks: 5,
            task_ttl_seconds: 1800,
            cleanup_interval: 100,
            error_tail: 10,
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5730
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Resolve which config file to read, if any
///
/// Returns `None` when neither an explicit path nor the platform default
/// file exists; callers then fall back to `TomlConfig::default()`.
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    let user_config = default_config_path()?;
    if user_config.exists() {
        Some(user_config)
    } else {
        None
    }
}

/// Platform default config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("nfo-editor").join("config.toml"))
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load configuration with graceful degradation
///
/// An explicitly named file that cannot be read is an error. The platform
/// default file is optional: problems there log a warning and yield defaults.
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    let explicit = cli_arg.is_some()
        || std::env::var(CONFIG_ENV_VAR)
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false);

    match resolve_config_path(cli_arg, CONFIG_ENV_VAR) {
        Some(path) if explicit => load_toml_config(&path),
        Some(path) => match load_toml_config(&path) {
            Ok(config) => Ok(config),
            Err(e) => {
                warn!("{}; using built-in defaults", e);
                Ok(TomlConfig::default())
            }
        },
        None => {
            info!("No config file found, using built-in defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Write a config file atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, target: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let temp_path = target.with_extension("toml.tmp");
    std::fs::write(&temp_path, content)?;
    std::fs::rename(&temp_path, target)?;

    Ok(())
}
