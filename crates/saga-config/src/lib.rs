//! Shared configuration for the saga-nextgen tooling.
//!
//! Settings are layered by `ortho_config`: built-in defaults, then a TOML
//! file (`--config-path` or `SAGANG_CONFIG_PATH`), then `SAGANG_*`
//! environment variables, then command-line flags. Blank path settings mean
//! "not configured" so every layer can reset a value inherited from below.

mod defaults;
mod options;

use std::path::PathBuf;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use self::defaults::{
    APPLICATION_DIR, DEFAULT_LOG_FILTER, SCRIPT_SUBDIR, default_log_filter,
    default_log_filter_string, default_log_format, default_script_dir, default_version_policy,
};
pub use self::options::{LogFormat, LogFormatParseError, VersionPolicy, VersionPolicyParseError};

/// Resolved configuration for the provider and its command-line surface.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "SAGANG")]
pub struct Config {
    /// Tool install folder. Empty means auto-detect.
    #[serde(default)]
    #[ortho_config(default = String::new())]
    pub saga_folder: String,
    /// Log rendered commands before running them. Unset means enabled.
    #[serde(default)]
    pub log_commands: Option<bool>,
    /// Log the console output after a run. Unset means enabled.
    #[serde(default)]
    pub log_console: Option<bool>,
    /// Opaque flag forwarded to the provider settings.
    #[serde(default)]
    #[ortho_config(default = false)]
    pub import_export_optimization: bool,
    /// Host application prefix used by auto-detection.
    #[serde(default)]
    #[ortho_config(default = String::new())]
    pub host_prefix: String,
    /// Directory for batch scripts. Empty means the per-user data folder.
    #[serde(default)]
    #[ortho_config(default = String::new())]
    pub script_dir: String,
    /// Reaction to an outdated tool.
    #[serde(default = "default_version_policy")]
    #[ortho_config(default = default_version_policy())]
    pub version_policy: VersionPolicy,
    /// `tracing` filter expression.
    #[serde(default = "default_log_filter_string")]
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Log output format.
    #[serde(default = "default_log_format")]
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            saga_folder: String::new(),
            log_commands: None,
            log_console: None,
            import_export_optimization: false,
            host_prefix: String::new(),
            script_dir: String::new(),
            version_policy: default_version_policy(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Returns the configured install folder, or `None` for auto-detection.
    #[must_use]
    pub fn saga_folder_path(&self) -> Option<PathBuf> {
        non_blank(&self.saga_folder)
    }

    /// Returns the host prefix, or `None` when unset.
    #[must_use]
    pub fn host_prefix_path(&self) -> Option<PathBuf> {
        non_blank(&self.host_prefix)
    }

    /// Returns the batch script directory, applying the default when unset.
    #[must_use]
    pub fn script_dir_path(&self) -> PathBuf {
        non_blank(&self.script_dir).unwrap_or_else(default_script_dir)
    }

    /// Returns whether rendered commands are logged before a run.
    #[must_use]
    pub fn log_commands(&self) -> bool {
        self.log_commands.unwrap_or(true)
    }

    /// Returns whether the console output is logged after a run.
    #[must_use]
    pub fn log_console(&self) -> bool {
        self.log_console.unwrap_or(true)
    }

    /// Returns the log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Returns the log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

fn non_blank(value: &str) -> Option<PathBuf> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
}
