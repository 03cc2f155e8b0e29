use std::env;
use std::path::PathBuf;

use dirs::data_dir;

use crate::options::{LogFormat, VersionPolicy};

/// Default log filter expression used by the binary.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Application folder under the per-user data directory.
pub const APPLICATION_DIR: &str = "saga-nextgen";

/// Sub-folder of [`APPLICATION_DIR`] receiving batch scripts.
pub const SCRIPT_SUBDIR: &str = "processing";

/// Default log filter expression used by the binary.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binary.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

/// Default reaction to an outdated tool.
#[must_use]
pub const fn default_version_policy() -> VersionPolicy {
    VersionPolicy::Warn
}

/// Directory used for batch scripts when none is configured.
///
/// Falls back to the system temporary directory when the platform has no
/// per-user data directory.
#[must_use]
pub fn default_script_dir() -> PathBuf {
    data_dir()
        .unwrap_or_else(env::temp_dir)
        .join(APPLICATION_DIR)
        .join(SCRIPT_SUBDIR)
}
