//! Enumerated settings that accept case-insensitive text.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Shape of the log lines written to stderr.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One flattened JSON object per event.
    Json,
    /// Terse single-line text for terminals.
    #[default]
    Compact,
}

/// Failure to read a [`LogFormat`] from text.
pub type LogFormatParseError = strum::ParseError;

/// Reaction to an installed `saga_cmd` older than the supported minimum.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum VersionPolicy {
    /// Log a warning and keep loading algorithms.
    #[default]
    Warn,
    /// Refuse to load algorithms.
    Abort,
}

/// Failure to read a [`VersionPolicy`] from text.
pub type VersionPolicyParseError = strum::ParseError;
