//! Domain errors raised while parsing, validating, and running algorithms.
//!
//! All errors use `thiserror`-derived enums with structured context so callers
//! can inspect the failure programmatically. I/O errors are wrapped in `Arc`
//! to satisfy the `result_large_err` Clippy lint.
//!
//! Parse and validation failures are recoverable per description unit or per
//! call. Nothing here is meant to take the host process down: every variant
//! degrades to "this algorithm failed to load" or "this job failed".

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// A description unit could not be turned into an algorithm descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    /// A line of the unit is malformed.
    #[error("malformed descriptor '{unit}' at line {line}: {message}")]
    Malformed {
        /// Name of the description unit (usually its file name).
        unit: String,
        /// One-based line number of the offending line.
        line: usize,
        /// Description of the problem.
        message: String,
    },

    /// A descriptor assembled in code violates a model invariant.
    #[error("inconsistent descriptor '{algorithm}': {message}")]
    Inconsistent {
        /// Display name of the algorithm.
        algorithm: String,
        /// Description of the problem.
        message: String,
    },
}

impl DescriptorError {
    pub(crate) fn malformed(unit: &str, line: usize, message: impl Into<String>) -> Self {
        Self::Malformed {
            unit: unit.to_owned(),
            line,
            message: message.into(),
        }
    }

    /// Returns the one-based line number the error points at, if any.
    #[must_use]
    pub const fn line(&self) -> Option<usize> {
        match self {
            Self::Malformed { line, .. } => Some(*line),
            Self::Inconsistent { .. } => None,
        }
    }
}

/// A caller-supplied value was rejected before any command was rendered.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required parameter has no value.
    #[error("missing value for required parameter '{key}'")]
    Missing {
        /// Parameter key.
        key: String,
    },

    /// A numeric value falls outside the declared bounds.
    #[error("value {value} for parameter '{key}' is outside [{}, {}]", bound(.minimum), bound(.maximum))]
    OutOfRange {
        /// Parameter key.
        key: String,
        /// The rejected value.
        value: f64,
        /// Declared lower bound.
        minimum: Option<f64>,
        /// Declared upper bound.
        maximum: Option<f64>,
    },

    /// A choice value matches none of the declared options.
    #[error("'{value}' is not a valid option for parameter '{key}' ({count} options declared)")]
    InvalidChoice {
        /// Parameter key.
        key: String,
        /// The rejected value, as text.
        value: String,
        /// Number of declared options.
        count: usize,
    },

    /// A value has the wrong shape for its parameter type.
    #[error("invalid value '{value}' for parameter '{key}': expected {expected}")]
    InvalidValue {
        /// Parameter key.
        key: String,
        /// The rejected value, as text.
        value: String,
        /// What the parameter accepts.
        expected: String,
    },
}

fn bound(value: &Option<f64>) -> String {
    value.map_or_else(|| String::from("unbounded"), |v| v.to_string())
}

impl ValidationError {
    /// Returns the key of the parameter that failed validation.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Missing { key }
            | Self::OutOfRange { key, .. }
            | Self::InvalidChoice { key, .. }
            | Self::InvalidValue { key, .. } => key,
        }
    }
}

/// Errors arising from algorithm discovery and execution.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// A description unit failed to parse.
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    /// A parameter value failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A command template references a key with no resolved value.
    #[error("algorithm '{algorithm}' references unresolved placeholder '{key}'")]
    UnresolvedPlaceholder {
        /// Internal algorithm name.
        algorithm: String,
        /// Placeholder key.
        key: String,
    },

    /// The requested algorithm is not registered.
    #[error("algorithm '{name}' not found in registry")]
    UnknownAlgorithm {
        /// Name that was looked up.
        name: String,
    },

    /// An algorithm with the same internal name is already registered.
    #[error("algorithm '{name}' is already registered")]
    DuplicateAlgorithm {
        /// Conflicting internal name.
        name: String,
    },

    /// The external tool could not be located or did not report a version.
    #[error("saga_cmd was not found or is not correctly installed")]
    ToolNotFound,

    /// The installed tool is older than the required minimum.
    #[error("unsupported saga_cmd version (found: {found}, required: >={required})")]
    UnsupportedVersion {
        /// Version reported by the tool.
        found: String,
        /// Minimum supported version.
        required: String,
    },

    /// The batch job process could not be started.
    #[error("failed to start '{program}': {source}")]
    ProcessSpawn {
        /// Program that was launched.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// Waiting for the batch job process failed.
    #[error("failed to wait for '{program}': {source}")]
    Wait {
        /// Program that was launched.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The batch script could not be written.
    #[error("failed to write batch script '{path}': {source}")]
    ScriptWrite {
        /// Script path (or its directory when no file was created yet).
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The per-job scratch directory could not be created.
    #[error("failed to create scratch space in '{path}': {source}")]
    ScratchSpace {
        /// Parent directory of the scratch space.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The description directory could not be read.
    #[error("failed to read description units from '{path}': {source}")]
    ReadDescriptors {
        /// Directory or file that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },
}
