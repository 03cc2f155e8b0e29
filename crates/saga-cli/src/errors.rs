//! Error types for the CLI runtime.

use std::io;
use std::sync::Arc;

use saga_processing::ProcessingError;
use thiserror::Error;

use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error(transparent)]
    Processing(#[from] ProcessingError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("expected KEY=VALUE, found '{argument}'")]
    InvalidAssignment { argument: String },
    #[error("saga_cmd was not found or is not correctly installed")]
    ToolNotFound,
    #[error("algorithm '{algorithm}' failed ({status})")]
    JobFailed { algorithm: String, status: String },
    #[error("failed to write output: {0}")]
    Write(io::Error),
}
