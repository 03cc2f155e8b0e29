//! Descriptor-driven integration of the `saga_cmd` geoprocessing tool.
//!
//! Algorithms are declared in plain-text description units. Each unit is
//! parsed into an [`AlgorithmDescriptor`] holding typed parameters and one
//! or more command templates. A run validates caller values against the
//! parameters, renders the templates into `saga_cmd` arguments, writes them
//! into a platform batch script and supervises that script while it runs,
//! turning its console output into progress and log lines.
//!
//! # Architecture
//!
//! The [`SagaProvider`] owns everything a host needs: the settings, the
//! located tool installation, the cached tool version and the
//! [`AlgorithmRegistry`]. Child processes are started through the
//! [`ProcessSpawner`](process::ProcessSpawner) trait, so every layer above it
//! can be exercised without the external tool.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use saga_processing::feedback::TracingFeedback;
//! use saga_processing::{ParameterValues, ProviderSettings, SagaProvider};
//!
//! let mut provider = SagaProvider::new(ProviderSettings::default());
//! provider.load_algorithms(Path::new("/usr/share/saga-nextgen/description"))?;
//!
//! let values = ParameterValues::new()
//!     .with("DEM", "/data/dem.sdat")
//!     .with("RESULT", "/data/filled.sdat");
//! let outcome = provider.run("fillsinks", &values, &mut TracingFeedback)?;
//! assert!(outcome.success);
//! # Ok::<(), saga_processing::ProcessingError>(())
//! ```

pub mod builtin;
pub mod command;
pub mod descriptor;
pub mod discovery;
pub mod error;
pub mod feedback;
pub mod parameter;
pub mod process;
pub mod provider;
pub mod registry;
pub mod script;
pub mod supervisor;
pub mod version;

#[cfg(test)]
mod tests;

pub use self::command::CommandBuilder;
pub use self::descriptor::{AlgorithmDescriptor, CommandTemplate, TemplatePart};
pub use self::error::{DescriptorError, ProcessingError, ValidationError};
pub use self::parameter::{ParameterDescriptor, ParameterKind, ParameterValue, ParameterValues};
pub use self::provider::{ProviderSettings, RunOutcome, SagaProvider, VersionPolicy};
pub use self::registry::AlgorithmRegistry;
pub use self::supervisor::{ExecutionJob, JobState};
