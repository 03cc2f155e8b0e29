//! The algorithm provider: settings, tool discovery, registry and runs.
//!
//! [`SagaProvider`] is the public-facing API a host calls. It locates the
//! tool once, gates algorithm loading on the probed version, and turns a
//! run request into a validated, rendered and supervised batch job.
//!
//! Process spawning goes through the [`ProcessSpawner`] the provider is
//! built with, so tests inject scripted children instead of running the
//! real tool.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::builtin::builtin_algorithms;
use crate::command::CommandBuilder;
use crate::discovery::{ToolInstallation, ToolLocator};
use crate::error::ProcessingError;
use crate::feedback::Feedback;
use crate::parameter::{ParameterValues, validate_all};
use crate::process::{ProcessSpawner, SystemSpawner};
use crate::registry::AlgorithmRegistry;
use crate::script::{ExecutionContext, Platform};
use crate::supervisor::{BatchSupervisor, ExecutionJob};
use crate::version::{REQUIRED_VERSION, ToolVersion, VersionCache};

const PROVIDER_TARGET: &str = "saga_processing::provider";

/// Stable provider identifier.
pub const PROVIDER_ID: &str = "sagang";

/// Human-readable provider name.
pub const PROVIDER_NAME: &str = "SAGA Next Gen";

/// Long name reported before the tool version is known.
pub const UNPROBED_LONG_NAME: &str = "SAGA";

/// First line of the console log written after a run.
pub const CONSOLE_HEADER: &str = "SAGA execution console output";

/// Reaction to a probed tool older than [`REQUIRED_VERSION`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersionPolicy {
    /// Log a warning and load the algorithms anyway.
    #[default]
    Warn,
    /// Refuse to load any algorithm.
    Abort,
}

/// Settings the provider reads. Hosts build this from their own
/// configuration layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    /// Configured install folder. `None` means auto-detect.
    pub saga_folder: Option<PathBuf>,
    /// Log rendered commands before running them.
    pub log_commands: bool,
    /// Log the console output after a run.
    pub log_console: bool,
    /// Opaque flag forwarded to hosts that optimise data import and export.
    pub import_export_optimization: bool,
    /// Host application prefix used by auto-detection.
    pub host_prefix: Option<PathBuf>,
    /// Directory that receives batch scripts and scratch space.
    pub script_dir: PathBuf,
    /// Reaction to an outdated tool.
    pub version_policy: VersionPolicy,
    /// Platform whose script and path conventions apply.
    pub platform: Platform,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            saga_folder: None,
            log_commands: true,
            log_console: true,
            import_export_optimization: false,
            host_prefix: None,
            script_dir: std::env::temp_dir().join("saga-nextgen"),
            version_policy: VersionPolicy::Warn,
            platform: Platform::current(),
        }
    }
}

/// Result of one algorithm run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// Declared output paths keyed by parameter key.
    pub outputs: BTreeMap<String, String>,
    /// Whether the batch job exited successfully.
    pub success: bool,
    /// The finished job, with console log, progress and exit code.
    pub job: ExecutionJob,
}

/// Owns settings, spawner, version cache and registry.
///
/// # Example
///
/// ```
/// use saga_processing::provider::{ProviderSettings, SagaProvider};
///
/// let provider = SagaProvider::new(ProviderSettings::default());
/// assert_eq!(provider.id(), "sagang");
/// assert_eq!(provider.long_name(), "SAGA");
/// ```
#[derive(Debug)]
pub struct SagaProvider<S = SystemSpawner> {
    settings: ProviderSettings,
    spawner: S,
    installation: ToolInstallation,
    versions: VersionCache,
    registry: AlgorithmRegistry,
}

impl SagaProvider<SystemSpawner> {
    /// Creates a provider that spawns real processes.
    #[must_use]
    pub fn new(settings: ProviderSettings) -> Self {
        Self::with_spawner(settings, SystemSpawner)
    }
}

impl<S> SagaProvider<S> {
    /// Creates a provider using `spawner` for every child process.
    ///
    /// The install location is resolved immediately from the settings.
    #[must_use]
    pub fn with_spawner(settings: ProviderSettings, spawner: S) -> Self {
        let mut locator = ToolLocator::new(settings.platform).with_environment();
        if let Some(folder) = &settings.saga_folder {
            locator = locator.with_configured_folder(folder);
        }
        if let Some(prefix) = &settings.host_prefix {
            locator = locator.with_host_prefix(prefix);
        }
        let installation = locator.locate();
        Self {
            settings,
            spawner,
            installation,
            versions: VersionCache::new(),
            registry: AlgorithmRegistry::new(),
        }
    }

    /// Returns the provider identifier.
    #[must_use]
    pub const fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    /// Returns the provider name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    /// Returns the name with the probed version appended, or the bare
    /// tool name until a probe succeeds.
    #[must_use]
    pub fn long_name(&self) -> String {
        self.versions.version().map_or_else(
            || UNPROBED_LONG_NAME.to_owned(),
            |version| format!("{PROVIDER_NAME} ({version})"),
        )
    }

    /// Returns the settings.
    #[must_use]
    pub const fn settings(&self) -> &ProviderSettings {
        &self.settings
    }

    /// Returns the resolved installation.
    #[must_use]
    pub const fn installation(&self) -> &ToolInstallation {
        &self.installation
    }

    /// Returns the cached tool version, if a probe found one.
    #[must_use]
    pub const fn version(&self) -> Option<&ToolVersion> {
        self.versions.version()
    }

    /// Returns the loaded algorithms.
    #[must_use]
    pub const fn registry(&self) -> &AlgorithmRegistry {
        &self.registry
    }

    /// Replaces the registry contents with the units in `dir` plus the
    /// built-in algorithms, without consulting the tool.
    ///
    /// Returns the number of algorithms loaded.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessingError::ReadDescriptors`] if `dir` cannot be
    /// listed, or [`ProcessingError::Descriptor`] if a built-in is broken.
    pub fn register_algorithms(&mut self, dir: &Path) -> Result<usize, ProcessingError> {
        self.registry.clear();
        self.registry.load_directory(dir)?;
        for algorithm in builtin_algorithms()? {
            let name = algorithm.name().to_owned();
            if let Err(err) = self.registry.register(algorithm) {
                warn!(
                    target: PROVIDER_TARGET,
                    algorithm = %name,
                    error = %err,
                    "built-in algorithm shadowed by a description unit"
                );
            }
        }
        debug!(
            target: PROVIDER_TARGET,
            count = self.registry.len(),
            "algorithms registered"
        );
        Ok(self.registry.len())
    }
}

impl<S: ProcessSpawner> SagaProvider<S> {
    /// Probes the tool version, reusing the cached outcome unless `force`.
    pub fn probe_version(&mut self, force: bool) -> Option<ToolVersion> {
        let invocation = self.installation.version_invocation();
        self.versions.probe(&self.spawner, &invocation, force)
    }

    /// Re-probes the tool, applies the version policy and reloads the
    /// registry from `dir` plus the built-ins.
    ///
    /// The registry is left empty on every error.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessingError::ToolNotFound`] when no version is
    /// reported, [`ProcessingError::UnsupportedVersion`] for an outdated
    /// tool under [`VersionPolicy::Abort`], and the errors of
    /// [`SagaProvider::register_algorithms`].
    pub fn load_algorithms(&mut self, dir: &Path) -> Result<usize, ProcessingError> {
        self.registry.clear();
        let version = self
            .probe_version(true)
            .ok_or(ProcessingError::ToolNotFound)?;
        if !version.meets(REQUIRED_VERSION) {
            match self.settings.version_policy {
                VersionPolicy::Warn => warn!(
                    target: PROVIDER_TARGET,
                    found = %version,
                    required = REQUIRED_VERSION,
                    "saga_cmd is older than the supported version; algorithms may fail"
                ),
                VersionPolicy::Abort => {
                    return Err(ProcessingError::UnsupportedVersion {
                        found: version.to_string(),
                        required: REQUIRED_VERSION.to_owned(),
                    });
                }
            }
        }
        self.register_algorithms(dir)
    }

    /// Validates `values`, renders the commands and runs them as one batch
    /// job.
    ///
    /// A job that exits non-zero is reported through
    /// [`RunOutcome::success`], not as an error.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessingError::UnknownAlgorithm`] for an unregistered
    /// name, [`ProcessingError::Validation`] for a bad value, and the
    /// script, scratch and process errors of the batch supervisor.
    pub fn run(
        &self,
        name: &str,
        values: &ParameterValues,
        feedback: &mut dyn Feedback,
    ) -> Result<RunOutcome, ProcessingError> {
        let algorithm = self.registry.require(name)?;
        let resolved = validate_all(algorithm.parameters(), values)?;

        let context = ExecutionContext::per_job(&self.settings.script_dir)
            .with_platform(self.settings.platform);
        let scratch = context.scratch_space()?;
        let builder = CommandBuilder::new(scratch.base(algorithm.name()));
        let commands = builder.build(algorithm, &resolved)?;
        if self.settings.log_commands {
            for command in &commands {
                info!(target: PROVIDER_TARGET, algorithm = name, "saga_cmd {command}");
            }
        }

        let mut job = ExecutionJob::new(commands);
        let supervisor = BatchSupervisor::new(&self.spawner, &context, self.installation.folder());
        supervisor.run(&mut job, feedback)?;
        drop(scratch);

        if self.settings.log_console {
            info!(target: PROVIDER_TARGET, "{}", console_log(&job));
        }

        let outputs = algorithm
            .outputs()
            .filter_map(|parameter| {
                resolved
                    .get(parameter.key())
                    .map(|value| (parameter.key().to_owned(), value.to_string()))
            })
            .collect();
        Ok(RunOutcome {
            outputs,
            success: job.succeeded(),
            job,
        })
    }
}

/// Renders the console log with its header line.
#[must_use]
pub fn console_log(job: &ExecutionJob) -> String {
    let mut log = String::from(CONSOLE_HEADER);
    for line in job.console() {
        log.push('\n');
        log.push_str(line);
    }
    log
}
