//! Locating the `saga_cmd` installation.
//!
//! An explicitly configured folder wins when it exists. Otherwise a short
//! list of platform-specific well-known folders is searched, and when none
//! holds the executable the tool is left to be resolved through `PATH`.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::process::Invocation;
use crate::script::Platform;

const DISCOVERY_TARGET: &str = "saga_processing::discovery";

/// Flag that makes the tool print its version banner.
const VERSION_FLAG: &str = "-v";

/// Resolves where the tool is installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolLocator {
    platform: Platform,
    configured: Option<PathBuf>,
    host_prefix: Option<PathBuf>,
    osgeo4w_root: Option<PathBuf>,
}

impl ToolLocator {
    /// Creates a locator with nothing configured.
    #[must_use]
    pub const fn new(platform: Platform) -> Self {
        Self {
            platform,
            configured: None,
            host_prefix: None,
            osgeo4w_root: None,
        }
    }

    /// Sets the configured install folder. Blank paths mean auto-detect.
    #[must_use]
    pub fn with_configured_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.configured = non_empty(folder.into());
        self
    }

    /// Sets the host application prefix used by auto-detection.
    #[must_use]
    pub fn with_host_prefix(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.host_prefix = non_empty(prefix.into());
        self
    }

    /// Sets the OSGeo4W root searched on Windows.
    #[must_use]
    pub fn with_osgeo4w_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.osgeo4w_root = non_empty(root.into());
        self
    }

    /// Reads the OSGeo4W root from the `OSGEO4W_ROOT` environment variable.
    #[must_use]
    pub fn with_environment(self) -> Self {
        match std::env::var_os("OSGEO4W_ROOT") {
            Some(root) => self.with_osgeo4w_root(root),
            None => self,
        }
    }

    /// Returns the platform whose conventions apply.
    #[must_use]
    pub const fn platform(&self) -> Platform {
        self.platform
    }

    /// Well-known folders searched when nothing usable is configured.
    #[must_use]
    pub fn candidate_folders(&self) -> Vec<PathBuf> {
        match self.platform {
            Platform::MacOs | Platform::FreeBsd => {
                let mut folders: Vec<PathBuf> = self
                    .host_prefix
                    .iter()
                    .map(|prefix| prefix.join("bin"))
                    .collect();
                folders.push(PathBuf::from("/usr/local/bin"));
                folders
            }
            Platform::Windows => {
                let mut folders: Vec<PathBuf> = self
                    .host_prefix
                    .as_deref()
                    .and_then(Path::parent)
                    .map(|parent| parent.join("saga"))
                    .into_iter()
                    .collect();
                folders.extend(
                    self.osgeo4w_root
                        .iter()
                        .map(|root| root.join("apps").join("saga")),
                );
                folders
            }
            Platform::Linux => Vec::new(),
        }
    }

    /// Resolves the installation.
    #[must_use]
    pub fn locate(&self) -> ToolInstallation {
        if let Some(folder) = &self.configured {
            if folder.is_dir() {
                debug!(
                    target: DISCOVERY_TARGET,
                    folder = %folder.display(),
                    "using configured saga folder"
                );
                return ToolInstallation::new(self.platform, Some(folder.clone()));
            }
            warn!(
                target: DISCOVERY_TARGET,
                folder = %folder.display(),
                "configured saga folder does not exist; falling back to auto-detection"
            );
        }

        let executable = self.platform.executable_name();
        let found = self
            .candidate_folders()
            .into_iter()
            .find(|folder| folder.join(executable).is_file());
        match &found {
            Some(folder) => debug!(
                target: DISCOVERY_TARGET,
                folder = %folder.display(),
                "found saga_cmd in well-known folder"
            ),
            None => debug!(
                target: DISCOVERY_TARGET,
                "no saga folder found; relying on PATH"
            ),
        }
        ToolInstallation::new(self.platform, found)
    }
}

fn non_empty(path: PathBuf) -> Option<PathBuf> {
    (!path.as_os_str().is_empty()).then_some(path)
}

/// A resolved installation. A missing folder means "on `PATH`".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInstallation {
    platform: Platform,
    folder: Option<PathBuf>,
}

impl ToolInstallation {
    /// Creates an installation record.
    #[must_use]
    pub const fn new(platform: Platform, folder: Option<PathBuf>) -> Self {
        Self { platform, folder }
    }

    /// Returns the install folder, if one was resolved.
    #[must_use]
    pub fn folder(&self) -> Option<&Path> {
        self.folder.as_deref()
    }

    /// Returns the executable path, or its bare name when on `PATH`.
    #[must_use]
    pub fn executable(&self) -> PathBuf {
        let name = self.platform.executable_name();
        self.folder
            .as_ref()
            .map_or_else(|| PathBuf::from(name), |folder| folder.join(name))
    }

    /// Returns the invocation that prints the version banner.
    #[must_use]
    pub fn version_invocation(&self) -> Invocation {
        Invocation::new(self.executable()).arg(VERSION_FLAG)
    }
}
