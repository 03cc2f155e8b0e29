//! Algorithm registry and description-directory discovery.
//!
//! The [`AlgorithmRegistry`] stores descriptors keyed by internal name and
//! lists them sorted by name or grouped by library. Duplicate registrations
//! for the same name are rejected. [`discover`] turns a directory of
//! description units into descriptors, skipping units that fail to parse so
//! one bad file never hides the rest.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::descriptor::{self, AlgorithmDescriptor};
use crate::error::ProcessingError;

const REGISTRY_TARGET: &str = "saga_processing::registry";

/// Extension of description units.
pub const DESCRIPTION_EXTENSION: &str = "txt";

/// Registry of loaded algorithms.
///
/// # Example
///
/// ```
/// use saga_processing::AlgorithmRegistry;
/// use saga_processing::descriptor::parse;
///
/// let mut registry = AlgorithmRegistry::new();
/// let descriptor = parse("Fill.txt", "Fill Sinks|2\nta_preprocessor\n")?;
/// registry.register(descriptor)?;
/// assert!(registry.get("fillsinks").is_some());
/// # Ok::<(), saga_processing::ProcessingError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct AlgorithmRegistry {
    algorithms: BTreeMap<String, AlgorithmDescriptor>,
}

impl AlgorithmRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an algorithm.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessingError::DuplicateAlgorithm`] if an algorithm with
    /// the same internal name is already registered.
    pub fn register(&mut self, algorithm: AlgorithmDescriptor) -> Result<(), ProcessingError> {
        let name = algorithm.name().to_owned();
        if self.algorithms.contains_key(&name) {
            return Err(ProcessingError::DuplicateAlgorithm { name });
        }
        self.algorithms.insert(name, algorithm);
        Ok(())
    }

    /// Registers every unit discovered in `dir`, skipping duplicates with a
    /// warning. Returns how many were added.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessingError::ReadDescriptors`] if the directory cannot
    /// be listed.
    pub fn load_directory(&mut self, dir: &Path) -> Result<usize, ProcessingError> {
        let mut added = 0;
        for algorithm in discover(dir)? {
            let name = algorithm.name().to_owned();
            match self.register(algorithm) {
                Ok(()) => added += 1,
                Err(err) => warn!(
                    target: REGISTRY_TARGET,
                    algorithm = %name,
                    error = %err,
                    "skipping algorithm"
                ),
            }
        }
        Ok(added)
    }

    /// Looks up an algorithm by internal name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AlgorithmDescriptor> {
        self.algorithms.get(name)
    }

    /// Looks up an algorithm, failing when it is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessingError::UnknownAlgorithm`] when nothing is
    /// registered under `name`.
    pub fn require(&self, name: &str) -> Result<&AlgorithmDescriptor, ProcessingError> {
        self.get(name)
            .ok_or_else(|| ProcessingError::UnknownAlgorithm {
                name: name.to_owned(),
            })
    }

    /// Returns all algorithms sorted by internal name.
    pub fn algorithms(&self) -> impl Iterator<Item = &AlgorithmDescriptor> {
        self.algorithms.values()
    }

    /// Returns algorithms grouped by group id, each group sorted by name.
    #[must_use]
    pub fn by_group(&self) -> BTreeMap<&str, Vec<&AlgorithmDescriptor>> {
        let mut groups: BTreeMap<&str, Vec<&AlgorithmDescriptor>> = BTreeMap::new();
        for algorithm in self.algorithms.values() {
            groups.entry(algorithm.group_id()).or_default().push(algorithm);
        }
        groups
    }

    /// Removes every algorithm.
    pub fn clear(&mut self) {
        self.algorithms.clear();
    }

    /// Returns the number of registered algorithms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.algorithms.len()
    }

    /// Returns `true` when no algorithms are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.algorithms.is_empty()
    }
}

/// Parses every `*.txt` description unit in `dir`, in file-name order.
///
/// Units that cannot be read or parsed, and units whose name is blank, are
/// logged and skipped.
///
/// # Errors
///
/// Returns [`ProcessingError::ReadDescriptors`] if the directory cannot be
/// listed.
pub fn discover(dir: &Path) -> Result<Vec<AlgorithmDescriptor>, ProcessingError> {
    let read_error = |source: std::io::Error| ProcessingError::ReadDescriptors {
        path: dir.to_path_buf(),
        source: Arc::new(source),
    };
    let mut units: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(read_error)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_description_unit(path))
        .collect();
    units.sort();

    let mut algorithms = Vec::with_capacity(units.len());
    for path in units {
        if let Some(algorithm) = load_unit(&path) {
            algorithms.push(algorithm);
        }
    }
    debug!(
        target: REGISTRY_TARGET,
        dir = %dir.display(),
        count = algorithms.len(),
        "discovered description units"
    );
    Ok(algorithms)
}

fn is_description_unit(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(DESCRIPTION_EXTENSION))
}

fn load_unit(path: &Path) -> Option<AlgorithmDescriptor> {
    let unit = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            warn!(
                target: REGISTRY_TARGET,
                unit = %unit,
                error = %err,
                "could not read description unit; skipping"
            );
            return None;
        }
    };
    match descriptor::parse(&unit, &text) {
        Ok(algorithm) if algorithm.name().is_empty() => {
            warn!(
                target: REGISTRY_TARGET,
                unit = %unit,
                "description unit has a blank algorithm name; skipping"
            );
            None
        }
        Ok(algorithm) => Some(algorithm),
        Err(err) => {
            warn!(
                target: REGISTRY_TARGET,
                unit = %unit,
                error = %err,
                "could not load description unit; skipping"
            );
            None
        }
    }
}
