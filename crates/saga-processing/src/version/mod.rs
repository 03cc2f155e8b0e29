//! Tool version probing with an explicit cache.
//!
//! The probe runs `saga_cmd -v` and looks for the `SAGA Version:` banner.
//! [`VersionCache`] remembers the outcome so repeated algorithm-list
//! refreshes do not respawn the tool; callers re-probe by forcing or by
//! invalidating the cache.

use std::cmp::Ordering;
use std::fmt;
use std::io::Read;

use tracing::{debug, warn};

use crate::process::{Invocation, ProcessSpawner};

const VERSION_TARGET: &str = "saga_processing::version";

/// Oldest tool version the descriptions are written for.
pub const REQUIRED_VERSION: &str = "9.1";

/// Prefix of the banner line carrying the version.
pub const VERSION_MARKER: &str = "SAGA Version:";

/// Attempts made when reading the probe output fails.
pub const MAX_PROBE_ATTEMPTS: usize = 5;

/// A version string reported by the tool, such as `9.3.1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolVersion {
    text: String,
}

impl ToolVersion {
    /// Wraps a version string.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Returns the version as reported.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Compares numerically, component by component.
    ///
    /// Missing components count as zero and each component is read up to
    /// its first non-digit, so `9.1` equals `9.1.0` and `9.2rc1` reads as
    /// `9.2`.
    ///
    /// ```
    /// use std::cmp::Ordering;
    /// use saga_processing::version::ToolVersion;
    ///
    /// let installed = ToolVersion::new("9.10.2");
    /// assert_eq!(installed.compare("9.9"), Ordering::Greater);
    /// assert_eq!(ToolVersion::new("9.1").compare("9.1.0"), Ordering::Equal);
    /// ```
    #[must_use]
    pub fn compare(&self, other: &str) -> Ordering {
        let left = components(&self.text);
        let right = components(other);
        let width = left.len().max(right.len());
        (0..width)
            .map(|index| {
                let a = left.get(index).copied().unwrap_or(0);
                let b = right.get(index).copied().unwrap_or(0);
                a.cmp(&b)
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// Returns `true` when this version is at least `minimum`.
    #[must_use]
    pub fn meets(&self, minimum: &str) -> bool {
        self.compare(minimum).is_ge()
    }
}

impl fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn components(version: &str) -> Vec<u64> {
    version
        .split('.')
        .map(|part| {
            let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().unwrap_or(0)
        })
        .collect()
}

/// Extracts the version from the tool's banner output.
///
/// ```
/// use saga_processing::version::extract_version;
///
/// let banner = "####\nSAGA Version: 9.3.1 (64 bit)\n####\n";
/// assert_eq!(extract_version(banner).map(|v| v.to_string()), Some("9.3.1".into()));
/// assert!(extract_version("command not found").is_none());
/// ```
#[must_use]
pub fn extract_version(output: &str) -> Option<ToolVersion> {
    output
        .lines()
        .find_map(|line| line.strip_prefix(VERSION_MARKER))
        .and_then(|rest| rest.split_whitespace().next())
        .map(ToolVersion::new)
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum ProbeState {
    #[default]
    Unprobed,
    Found(ToolVersion),
    NotFound,
}

/// Remembers the outcome of the last probe.
///
/// Both outcomes are cached; only [`VersionCache::invalidate`] or a forced
/// probe runs the tool again. The cache has no internal locking, so callers
/// sharing one across threads must serialise access.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionCache {
    state: ProbeState,
}

impl VersionCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached version, if one was found.
    #[must_use]
    pub const fn version(&self) -> Option<&ToolVersion> {
        match &self.state {
            ProbeState::Found(version) => Some(version),
            ProbeState::Unprobed | ProbeState::NotFound => None,
        }
    }

    /// Returns `true` once any probe has completed.
    #[must_use]
    pub const fn is_probed(&self) -> bool {
        !matches!(self.state, ProbeState::Unprobed)
    }

    /// Forgets the cached outcome.
    pub fn invalidate(&mut self) {
        self.state = ProbeState::Unprobed;
    }

    /// Returns the tool version, running `invocation` unless a cached
    /// outcome exists and `force` is unset.
    ///
    /// A spawn failure means the tool is absent and is not retried. A read
    /// failure is retried up to [`MAX_PROBE_ATTEMPTS`] attempts in total.
    pub fn probe<S: ProcessSpawner + ?Sized>(
        &mut self,
        spawner: &S,
        invocation: &Invocation,
        force: bool,
    ) -> Option<ToolVersion> {
        if self.is_probed() && !force {
            return self.version().cloned();
        }
        let found = run_probe(spawner, invocation);
        self.state = found
            .clone()
            .map_or(ProbeState::NotFound, ProbeState::Found);
        found
    }
}

fn run_probe<S: ProcessSpawner + ?Sized>(spawner: &S, invocation: &Invocation) -> Option<ToolVersion> {
    for attempt in 1..=MAX_PROBE_ATTEMPTS {
        let mut child = match spawner.spawn(invocation) {
            Ok(child) => child,
            Err(err) => {
                debug!(
                    target: VERSION_TARGET,
                    command = %invocation,
                    error = %err,
                    "saga_cmd could not be started"
                );
                return None;
            }
        };

        let mut bytes = Vec::new();
        let read = child
            .take_stdout()
            .map_or(Ok(0), |mut stdout| stdout.read_to_end(&mut bytes));
        if let Err(err) = child.wait() {
            debug!(target: VERSION_TARGET, error = %err, "failed to reap version probe");
        }

        match read {
            Ok(_) => {
                let version = extract_version(&String::from_utf8_lossy(&bytes));
                debug!(
                    target: VERSION_TARGET,
                    version = version.as_ref().map(ToolVersion::as_str),
                    "version probe finished"
                );
                return version;
            }
            Err(err) => warn!(
                target: VERSION_TARGET,
                attempt,
                max_attempts = MAX_PROBE_ATTEMPTS,
                error = %err,
                "reading version probe output failed"
            ),
        }
    }
    None
}
