//! Platform batch scripts and the shell commands that launch them.
//!
//! A batch job is one script holding environment setup, one `saga_cmd` line
//! per rendered command, and a final `exit`. Everything platform-specific
//! takes a [`Platform`] argument so Windows behaviour is testable on any
//! host.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::{Builder, TempDir, TempPath};
use tracing::debug;

use crate::error::ProcessingError;
use crate::process::Invocation;

const SCRIPT_TARGET: &str = "saga_processing::script";

/// Base name of batch scripts.
pub const SCRIPT_STEM: &str = "saga_batch_job";

/// Operating system family whose shell conventions apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// `cmd.exe` and `.bat` files.
    Windows,
    /// macOS.
    MacOs,
    /// FreeBSD.
    FreeBsd,
    /// Linux and any other POSIX system.
    Linux,
}

impl Platform {
    /// Returns the platform the crate was compiled for.
    #[must_use]
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Maps a `std::env::consts::OS` value to a platform.
    #[must_use]
    pub fn from_os(os: &str) -> Self {
        match os {
            "windows" => Self::Windows,
            "macos" => Self::MacOs,
            "freebsd" => Self::FreeBsd,
            _ => Self::Linux,
        }
    }

    /// Returns `true` for Windows.
    #[must_use]
    pub const fn is_windows(self) -> bool {
        matches!(self, Self::Windows)
    }

    /// Extension of batch scripts, without the dot.
    #[must_use]
    pub const fn script_extension(self) -> &'static str {
        if self.is_windows() { "bat" } else { "sh" }
    }

    /// File name of the tool executable.
    #[must_use]
    pub const fn executable_name(self) -> &'static str {
        if self.is_windows() {
            "saga_cmd.exe"
        } else {
            "saga_cmd"
        }
    }

    const fn line_ending(self) -> &'static str {
        if self.is_windows() { "\r\n" } else { "\n" }
    }
}

/// Renders the script text for `commands`.
///
/// Environment setup is only written when the tool folder is known;
/// otherwise the tool is expected on `PATH`.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use saga_processing::script::{Platform, render_script};
///
/// let script = render_script(
///     Platform::Linux,
///     Some(Path::new("/opt/saga/bin")),
///     &[String::from("io_gdal 0 -FILES \"in.tif\"")],
/// );
/// assert_eq!(
///     script,
///     "export SAGA_MLB=/opt/saga/bin/../lib/saga\n\
///      export PATH=/opt/saga/bin:$PATH\n\
///      saga_cmd io_gdal 0 -FILES \"in.tif\"\n\
///      exit",
/// );
/// ```
#[must_use]
pub fn render_script(platform: Platform, tool_folder: Option<&Path>, commands: &[String]) -> String {
    let newline = platform.line_ending();
    let mut lines: Vec<String> = Vec::with_capacity(commands.len() + 4);
    if let Some(path) = tool_folder {
        let folder = path.display();
        if platform.is_windows() {
            lines.push(format!("set SAGA={folder}"));
            lines.push(format!("set SAGA_MLB={folder}\\modules"));
            lines.push(String::from("PATH=%PATH%;%SAGA%;%SAGA_MLB%"));
        } else {
            lines.push(format!("export SAGA_MLB={folder}/../lib/saga"));
            lines.push(format!("export PATH={folder}:$PATH"));
        }
    }
    lines.extend(commands.iter().map(|command| format!("saga_cmd {command}")));
    lines.push(String::from("exit"));
    lines.join(newline)
}

/// Escapes a path for embedding in a `cmd.exe` command line.
///
/// Each of `& < > ( ) @ ^ |` gets a caret prefix and the result is wrapped
/// in double quotes.
///
/// ```
/// use saga_processing::script::make_path_safe;
///
/// assert_eq!(
///     make_path_safe(r"C:\Users\new(profile)\saga_batch_job.bat"),
///     r#""C:\Users\new^(profile^)\saga_batch_job.bat""#,
/// );
/// ```
#[must_use]
pub fn make_path_safe(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len() + 2);
    escaped.push('"');
    for c in path.chars() {
        if matches!(c, '&' | '<' | '>' | '(' | ')' | '@' | '^' | '|') {
            escaped.push('^');
        }
        escaped.push(c);
    }
    escaped.push('"');
    escaped
}

/// Single-quotes a string for a POSIX shell.
#[must_use]
pub fn posix_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}

/// Builds the shell command that runs `script` with stderr merged into stdout.
#[must_use]
pub fn shell_invocation(platform: Platform, script: &Path) -> Invocation {
    let path = script.to_string_lossy();
    if platform.is_windows() {
        Invocation::new("cmd.exe")
            .arg("/C")
            .arg(format!("{} 2>&1", make_path_safe(&path)))
            .verbatim()
    } else {
        Invocation::new("/bin/sh")
            .arg("-c")
            .arg(format!("{} 2>&1", posix_quote(&path)))
    }
}

/// A script written to disk.
///
/// Per-job scripts are removed when the value is dropped; shared scripts
/// stay in place to be overwritten by the next job.
#[derive(Debug)]
pub struct BatchScript {
    path: PathBuf,
    _cleanup: Option<TempPath>,
}

impl BatchScript {
    /// Returns the script location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Per-job directory for intermediate files, removed on drop.
#[derive(Debug)]
pub struct ScratchSpace {
    dir: TempDir,
}

impl ScratchSpace {
    /// Returns the directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Returns a path prefix inside the directory for intermediate files.
    #[must_use]
    pub fn base(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScriptNaming {
    Shared,
    PerJob,
}

/// Where and how batch scripts are written.
///
/// `shared` reproduces a single fixed script per directory, which callers
/// must not run concurrently. `per_job` gives every job its own uniquely
/// named script and is safe for concurrent jobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    directory: PathBuf,
    platform: Platform,
    naming: ScriptNaming,
}

impl ExecutionContext {
    /// Writes every job to the same `saga_batch_job` script in `directory`.
    #[must_use]
    pub fn shared(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            platform: Platform::current(),
            naming: ScriptNaming::Shared,
        }
    }

    /// Writes each job to a uniquely named script in `directory`.
    #[must_use]
    pub fn per_job(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            platform: Platform::current(),
            naming: ScriptNaming::PerJob,
        }
    }

    /// Overrides the platform whose conventions apply.
    #[must_use]
    pub const fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Returns the script directory.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Returns the platform whose conventions apply.
    #[must_use]
    pub const fn platform(&self) -> Platform {
        self.platform
    }

    /// Returns `true` when each job gets its own script.
    #[must_use]
    pub const fn is_per_job(&self) -> bool {
        matches!(self.naming, ScriptNaming::PerJob)
    }

    /// Returns the fixed script path used in shared mode.
    #[must_use]
    pub fn shared_script_path(&self) -> PathBuf {
        self.directory
            .join(format!("{SCRIPT_STEM}.{}", self.platform.script_extension()))
    }

    /// Writes `contents` as an executable script.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessingError::ScriptWrite`] when the directory cannot be
    /// created or the file cannot be written.
    pub fn write_script(&self, contents: &str) -> Result<BatchScript, ProcessingError> {
        let write_error = |path: &Path, source: io::Error| ProcessingError::ScriptWrite {
            path: path.to_path_buf(),
            source: Arc::new(source),
        };
        fs::create_dir_all(&self.directory).map_err(|err| write_error(&self.directory, err))?;

        let script = match self.naming {
            ScriptNaming::Shared => {
                let path = self.shared_script_path();
                fs::write(&path, contents).map_err(|err| write_error(&path, err))?;
                BatchScript {
                    path,
                    _cleanup: None,
                }
            }
            ScriptNaming::PerJob => {
                let mut file = Builder::new()
                    .prefix(&format!("{SCRIPT_STEM}-"))
                    .suffix(&format!(".{}", self.platform.script_extension()))
                    .tempfile_in(&self.directory)
                    .map_err(|err| write_error(&self.directory, err))?;
                file.write_all(contents.as_bytes())
                    .and_then(|()| file.flush())
                    .map_err(|err| write_error(file.path(), err))?;
                // Closing the handle before exec avoids ETXTBSY on Linux.
                let temp_path = file.into_temp_path();
                BatchScript {
                    path: temp_path.to_path_buf(),
                    _cleanup: Some(temp_path),
                }
            }
        };

        if !self.platform.is_windows() {
            make_executable(&script.path).map_err(|err| write_error(&script.path, err))?;
        }
        debug!(
            target: SCRIPT_TARGET,
            path = %script.path.display(),
            bytes = contents.len(),
            "wrote batch script"
        );
        Ok(script)
    }

    /// Creates a scratch directory for intermediate files of one job.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessingError::ScratchSpace`] when the directory cannot be
    /// created.
    pub fn scratch_space(&self) -> Result<ScratchSpace, ProcessingError> {
        let scratch_error = |source: io::Error| ProcessingError::ScratchSpace {
            path: self.directory.clone(),
            source: Arc::new(source),
        };
        fs::create_dir_all(&self.directory).map_err(scratch_error)?;
        let dir = Builder::new()
            .prefix("saga_scratch-")
            .tempdir_in(&self.directory)
            .map_err(scratch_error)?;
        Ok(ScratchSpace { dir })
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}
