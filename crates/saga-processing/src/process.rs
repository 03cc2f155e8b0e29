//! Child-process spawning behind a mockable seam.
//!
//! [`ProcessSpawner`] is the only place the crate touches the operating
//! system's process table. The batch supervisor and the version probe both
//! take a spawner by reference, so tests substitute scripted fakes and never
//! launch the real `saga_cmd`. [`SystemSpawner`] is the production
//! implementation built on [`std::process::Command`].

use std::ffi::OsString;
use std::fmt;
use std::io::{self, Read};
use std::process::{Child, Command, Stdio};

use tracing::debug;

/// Tracing target for process operations.
const PROCESS_TARGET: &str = "saga_processing::process";

/// A program and its arguments, ready to spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: OsString,
    args: Vec<OsString>,
    verbatim: bool,
}

impl Invocation {
    /// Creates an invocation with no arguments.
    #[must_use]
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            verbatim: false,
        }
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Passes arguments to the program without re-quoting them.
    ///
    /// Only meaningful on Windows, where `cmd.exe` needs the already escaped
    /// script path exactly as written. Elsewhere arguments are never quoted.
    #[must_use]
    pub const fn verbatim(mut self) -> Self {
        self.verbatim = true;
        self
    }

    /// Returns the program.
    #[must_use]
    pub fn program(&self) -> &OsString {
        &self.program
    }

    /// Returns the arguments in order.
    #[must_use]
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Returns `true` when arguments bypass quoting.
    #[must_use]
    pub const fn is_verbatim(&self) -> bool {
        self.verbatim
    }

    /// Renders the invocation as a single line for logs.
    #[must_use]
    pub fn command_line(&self) -> String {
        let mut line = self.program.to_string_lossy().into_owned();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }

    fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        apply_args(&mut command, &self.args, self.verbatim);
        command
    }
}

#[cfg(windows)]
fn apply_args(command: &mut Command, args: &[OsString], verbatim: bool) {
    use std::os::windows::process::CommandExt;
    if verbatim {
        for arg in args {
            command.raw_arg(arg);
        }
    } else {
        command.args(args);
    }
}

#[cfg(not(windows))]
fn apply_args(command: &mut Command, args: &[OsString], _verbatim: bool) {
    command.args(args);
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// How a child process finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitOutcome {
    code: Option<i32>,
}

impl ExitOutcome {
    /// Creates an outcome from an exit code; `None` means the process was
    /// terminated by a signal.
    #[must_use]
    pub const fn new(code: Option<i32>) -> Self {
        Self { code }
    }

    /// Returns the exit code, if the process exited normally.
    #[must_use]
    pub const fn code(self) -> Option<i32> {
        self.code
    }

    /// Returns `true` for exit code zero.
    #[must_use]
    pub const fn success(self) -> bool {
        matches!(self.code, Some(0))
    }
}

/// A running child process.
pub trait ChildProcess {
    /// Takes the child's standard output. Returns `None` on the second call.
    fn take_stdout(&mut self) -> Option<Box<dyn Read + Send>>;

    /// Blocks until the child exits.
    ///
    /// # Errors
    ///
    /// Returns the OS error raised while waiting.
    fn wait(&mut self) -> io::Result<ExitOutcome>;
}

/// Starts child processes.
#[cfg_attr(test, mockall::automock)]
pub trait ProcessSpawner {
    /// Spawns `invocation` with standard output piped and standard input and
    /// error discarded.
    ///
    /// # Errors
    ///
    /// Returns the OS error raised by the spawn.
    fn spawn(&self, invocation: &Invocation) -> io::Result<Box<dyn ChildProcess>>;
}

/// Spawns real operating-system processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemSpawner;

impl ProcessSpawner for SystemSpawner {
    fn spawn(&self, invocation: &Invocation) -> io::Result<Box<dyn ChildProcess>> {
        debug!(
            target: PROCESS_TARGET,
            command = %invocation,
            "spawning child process"
        );
        let child = invocation
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;
        debug!(target: PROCESS_TARGET, pid = child.id(), "child process started");
        Ok(Box::new(SystemChild { child }))
    }
}

struct SystemChild {
    child: Child,
}

impl ChildProcess for SystemChild {
    fn take_stdout(&mut self) -> Option<Box<dyn Read + Send>> {
        self.child
            .stdout
            .take()
            .map(|stdout| Box::new(stdout) as Box<dyn Read + Send>)
    }

    fn wait(&mut self) -> io::Result<ExitOutcome> {
        let status = self.child.wait()?;
        debug!(target: PROCESS_TARGET, ?status, "child process exited");
        Ok(ExitOutcome::new(status.code()))
    }
}
