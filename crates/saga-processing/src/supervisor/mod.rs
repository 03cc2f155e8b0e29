//! Batch job supervision.
//!
//! A job moves through `Idle → ScriptWritten → Running → Succeeded | Failed`.
//! The supervisor writes the platform script, launches it through the
//! [`ProcessSpawner`], streams console output into the job and the caller's
//! [`Feedback`], and records how the process ended. It never checks the
//! declared outputs; that is the caller's concern.

mod output;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::error::ProcessingError;
use crate::feedback::Feedback;
use crate::process::ProcessSpawner;
use crate::script::{ExecutionContext, render_script, shell_invocation};

pub use self::output::{OutputLine, classify_line, parse_progress};

/// Tracing target for supervisor operations.
pub(crate) const SUPERVISOR_TARGET: &str = "saga_processing::supervisor";

/// Lifecycle of a batch job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JobState {
    /// Created, nothing written yet.
    #[default]
    Idle,
    /// The script is on disk.
    ScriptWritten,
    /// The script process is running.
    Running,
    /// The process exited with status zero.
    Succeeded,
    /// The process could not start, could not be awaited, or exited non-zero.
    Failed,
}

impl JobState {
    /// Returns `true` for `Succeeded` and `Failed`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// One batch job: its commands and everything observed while it ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionJob {
    commands: Vec<String>,
    state: JobState,
    script_path: Option<PathBuf>,
    console: Vec<String>,
    progress: Option<u8>,
    exit_code: Option<i32>,
}

impl ExecutionJob {
    /// Creates an idle job for `commands`.
    #[must_use]
    pub const fn new(commands: Vec<String>) -> Self {
        Self {
            commands,
            state: JobState::Idle,
            script_path: None,
            console: Vec::new(),
            progress: None,
            exit_code: None,
        }
    }

    /// Rendered commands, one script line each.
    #[must_use]
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> JobState {
        self.state
    }

    /// Where the script was written.
    #[must_use]
    pub fn script_path(&self) -> Option<&Path> {
        self.script_path.as_deref()
    }

    /// Console lines in arrival order, spinner glyphs and progress removed.
    #[must_use]
    pub fn console(&self) -> &[String] {
        &self.console
    }

    /// Most recent progress percentage.
    #[must_use]
    pub const fn progress(&self) -> Option<u8> {
        self.progress
    }

    /// Exit code of the script process.
    #[must_use]
    pub const fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Returns `true` when the job finished successfully.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        matches!(self.state, JobState::Succeeded)
    }

    fn advance(&mut self, next: JobState) {
        debug!(
            target: SUPERVISOR_TARGET,
            from = ?self.state,
            to = ?next,
            "job state change"
        );
        self.state = next;
    }

    fn record_line(&mut self, line: &str, feedback: &mut dyn Feedback) {
        match classify_line(line) {
            OutputLine::Progress(Some(percent)) => {
                self.progress = Some(percent);
                feedback.set_progress(percent);
            }
            // Blank lines carry nothing worth keeping in the console log.
            OutputLine::Progress(None) | OutputLine::Spinner | OutputLine::Console("") => {}
            OutputLine::Console(text) => {
                self.console.push(text.to_owned());
                feedback.push_console_info(text);
            }
        }
    }
}

/// Runs batch jobs through a [`ProcessSpawner`].
///
/// The supervisor blocks for the whole runtime of the tool and never kills
/// the child. Callers that need cancellation must terminate the process
/// themselves.
pub struct BatchSupervisor<'a, S: ProcessSpawner + ?Sized> {
    spawner: &'a S,
    context: &'a ExecutionContext,
    tool_folder: Option<&'a Path>,
}

impl<'a, S: ProcessSpawner + ?Sized> BatchSupervisor<'a, S> {
    /// Creates a supervisor writing scripts per `context`.
    ///
    /// `tool_folder` is the resolved install folder; `None` leaves the tool
    /// to be found on `PATH`.
    #[must_use]
    pub const fn new(
        spawner: &'a S,
        context: &'a ExecutionContext,
        tool_folder: Option<&'a Path>,
    ) -> Self {
        Self {
            spawner,
            context,
            tool_folder,
        }
    }

    /// Runs `job` to completion.
    ///
    /// A non-zero exit leaves the job `Failed` but is not an error; the exit
    /// code and console log are on the job.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessingError::ScriptWrite`] when the script cannot be
    /// written, [`ProcessingError::ProcessSpawn`] when it cannot be started,
    /// and [`ProcessingError::Wait`] when its exit cannot be observed. The job
    /// is `Failed` in the last two cases.
    pub fn run(
        &self,
        job: &mut ExecutionJob,
        feedback: &mut dyn Feedback,
    ) -> Result<(), ProcessingError> {
        let platform = self.context.platform();
        let contents = render_script(platform, self.tool_folder, &job.commands);
        let script = self.context.write_script(&contents)?;
        job.script_path = Some(script.path().to_path_buf());
        job.advance(JobState::ScriptWritten);

        let invocation = shell_invocation(platform, script.path());
        let program = invocation.command_line();
        let mut child = match self.spawner.spawn(&invocation) {
            Ok(child) => child,
            Err(err) => {
                job.advance(JobState::Failed);
                return Err(ProcessingError::ProcessSpawn {
                    program,
                    source: Arc::new(err),
                });
            }
        };
        job.advance(JobState::Running);

        if let Some(stdout) = child.take_stdout() {
            output::for_each_line(stdout, |line| job.record_line(line, &mut *feedback));
        }

        let outcome = match child.wait() {
            Ok(outcome) => outcome,
            Err(err) => {
                job.advance(JobState::Failed);
                return Err(ProcessingError::Wait {
                    program,
                    source: Arc::new(err),
                });
            }
        };
        job.exit_code = outcome.code();
        job.advance(if outcome.success() {
            JobState::Succeeded
        } else {
            JobState::Failed
        });
        debug!(
            target: SUPERVISOR_TARGET,
            exit_code = ?outcome.code(),
            console_lines = job.console.len(),
            "batch job finished"
        );
        drop(script);
        Ok(())
    }
}
