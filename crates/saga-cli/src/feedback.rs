//! Progress reporting on the terminal.

use std::io::Write;

use saga_processing::feedback::Feedback;
use tracing::debug;

use crate::CLI_TARGET;

/// Writes each new progress percentage to a stream, one per line.
pub(crate) struct ProgressFeedback<'a, E: Write> {
    stream: &'a mut E,
    last: Option<u8>,
}

impl<'a, E: Write> ProgressFeedback<'a, E> {
    pub(crate) const fn new(stream: &'a mut E) -> Self {
        Self { stream, last: None }
    }
}

impl<E: Write> Feedback for ProgressFeedback<'_, E> {
    fn set_progress(&mut self, percent: u8) {
        if self.last == Some(percent) {
            return;
        }
        self.last = Some(percent);
        if let Err(error) = writeln!(self.stream, "{percent}%") {
            debug!(target: CLI_TARGET, %error, "could not write progress");
        }
    }

    fn push_console_info(&mut self, line: &str) {
        debug!(target: CLI_TARGET, line, "console");
    }
}
