//! Progress and console sink supplied by the caller of a job.

use tracing::debug;

const FEEDBACK_TARGET: &str = "saga_processing::feedback";

/// Receives progress updates and console lines while a batch job runs.
///
/// The supervisor calls these methods synchronously from the thread that
/// reads the child's output, so implementations should return quickly.
pub trait Feedback {
    /// Reports the most recent progress percentage (0 to 100).
    fn set_progress(&mut self, percent: u8);

    /// Forwards one line of console output from the tool.
    fn push_console_info(&mut self, line: &str);
}

/// Forwards feedback to `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingFeedback;

impl Feedback for TracingFeedback {
    fn set_progress(&mut self, percent: u8) {
        debug!(target: FEEDBACK_TARGET, percent, "progress");
    }

    fn push_console_info(&mut self, line: &str) {
        debug!(target: FEEDBACK_TARGET, line, "console");
    }
}

/// Keeps everything it receives. Useful for embedding and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingFeedback {
    /// Every progress value reported, in order.
    pub progress: Vec<u8>,
    /// Every console line forwarded, in order.
    pub console: Vec<String>,
}

impl Feedback for RecordingFeedback {
    fn set_progress(&mut self, percent: u8) {
        self.progress.push(percent);
    }

    fn push_console_info(&mut self, line: &str) {
        self.console.push(line.to_owned());
    }
}
