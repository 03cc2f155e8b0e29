//! Entry point for the `saga-nextgen` binary.
//!
//! The binary delegates to [`saga_cli::run`], which loads configuration,
//! installs logging and dispatches the requested subcommand.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    saga_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
