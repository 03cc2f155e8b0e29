//! Command-line runtime for the saga-nextgen provider.
//!
//! The runtime owns argument parsing, configuration bootstrapping, logging
//! setup and subcommand dispatch. It can be driven from the binary or from
//! tests, where the configuration loader, the process spawner and the IO
//! streams are substituted.

use std::ffi::OsString;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use saga_processing::process::{ProcessSpawner, SystemSpawner};
use saga_processing::{ParameterValues, SagaProvider};
use tracing::debug;

mod cli;
mod config;
mod errors;
mod feedback;
mod telemetry;

use cli::{Cli, CliCommand};
use config::{ConfigLoader, OrthoConfigLoader, provider_settings, split_config_arguments};
use errors::AppError;
use feedback::ProgressFeedback;

const CLI_TARGET: &str = "saga_cli";

/// Bundles the IO streams provided to the CLI runtime.
pub(crate) struct IoStreams<'a, W: Write, E: Write> {
    pub(crate) stdout: &'a mut W,
    pub(crate) stderr: &'a mut E,
}

impl<'a, W: Write, E: Write> IoStreams<'a, W, E> {
    pub(crate) const fn new(stdout: &'a mut W, stderr: &'a mut E) -> Self {
        Self { stdout, stderr }
    }
}

struct CliRunner<'a, W: Write, E: Write, L: ConfigLoader, S: ProcessSpawner> {
    io: IoStreams<'a, W, E>,
    loader: &'a L,
    spawner: S,
}

impl<'a, W, E, L, S> CliRunner<'a, W, E, L, S>
where
    W: Write,
    E: Write,
    L: ConfigLoader,
    S: ProcessSpawner,
{
    const fn new(io: IoStreams<'a, W, E>, loader: &'a L, spawner: S) -> Self {
        Self {
            io,
            loader,
            spawner,
        }
    }

    fn run<I>(mut self, args: I) -> ExitCode
    where
        I: IntoIterator<Item = OsString>,
    {
        let args: Vec<OsString> = args.into_iter().collect();
        let split = split_config_arguments(&args);

        let result = Cli::try_parse_from(&split.command_arguments)
            .map_err(AppError::CliUsage)
            .and_then(|cli| {
                let config = self.loader.load(&split.config_arguments)?;
                telemetry::initialise(&config)?;
                let provider = SagaProvider::with_spawner(provider_settings(&config), self.spawner);
                dispatch(cli.command, provider, &mut self.io)
            });

        match result {
            Ok(exit_code) => exit_code,
            Err(error) => {
                if let Err(write_error) = writeln!(self.io.stderr, "{error}") {
                    debug!(target: CLI_TARGET, %error, %write_error, "could not report error");
                }
                ExitCode::FAILURE
            }
        }
    }
}

fn dispatch<S, W, E>(
    command: CliCommand,
    mut provider: SagaProvider<S>,
    io: &mut IoStreams<'_, W, E>,
) -> Result<ExitCode, AppError>
where
    S: ProcessSpawner,
    W: Write,
    E: Write,
{
    match command {
        CliCommand::Discover { dir } => discover(&mut provider, &dir, io),
        CliCommand::Describe { dir, algorithm } => describe(&mut provider, &dir, &algorithm, io),
        CliCommand::Run {
            dir,
            algorithm,
            assignments,
        } => run_algorithm(&mut provider, &dir, &algorithm, &assignments, io),
        CliCommand::Probe { force } => probe(&mut provider, force, io),
    }
}

fn discover<S, W, E>(
    provider: &mut SagaProvider<S>,
    dir: &Path,
    io: &mut IoStreams<'_, W, E>,
) -> Result<ExitCode, AppError>
where
    W: Write,
    E: Write,
{
    provider.register_algorithms(dir)?;
    for algorithm in provider.registry().algorithms() {
        writeln!(
            io.stdout,
            "{}\t{}\t{}",
            algorithm.name(),
            algorithm.group_id(),
            algorithm.display_name()
        )
        .map_err(AppError::Write)?;
    }
    io.stdout.flush().map_err(AppError::Write)?;
    Ok(ExitCode::SUCCESS)
}

fn describe<S, W, E>(
    provider: &mut SagaProvider<S>,
    dir: &Path,
    name: &str,
    io: &mut IoStreams<'_, W, E>,
) -> Result<ExitCode, AppError>
where
    W: Write,
    E: Write,
{
    provider.register_algorithms(dir)?;
    let algorithm = provider.registry().require(name)?;
    for parameter in algorithm.parameters() {
        let presence = if parameter.is_optional() {
            "optional"
        } else {
            "required"
        };
        writeln!(
            io.stdout,
            "{}\t{}\t{presence}\t{}",
            parameter.key(),
            parameter.kind().type_name(),
            parameter.label()
        )
        .map_err(AppError::Write)?;
    }
    io.stdout.flush().map_err(AppError::Write)?;
    Ok(ExitCode::SUCCESS)
}

fn run_algorithm<S, W, E>(
    provider: &mut SagaProvider<S>,
    dir: &Path,
    name: &str,
    assignments: &[String],
    io: &mut IoStreams<'_, W, E>,
) -> Result<ExitCode, AppError>
where
    S: ProcessSpawner,
    W: Write,
    E: Write,
{
    provider.load_algorithms(dir)?;
    let algorithm = provider.registry().require(name)?;
    let mut values = ParameterValues::with_defaults(algorithm.parameters());
    for assignment in assignments {
        let (key, value) = parse_assignment(assignment)?;
        values.insert(key, value);
    }

    let mut feedback = ProgressFeedback::new(&mut *io.stderr);
    let outcome = provider.run(name, &values, &mut feedback)?;
    for (key, path) in &outcome.outputs {
        writeln!(io.stdout, "{key}={path}").map_err(AppError::Write)?;
    }
    io.stdout.flush().map_err(AppError::Write)?;

    if outcome.success {
        Ok(ExitCode::SUCCESS)
    } else {
        let status = outcome
            .job
            .exit_code()
            .map_or_else(|| String::from("no exit code"), |code| format!("exit code {code}"));
        Err(AppError::JobFailed {
            algorithm: name.to_owned(),
            status,
        })
    }
}

fn probe<S, W, E>(
    provider: &mut SagaProvider<S>,
    force: bool,
    io: &mut IoStreams<'_, W, E>,
) -> Result<ExitCode, AppError>
where
    S: ProcessSpawner,
    W: Write,
    E: Write,
{
    let version = provider.probe_version(force).ok_or(AppError::ToolNotFound)?;
    writeln!(io.stdout, "{version}").map_err(AppError::Write)?;
    io.stdout.flush().map_err(AppError::Write)?;
    Ok(ExitCode::SUCCESS)
}

fn parse_assignment(argument: &str) -> Result<(&str, &str), AppError> {
    argument
        .split_once('=')
        .filter(|(key, _)| !key.trim().is_empty())
        .map(|(key, value)| (key.trim(), value))
        .ok_or_else(|| AppError::InvalidAssignment {
            argument: argument.to_owned(),
        })
}

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with(args, IoStreams::new(stdout, stderr), &OrthoConfigLoader, SystemSpawner)
}

/// Runs the CLI with a custom configuration loader and process spawner.
pub(crate) fn run_with<'a, I, W, E, L, S>(
    args: I,
    io: IoStreams<'a, W, E>,
    loader: &'a L,
    spawner: S,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
    S: ProcessSpawner,
{
    CliRunner::new(io, loader, spawner).run(args)
}

#[cfg(test)]
mod tests;
