//! Unit tests for the CLI runtime.


use std::collections::VecDeque;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Cursor, Read};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use rstest::{fixture, rstest};
use saga_config::Config;
use saga_processing::process::{ChildProcess, ExitOutcome, Invocation, ProcessSpawner};
use tempfile::TempDir;

use super::*;

pub(super) const FILL_UNIT: &str = "\
Fill Sinks|2
ta_preprocessor
QgsProcessingParameterRasterLayer|DEM|DEM
QgsProcessingParameterNumber|MINSLOPE|Minimum Slope|QgsProcessingParameterNumber.Double|0.1|False|0.0|None
QgsProcessingParameterRasterDestination|RESULT|Filled DEM
";

pub(super) const BANNER: &str = "SAGA Version: 9.3.1 (64 bit)\n";

/// Returns the same configuration for every load.
pub(super) struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    pub(super) const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(self.config.clone())
    }
}

/// Replays canned children in order. `None` makes the spawn fail.
#[derive(Clone, Default)]
pub(super) struct CannedSpawner {
    children: Arc<Mutex<VecDeque<Option<(String, i32)>>>>,
    launched: Arc<Mutex<Vec<String>>>,
}

impl CannedSpawner {
    pub(super) fn new(children: impl IntoIterator<Item = Option<(&'static str, i32)>>) -> Self {
        Self::from_owned(
            children
                .into_iter()
                .map(|child| child.map(|(text, code)| (text.to_owned(), code))),
        )
    }

    pub(super) fn from_owned(children: impl IntoIterator<Item = Option<(String, i32)>>) -> Self {
        Self {
            children: Arc::new(Mutex::new(children.into_iter().collect())),
            launched: Arc::default(),
        }
    }

    pub(super) fn launched(&self) -> Vec<String> {
        self.launched.lock().expect("launch log").clone()
    }
}

impl ProcessSpawner for CannedSpawner {
    fn spawn(&self, invocation: &Invocation) -> io::Result<Box<dyn ChildProcess>> {
        self.launched
            .lock()
            .expect("launch log")
            .push(invocation.command_line());
        let next = self.children.lock().expect("queue").pop_front().flatten();
        match next {
            Some((text, code)) => Ok(Box::new(CannedChild {
                stdout: Some(text.into_bytes()),
                code,
            })),
            None => Err(io::Error::new(io::ErrorKind::NotFound, "saga_cmd missing")),
        }
    }
}

struct CannedChild {
    stdout: Option<Vec<u8>>,
    code: i32,
}

impl ChildProcess for CannedChild {
    fn take_stdout(&mut self) -> Option<Box<dyn Read + Send>> {
        self.stdout
            .take()
            .map(|bytes| Box::new(Cursor::new(bytes)) as Box<dyn Read + Send>)
    }

    fn wait(&mut self) -> io::Result<ExitOutcome> {
        Ok(ExitOutcome::new(Some(self.code)))
    }
}

/// Description units and script space for one test.
pub(super) struct Workspace {
    pub(super) units: TempDir,
    pub(super) scripts: TempDir,
}

impl Workspace {
    pub(super) fn config(&self) -> Config {
        Config {
            script_dir: self.scripts.path().display().to_string(),
            log_commands: Some(false),
            log_console: Some(false),
            ..Config::default()
        }
    }

    pub(super) fn units_arg(&self) -> String {
        self.units.path().display().to_string()
    }
}

#[fixture]
pub(super) fn workspace() -> Workspace {
    let units = TempDir::new().expect("units dir");
    fs::write(units.path().join("FillSinks.txt"), FILL_UNIT).expect("write unit");
    let scripts = TempDir::new().expect("scripts dir");
    Workspace { units, scripts }
}

pub(super) struct Captured {
    pub(super) exit: ExitCode,
    pub(super) stdout: String,
    pub(super) stderr: String,
}

pub(super) fn invoke(workspace: &Workspace, spawner: CannedSpawner, args: &[&str]) -> Captured {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let loader = StaticConfigLoader::new(workspace.config());
    let argv = std::iter::once("saga-nextgen")
        .chain(args.iter().copied())
        .map(OsString::from);
    let exit = run_with(argv, IoStreams::new(&mut stdout, &mut stderr), &loader, spawner);
    Captured {
        exit,
        stdout: String::from_utf8(stdout).expect("stdout utf8"),
        stderr: String::from_utf8(stderr).expect("stderr utf8"),
    }
}

#[rstest]
fn discover_lists_units_and_builtins(workspace: Workspace) {
    let spawner = CannedSpawner::default();
    let units = workspace.units_arg();
    let captured = invoke(&workspace, spawner.clone(), &["discover", &units]);

    assert_eq!(captured.exit, ExitCode::SUCCESS);
    assert_eq!(
        captured.stdout,
        "fillsinks\tta_preprocessor\tFill Sinks\nsplitrgbbands\trastertools\tSplit RGB bands\n"
    );
    assert!(spawner.launched().is_empty(), "discover must not probe the tool");
}

#[rstest]
fn describe_lists_parameters(workspace: Workspace) {
    let units = workspace.units_arg();
    let captured = invoke(
        &workspace,
        CannedSpawner::default(),
        &["describe", &units, "fillsinks"],
    );

    assert_eq!(captured.exit, ExitCode::SUCCESS);
    let lines: Vec<&str> = captured.stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines.first().copied(), Some("DEM\tinput\trequired\tDEM"));
    assert_eq!(
        lines.get(1).copied(),
        Some("MINSLOPE\tnumeric\trequired\tMinimum Slope")
    );
    assert!(captured.stdout.contains("RESULT\toutput"));
}

#[rstest]
fn describe_rejects_unknown_algorithm(workspace: Workspace) {
    let units = workspace.units_arg();
    let captured = invoke(
        &workspace,
        CannedSpawner::default(),
        &["describe", &units, "nope"],
    );

    assert_eq!(captured.exit, ExitCode::FAILURE);
    assert!(captured.stderr.contains("nope"), "stderr: {}", captured.stderr);
    assert!(captured.stdout.is_empty());
}

#[rstest]
fn run_prints_outputs_and_progress(workspace: Workspace) {
    let spawner = CannedSpawner::new([Some((BANNER, 0)), Some(("Filling\n40%\n100%\n", 0))]);
    let units = workspace.units_arg();
    let captured = invoke(
        &workspace,
        spawner.clone(),
        &[
            "run",
            &units,
            "fillsinks",
            "DEM=/data/dem.sdat",
            "RESULT=/out/filled.sdat",
        ],
    );

    assert_eq!(captured.exit, ExitCode::SUCCESS, "stderr: {}", captured.stderr);
    assert_eq!(captured.stdout, "RESULT=/out/filled.sdat\n");
    assert_eq!(captured.stderr, "40%\n100%\n");
    assert_eq!(spawner.launched().len(), 2);
}

#[rstest]
fn failed_job_sets_failure_exit(workspace: Workspace) {
    let spawner = CannedSpawner::new([Some((BANNER, 0)), Some(("Error: grid\n", 2))]);
    let units = workspace.units_arg();
    let captured = invoke(
        &workspace,
        spawner,
        &[
            "run",
            &units,
            "fillsinks",
            "DEM=/data/dem.sdat",
            "RESULT=/out/filled.sdat",
        ],
    );

    assert_eq!(captured.exit, ExitCode::FAILURE);
    assert!(
        captured
            .stderr
            .contains("algorithm 'fillsinks' failed (exit code 2)"),
        "stderr: {}",
        captured.stderr
    );
}

#[rstest]
#[case::no_separator("DEM")]
#[case::blank_key("=/data/dem.sdat")]
fn malformed_assignment_is_rejected(workspace: Workspace, #[case] assignment: &str) {
    let spawner = CannedSpawner::new([Some((BANNER, 0))]);
    let units = workspace.units_arg();
    let captured = invoke(
        &workspace,
        spawner.clone(),
        &["run", &units, "fillsinks", assignment],
    );

    assert_eq!(captured.exit, ExitCode::FAILURE);
    assert!(captured.stderr.contains("expected KEY=VALUE"));
    assert_eq!(spawner.launched().len(), 1, "only the version probe runs");
}

#[rstest]
fn run_reports_missing_tool(workspace: Workspace) {
    let units = workspace.units_arg();
    let captured = invoke(
        &workspace,
        CannedSpawner::new([None]),
        &["run", &units, "fillsinks", "DEM=/data/dem.sdat"],
    );

    assert_eq!(captured.exit, ExitCode::FAILURE);
    assert!(captured.stdout.is_empty());
}

#[rstest]
#[case::found(Some((BANNER, 0)), ExitCode::SUCCESS, "9.3.1\n")]
#[case::missing(None, ExitCode::FAILURE, "")]
fn probe_prints_version(
    workspace: Workspace,
    #[case] child: Option<(&'static str, i32)>,
    #[case] exit: ExitCode,
    #[case] stdout: &str,
) {
    let captured = invoke(&workspace, CannedSpawner::new([child]), &["probe", "--force"]);
    assert_eq!(captured.exit, exit);
    assert_eq!(captured.stdout, stdout);
    if exit == ExitCode::FAILURE {
        assert!(captured.stderr.contains("saga_cmd was not found"));
    }
}

#[rstest]
fn missing_subcommand_is_a_usage_error(workspace: Workspace) {
    let captured = invoke(&workspace, CannedSpawner::default(), &[]);
    assert_eq!(captured.exit, ExitCode::FAILURE);
    assert!(captured.stderr.contains("Usage"), "stderr: {}", captured.stderr);
}

#[rstest]
#[case("DEM=/data/dem.sdat", ("DEM", "/data/dem.sdat"))]
#[case(" METHOD =6", ("METHOD", "6"))]
#[case("NAME=a=b", ("NAME", "a=b"))]
#[case("EMPTY=", ("EMPTY", ""))]
fn assignments_split_on_first_equals(#[case] argument: &str, #[case] expected: (&str, &str)) {
    assert_eq!(parse_assignment(argument).expect("valid"), expected);
}
