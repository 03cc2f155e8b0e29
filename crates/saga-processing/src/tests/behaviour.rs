//! Behaviour-driven tests for loading and running algorithms.

use std::cell::RefCell;
use std::fs;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

use crate::error::ProcessingError;
use crate::feedback::RecordingFeedback;
use crate::parameter::ParameterValues;
use crate::process::fake::{FakeSpawner, Script};
use crate::provider::{ProviderSettings, RunOutcome, SagaProvider, VersionPolicy};
use crate::script::Platform;

const FILL_UNIT: &str = "\
Fill Sinks|2
ta_preprocessor
QgsProcessingParameterRasterLayer|DEM|DEM
QgsProcessingParameterNumber|MINSLOPE|Minimum Slope|QgsProcessingParameterNumber.Double|0.1|False|0.0|None
QgsProcessingParameterRasterDestination|RESULT|Filled DEM
";

// ---------------------------------------------------------------------------
// Test world
// ---------------------------------------------------------------------------

struct TestWorld {
    units: TempDir,
    scripts: TempDir,
    policy: VersionPolicy,
    queued: Vec<Script>,
    provider: Option<SagaProvider<FakeSpawner>>,
    loaded: Option<Result<usize, ProcessingError>>,
    run: Option<Result<RunOutcome, ProcessingError>>,
    feedback: RecordingFeedback,
}

impl TestWorld {
    fn new() -> Self {
        Self {
            units: TempDir::new().expect("units dir"),
            scripts: TempDir::new().expect("scripts dir"),
            policy: VersionPolicy::Warn,
            queued: Vec::new(),
            provider: None,
            loaded: None,
            run: None,
            feedback: RecordingFeedback::default(),
        }
    }

    fn provider(&self) -> &SagaProvider<FakeSpawner> {
        self.provider.as_ref().expect("algorithms were not loaded")
    }

    fn run_with(&mut self, values: &ParameterValues) {
        let mut feedback = RecordingFeedback::default();
        let result = self.provider().run("fillsinks", values, &mut feedback);
        self.feedback = feedback;
        self.run = Some(result);
    }

    fn outcome(&self) -> &RunOutcome {
        self.run
            .as_ref()
            .expect("no run captured")
            .as_ref()
            .expect("expected the run to complete")
    }
}

#[fixture]
fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new())
}

// ---------------------------------------------------------------------------
// Given steps
// ---------------------------------------------------------------------------

#[given("a description directory holding the fill sinks unit")]
fn given_units(world: &RefCell<TestWorld>) {
    let w = world.borrow();
    fs::write(w.units.path().join("FillSinks.txt"), FILL_UNIT).expect("write unit");
}

#[given("the version policy aborts on outdated tools")]
fn given_abort_policy(world: &RefCell<TestWorld>) {
    world.borrow_mut().policy = VersionPolicy::Abort;
}

#[given("saga_cmd reports version \"{version}\"")]
fn given_version(world: &RefCell<TestWorld>, version: String) {
    let banner = format!("####\nSAGA Version: {version} (64 bit)\n####\n");
    world.borrow_mut().queued.push(Script::prints(&banner, 0));
}

#[given("saga_cmd is not installed")]
fn given_not_installed(world: &RefCell<TestWorld>) {
    world.borrow_mut().queued.push(Script::SpawnError);
}

#[given("the batch job prints progress up to 100 percent and exits with {code}")]
fn given_job(world: &RefCell<TestWorld>, code: i32) {
    world
        .borrow_mut()
        .queued
        .push(Script::prints("Filling sinks\r25%\r50%\r100%\nFinished\n", code));
}

// ---------------------------------------------------------------------------
// When steps
// ---------------------------------------------------------------------------

#[when("the algorithms are loaded")]
fn when_loaded(world: &RefCell<TestWorld>) {
    let mut w = world.borrow_mut();
    let settings = ProviderSettings {
        script_dir: w.scripts.path().to_path_buf(),
        version_policy: w.policy,
        platform: Platform::Linux,
        ..ProviderSettings::default()
    };
    let spawner = FakeSpawner::new(std::mem::take(&mut w.queued));
    let mut provider = SagaProvider::with_spawner(settings, spawner);
    let result = provider.load_algorithms(w.units.path());
    w.provider = Some(provider);
    w.loaded = Some(result);
}

#[when("fillsinks runs on \"{dem}\" writing \"{result}\"")]
fn when_run(world: &RefCell<TestWorld>, dem: String, result: String) {
    let values = ParameterValues::new()
        .with("DEM", dem)
        .with("MINSLOPE", 0.1)
        .with("RESULT", result);
    world.borrow_mut().run_with(&values);
}

#[when("fillsinks runs without an elevation model")]
fn when_run_without_dem(world: &RefCell<TestWorld>) {
    let values = ParameterValues::new().with("RESULT", "/out/filled.sdat");
    world.borrow_mut().run_with(&values);
}

// ---------------------------------------------------------------------------
// Then steps
// ---------------------------------------------------------------------------

#[then("{count} algorithms are registered")]
fn then_count(world: &RefCell<TestWorld>, count: usize) {
    assert_eq!(world.borrow().provider().registry().len(), count);
}

#[then("the provider long name is \"{name}\"")]
fn then_long_name(world: &RefCell<TestWorld>, name: String) {
    assert_eq!(world.borrow().provider().long_name(), name);
}

#[then("loading fails with \"{message}\"")]
fn then_load_fails(world: &RefCell<TestWorld>, message: String) {
    let w = world.borrow();
    let err = w
        .loaded
        .as_ref()
        .expect("nothing was loaded")
        .as_ref()
        .expect_err("expected loading to fail");
    assert_eq!(err.to_string(), message);
}

#[then("the run succeeds")]
fn then_run_succeeds(world: &RefCell<TestWorld>) {
    let w = world.borrow();
    assert!(w.outcome().success, "console: {:?}", w.outcome().job.console());
}

#[then("the last reported progress is {percent}")]
fn then_progress(world: &RefCell<TestWorld>, percent: u8) {
    let w = world.borrow();
    assert_eq!(w.feedback.progress.last(), Some(&percent));
    assert_eq!(w.outcome().job.progress(), Some(percent));
}

#[then("output {key} is \"{path}\"")]
fn then_output(world: &RefCell<TestWorld>, key: String, path: String) {
    let w = world.borrow();
    assert_eq!(w.outcome().outputs.get(&key), Some(&path));
}

#[then("the run fails with exit code {code}")]
fn then_run_fails(world: &RefCell<TestWorld>, code: i32) {
    let w = world.borrow();
    assert!(!w.outcome().success);
    assert_eq!(w.outcome().job.exit_code(), Some(code));
}

#[then("the run is rejected with \"{message}\"")]
fn then_run_rejected(world: &RefCell<TestWorld>, message: String) {
    let w = world.borrow();
    let err = w
        .run
        .as_ref()
        .expect("no run captured")
        .as_ref()
        .expect_err("expected the run to be rejected");
    assert_eq!(err.to_string(), message);
}

// ---------------------------------------------------------------------------
// Scenario registration
// ---------------------------------------------------------------------------

#[scenario(path = "tests/features/algorithm_provider.feature")]
fn algorithm_provider_behaviour(world: RefCell<TestWorld>) {
    let _ = world;
}
