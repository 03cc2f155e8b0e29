//! Crate-level integration and BDD tests.

use std::fs;

use tempfile::TempDir;

use crate::command::CommandBuilder;
use crate::descriptor::parse;
use crate::feedback::RecordingFeedback;
use crate::parameter::{ParameterValues, validate_all};
use crate::process::fake::{FakeSpawner, Script};
use crate::script::{ExecutionContext, Platform};
use crate::supervisor::{BatchSupervisor, ExecutionJob, JobState};

mod behaviour;

const SLOPE_UNIT: &str = "\
Slope, Aspect, Curvature|0
ta_morphometry
QgsProcessingParameterRasterLayer|ELEVATION|Elevation
QgsProcessingParameterEnum|METHOD|Method|[0] maximum slope;[1] maximum triangle slope;[6] 9 parameter 2nd order polynom (Zevenbergen & Thorne 1987)|False|2
QgsProcessingParameterRasterDestination|SLOPE|Slope
Hardcoded|-UNIT_SLOPE 1
";

#[test]
fn end_to_end_unit_to_finished_job() {
    let algorithm = parse("SlopeAspectCurvature.txt", SLOPE_UNIT).expect("unit parses");
    let values = ParameterValues::with_defaults(algorithm.parameters())
        .with("ELEVATION", "/data/dem.sdat")
        .with("SLOPE", "/out/slope.sdat");
    let resolved = validate_all(algorithm.parameters(), &values).expect("values validate");
    let commands = CommandBuilder::default()
        .build(&algorithm, &resolved)
        .expect("commands render");
    assert_eq!(
        commands,
        ["ta_morphometry \"0\" -ELEVATION \"/data/dem.sdat\" -METHOD 6 -SLOPE \"/out/slope.sdat\" -UNIT_SLOPE 1"]
    );

    let dir = TempDir::new().expect("temp dir");
    let context = ExecutionContext::per_job(dir.path()).with_platform(Platform::Linux);
    let spawner = FakeSpawner::new([Script::prints("Slope\n33%\n66%\n100%\n", 0)]);
    let mut job = ExecutionJob::new(commands);
    let mut feedback = RecordingFeedback::default();
    BatchSupervisor::new(&spawner, &context, None)
        .run(&mut job, &mut feedback)
        .expect("job runs");

    assert_eq!(job.state(), JobState::Succeeded);
    assert_eq!(feedback.progress, [33, 66, 100]);
    assert_eq!(job.console(), ["Slope"]);
    let leftovers = fs::read_dir(dir.path()).expect("list dir").count();
    assert_eq!(leftovers, 0, "per-job script should be removed");
}
