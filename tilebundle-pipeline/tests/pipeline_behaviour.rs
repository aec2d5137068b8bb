//! Behavioural tests for `PipelineDriver::run` with scripted tools.

use camino::Utf8PathBuf;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::{cell::RefCell, fs, io::Cursor, io::Write};
use tempfile::TempDir;
use tilebundle_core::test_support::ScriptedToolRunner;
use tilebundle_core::{PipelineResult, ToolOutput, UploadArtifact};
use tilebundle_pipeline::{DriverConfig, PipelineDriver, PipelineError};
use zip::{ZipWriter, write::SimpleFileOptions};

const OGRINFO_REPORT: &str =
    r#"{"layers":[{"name":"city","geometryFields":[{"extent":[-3.2,55.9,-3.1,56.0]}]}]}"#;

struct PipelineWorld {
    _dir: TempDir,
    work_root: Utf8PathBuf,
    upload: RefCell<Option<UploadArtifact>>,
    runner: RefCell<ScriptedToolRunner>,
    programs: RefCell<Vec<String>>,
    outcome: RefCell<Option<Result<PipelineResult, PipelineError>>>,
}

impl PipelineWorld {
    fn script(&self, configure: impl FnOnce(ScriptedToolRunner) -> ScriptedToolRunner) {
        let runner = self.runner.take();
        self.runner.replace(configure(runner));
    }

    fn result(&self) -> PipelineResult {
        self.outcome
            .borrow()
            .as_ref()
            .expect("pipeline should have run")
            .as_ref()
            .expect("pipeline should succeed")
            .clone()
    }
}

#[fixture]
fn world() -> PipelineWorld {
    let dir = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 tempdir");
    PipelineWorld {
        _dir: dir,
        work_root: root.join("work"),
        upload: RefCell::new(None),
        runner: RefCell::new(ScriptedToolRunner::new()),
        programs: RefCell::new(Vec::new()),
        outcome: RefCell::new(None),
    }
}

fn zip_bytes(entries: &[&str]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for name in entries {
        if name.ends_with('/') {
            writer
                .add_directory(*name, SimpleFileOptions::default())
                .expect("add directory");
        } else {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .expect("start entry");
            writer.write_all(b"placeholder").expect("write entry");
        }
    }
    writer.finish().expect("finish zip").into_inner()
}

#[given("a shapefile container named {name}")]
fn shapefile_container(world: &PipelineWorld, name: String) {
    let bytes = zip_bytes(&["city.dbf", "city.prj", "city.shp", "city.shx"]);
    world
        .upload
        .replace(Some(UploadArtifact::new(name.trim_matches('"'), bytes)));
}

#[given("an empty container named {name}")]
fn empty_container(world: &PipelineWorld, name: String) {
    let bytes = zip_bytes(&["empty/"]);
    world
        .upload
        .replace(Some(UploadArtifact::new(name.trim_matches('"'), bytes)));
}

#[given("an upload named {name}")]
fn plain_upload(world: &PipelineWorld, name: String) {
    world.upload.replace(Some(UploadArtifact::new(
        name.trim_matches('"'),
        b"payload".to_vec(),
    )));
}

#[given("the extent probe reports a bounding box")]
fn probe_reports_extent(world: &PipelineWorld) {
    world.script(|runner| runner.with_output("ogrinfo", ToolOutput::succeeded(OGRINFO_REPORT)));
}

#[given("the extent probe prints malformed output")]
fn probe_prints_garbage(world: &PipelineWorld) {
    world.script(|runner| runner.with_output("ogrinfo", ToolOutput::succeeded("{ \"layers\": [")));
}

#[given("the {program} tool exits with status {status}")]
fn tool_exits(world: &PipelineWorld, program: String, status: i32) {
    let program = program.trim_matches('"').to_owned();
    world.script(|runner| runner.with_exit(program, status, "rejected input"));
}

#[when("the pipeline runs for bundle {name}")]
fn run_pipeline(world: &PipelineWorld, name: String) {
    let upload = world
        .upload
        .borrow()
        .clone()
        .expect("an upload should be given");
    let driver = PipelineDriver::new(
        world.runner.take(),
        DriverConfig::default().with_work_root(world.work_root.clone()),
    );
    let outcome = driver
        .run(&upload, name.trim_matches('"'))
        .map(tilebundle_pipeline::PipelineOutput::close);
    world.programs.replace(driver.runner().programs());
    world.outcome.replace(Some(outcome));
}

#[then("the route is {route}")]
fn route_is(world: &PipelineWorld, route: String) {
    assert_eq!(world.result().route.as_str(), route.trim_matches('"'));
}

#[then("the tools run in order {programs}")]
fn tools_in_order(world: &PipelineWorld, programs: String) {
    let expected: Vec<&str> = programs
        .trim_matches('"')
        .split(',')
        .map(str::trim)
        .filter(|program| !program.is_empty())
        .collect();
    assert_eq!(*world.programs.borrow(), expected);
}

#[then("the bounds are recorded")]
fn bounds_recorded(world: &PipelineWorld) {
    let bounds = world.result().bounds.expect("bounds should be present");
    assert_eq!(bounds.to_array(), [-3.2, 55.9, -3.1, 56.0]);
}

#[then("no bounds are recorded")]
fn bounds_absent(world: &PipelineWorld) {
    assert_eq!(world.result().bounds, None);
}

#[then("the archive is named {name}")]
fn archive_named(world: &PipelineWorld, name: String) {
    assert_eq!(
        world.result().archive.file_name(),
        Some(name.trim_matches('"'))
    );
}

#[then("the run fails with an input error")]
fn fails_with_input_error(world: &PipelineWorld) {
    let outcome = world.outcome.borrow();
    let outcome = outcome.as_ref().expect("pipeline should have run");
    match outcome {
        Ok(result) => panic!("expected failure, got {result:?}"),
        Err(err) => assert!(err.is_input_error(), "{err:?}"),
    }
}

#[then("no working directories remain")]
fn scopes_removed(world: &PipelineWorld) {
    let leftovers = fs::read_dir(&world.work_root).map_or(0, Iterator::count);
    assert_eq!(leftovers, 0);
}

#[scenario(path = "tests/features/pipeline.feature", index = 0)]
fn zipped_shapefile(world: PipelineWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/pipeline.feature", index = 1)]
fn rejected_tile_database(world: PipelineWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/pipeline.feature", index = 2)]
fn malformed_probe(world: PipelineWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/pipeline.feature", index = 3)]
fn empty_container_rejected(world: PipelineWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/pipeline.feature", index = 4)]
fn pass_through(world: PipelineWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/pipeline.feature", index = 5)]
fn failing_middle_stage(world: PipelineWorld) {
    let _ = world;
}
