//! Unit tests for the classify command.

use super::*;
use crate::classify::ClassifyReport;
use rstest::rstest;
use tilebundle_core::{ConversionRoute, ConversionStage};

#[rstest]
#[case("ready.PMTILES", Some(ConversionRoute::PassThrough), 0, false)]
#[case("harbour.mbtiles", Some(ConversionRoute::FromTileDatabase), 1, false)]
#[case("parks.json", Some(ConversionRoute::FromInterchange), 2, true)]
#[case("roads.kml", Some(ConversionRoute::FromGenericOgr), 3, true)]
#[case("README", Some(ConversionRoute::FromGenericOgr), 3, true)]
#[case("city.shp.zip", None, 0, false)]
fn reports_route_and_stages(
    #[case] name: &str,
    #[case] route: Option<ConversionRoute>,
    #[case] stage_count: usize,
    #[case] attempts_bounds: bool,
) {
    let report = ClassifyReport::for_name(name);
    assert_eq!(report.route, route);
    assert_eq!(report.stages.len(), stage_count);
    assert_eq!(report.attempts_bounds, attempts_bounds);
    assert_eq!(report.container, route.is_none());
}

#[rstest]
fn classify_command_prints_json() {
    let cli = Cli::try_parse_from(["tilebundle", "classify", "Parks.GeoJSON"]).expect("parse");
    let mut stdout = Vec::new();
    let builder = super::helpers::ScriptedRunnerBuilder::default();
    dispatch(cli.command, &builder, &mut stdout).expect("classify succeeds");

    let report: ClassifyReport = serde_json::from_slice(&stdout).expect("JSON report");
    assert_eq!(report.extension, "geojson");
    assert_eq!(report.route, Some(ConversionRoute::FromInterchange));
    assert_eq!(
        report.stages,
        vec![
            ConversionStage::InterchangeToTileDatabase,
            ConversionStage::TileDatabaseToArchive
        ]
    );
    assert!(builder.runner.invocations().is_empty());

    let raw: serde_json::Value = serde_json::from_slice(&stdout).expect("JSON value");
    assert_eq!(raw["route"], "from_interchange");
}

#[rstest]
fn classify_requires_a_name() {
    let err = Cli::try_parse_from(["tilebundle", "classify"]).expect_err("missing name");
    assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    assert_eq!(CliError::from(err).exit_code(), EXIT_INPUT);
}
