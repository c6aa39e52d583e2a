//! Pipeline integration tests covering the load command flow.

use super::helpers::{Workspace, entity_rows, location_total};
use super::*;
use crate::load::LoadArgs;
use rstest::rstest;

fn load_args(workspace: &Workspace, osm: camino::Utf8PathBuf) -> LoadArgs {
    LoadArgs {
        osm: Some(osm),
        database: Some(workspace.database()),
        ..LoadArgs::default()
    }
}

fn run_to_string(args: LoadArgs) -> Result<String, CliError> {
    let mut output = Vec::new();
    dispatch(Command::Load(args), &mut output)?;
    Ok(String::from_utf8(output).expect("report is UTF-8"))
}

#[rstest]
fn load_writes_entities_and_a_report() {
    let workspace = Workspace::new();
    let extract = workspace.plain_extract();

    let report = run_to_string(load_args(&workspace, extract)).expect("load should succeed");

    assert_eq!(
        entity_rows(&workspace.database()),
        vec![
            ("The Crown".to_owned(), "OpenStreetMap".to_owned()),
            ("High Street".to_owned(), "OpenStreetMap".to_owned()),
        ]
    );
    assert_eq!(location_total(&workspace.database()), 3);
    assert!(
        report.contains("pass 1: 3 nodes, 1 ways, 0 relations, 0 dangling references"),
        "unexpected report: {report}"
    );
    assert!(
        report.contains("pass 2: 2 entities (0 merged continuations) with 3 locations"),
        "unexpected report: {report}"
    );
    assert!(
        !workspace.default_geometry_store().exists(),
        "working store should be removed"
    );
}

#[rstest]
fn load_reads_bzip2_extracts_and_keeps_the_store_on_request() {
    let workspace = Workspace::new();
    let args = LoadArgs {
        keep_geometry_store: true,
        source: Some("Survey".to_owned()),
        batch_size: Some(1),
        ..load_args(&workspace, workspace.bzip2_extract())
    };

    let config = resolve_load_config(args).expect("valid configuration");
    let report = execute_load(&config).expect("load should succeed");

    assert_eq!(report.emit.entities_created, 2);
    assert_eq!(
        entity_rows(&workspace.database())
            .into_iter()
            .map(|(_, source)| source)
            .collect::<Vec<_>>(),
        vec!["Survey", "Survey"]
    );
    assert!(workspace.default_geometry_store().is_file());
}

#[rstest]
fn load_with_in_memory_geometry_touches_no_working_file() {
    let workspace = Workspace::new();
    let args = LoadArgs {
        in_memory_geometry: true,
        ..load_args(&workspace, workspace.plain_extract())
    };

    let config = resolve_load_config(args).expect("valid configuration");
    let report = execute_load(&config).expect("load should succeed");

    assert_eq!(report.resolve.elements(), 4);
    assert_eq!(location_total(&workspace.database()), 3);
    assert!(!workspace.default_geometry_store().exists());
}

#[rstest]
fn load_errors_when_the_extract_is_missing() {
    let workspace = Workspace::new();
    let args = load_args(&workspace, workspace.root().join("absent.osm"));

    let err = run_to_string(args).expect_err("missing extract should fail");
    match err {
        CliError::MissingSourceFile { field, .. } => assert_eq!(field, ARG_OSM),
        other => panic!("unexpected error {other:?}"),
    }
    assert!(!workspace.database().exists());
}

#[rstest]
fn malformed_extracts_fail_and_still_discard_the_store() {
    let workspace = Workspace::new();
    let extract = workspace.root().join("broken.osm");
    super::helpers::write_utf8(&extract, br#"<osm><way id="x"/></osm>"#);

    let err = run_to_string(load_args(&workspace, extract)).expect_err("decode should fail");
    match err {
        CliError::Load { .. } => {}
        other => panic!("unexpected error {other:?}"),
    }
    assert!(!workspace.default_geometry_store().exists());
}
