//! Integration tests for running JSON scenarios

use std::fs;
use std::path::Path;

use flowpoint::harness::{HarnessError, ScenarioConfig, run_scenario};
use flowpoint::{FlowStatus, JsonFileReporter, NullReporter, Session, load_summary};

fn write_scenario(dir: &Path, marker: &Path, log: &Path) -> std::path::PathBuf {
    let scenario = serde_json::json!({
        "name": "client start",
        "policy": {"timeout_ms": 50, "interval_ms": 10},
        "steps": [
            {
                "description": "client marker written",
                "critical": true,
                "probe": {"kind": "file_exists", "path": marker}
            },
            {
                "description": "client log reports ready",
                "probe": {"kind": "file_contains", "path": log, "needle": "ready"}
            },
            {
                "description": "updater finished",
                "probe": {"kind": "file_contains", "path": log, "needle": "updated"}
            }
        ]
    });
    let path = dir.join("scenario.json");
    fs::write(&path, serde_json::to_string_pretty(&scenario).unwrap()).unwrap();
    path
}

#[test]
fn test_scenario_collects_soft_failures() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("client.pid");
    let log = dir.path().join("client.log");
    fs::write(&marker, "42").unwrap();
    fs::write(&log, "booting\nready\n").unwrap();

    let config = ScenarioConfig::load(write_scenario(dir.path(), &marker, &log)).unwrap();
    let err = run_scenario(&config, NullReporter).unwrap_err();

    let HarnessError::Assertion(summary) = err else {
        panic!("expected assertion failure");
    };
    assert_eq!(summary.status, FlowStatus::Completed);
    assert_eq!(summary.passed_count, 2);
    assert_eq!(summary.failed_count, 1);
    assert_eq!(summary.outcomes[2].description, "updater finished");
}

#[test]
fn test_scenario_aborts_on_missing_marker() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("client.pid");
    let log = dir.path().join("client.log");

    let config = ScenarioConfig::load(write_scenario(dir.path(), &marker, &log)).unwrap();
    let session = Session::in_dir(dir.path().join("reports"));
    session.init().unwrap();
    let report_path = session.report_path(&config.name);

    let err = run_scenario(&config, JsonFileReporter::new(&report_path)).unwrap_err();
    assert!(matches!(err, HarnessError::Assertion(_)));

    let report = load_summary(&report_path).unwrap();
    assert_eq!(report.status, FlowStatus::Aborted);
    assert_eq!(report.skipped_count, 2);
    assert_eq!(session.list_reports().unwrap(), vec![report_path]);
}

#[test]
fn test_malformed_scenario_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ not json").unwrap();
    assert!(matches!(ScenarioConfig::load(&path), Err(HarnessError::Parse(_))));
}
