//! Integration tests for flows, polling and outcome reporting

use std::cell::Cell;
use std::time::Duration;

use flowpoint::{
    Flow, FlowStatus, JsonFileReporter, ManualClock, NullReporter, PollPolicy, Poller, ProbeError,
    load_summary,
};
use pretty_assertions::assert_eq;

fn ok(value: bool) -> Result<bool, String> {
    Ok(value)
}

#[test]
fn test_critical_failure_first_step() {
    let mut flow = Flow::new("first step fails", NullReporter);
    flow.critical_step("A", || ok(false));
    flow.critical_step("B", || ok(true));
    flow.soft_step("C", || ok(true));

    let err = flow.finalize_and_assert().unwrap_err();
    let summary = err.summary();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.descriptions(), vec!["A", "B", "C"]);
    assert!(!summary.outcomes[0].skipped);
    assert!(summary.outcomes[1].skipped && summary.outcomes[2].skipped);
    assert!(summary.outcomes.iter().all(|o| !o.passed));
    assert!(err.to_string().contains("3 of 3 steps failed"));
}

#[test]
fn test_soft_failure_without_abort() {
    let mut flow = Flow::new("soft failure", NullReporter);
    flow.soft_step("A", || ok(false));
    flow.critical_step("B", || ok(true));

    let err = flow.finalize_and_assert().unwrap_err();
    let summary = err.summary();
    assert_eq!(summary.status, FlowStatus::Completed);
    assert_eq!(summary.outcomes[0].passed, false);
    assert_eq!(summary.outcomes[1].passed, true);
}

#[test]
fn test_pre_abort_successes_are_reported() {
    let mut flow = Flow::new("gift", NullReporter);
    flow.critical_step("log in sender", || ok(true));
    flow.soft_step("open friends list", || ok(true));
    flow.critical_step("select recipient", || ok(false));
    flow.soft_step("confirm gift", || ok(true));

    let err = flow.finalize_and_assert().unwrap_err();
    let summary = err.summary();
    assert_eq!(summary.passed_count, 2);
    assert_eq!(summary.failed_count, 2);
    assert_eq!(summary.skipped_count, 1);
    assert_eq!(summary.critical_failure().map(|o| o.description.as_str()), Some("select recipient"));
}

#[test]
fn test_summarize_is_stable_between_steps() {
    let mut flow = Flow::new("stable", NullReporter);
    flow.soft_step("one", || ok(true));
    let first = flow.summarize();
    let second = flow.summarize();
    assert_eq!(first, second);

    flow.soft_step("two", || ok(true));
    assert_eq!(flow.summarize().total, 2);
}

#[test]
fn test_macro_action_with_virtual_clock() {
    // A purchase dialog that becomes visible on the third check
    let clock = ManualClock::new();
    let poller = Poller::with_clock(&clock);
    let checks = Cell::new(0);
    let policy = PollPolicy::default();

    let mut flow = Flow::new("purchase", NullReporter);
    let passed = flow.wait_step_with(
        &poller,
        "checkout dialog opens",
        true,
        || {
            checks.set(checks.get() + 1);
            if checks.get() == 1 {
                Err(ProbeError::transient("dialog frame detached"))
            } else {
                Ok(checks.get() >= 3)
            }
        },
        &policy,
    );

    assert!(passed);
    assert_eq!(clock.elapsed(), Duration::from_millis(1000));
    assert!(flow.finalize_and_assert().is_ok());
}

#[test]
fn test_finalized_flow_rejects_late_critical_step() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("late.json");

    let mut flow = Flow::new("late", JsonFileReporter::new(&path));
    flow.critical_step("store opens", || ok(true));
    assert!(flow.finalize_and_assert().is_ok());
    let reported = load_summary(&path).unwrap();

    let mut ran = false;
    flow.critical_step("after finalize", || {
        ran = true;
        ok(false)
    });
    assert!(!ran);
    assert_eq!(flow.status(), FlowStatus::Completed);

    // the second finalize fails on the skipped step but leaves the report alone
    assert!(flow.finalize_and_assert().is_err());
    assert_eq!(load_summary(&path).unwrap(), reported);
}

#[test]
fn test_json_report_roundtrip_through_flow() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.json");

    let mut flow = Flow::new("library", JsonFileReporter::new(&path));
    flow.soft_step("game tile visible", || ok(true));
    flow.soft_step("download button enabled", || -> Result<bool, String> {
        Err("button missing".to_string())
    });
    let err = flow.finalize_and_assert().unwrap_err();

    let loaded = load_summary(&path).unwrap();
    assert_eq!(loaded.descriptions(), err.summary().descriptions());
    assert_eq!(loaded.outcomes[1].error.as_deref(), Some("button missing"));
    assert_eq!(loaded.status, FlowStatus::Completed);
}
