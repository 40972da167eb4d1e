// End-to-end tests for the process-isolation harness, driven through the
// demo runner binary. Each test launches the runner as a real process, so
// spawn, channel transport, classification, reporting, and the exit-code
// contract are all exercised across a genuine process boundary.
// Requires: assert_cmd, predicates crates in [dev-dependencies]

use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

fn demo(fixture: Option<&str>) -> Command {
    let mut cmd = Command::cargo_bin("isospec-demo").unwrap();
    cmd.env_remove("ISOSPEC_FIXTURE")
        .env_remove("ISOSPEC_TIMEOUT_MS")
        .env_remove("ISOSPEC_TARGET");
    if let Some(fixture) = fixture {
        cmd.env("ISOSPEC_FIXTURE", fixture);
    }
    cmd
}

#[test]
fn all_passing_showcase_exits_zero() {
    demo(None).assert().success().stdout(
        contains("....")
            .and(contains("4 examples, 0 failures, 0 errors"))
            .and(contains("Failures:").not())
            .and(contains("Errors:").not()),
    );
}

#[test]
fn first_fails_second_passes_lists_only_the_first() {
    demo(Some("pair")).assert().code(1).stdout(
        contains("F.")
            .and(contains("2 examples, 1 failures, 0 errors"))
            .and(contains("  1) math add(2,3) returns 6"))
            .and(contains("expected 6, got 5"))
            .and(contains("# src/bin/demo.rs:"))
            .and(contains("  2)").not()),
    );
}

#[test]
fn crashes_classify_as_errors_and_spare_the_rest_of_the_run() {
    demo(Some("crash")).assert().code(2).stdout(
        contains("EE.")
            .and(contains("Errors:"))
            .and(contains("  1) faults aborts the process"))
            .and(contains("  2) faults panics mid-example"))
            .and(contains("# src/bin/demo.rs:"))
            .and(contains("3 examples, 0 failures, 2 errors"))
            .and(contains("Failures:").not()),
    );
}

#[test]
fn hung_example_is_killed_and_recorded_as_an_error() {
    demo(Some("hang"))
        .env("ISOSPEC_TIMEOUT_MS", "200")
        .assert()
        .code(1)
        .stdout(contains("E.").and(contains("2 examples, 0 failures, 1 errors")));
}

#[test]
fn overlong_failure_message_truncates_to_channel_capacity() {
    demo(Some("truncate")).assert().code(1).stdout(
        contains("x".repeat(512))
            .and(contains("x".repeat(513)).not())
            .and(contains("1 examples, 1 failures, 0 errors")),
    );
}

#[test]
fn exit_code_is_the_sum_of_failures_and_errors() {
    demo(Some("tally")).assert().code(3).stdout(
        contains("FFE.")
            .and(contains("4 examples, 2 failures, 1 errors"))
            .and(contains("expected 5, got 4"))
            .and(contains("expected `add(7, 0) == 0` to hold")),
    );
}

#[test]
fn failure_numbering_is_per_section_and_one_based() {
    demo(Some("tally")).assert().code(3).stdout(
        contains("  1) math wrong sum")
            .and(contains("  2) math zero is absorbing"))
            // The error section restarts its numbering.
            .and(contains("  1) math aborts while summing")),
    );
}

#[test]
fn child_mode_runs_one_example_silently_on_success() {
    demo(None)
        .env("ISOSPEC_TARGET", "0:0")
        .assert()
        .success()
        .stdout(predicates::str::is_empty());
}

#[test]
fn child_mode_failure_emits_a_single_report_frame() {
    demo(Some("pair"))
        .env("ISOSPEC_TARGET", "0:0")
        .assert()
        .code(1)
        .stdout(contains("\"line\":").and(contains("expected 6, got 5")));
}

#[test]
fn child_mode_rejects_an_out_of_range_target() {
    demo(None)
        .env("ISOSPEC_TARGET", "9:9")
        .assert()
        .code(1)
        .stdout(contains("not deterministic"));
}

#[test]
fn malformed_child_target_is_a_harness_fault() {
    demo(None)
        .env("ISOSPEC_TARGET", "bogus")
        .assert()
        .code(101)
        .stderr(contains("malformed child target"));
}
