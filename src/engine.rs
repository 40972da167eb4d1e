//! # Run Engine
//!
//! The sequential control loop tying the harness together: dispatch between
//! parent and child roles, iterate every registered example in order, hand
//! each one to the isolation executor, classify its termination, and feed
//! the reporter. Exactly one child is outstanding at any time; the parent
//! blocks on each child before starting the next, so output order equals
//! registration order by construction.

use std::env;
use std::process;
use std::time::Duration;

use termcolor::WriteColor;

use crate::classify::{classify, Verdict};
use crate::errors::HarnessError;
use crate::executor::{run_child, ChildTarget, Executor};
use crate::registry::{Registry, Test, TestStatus};
use crate::report::{Reporter, RunTally};

/// Exit code for harness faults, distinct from any failure/error tally.
pub const HARNESS_FAULT_EXIT: i32 = 101;

/// Environment override for the per-example deadline, in milliseconds.
/// `0` disables the deadline entirely.
pub const TIMEOUT_ENV: &str = "ISOSPEC_TIMEOUT_MS";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Execution settings for one run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Deadline after which an unresponsive child is killed and recorded
    /// as an error. `None` waits forever.
    pub timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

impl Config {
    /// Default settings with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = env::var(TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(0) => config.timeout = None,
                Ok(ms) => config.timeout = Some(Duration::from_millis(ms)),
                Err(_) => {}
            }
        }
        config
    }
}

/// Run every registered example, rendering to stdout.
pub fn run(registry: &mut Registry, config: &Config) -> Result<RunTally, HarnessError> {
    let mut reporter = Reporter::stdout();
    run_with_reporter(registry, config, &mut reporter)
}

/// Run every registered example, rendering into the given reporter.
///
/// Examples execute strictly sequentially in registration order; each
/// status is recorded and its glyph printed before the next child spawns.
/// A harness fault aborts the run immediately.
pub fn run_with_reporter<W: WriteColor>(
    registry: &mut Registry,
    config: &Config,
    reporter: &mut Reporter<W>,
) -> Result<RunTally, HarnessError> {
    let executor = Executor::new(config.timeout);
    let mut tally = RunTally::default();

    for suite_index in 0..registry.suites.len() {
        for test_index in 0..registry.suites[suite_index].tests.len() {
            // Flush so the child cannot inherit buffered report text.
            reporter.flush()?;

            let target = ChildTarget {
                suite: suite_index,
                test: test_index,
            };
            let description = registry.suites[suite_index].tests[test_index].desc.clone();
            let outcome = executor.execute(target, &description)?;
            let verdict = classify(outcome.termination, &outcome.channel);

            let test = &mut registry.suites[suite_index].tests[test_index];
            let status = apply(test, verdict);
            tally.record(status);
            reporter.glyph(status)?;
        }
    }

    reporter.finish(registry, &tally)?;
    Ok(tally)
}

/// Record a verdict onto the example it belongs to. The single NotRun →
/// terminal transition in the whole system happens here.
fn apply(test: &mut Test, verdict: Verdict) -> TestStatus {
    debug_assert_eq!(test.status, TestStatus::NotRun);
    match verdict {
        Verdict::Pass => test.status = TestStatus::Pass,
        Verdict::Fail(report) => {
            test.status = TestStatus::Fail;
            test.output = report.message;
            test.failure_line = if report.line > 0 {
                report.line
            } else {
                // Silent channel; point at the declaration instead.
                test.origin.line
            };
        }
        Verdict::Error => test.status = TestStatus::Error,
    }
    test.status
}

/// The single program entry for a spec binary: run the registration pass,
/// then act as either the supervising parent or an isolated child.
///
/// `build` must register deterministically; it runs once in the parent and
/// once in every child, and both sides rely on identical ordering.
pub fn harness_main(build: impl FnOnce(&mut Registry)) -> ! {
    let mut registry = Registry::new();
    build(&mut registry);

    match ChildTarget::from_env() {
        Ok(Some(target)) => run_child(&registry, target),
        Ok(None) => {}
        Err(err) => fault(err),
    }

    match run(&mut registry, &Config::from_env()) {
        Ok(tally) => process::exit(tally.exit_code()),
        Err(err) => fault(err),
    }
}

fn fault(err: HarnessError) -> ! {
    // Harness faults must never masquerade as a passing (or failing) run.
    eprintln!("isospec: {err}");
    process::exit(HARNESS_FAULT_EXIT)
}
