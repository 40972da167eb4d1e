//! # Reporter
//!
//! All user-facing output for a harness run: the live per-example progress
//! glyphs, the numbered failure and error sections, and the final tally
//! line. Rendering is a pure function of the registry's post-run state plus
//! the tally; the reporter holds no other state.
//!
//! Output goes through `termcolor` so the same code paths serve a colorized
//! terminal, a plain pipe, and the in-memory buffers used by tests.

use std::io::{self, Write};

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::registry::{Registry, Test, TestStatus};

/// Counters accumulated over one run, plus the exit-code rule.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunTally {
    pub passes: usize,
    pub failures: usize,
    pub errors: usize,
}

impl RunTally {
    pub fn record(&mut self, status: TestStatus) {
        match status {
            TestStatus::Pass => self.passes += 1,
            TestStatus::Fail => self.failures += 1,
            TestStatus::Error => self.errors += 1,
            TestStatus::NotRun => {}
        }
    }

    pub fn total(&self) -> usize {
        self.passes + self.failures + self.errors
    }

    pub fn is_clean(&self) -> bool {
        self.failures == 0 && self.errors == 0
    }

    /// The machine-readable interface for CI: 0 iff nothing failed or
    /// errored, otherwise the sum of both counts.
    pub fn exit_code(&self) -> i32 {
        (self.failures + self.errors) as i32
    }
}

/// Renders progress and the final report into any `WriteColor` sink.
pub struct Reporter<W: WriteColor> {
    out: W,
}

impl Reporter<StandardStream> {
    /// Reporter on stdout, colorized only when stdout is a terminal.
    pub fn stdout() -> Self {
        let choice = if atty::is(atty::Stream::Stdout) {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        };
        Self::new(StandardStream::stdout(choice))
    }
}

impl<W: WriteColor> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Flush pending output. The engine calls this before every spawn so a
    /// child can never inherit or duplicate buffered report text.
    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    /// Print one live progress glyph, flushed immediately.
    pub fn glyph(&mut self, status: TestStatus) -> io::Result<()> {
        let (glyph, color) = match status {
            TestStatus::Pass => ('.', Color::Green),
            TestStatus::Fail => ('F', Color::Red),
            TestStatus::Error => ('E', Color::Red),
            TestStatus::NotRun => ('?', Color::Yellow),
        };
        self.out.set_color(ColorSpec::new().set_fg(Some(color)))?;
        write!(self.out, "{glyph}")?;
        self.out.reset()?;
        self.out.flush()
    }

    /// Print the failure section, the error section, and the summary line.
    pub fn finish(&mut self, registry: &Registry, tally: &RunTally) -> io::Result<()> {
        writeln!(self.out)?;

        if tally.failures > 0 {
            writeln!(self.out)?;
            writeln!(self.out, "Failures:")?;
            self.failure_entries(registry)?;
        }
        if tally.errors > 0 {
            writeln!(self.out)?;
            writeln!(self.out, "Errors:")?;
            self.error_entries(registry)?;
        }

        writeln!(self.out)?;
        let color = if tally.is_clean() {
            Color::Green
        } else {
            Color::Red
        };
        self.out.set_color(ColorSpec::new().set_fg(Some(color)))?;
        writeln!(
            self.out,
            "{} examples, {} failures, {} errors",
            tally.total(),
            tally.failures,
            tally.errors
        )?;
        self.out.reset()?;
        self.out.flush()
    }

    fn failure_entries(&mut self, registry: &Registry) -> io::Result<()> {
        let mut number = 0;
        for suite in &registry.suites {
            for test in &suite.tests {
                if test.status != TestStatus::Fail {
                    continue;
                }
                number += 1;
                writeln!(self.out)?;
                writeln!(self.out, "  {number}) {}", label(&suite.desc, test))?;

                self.out.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
                for line in test.output.lines() {
                    writeln!(self.out, "     {line}")?;
                }
                self.out.reset()?;

                // The assertion's own line when the channel carried one,
                // the declaration line otherwise.
                let line = if test.failure_line > 0 {
                    test.failure_line
                } else {
                    test.origin.line
                };
                self.origin_line(test.origin.file, line)?;
            }
        }
        Ok(())
    }

    fn error_entries(&mut self, registry: &Registry) -> io::Result<()> {
        let mut number = 0;
        for suite in &registry.suites {
            for test in &suite.tests {
                if test.status != TestStatus::Error {
                    continue;
                }
                number += 1;
                writeln!(self.out)?;
                writeln!(self.out, "  {number}) {}", label(&suite.desc, test))?;
                // No channel data exists for an abnormal termination; only
                // the declaration site is known.
                self.origin_line(test.origin.file, test.origin.line)?;
            }
        }
        Ok(())
    }

    fn origin_line(&mut self, file: &str, line: u32) -> io::Result<()> {
        self.out
            .set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
        writeln!(self.out, "     # {file}:{line}")?;
        self.out.reset()
    }
}

fn label(suite_desc: &Option<String>, test: &Test) -> String {
    match suite_desc {
        Some(desc) => format!("{desc} {}", test.desc),
        None => test.desc.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use termcolor::NoColor;

    fn rendered(registry: &Registry, tally: &RunTally) -> String {
        let mut reporter = Reporter::new(NoColor::new(Vec::new()));
        reporter.finish(registry, tally).unwrap();
        String::from_utf8(reporter.out.into_inner()).unwrap()
    }

    fn fixture() -> (Registry, RunTally) {
        let mut registry = Registry::new();
        let math = registry.suite("math");
        registry.register(math, "add(2,3) returns 5", || Ok(()));
        registry.register(math, "add(2,3) returns 6", || Ok(()));
        let faults = registry.suite("faults");
        registry.register(faults, "stays inside its sandbox", || Ok(()));

        registry.suites[0].tests[0].status = TestStatus::Pass;
        registry.suites[0].tests[1].status = TestStatus::Fail;
        registry.suites[0].tests[1].output = "expected 6, got 5".to_string();
        registry.suites[0].tests[1].failure_line = 321;
        registry.suites[1].tests[0].status = TestStatus::Error;

        let mut tally = RunTally::default();
        for suite in &registry.suites {
            for test in &suite.tests {
                tally.record(test.status);
            }
        }
        (registry, tally)
    }

    #[test]
    fn tally_counts_and_exit_code() {
        let (_, tally) = fixture();
        assert_eq!((tally.passes, tally.failures, tally.errors), (1, 1, 1));
        assert_eq!(tally.total(), 3);
        assert_eq!(tally.exit_code(), 2);
        assert!(!tally.is_clean());
        assert_eq!(RunTally::default().exit_code(), 0);
    }

    #[test]
    fn glyphs_match_statuses() {
        let mut reporter = Reporter::new(NoColor::new(Vec::new()));
        reporter.glyph(TestStatus::Pass).unwrap();
        reporter.glyph(TestStatus::Fail).unwrap();
        reporter.glyph(TestStatus::Error).unwrap();
        assert_eq!(String::from_utf8(reporter.out.into_inner()).unwrap(), ".FE");
    }

    #[test]
    fn failure_entry_shows_message_and_assertion_origin() {
        let (registry, tally) = fixture();
        let out = rendered(&registry, &tally);
        assert!(out.contains("Failures:"));
        assert!(out.contains("  1) math add(2,3) returns 6"));
        assert!(out.contains("     expected 6, got 5"));
        // Assertion line from the channel, not the declaration line.
        let file = registry.suites[0].tests[1].origin.file;
        assert!(out.contains(&format!("     # {file}:321")));
    }

    #[test]
    fn error_entry_shows_only_the_declaration_origin() {
        let (registry, tally) = fixture();
        let out = rendered(&registry, &tally);
        let errored = &registry.suites[1].tests[0];
        assert!(out.contains("Errors:"));
        assert!(out.contains("  1) faults stays inside its sandbox"));
        assert!(out.contains(&format!(
            "     # {}:{}",
            errored.origin.file, errored.origin.line
        )));
    }

    #[test]
    fn summary_line_is_plural_and_complete() {
        let (registry, tally) = fixture();
        let out = rendered(&registry, &tally);
        assert!(out.ends_with("3 examples, 1 failures, 1 errors\n"));
    }

    #[test]
    fn clean_run_renders_no_sections() {
        let mut registry = Registry::new();
        let suite = registry.suite("math");
        registry.register(suite, "adds", || Ok(()));
        registry.suites[0].tests[0].status = TestStatus::Pass;
        let mut tally = RunTally::default();
        tally.record(TestStatus::Pass);

        let out = rendered(&registry, &tally);
        assert!(!out.contains("Failures:"));
        assert!(!out.contains("Errors:"));
        assert!(out.contains("1 examples, 0 failures, 0 errors"));
    }

    #[test]
    fn fallback_origin_uses_the_declaration_line_when_no_report_arrived() {
        let mut registry = Registry::new();
        let suite = registry.suite("silent");
        registry.register(suite, "exits without reporting", || Ok(()));
        registry.suites[0].tests[0].status = TestStatus::Fail;
        registry.suites[0].tests[0].output =
            "process exited with status 7 without writing a failure report".to_string();
        let mut tally = RunTally::default();
        tally.record(TestStatus::Fail);

        let out = rendered(&registry, &tally);
        let test = &registry.suites[0].tests[0];
        assert!(out.contains(&format!("     # {}:{}", test.origin.file, test.origin.line)));
    }

    #[test]
    fn failure_numbering_is_one_based_in_registration_order() {
        let mut registry = Registry::new();
        let suite = registry.suite("s");
        for name in ["first", "second", "third"] {
            registry.register(suite, name, || Ok(()));
        }
        let mut tally = RunTally::default();
        for test in &mut registry.suites[0].tests {
            test.status = TestStatus::Fail;
            test.output = "boom".to_string();
            test.failure_line = 1;
            tally.record(TestStatus::Fail);
        }

        let out = rendered(&registry, &tally);
        assert!(out.contains("  1) s first"));
        assert!(out.contains("  2) s second"));
        assert!(out.contains("  3) s third"));
    }
}
