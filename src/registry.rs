//! # Isospec Registry
//!
//! Ordered bookkeeping for suites and the examples they own. The registry is
//! built in full by an explicit registration pass before the engine starts,
//! and is read-only during execution except for the per-example status fields
//! the engine fills in after each isolated run.
//!
//! Registry Invariant: registration order is execution order. The live glyph
//! stream, the failure/error numbering, and the parent/child target lookup
//! all depend on suites and examples iterating exactly as they were
//! registered. Registration is append-only; nothing is ever removed.

use std::panic::Location;

use crate::expect::Check;

/// A unit of work: the body of one example. Invoked only inside an isolated
/// child process, where returning `Err` becomes the failure report and a
/// panic or fault becomes an abnormal termination.
pub type UnitOfWork = Box<dyn Fn() -> Check>;

/// Where an example was declared, recorded for failure/error reporting only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin {
    pub file: &'static str,
    pub line: u32,
}

impl Origin {
    /// Capture the caller's declaration site.
    #[track_caller]
    pub fn caller() -> Self {
        let loc = Location::caller();
        Self {
            file: loc.file(),
            line: loc.line(),
        }
    }
}

/// Terminal state of one example. Transitions exactly once, from `NotRun`
/// to one of the three terminal values, applied by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestStatus {
    NotRun,
    Pass,
    Fail,
    Error,
}

/// One independently executable example.
///
/// `output` and `failure_line` are meaningful only when `status` is `Fail`;
/// both come from the failure channel and are bounded by its capacity.
pub struct Test {
    pub desc: String,
    pub origin: Origin,
    pub work: UnitOfWork,
    pub status: TestStatus,
    pub output: String,
    pub failure_line: u32,
}

/// A grouping of examples. `desc` is `None` for the implicit top-level
/// suite. A suite with zero examples is legal and contributes nothing to
/// the report.
pub struct Suite {
    pub desc: Option<String>,
    pub tests: Vec<Test>,
}

/// Opaque handle to a registered suite, returned by [`Registry::suite`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuiteId(pub(crate) usize);

/// The ordered collection of suites for one harness run.
#[derive(Default)]
pub struct Registry {
    pub suites: Vec<Suite>,
    root: Option<usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a named suite and return its handle.
    pub fn suite(&mut self, desc: impl Into<String>) -> SuiteId {
        self.suites.push(Suite {
            desc: Some(desc.into()),
            tests: Vec::new(),
        });
        SuiteId(self.suites.len() - 1)
    }

    /// Handle to the implicit top-level suite, created on first use.
    pub fn root(&mut self) -> SuiteId {
        match self.root {
            Some(index) => SuiteId(index),
            None => {
                self.suites.push(Suite {
                    desc: None,
                    tests: Vec::new(),
                });
                let index = self.suites.len() - 1;
                self.root = Some(index);
                SuiteId(index)
            }
        }
    }

    /// Append an example to a suite, recording the declaration site.
    #[track_caller]
    pub fn register<F>(&mut self, suite: SuiteId, desc: impl Into<String>, work: F)
    where
        F: Fn() -> Check + 'static,
    {
        let origin = Origin::caller();
        self.suites[suite.0].tests.push(Test {
            desc: desc.into(),
            origin,
            work: Box::new(work),
            status: TestStatus::NotRun,
            output: String::new(),
            failure_line: 0,
        });
    }

    /// Total number of registered examples across all suites.
    pub fn example_count(&self) -> usize {
        self.suites.iter().map(|s| s.tests.len()).sum()
    }

    /// Look up one example by suite and example index.
    pub fn lookup(&self, suite: usize, test: usize) -> Option<&Test> {
        self.suites.get(suite)?.tests.get(test)
    }
}
