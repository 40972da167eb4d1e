//! # Isolation Executor
//!
//! Runs one example in a separate fault domain. The parent re-executes its
//! own binary with [`CHILD_TARGET_ENV`] naming the example; the child runs
//! the same registration pass, so both processes see an identical registry,
//! then the child executes exactly one unit of work and terminates.
//!
//! The child's stdout is the failure channel and nothing else: the parent
//! drains it under a hard byte bound, waits for termination (optionally
//! against a deadline), and reduces the exit state to a [`Termination`]
//! value for classification. A crash, abort, panic, or hang inside the
//! unit of work ends in the child; the parent only ever observes its
//! termination.

use std::io::{self, Write};
use std::process::{self, Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use std::{env, panic};

use crate::channel::{drain_bounded, FailureReport};
use crate::errors::HarnessError;
use crate::registry::Registry;

/// Environment variable that marks a process as an isolated child and names
/// its target example as `<suite index>:<test index>`.
pub const CHILD_TARGET_ENV: &str = "ISOSPEC_TARGET";

/// Exit code the child uses to signal an assertion failure.
pub const FAILURE_EXIT_CODE: i32 = 1;

/// Interval between `try_wait` polls while a deadline is armed.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// How a child process ended, as far as the parent can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Exited normally with this code.
    Exited(i32),
    /// Terminated by a signal (the signal number where the platform
    /// exposes one), or otherwise did not produce an exit code.
    Signaled(Option<i32>),
    /// Killed by the executor after exceeding the configured deadline.
    TimedOut,
}

/// Everything the parent learns from one isolated execution.
#[derive(Debug)]
pub struct ChildOutcome {
    pub termination: Termination,
    pub channel: Vec<u8>,
}

/// Coordinates of one example inside the registry, stable across the
/// re-exec boundary because registration is deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildTarget {
    pub suite: usize,
    pub test: usize,
}

impl ChildTarget {
    /// Read the target from the environment. `Ok(None)` means this process
    /// is the parent; a present-but-malformed value is a harness fault.
    pub fn from_env() -> Result<Option<Self>, HarnessError> {
        let Some(raw) = env::var_os(CHILD_TARGET_ENV) else {
            return Ok(None);
        };
        let raw = raw.to_string_lossy().into_owned();
        match Self::parse(&raw) {
            Some(target) => Ok(Some(target)),
            None => Err(HarnessError::MalformedTarget { value: raw }),
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        let (suite, test) = raw.split_once(':')?;
        Some(Self {
            suite: suite.parse().ok()?,
            test: test.parse().ok()?,
        })
    }

    fn encode(&self) -> String {
        format!("{}:{}", self.suite, self.test)
    }
}

/// Parent-side runner for isolated children.
pub struct Executor {
    timeout: Option<Duration>,
}

impl Executor {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    /// Execute one example in a fresh child process and collect its
    /// termination state plus whatever it left on the failure channel.
    ///
    /// Process-creation failures surface as harness faults; they are never
    /// recorded as if the example ran.
    pub fn execute(
        &self,
        target: ChildTarget,
        description: &str,
    ) -> Result<ChildOutcome, HarnessError> {
        let exe = env::current_exe().map_err(|source| HarnessError::ExecutablePath { source })?;

        let mut child = Command::new(exe)
            .env(CHILD_TARGET_ENV, target.encode())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| HarnessError::Spawn {
                description: description.to_string(),
                source,
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| HarnessError::ChannelOpen {
                description: description.to_string(),
            })?;

        // Drain on a helper thread so a child that floods its pipe can
        // still exit; the drain itself is byte-bounded and cannot block
        // past child termination, when the write end closes.
        let drain = thread::spawn(move || drain_bounded(stdout));

        let termination = self.wait(&mut child, description)?;
        let channel = drain.join().unwrap_or_default();

        Ok(ChildOutcome {
            termination,
            channel,
        })
    }

    fn wait(&self, child: &mut Child, description: &str) -> Result<Termination, HarnessError> {
        let wait_err = |source| HarnessError::Wait {
            description: description.to_string(),
            source,
        };

        let Some(limit) = self.timeout else {
            let status = child.wait().map_err(wait_err)?;
            return Ok(termination_of(status));
        };

        let deadline = Instant::now() + limit;
        loop {
            if let Some(status) = child.try_wait().map_err(wait_err)? {
                return Ok(termination_of(status));
            }
            if Instant::now() >= deadline {
                // Already-exited children make kill a no-op error; the
                // reap below still collects them.
                let _ = child.kill();
                let _ = child.wait();
                return Ok(Termination::TimedOut);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

fn termination_of(status: ExitStatus) -> Termination {
    match status.code() {
        Some(code) => Termination::Exited(code),
        None => {
            #[cfg(unix)]
            let signal = {
                use std::os::unix::process::ExitStatusExt;
                status.signal()
            };
            #[cfg(not(unix))]
            let signal = None;
            Termination::Signaled(signal)
        }
    }
}

/// Child-side entry: run exactly one unit of work, then terminate.
///
/// Never returns. A clean return from the work exits 0; a failed check
/// writes its report on the channel and exits nonzero; a panic aborts the
/// process so it classifies as an abnormal termination, not a failure.
pub fn run_child(registry: &Registry, target: ChildTarget) -> ! {
    panic::set_hook(Box::new(|_| process::abort()));

    let stdout = io::stdout();
    let Some(test) = registry.lookup(target.suite, target.test) else {
        // The child rebuilt a different registry than the parent saw.
        let report = FailureReport::new(
            0,
            "target example not found in child registry; registration is not deterministic",
        );
        let _ = report.encode(&mut stdout.lock());
        process::exit(FAILURE_EXIT_CODE);
    };

    match (test.work)() {
        Ok(()) => process::exit(0),
        Err(failure) => {
            let report = FailureReport::from_failure(&failure);
            let mut out = stdout.lock();
            let _ = report.encode(&mut out);
            let _ = out.flush();
            process::exit(FAILURE_EXIT_CODE);
        }
    }
}
