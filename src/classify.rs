//! # Outcome Classifier
//!
//! Pure, total mapping from a child's termination state plus the failure
//! channel's contents to a verdict. Every possible termination classifies;
//! there is no unknown outcome.

use crate::channel::FailureReport;
use crate::executor::Termination;

/// Classified outcome of one isolated execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail(FailureReport),
    Error,
}

/// Classify a termination:
///
/// - signal or deadline kill means the child never got to report, so the
///   channel is ignored and the verdict is `Error`;
/// - a clean zero exit is `Pass`;
/// - a clean nonzero exit is `Fail`, carrying the decoded report, or a
///   substitute naming the exit code when the child wrote nothing usable.
pub fn classify(termination: Termination, channel: &[u8]) -> Verdict {
    match termination {
        Termination::Signaled(_) | Termination::TimedOut => Verdict::Error,
        Termination::Exited(0) => Verdict::Pass,
        Termination::Exited(code) => Verdict::Fail(
            FailureReport::decode(channel).unwrap_or_else(|| FailureReport::missing(code)),
        ),
    }
}
