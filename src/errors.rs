//! # Harness Faults
//!
//! Errors in the harness itself, as opposed to failures or errors *of the
//! code under test*. A harness fault aborts the run with a distinct exit
//! code; it is never folded into a test's Pass/Fail/Error classification,
//! and the engine never continues iterating as if the affected test ran.

use std::io;

use thiserror::Error;

/// Unified error type for every way the harness itself can fail.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("could not resolve the harness executable: {source}")]
    ExecutablePath {
        #[source]
        source: io::Error,
    },

    #[error("could not spawn isolated process for `{description}`: {source}")]
    Spawn {
        description: String,
        #[source]
        source: io::Error,
    },

    #[error("failure channel was not opened for `{description}`")]
    ChannelOpen { description: String },

    #[error("could not wait on isolated process for `{description}`: {source}")]
    Wait {
        description: String,
        #[source]
        source: io::Error,
    },

    #[error("malformed child target `{value}` in ISOSPEC_TARGET")]
    MalformedTarget { value: String },

    #[error("could not write the report: {source}")]
    ReportIo {
        #[from]
        source: io::Error,
    },
}
