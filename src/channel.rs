//! # Failure Channel
//!
//! The bounded, one-shot transport that carries the reason for an assertion
//! failure from an isolated child back to the supervising parent. The child
//! writes a single [`FailureReport`] as its last observable act before
//! exiting nonzero; the parent decodes it only after observing that exit.
//!
//! Capacity Invariant: the message is truncated to [`MESSAGE_CAPACITY`] on
//! the write side, and again on the read side. The parent never reads more
//! than [`CHANNEL_READ_LIMIT`] bytes into memory regardless of what the
//! child wrote. This is the memory-safety boundary between the harness and
//! arbitrary code under test; writers truncate, readers bound, nothing
//! overruns.

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use crate::expect::Failure;

/// Maximum failure-message payload, in bytes.
pub const MESSAGE_CAPACITY: usize = 512;

/// Hard bound on bytes retained from the child's side of the channel. Large
/// enough for one fully escaped report frame plus slack for stray output.
pub const CHANNEL_READ_LIMIT: usize = 4096;

/// The typed record sent across the process boundary: the source line of the
/// failing assertion plus the formatted message, capped at capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    pub line: u32,
    pub message: String,
}

impl FailureReport {
    pub fn new(line: u32, message: impl Into<String>) -> Self {
        let mut message = message.into();
        truncate_to_capacity(&mut message);
        Self { line, message }
    }

    pub fn from_failure(failure: &Failure) -> Self {
        Self::new(failure.line, failure.message.clone())
    }

    /// Substitute used when a child exited nonzero without writing a report.
    /// A line of 0 tells the reporter to fall back to the declaration site.
    pub fn missing(code: i32) -> Self {
        Self::new(
            0,
            format!("process exited with status {code} without writing a failure report"),
        )
    }

    /// Serialize as a single JSON line. Child side only. The leading
    /// newline keeps the frame off any unterminated line the unit of work
    /// may have printed before failing.
    pub fn encode<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let frame =
            serde_json::to_vec(self).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        out.write_all(b"\n")?;
        out.write_all(&frame)?;
        out.write_all(b"\n")
    }

    /// Recover a report from whatever the child left on the channel.
    ///
    /// The unit of work may have printed before failing, so the report is
    /// the *last* line that parses; anything else is ignored. Returns `None`
    /// for an empty or garbled channel.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let text = String::from_utf8_lossy(bytes);
        let mut report: Self = text
            .lines()
            .rev()
            .find_map(|line| serde_json::from_str(line.trim()).ok())?;
        truncate_to_capacity(&mut report.message);
        Some(report)
    }
}

/// Cap a message at [`MESSAGE_CAPACITY`] bytes, backing off to the nearest
/// UTF-8 character boundary.
pub fn truncate_to_capacity(message: &mut String) {
    if message.len() <= MESSAGE_CAPACITY {
        return;
    }
    let mut end = MESSAGE_CAPACITY;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    message.truncate(end);
}

/// Drain the read side of the channel to EOF, keeping only the trailing
/// [`CHANNEL_READ_LIMIT`] bytes. Reading to EOF (rather than stopping at the
/// limit) keeps a chatty child from blocking on a full pipe; keeping the
/// tail preserves the report, which is always written last.
pub fn drain_bounded<R: Read>(mut reader: R) -> Vec<u8> {
    let mut tail = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                tail.extend_from_slice(&chunk[..n]);
                if tail.len() > CHANNEL_READ_LIMIT {
                    let cut = tail.len() - CHANNEL_READ_LIMIT;
                    tail.drain(..cut);
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            // The child is gone; whatever was captured is all there is.
            Err(_) => break,
        }
    }
    tail
}
