//! Isospec: a behavior-driven test harness that runs every example in its
//! own process, so a segfault, abort, or hang in one example can never
//! corrupt another example's result or the harness itself.
//!
//! A spec binary registers suites and examples in an explicit registration
//! pass, then hands control to [`harness_main`]:
//!
//! ```no_run
//! use isospec::{expect, harness_main, Registry};
//!
//! fn main() {
//!     harness_main(|specs: &mut Registry| {
//!         let math = specs.suite("math");
//!         specs.register(math, "add(2,3) returns 5", || expect(2 + 3).to_equal(5));
//!     })
//! }
//! ```

pub mod channel;
pub mod classify;
pub mod engine;
pub mod errors;
pub mod executor;
pub mod expect;
pub mod registry;
pub mod report;

pub use crate::engine::{harness_main, run, Config, HARNESS_FAULT_EXIT};
pub use crate::errors::HarnessError;
pub use crate::expect::{check, expect, Check, Failure};
pub use crate::registry::{Registry, SuiteId, TestStatus};
pub use crate::report::RunTally;
