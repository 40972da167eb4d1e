// Isospec demo runner: registers a fixture spec suite and hands control to
// the harness. The ISOSPEC_FIXTURE variable selects which registry the
// registration pass builds; the default is a small all-passing showcase.
// The non-default fixtures exercise the failure, crash, hang, and
// truncation paths and back the integration tests.

use std::env;
use std::thread;
use std::time::Duration;

use isospec::{check, expect, harness_main, Failure, Registry};

fn main() {
    harness_main(build)
}

fn build(specs: &mut Registry) {
    match env::var("ISOSPEC_FIXTURE").ok().as_deref() {
        Some("pair") => pair(specs),
        Some("crash") => crash(specs),
        Some("hang") => hang(specs),
        Some("truncate") => truncate(specs),
        Some("tally") => tally(specs),
        _ => showcase(specs),
    }
}

fn add(a: i64, b: i64) -> i64 {
    a + b
}

fn showcase(specs: &mut Registry) {
    let math = specs.suite("math");
    specs.register(math, "add(2,3) returns 5", || expect(add(2, 3)).to_equal(5));
    specs.register(math, "addition commutes", || {
        expect(add(2, 3)).to_equal(add(3, 2))
    });

    let strings = specs.suite("strings");
    specs.register(strings, "concatenation keeps both halves", || {
        let joined = format!("{}{}", "iso", "spec");
        check(joined.starts_with("iso"), "joined.starts_with(\"iso\")")?;
        expect(joined.len()).to_equal(7)
    });

    // Legal and silent in the report.
    specs.suite("reserved for future examples");

    let root = specs.root();
    specs.register(root, "a top-level example needs no suite", || {
        expect(1).not_to_equal(2)
    });
}

fn pair(specs: &mut Registry) {
    let math = specs.suite("math");
    specs.register(math, "add(2,3) returns 6", || expect(add(2, 3)).to_equal(6));
    specs.register(math, "add(2,3) returns 5", || expect(add(2, 3)).to_equal(5));
}

fn crash(specs: &mut Registry) {
    let faults = specs.suite("faults");
    specs.register(faults, "aborts the process", || std::process::abort());
    specs.register(faults, "panics mid-example", || {
        panic!("unwound right out of the example")
    });
    specs.register(faults, "still runs after the crashes", || {
        expect(add(1, 1)).to_equal(2)
    });
}

fn hang(specs: &mut Registry) {
    let clock = specs.suite("clock");
    specs.register(clock, "spins forever", || loop {
        thread::sleep(Duration::from_millis(50));
    });
    specs.register(clock, "finishes instantly", || Ok(()));
}

fn truncate(specs: &mut Registry) {
    let channel = specs.suite("channel");
    specs.register(channel, "fails with an overlong message", || {
        Err(Failure::here("x".repeat(600)))
    });
}

fn tally(specs: &mut Registry) {
    let math = specs.suite("math");
    specs.register(math, "wrong sum", || expect(add(2, 2)).to_equal(5));
    specs.register(math, "zero is absorbing", || {
        check(add(7, 0) == 0, "add(7, 0) == 0")
    });
    specs.register(math, "aborts while summing", || std::process::abort());
    specs.register(math, "right sum", || expect(add(2, 2)).to_equal(4));
}
