//! Dynamic registration: action bodies append and immediately run tests.

mod common;

use common::{pass, CallLog, Counter};
use trellis::prelude::*;

#[test]
fn action_runs_registered_tests_immediately_in_order() {
    let log = CallLog::new();
    let tree = SpecTree::build("dynamic", |c| {
        let log = log.clone();
        c.action("three values", Pending::No, move |handle| {
            for value in [1u32, 2, 3] {
                let log = log.clone();
                let name = format!("value {}", value);
                let body_log = log.clone();
                handle.test(&name, Pending::No, move || {
                    body_log.push(format!("ran {}", value));
                    Ok(())
                })?;
                log.push(format!("registered {}", value));
            }
            Ok(())
        })
    });

    let report = Runner::new().run(&tree);
    assert_eq!(report.passed(), 3);
    // Each test executes inline as it is registered, never batched.
    assert_eq!(
        log.entries(),
        vec![
            "ran 1",
            "registered 1",
            "ran 2",
            "registered 2",
            "ran 3",
            "registered 3"
        ]
    );
}

#[test]
fn dynamic_tests_report_independent_outcomes() {
    let tree = SpecTree::build("mixed", |c| {
        c.action("a", Pending::No, |handle| {
            handle.test("passes", Pending::No, pass())?;
            handle.test("fails", Pending::No, || {
                Err(TrellisError::assertion("expected 4, got 5"))
            })?;
            handle.test("also passes", Pending::No, pass())
        })
    });

    let report = Runner::new().run(&tree);
    assert_eq!(report.passed(), 2);
    assert_eq!(report.failed(), 1);

    let action = tree.root().path().append(SegmentKind::Group, "a");
    assert!(matches!(
        report.outcome_for(&action.append(SegmentKind::Test, "fails")),
        Some(Outcome::Failed {
            kind: ErrorKind::Assertion,
            ..
        })
    ));
}

#[test]
fn each_test_fixtures_wrap_every_dynamic_test() {
    let log = CallLog::new();
    let tree = SpecTree::build("wrapped", |c| {
        c.before_each_test(log.fixture("before"));
        c.after_each_test(log.fixture("after"));
        let log = log.clone();
        c.action("a", Pending::No, move |handle| {
            let first = log.clone();
            handle.test("one", Pending::No, move || {
                first.push("one");
                Ok(())
            })?;
            let second = log.clone();
            handle.test("two", Pending::No, move || {
                second.push("two");
                Ok(())
            })
        })
    });

    Runner::new().run(&tree);
    assert_eq!(
        log.entries(),
        vec!["before", "one", "after", "before", "two", "after"]
    );
}

#[test]
fn pending_action_skips_without_invoking_its_body() {
    let calls = Counter::new();
    let tree = SpecTree::build("pending", |c| {
        let calls = calls.clone();
        c.action("never", Pending::Yes, move |handle| {
            calls.bump();
            handle.test("ghost", Pending::No, pass())
        })
    });

    let report = Runner::new().run(&tree);
    assert_eq!(calls.value(), 0);
    assert_eq!(report.skipped(), 1);
    assert_eq!(report.passed(), 0);
}

#[test]
fn pending_dynamic_test_is_reported_skipped() {
    let tree = SpecTree::build("partial", |c| {
        c.action("a", Pending::No, |handle| {
            handle.test("runs", Pending::No, pass())?;
            handle.test("not yet", Pending::Yes, pass())
        })
    });

    let report = Runner::new().run(&tree);
    assert_eq!(report.passed(), 1);
    assert_eq!(report.skipped(), 1);
}

#[test]
fn failing_action_body_is_contained_as_a_synthetic_test() {
    let tree = SpecTree::build("broken", |c| {
        c.action("a", Pending::No, |handle| {
            handle.test("already ran", Pending::No, pass())?;
            Err(TrellisError::assertion("action body fell over"))
        })?;
        c.test("sibling", Pending::No, pass())
    });

    let report = Runner::new().run(&tree);
    assert_eq!(report.passed(), 2);
    assert_eq!(report.failed(), 1);

    let synthetic = tree
        .root()
        .path()
        .append(SegmentKind::Group, "a")
        .append(SegmentKind::Test, "action failure");
    assert!(matches!(
        report.outcome_for(&synthetic),
        Some(Outcome::Failed {
            kind: ErrorKind::Definition,
            ..
        })
    ));
}

#[test]
fn duplicate_dynamic_test_name_is_rejected() {
    let tree = SpecTree::build("dup", |c| {
        c.action("a", Pending::No, |handle| {
            handle.test("same", Pending::No, pass())?;
            let result = handle.test("same", Pending::No, pass());
            assert!(matches!(result, Err(TrellisError::Definition { .. })));
            Ok(())
        })
    });

    let report = Runner::new().run(&tree);
    assert_eq!(report.passed(), 1);
}
