//! Pending propagation: a pending scope silences its whole subtree.

mod common;

use common::{CallLog, Counter};
use trellis::prelude::*;

#[test]
fn pending_group_skips_every_descendant_test() {
    let log = CallLog::new();
    let tree = SpecTree::build("inherited", |c| {
        c.group("later", Pending::Yes, |c| {
            c.test("one", Pending::No, log.body("one"))?;
            c.group("deeper", Pending::No, |c| {
                c.test("two", Pending::No, log.body("two"))
            })
        })
    });

    let report = Runner::new().run(&tree);
    assert!(log.entries().is_empty());
    assert_eq!(report.skipped(), 2);
    assert_eq!(report.passed(), 0);
    assert_eq!(report.failed(), 0);
}

#[test]
fn skip_reasons_distinguish_own_flag_from_inherited_flag() {
    let tree = SpecTree::build("reasons", |c| {
        c.group("off", Pending::Yes, |c| {
            c.test("inherited", Pending::No, common::pass())?;
            c.test("own", Pending::Yes, common::pass())
        })
    });

    let report = Runner::new().run(&tree);
    let group = tree.root().path().append(SegmentKind::Group, "off");

    match report.outcome_for(&group.append(SegmentKind::Test, "inherited")) {
        Some(Outcome::Skipped { reason }) => assert_eq!(reason, "ancestor scope pending"),
        other => panic!("expected a skip, got {:?}", other),
    }
    match report.outcome_for(&group.append(SegmentKind::Test, "own")) {
        Some(Outcome::Skipped { reason }) => assert_eq!(reason, "marked pending"),
        other => panic!("expected a skip, got {:?}", other),
    }
}

#[test]
fn pending_group_fires_no_group_fixtures() {
    let log = CallLog::new();
    let tree = SpecTree::build("silent", |c| {
        c.group("off", Pending::Yes, |c| {
            c.before_group(log.fixture("setup"));
            c.after_group(log.fixture("teardown"));
            c.test("t", Pending::No, common::pass())
        })
    });

    Runner::new().run(&tree);
    assert!(log.entries().is_empty());
}

#[test]
fn pending_group_never_computes_memoized_values() {
    let calls = Counter::new();
    let tree = SpecTree::build("lazy", |c| {
        c.group("off", Pending::Yes, |c| {
            let calls = calls.clone();
            let value = c.memoized(CachingMode::Group, move || calls.bump());
            c.test("t", Pending::No, move || {
                value.get();
                Ok(())
            })
        })
    });

    Runner::new().run(&tree);
    assert_eq!(calls.value(), 0);
}

#[test]
fn siblings_of_a_pending_group_still_run() {
    let log = CallLog::new();
    let tree = SpecTree::build("mixed", |c| {
        c.group("off", Pending::Yes, |c| {
            c.test("skipped", Pending::No, log.body("skipped"))
        })?;
        c.group("on", Pending::No, |c| {
            c.test("runs", Pending::No, log.body("runs"))
        })
    });

    let report = Runner::new().run(&tree);
    assert_eq!(log.entries(), vec!["runs"]);
    assert_eq!(report.passed(), 1);
    assert_eq!(report.skipped(), 1);
}
