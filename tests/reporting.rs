//! Run reports: tallies, lookup, and host-facing serialization.

mod common;

use common::pass;
use trellis::prelude::*;

fn sample_report() -> (SpecTree, RunReport) {
    let tree = SpecTree::build("sample", |c| {
        c.test("passes", Pending::No, pass())?;
        c.test("fails", Pending::No, || {
            Err(TrellisError::assertion("left != right"))
        })?;
        c.test("waits", Pending::Yes, pass())
    });
    let report = Runner::new().run(&tree);
    (tree, report)
}

#[test]
fn report_tallies_by_outcome() {
    let (_tree, report) = sample_report();
    assert_eq!(report.entries.len(), 3);
    assert_eq!(report.passed(), 1);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.skipped(), 1);
    assert!(report.has_failures());
}

#[test]
fn entries_preserve_traversal_order() {
    let (_tree, report) = sample_report();
    let names: Vec<&str> = report.entries.iter().map(|e| e.path.name()).collect();
    assert_eq!(names, vec!["passes", "fails", "waits"]);
}

#[test]
fn reports_round_trip_through_json() {
    let (_tree, report) = sample_report();
    let encoded = serde_json::to_string(&report).expect("report must serialize");
    let decoded: RunReport = serde_json::from_str(&encoded).expect("report must deserialize");
    assert_eq!(decoded, report);
}

#[test]
fn failure_entries_carry_kind_and_message() {
    let (tree, report) = sample_report();
    let path = tree.root().path().append(SegmentKind::Test, "fails");
    match report.outcome_for(&path) {
        Some(Outcome::Failed { kind, message }) => {
            assert_eq!(*kind, ErrorKind::Assertion);
            assert!(message.contains("left != right"));
        }
        other => panic!("expected a failure, got {:?}", other),
    }
}
