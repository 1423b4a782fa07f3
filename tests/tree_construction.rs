//! Tree construction: collector calls become scope structure.

mod common;

use std::collections::HashSet;

use common::{collect_paths, pass, CallLog};
use trellis::prelude::*;

#[test]
fn nested_groups_build_declaration_ordered_children() {
    let tree = SpecTree::build("calculator", |c| {
        c.group("addition", Pending::No, |c| {
            c.test("adds two numbers", Pending::No, pass())?;
            c.test("adds negatives", Pending::No, pass())
        })?;
        c.group("subtraction", Pending::No, |c| {
            c.test("subtracts", Pending::No, pass())
        })
    });

    let children = tree.root().children_snapshot();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].path().name(), "addition");
    assert_eq!(children[1].path().name(), "subtraction");

    let Scope::Group(addition) = &children[0] else {
        panic!("expected a group");
    };
    let grandchildren = addition.children_snapshot();
    assert_eq!(grandchildren.len(), 2);
    assert_eq!(grandchildren[0].path().name(), "adds two numbers");
    assert_eq!(grandchildren[1].path().name(), "adds negatives");
}

#[test]
fn every_scope_has_a_unique_path() {
    let tree = SpecTree::build("unique", |c| {
        c.group("outer", Pending::No, |c| {
            c.test("same name", Pending::No, pass())?;
            c.group("inner", Pending::No, |c| {
                // Same leaf name at a different depth is a different path.
                c.test("same name", Pending::No, pass())
            })
        })?;
        c.group("sibling", Pending::No, |c| {
            c.test("same name", Pending::No, pass())
        })
    });

    let mut paths = Vec::new();
    collect_paths(tree.root(), &mut paths);
    let distinct: HashSet<_> = paths.iter().cloned().collect();
    assert_eq!(distinct.len(), paths.len());
}

#[test]
fn duplicate_sibling_test_is_rejected() {
    let tree = SpecTree::build("dup", |c| {
        c.test("twice", Pending::No, pass())?;
        let result = c.test("twice", Pending::No, pass());
        assert!(matches!(result, Err(TrellisError::Definition { .. })));
        Ok(())
    });
    assert_eq!(tree.root().children_snapshot().len(), 1);
}

#[test]
fn duplicate_sibling_group_is_rejected() {
    SpecTree::build("dup", |c| {
        c.group("twice", Pending::No, |_| Ok(()))?;
        let result = c.group("twice", Pending::No, |_| Ok(()));
        assert!(matches!(result, Err(TrellisError::Definition { .. })));
        Ok(())
    });
}

#[test]
fn group_and_test_of_same_name_may_coexist() {
    let tree = SpecTree::build("kinds", |c| {
        c.group("thing", Pending::No, |_| Ok(()))?;
        c.test("thing", Pending::No, pass())
    });
    assert_eq!(tree.root().children_snapshot().len(), 2);
}

#[test]
fn declaration_sites_are_attached() {
    let tree = SpecTree::build("located", |c| {
        c.test("somewhere", Pending::No, pass())
    });
    let Scope::Test(test) = &tree.root().children_snapshot()[0] else {
        panic!("expected a test");
    };
    let source = test.source().expect("declaration site missing");
    assert!(source.file.ends_with("tree_construction.rs"));
    assert!(source.line > 0);
}

#[test]
fn construction_does_not_execute_bodies() {
    let log = CallLog::new();
    SpecTree::build("inert", |c| {
        c.test("not yet", Pending::No, log.body("ran"))
    });
    assert!(log.entries().is_empty());
}
