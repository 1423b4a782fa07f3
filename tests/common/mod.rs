//! Shared helpers for the Trellis integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use trellis::prelude::*;

/// Records labels in call order across fixtures, listeners, and test bodies.
#[derive(Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<String>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, label: impl Into<String>) {
        self.0.borrow_mut().push(label.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    /// A fixture callback that records `label` and succeeds.
    pub fn fixture(&self, label: &str) -> impl FnMut() -> Result<(), TrellisError> + 'static {
        let log = self.clone();
        let label = label.to_string();
        move || {
            log.push(label.clone());
            Ok(())
        }
    }

    /// A test body that records `label` and passes.
    pub fn body(&self, label: &str) -> impl FnMut() -> Result<(), TrellisError> + 'static {
        self.fixture(label)
    }
}

/// Counts invocations, for cache-adapter factory assertions.
#[derive(Clone, Default)]
pub struct Counter(Rc<Cell<usize>>);

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bump(&self) -> usize {
        self.0.set(self.0.get() + 1);
        self.0.get()
    }

    pub fn value(&self) -> usize {
        self.0.get()
    }
}

/// A passing test body.
pub fn pass() -> impl FnMut() -> Result<(), TrellisError> + 'static {
    || Ok(())
}

/// Collects the identity path of every scope in a group's subtree,
/// the group itself included.
pub fn collect_paths(group: &Rc<GroupScope>, out: &mut Vec<ScopePath>) {
    out.push(group.path().clone());
    for child in group.children_snapshot() {
        match child {
            Scope::Group(nested) => collect_paths(&nested, out),
            other => out.push(other.path()),
        }
    }
}
