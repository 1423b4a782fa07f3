//! Scope-bound before/after callbacks.
//!
//! The registry stores every fixture registration in collector-call order
//! and, as a lifecycle listener, invokes the callbacks belonging to the
//! boundary currently being crossed:
//!
//! - before/after-each-test callbacks apply to every test transitively
//!   nested under the registering scope, outer-to-inner for "before" and
//!   inner-to-outer for "after";
//! - before/after-group callbacks apply to exactly the registering group.
//!
//! A failing callback does not stop the remaining callbacks for the same
//! boundary; the first failure is returned so the driver can attribute it
//! to the in-flight test (or to a synthetic failing test at group
//! boundaries).

use std::cell::RefCell;
use std::rc::Rc;

use crate::errors::TrellisError;
use crate::lifecycle::{LifecycleEvent, LifecycleListener};
use crate::tree::path::ScopePath;

/// A registered before/after callback.
pub type FixtureFn = Box<dyn FnMut() -> Result<(), TrellisError>>;

/// The boundary a fixture is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixtureKind {
    BeforeEachTest,
    AfterEachTest,
    BeforeGroup,
    AfterGroup,
}

struct FixtureEntry {
    scope: ScopePath,
    kind: FixtureKind,
    callback: RefCell<FixtureFn>,
}

/// Records fixtures per scope and fires them on lifecycle events.
#[derive(Default)]
pub struct FixtureRegistry {
    entries: RefCell<Vec<Rc<FixtureEntry>>>,
}

impl FixtureRegistry {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn register(
        &self,
        scope: ScopePath,
        kind: FixtureKind,
        callback: impl FnMut() -> Result<(), TrellisError> + 'static,
    ) {
        self.entries.borrow_mut().push(Rc::new(FixtureEntry {
            scope,
            kind,
            callback: RefCell::new(Box::new(callback)),
        }));
    }

    pub fn register_before_each_test(
        &self,
        scope: ScopePath,
        callback: impl FnMut() -> Result<(), TrellisError> + 'static,
    ) {
        self.register(scope, FixtureKind::BeforeEachTest, callback);
    }

    pub fn register_after_each_test(
        &self,
        scope: ScopePath,
        callback: impl FnMut() -> Result<(), TrellisError> + 'static,
    ) {
        self.register(scope, FixtureKind::AfterEachTest, callback);
    }

    pub fn register_before_group(
        &self,
        scope: ScopePath,
        callback: impl FnMut() -> Result<(), TrellisError> + 'static,
    ) {
        self.register(scope, FixtureKind::BeforeGroup, callback);
    }

    pub fn register_after_group(
        &self,
        scope: ScopePath,
        callback: impl FnMut() -> Result<(), TrellisError> + 'static,
    ) {
        self.register(scope, FixtureKind::AfterGroup, callback);
    }

    /// Fires every each-test fixture of `kind` registered on an ancestor of
    /// `test`. Before-fixtures run outer-to-inner; after-fixtures run
    /// inner-to-outer. Within one scope, registration order is preserved.
    fn fire_each_test(&self, test: &ScopePath, kind: FixtureKind) -> Result<(), TrellisError> {
        let mut matching: Vec<Rc<FixtureEntry>> = self
            .entries
            .borrow()
            .iter()
            .filter(|e| e.kind == kind && e.scope.is_ancestor_of(test))
            .cloned()
            .collect();
        // Stable by depth: entries on the same scope keep registration order.
        match kind {
            FixtureKind::AfterEachTest => {
                matching.sort_by_key(|e| std::cmp::Reverse(e.scope.len()))
            }
            _ => matching.sort_by_key(|e| e.scope.len()),
        }
        self.invoke_all(&matching, test)
    }

    /// Fires every group fixture of `kind` registered directly on `group`,
    /// in registration order. Ancestors and descendants do not participate.
    fn fire_group(&self, group: &ScopePath, kind: FixtureKind) -> Result<(), TrellisError> {
        let matching: Vec<Rc<FixtureEntry>> = self
            .entries
            .borrow()
            .iter()
            .filter(|e| e.kind == kind && e.scope == *group)
            .cloned()
            .collect();
        self.invoke_all(&matching, group)
    }

    /// Invokes each entry, continuing past failures, and returns the first
    /// failure wrapped with the boundary path it occurred at.
    fn invoke_all(&self, entries: &[Rc<FixtureEntry>], at: &ScopePath) -> Result<(), TrellisError> {
        let mut first_failure = None;
        for entry in entries {
            let result = (entry.callback.borrow_mut())();
            if let Err(error) = result {
                if first_failure.is_none() {
                    first_failure = Some(TrellisError::fixture(at, error.to_string()));
                }
            }
        }
        match first_failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl LifecycleListener for FixtureRegistry {
    fn on_event(&self, event: &LifecycleEvent) -> Result<(), TrellisError> {
        match event {
            LifecycleEvent::BeforeEachTest { path } => {
                self.fire_each_test(path, FixtureKind::BeforeEachTest)
            }
            LifecycleEvent::AfterEachTest { path } => {
                self.fire_each_test(path, FixtureKind::AfterEachTest)
            }
            LifecycleEvent::EnterGroup { path } => self.fire_group(path, FixtureKind::BeforeGroup),
            LifecycleEvent::ExitGroup { path } => self.fire_group(path, FixtureKind::AfterGroup),
        }
    }
}
