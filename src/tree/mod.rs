//! The executable scope tree.
//!
//! A specification resolves to a tree of scopes: groups own ordered
//! children, tests own one executable body, and actions own a body that may
//! register further tests while it runs. Every scope carries its identity
//! path, its pending flag, an optional source location, and a shared
//! reference to the specification's lifecycle manager.
//!
//! Structure is frozen once construction finishes: children are appended
//! only while the tree is being built, never after traversal begins. The
//! single exception is an action, which appends test children during its
//! own execution and is sealed when that execution completes.

pub mod filter;
pub mod path;

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::collect::Collector;
use crate::errors::{FailureSink, TrellisError};
use crate::exec::ActionHandle;
use crate::lifecycle::fixture::FixtureRegistry;
use crate::lifecycle::{LifecycleListener, LifecycleManager};
use crate::tree::path::ScopePath;

/// Marks a scope as intentionally skipped. Pending is inherited downward:
/// every descendant of a pending scope is reported skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pending {
    Yes,
    No,
}

impl Pending {
    pub fn is_pending(self) -> bool {
        matches!(self, Pending::Yes)
    }

    /// Combines an inherited flag with a scope's own flag.
    pub(crate) fn inherit(self, own: Pending) -> Pending {
        if self.is_pending() {
            Pending::Yes
        } else {
            own
        }
    }
}

/// Where a scope was declared. Optional: correctness never depends on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
}

impl SourceLocation {
    /// Captures the declaration site of the caller.
    #[track_caller]
    pub fn caller() -> Self {
        let location = std::panic::Location::caller();
        Self {
            file: location.file().to_string(),
            line: location.line(),
        }
    }
}

/// A test's executable body: no arguments, success or a failure signal.
pub type TestBody = Box<dyn FnMut() -> Result<(), TrellisError>>;

/// An action's executable body. The handle it receives registers test
/// children that the driver executes immediately.
pub type ActionBody = Box<dyn FnOnce(&mut ActionHandle<'_, '_>) -> Result<(), TrellisError>>;

/// A node in the executable tree.
#[derive(Clone)]
pub enum Scope {
    Group(Rc<GroupScope>),
    Action(Rc<ActionScope>),
    Test(Rc<TestScope>),
}

impl Scope {
    pub fn path(&self) -> ScopePath {
        match self {
            Scope::Group(g) => g.path().clone(),
            Scope::Action(a) => a.path().clone(),
            Scope::Test(t) => t.path().clone(),
        }
    }

    pub fn pending(&self) -> Pending {
        match self {
            Scope::Group(g) => g.pending(),
            Scope::Action(a) => a.pending(),
            Scope::Test(t) => t.pending(),
        }
    }
}

// ============================================================================
// GROUP
// ============================================================================

/// A scope owning an ordered sequence of children. Insertion order equals
/// declaration order and determines traversal and fixture-boundary order.
pub struct GroupScope {
    path: ScopePath,
    pending: Pending,
    source: Option<SourceLocation>,
    lifecycle: Rc<LifecycleManager>,
    children: RefCell<Vec<Scope>>,
}

impl GroupScope {
    pub(crate) fn new(
        path: ScopePath,
        pending: Pending,
        source: Option<SourceLocation>,
        lifecycle: Rc<LifecycleManager>,
    ) -> Rc<Self> {
        Rc::new(Self {
            path,
            pending,
            source,
            lifecycle,
            children: RefCell::new(Vec::new()),
        })
    }

    pub fn path(&self) -> &ScopePath {
        &self.path
    }

    pub fn pending(&self) -> Pending {
        self.pending
    }

    pub fn source(&self) -> Option<&SourceLocation> {
        self.source.as_ref()
    }

    pub fn lifecycle(&self) -> &Rc<LifecycleManager> {
        &self.lifecycle
    }

    pub fn children(&self) -> Ref<'_, Vec<Scope>> {
        self.children.borrow()
    }

    /// Cheap clone of the child list, for iteration that must not hold a
    /// borrow across callbacks.
    pub fn children_snapshot(&self) -> Vec<Scope> {
        self.children.borrow().clone()
    }

    pub(crate) fn children_mut(&self) -> RefMut<'_, Vec<Scope>> {
        self.children.borrow_mut()
    }

    /// Appends a child, rejecting a full path that collides with an
    /// existing sibling.
    pub(crate) fn append(&self, child: Scope) -> Result<(), TrellisError> {
        let path = child.path();
        if self.children.borrow().iter().any(|c| c.path() == path) {
            return Err(TrellisError::definition(
                &path,
                "a sibling scope with this name already exists",
            ));
        }
        self.children.borrow_mut().push(child);
        Ok(())
    }

    /// Appends without the duplicate check. Reserved for synthetic failing
    /// tests produced by the failure sink.
    pub(crate) fn append_unchecked(&self, child: Scope) {
        self.children.borrow_mut().push(child);
    }
}

// ============================================================================
// TEST
// ============================================================================

/// A leaf scope owning exactly one executable body.
pub struct TestScope {
    path: ScopePath,
    pending: Pending,
    source: Option<SourceLocation>,
    lifecycle: Rc<LifecycleManager>,
    body: RefCell<TestBody>,
}

impl TestScope {
    pub(crate) fn new(
        path: ScopePath,
        pending: Pending,
        source: Option<SourceLocation>,
        lifecycle: Rc<LifecycleManager>,
        body: TestBody,
    ) -> Rc<Self> {
        Rc::new(Self {
            path,
            pending,
            source,
            lifecycle,
            body: RefCell::new(body),
        })
    }

    pub fn path(&self) -> &ScopePath {
        &self.path
    }

    pub fn pending(&self) -> Pending {
        self.pending
    }

    pub fn source(&self) -> Option<&SourceLocation> {
        self.source.as_ref()
    }

    pub fn lifecycle(&self) -> &Rc<LifecycleManager> {
        &self.lifecycle
    }

    pub(crate) fn run_body(&self) -> Result<(), TrellisError> {
        (self.body.borrow_mut())()
    }
}

// ============================================================================
// ACTION
// ============================================================================

/// A scope whose body registers and immediately executes test children.
///
/// Registration stays open only while the body runs; the driver seals the
/// action when the body returns, after which appending is a definition
/// error.
pub struct ActionScope {
    path: ScopePath,
    pending: Pending,
    source: Option<SourceLocation>,
    lifecycle: Rc<LifecycleManager>,
    body: RefCell<Option<ActionBody>>,
    children: RefCell<Vec<Rc<TestScope>>>,
    sealed: Cell<bool>,
}

impl ActionScope {
    pub(crate) fn new(
        path: ScopePath,
        pending: Pending,
        source: Option<SourceLocation>,
        lifecycle: Rc<LifecycleManager>,
        body: ActionBody,
    ) -> Rc<Self> {
        Rc::new(Self {
            path,
            pending,
            source,
            lifecycle,
            body: RefCell::new(Some(body)),
            children: RefCell::new(Vec::new()),
            sealed: Cell::new(false),
        })
    }

    pub fn path(&self) -> &ScopePath {
        &self.path
    }

    pub fn pending(&self) -> Pending {
        self.pending
    }

    pub fn source(&self) -> Option<&SourceLocation> {
        self.source.as_ref()
    }

    pub fn lifecycle(&self) -> &Rc<LifecycleManager> {
        &self.lifecycle
    }

    pub fn children(&self) -> Vec<Rc<TestScope>> {
        self.children.borrow().clone()
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.get()
    }

    pub(crate) fn take_body(&self) -> Option<ActionBody> {
        self.body.borrow_mut().take()
    }

    pub(crate) fn seal(&self) {
        self.sealed.set(true);
    }

    pub(crate) fn append_test(&self, test: Rc<TestScope>) -> Result<(), TrellisError> {
        if self.sealed.get() {
            return Err(TrellisError::definition(
                test.path(),
                "action has finished executing; tests can no longer be registered",
            ));
        }
        if self
            .children
            .borrow()
            .iter()
            .any(|c| c.path() == test.path())
        {
            return Err(TrellisError::definition(
                test.path(),
                "a sibling test with this name already exists",
            ));
        }
        self.children.borrow_mut().push(test);
        Ok(())
    }
}

// ============================================================================
// SPEC TREE
// ============================================================================

/// One resolved specification: the root group plus the lifecycle manager
/// and fixture registry every scope in the tree shares.
pub struct SpecTree {
    root: Rc<GroupScope>,
    lifecycle: Rc<LifecycleManager>,
    fixtures: Rc<FixtureRegistry>,
}

impl SpecTree {
    /// Wires a fresh manager, registry, and root group, then runs `body`
    /// against a collector bound to the root. A failing body yields a tree
    /// holding a single synthetic failing test.
    pub fn build(
        name: &str,
        body: impl FnOnce(&Collector) -> Result<(), TrellisError>,
    ) -> SpecTree {
        let lifecycle = LifecycleManager::new();
        let fixtures = FixtureRegistry::new();
        // The registry is always the first listener, so fixtures observe a
        // boundary before cache adapters react to it.
        lifecycle.add_listener(Rc::clone(&fixtures) as Rc<dyn LifecycleListener>);

        let root = GroupScope::new(
            ScopePath::spec_root(name),
            Pending::No,
            None,
            Rc::clone(&lifecycle),
        );
        let tree = SpecTree {
            root: Rc::clone(&root),
            lifecycle: Rc::clone(&lifecycle),
            fixtures: Rc::clone(&fixtures),
        };

        let collector = Collector::new(root, lifecycle, fixtures);
        if let Err(error) = body(&collector) {
            FailureSink::synthetic_test(
                tree.root(),
                "definition failure",
                TrellisError::definition(tree.root().path(), error.to_string()),
            );
        }
        tree
    }

    pub fn root(&self) -> &Rc<GroupScope> {
        &self.root
    }

    pub fn lifecycle(&self) -> &Rc<LifecycleManager> {
        &self.lifecycle
    }

    pub fn fixtures(&self) -> &Rc<FixtureRegistry> {
        &self.fixtures
    }

    pub fn name(&self) -> &str {
        self.root.path().name()
    }

    /// Prunes the tree to the ancestors of `target`, the node it names, and
    /// that node's descendants. The root is never removed.
    pub fn filter(&self, target: &ScopePath) {
        filter::apply(&self.root, target);
    }
}
