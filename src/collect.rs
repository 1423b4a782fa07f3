//! The builder exposed to declarative specification bodies.
//!
//! A collector is bound to one group; each nested `group` call yields a
//! child collector bound to a new child group sharing the same lifecycle
//! manager and fixture registry. Declarative calls translate into tree
//! mutations plus listener and fixture registrations, in call order, which
//! is what fixes the lifecycle delivery order at execution time.

use std::rc::Rc;

use crate::errors::{FailureSink, TrellisError};
use crate::exec::ActionHandle;
use crate::lifecycle::fixture::FixtureRegistry;
use crate::lifecycle::memo::{CachingMode, Memo, Memoized};
use crate::lifecycle::{LifecycleListener, LifecycleManager};
use crate::tree::path::SegmentKind;
use crate::tree::{ActionScope, GroupScope, Pending, Scope, SourceLocation, TestScope};

/// Translates declarative calls into scope-tree structure.
pub struct Collector {
    group: Rc<GroupScope>,
    lifecycle: Rc<LifecycleManager>,
    fixtures: Rc<FixtureRegistry>,
}

impl Collector {
    pub(crate) fn new(
        group: Rc<GroupScope>,
        lifecycle: Rc<LifecycleManager>,
        fixtures: Rc<FixtureRegistry>,
    ) -> Self {
        Self {
            group,
            lifecycle,
            fixtures,
        }
    }

    /// The group this collector appends into.
    pub fn scope(&self) -> &Rc<GroupScope> {
        &self.group
    }

    /// Declares a nested group and runs its body against a child collector.
    ///
    /// A failing body is contained: the new group keeps whatever the body
    /// declared before failing, gains one synthetic failing test, and
    /// sibling scopes proceed unaffected. Only structural errors (a
    /// duplicate sibling name) propagate to the caller.
    #[track_caller]
    pub fn group(
        &self,
        name: &str,
        pending: Pending,
        body: impl FnOnce(&Collector) -> Result<(), TrellisError>,
    ) -> Result<(), TrellisError> {
        let source = SourceLocation::caller();
        let path = self.group.path().append(SegmentKind::Group, name);
        let child = GroupScope::new(path, pending, Some(source), Rc::clone(&self.lifecycle));
        self.group.append(Scope::Group(Rc::clone(&child)))?;

        let collector = Collector::new(
            Rc::clone(&child),
            Rc::clone(&self.lifecycle),
            Rc::clone(&self.fixtures),
        );
        if let Err(error) = body(&collector) {
            let wrapped = TrellisError::definition(child.path(), error.to_string());
            FailureSink::synthetic_test(&child, "definition failure", wrapped);
        }
        Ok(())
    }

    /// Declares a test leaf.
    #[track_caller]
    pub fn test(
        &self,
        name: &str,
        pending: Pending,
        body: impl FnMut() -> Result<(), TrellisError> + 'static,
    ) -> Result<(), TrellisError> {
        let source = SourceLocation::caller();
        let path = self.group.path().append(SegmentKind::Test, name);
        let test = TestScope::new(
            path,
            pending,
            Some(source),
            Rc::clone(&self.lifecycle),
            Box::new(body),
        );
        self.group.append(Scope::Test(test))
    }

    /// Declares an action whose body registers and immediately executes
    /// test children when the driver reaches it.
    #[track_caller]
    pub fn action(
        &self,
        name: &str,
        pending: Pending,
        body: impl FnOnce(&mut ActionHandle<'_, '_>) -> Result<(), TrellisError> + 'static,
    ) -> Result<(), TrellisError> {
        let source = SourceLocation::caller();
        let path = self.group.path().append(SegmentKind::Group, name);
        let action = ActionScope::new(
            path,
            pending,
            Some(source),
            Rc::clone(&self.lifecycle),
            Box::new(body),
        );
        self.group.append(Scope::Action(action))
    }

    /// Declares a scope-bound memoized value and registers its cache
    /// adapter as a lifecycle listener.
    pub fn memoized<T: 'static>(
        &self,
        mode: CachingMode,
        factory: impl Fn() -> T + 'static,
    ) -> Memo<T> {
        let memo = Memoized::new(mode, self.group.path().clone(), factory);
        self.lifecycle
            .add_listener(Rc::clone(&memo) as Rc<dyn LifecycleListener>);
        memo
    }

    /// Runs before every test transitively nested under this group.
    pub fn before_each_test(&self, callback: impl FnMut() -> Result<(), TrellisError> + 'static) {
        self.fixtures
            .register_before_each_test(self.group.path().clone(), callback);
    }

    /// Runs after every test transitively nested under this group.
    pub fn after_each_test(&self, callback: impl FnMut() -> Result<(), TrellisError> + 'static) {
        self.fixtures
            .register_after_each_test(self.group.path().clone(), callback);
    }

    /// Runs once when the driver enters exactly this group.
    pub fn before_group(&self, callback: impl FnMut() -> Result<(), TrellisError> + 'static) {
        self.fixtures
            .register_before_group(self.group.path().clone(), callback);
    }

    /// Runs once when the driver exits exactly this group.
    pub fn after_group(&self, callback: impl FnMut() -> Result<(), TrellisError> + 'static) {
        self.fixtures
            .register_after_group(self.group.path().clone(), callback);
    }
}
