//! Scope-bound memoization of lazily-created values.
//!
//! A [`Memoized`] adapter wraps a value-producing factory and caches the
//! result for as long as its [`CachingMode`] allows. Each adapter is also a
//! lifecycle listener: it watches the event stream and drops its cached
//! value when its validity window closes.
//!
//! `get()` assumes a single logical thread drives one specification's
//! traversal; parallelizing tests within one group would require
//! serializing the compute-once step externally.

use std::cell::RefCell;
use std::rc::Rc;

use crate::errors::TrellisError;
use crate::lifecycle::{LifecycleEvent, LifecycleListener};
use crate::tree::path::ScopePath;

/// When a memoized value is invalidated and recreated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CachingMode {
    /// Valid for one execution of the immediately enclosing group: every
    /// test of that group execution shares the value; the exit boundary
    /// discards it.
    Group,
    /// Valid for a single test: discarded on every after-each-test event
    /// fired by a test beneath the adapter's scope.
    Test,
    /// Valid for the whole specification instance. Never reset.
    Scope,
}

/// A shared handle to a scope-bound memoized value.
pub type Memo<T> = Rc<Memoized<T>>;

/// Wraps a zero-argument factory with scope-bound caching.
pub struct Memoized<T> {
    mode: CachingMode,
    bound_to: ScopePath,
    factory: Box<dyn Fn() -> T>,
    value: RefCell<Option<Rc<T>>>,
}

impl<T> Memoized<T> {
    pub(crate) fn new(
        mode: CachingMode,
        bound_to: ScopePath,
        factory: impl Fn() -> T + 'static,
    ) -> Memo<T> {
        Rc::new(Self {
            mode,
            bound_to,
            factory: Box::new(factory),
            value: RefCell::new(None),
        })
    }

    /// Returns the cached value, invoking the factory exactly once per
    /// validity window. Callers share one allocation: two `get()` calls in
    /// the same window return handles to the identical value.
    pub fn get(&self) -> Rc<T> {
        if let Some(value) = self.value.borrow().as_ref() {
            return Rc::clone(value);
        }
        let fresh = Rc::new((self.factory)());
        *self.value.borrow_mut() = Some(Rc::clone(&fresh));
        fresh
    }

    pub fn mode(&self) -> CachingMode {
        self.mode
    }

    /// The group boundary this adapter is bound to.
    pub fn bound_to(&self) -> &ScopePath {
        &self.bound_to
    }

    fn invalidate(&self) {
        self.value.borrow_mut().take();
    }
}

impl<T> LifecycleListener for Memoized<T> {
    fn on_event(&self, event: &LifecycleEvent) -> Result<(), TrellisError> {
        match (self.mode, event) {
            (CachingMode::Group, LifecycleEvent::ExitGroup { path }) if *path == self.bound_to => {
                self.invalidate();
            }
            (CachingMode::Test, LifecycleEvent::AfterEachTest { path })
                if self.bound_to.is_ancestor_of(path) =>
            {
                self.invalidate();
            }
            // Scope-bound values survive every boundary of their spec.
            _ => {}
        }
        Ok(())
    }
}
