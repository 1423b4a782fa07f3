//! Per-specification lifecycle event bus.
//!
//! One [`LifecycleManager`] is created per specification instance and shared
//! by reference by every scope in that specification's tree. Listeners
//! (fixture registries, cache adapters, host integrations) register during
//! tree construction; the execution driver broadcasts ordered events while
//! it walks the tree.
//!
//! Ordering invariant: delivery order equals registration order, and
//! registration order equals the order in which collector calls occurred
//! during construction.

pub mod fixture;
pub mod memo;

use std::cell::RefCell;
use std::rc::Rc;

use crate::errors::TrellisError;
use crate::tree::path::ScopePath;

/// A lifecycle boundary crossed during tree traversal.
///
/// Group events carry the group's path; test events carry the test's path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    EnterGroup { path: ScopePath },
    ExitGroup { path: ScopePath },
    BeforeEachTest { path: ScopePath },
    AfterEachTest { path: ScopePath },
}

impl LifecycleEvent {
    pub fn path(&self) -> &ScopePath {
        match self {
            LifecycleEvent::EnterGroup { path }
            | LifecycleEvent::ExitGroup { path }
            | LifecycleEvent::BeforeEachTest { path }
            | LifecycleEvent::AfterEachTest { path } => path,
        }
    }
}

/// Reacts to lifecycle boundaries. A failing listener returns `Err`; the
/// manager keeps notifying the remaining listeners regardless.
pub trait LifecycleListener {
    fn on_event(&self, event: &LifecycleEvent) -> Result<(), TrellisError>;
}

/// Ordered listener registry for one specification instance.
#[derive(Default)]
pub struct LifecycleManager {
    listeners: RefCell<Vec<Rc<dyn LifecycleListener>>>,
}

impl LifecycleManager {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Registers a listener. No de-duplication: registering the same
    /// listener twice means it is notified twice, mirroring caller intent.
    pub fn add_listener(&self, listener: Rc<dyn LifecycleListener>) {
        self.listeners.borrow_mut().push(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Delivers `event` to every registered listener in registration order.
    ///
    /// The listener list is snapshotted before iteration, so a listener that
    /// registers further listeners does not perturb the in-flight delivery.
    /// Failures are collected rather than short-circuiting; the caller
    /// attributes them to the nearest enclosing test boundary.
    pub fn notify(&self, event: &LifecycleEvent) -> Vec<TrellisError> {
        let snapshot: Vec<Rc<dyn LifecycleListener>> = self.listeners.borrow().clone();
        let mut failures = Vec::new();
        for listener in snapshot {
            if let Err(error) = listener.on_event(event) {
                failures.push(error);
            }
        }
        failures
    }
}
