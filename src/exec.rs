//! Walks a resolved spec tree and drives its lifecycle.
//!
//! The runner fires enter/exit events around every group, before/after
//! events around every test body, and invokes action bodies with a handle
//! that registers-and-runs dynamic tests inline. Outcomes are recorded in
//! traversal order; failures never abort the walk.
//!
//! One runner invocation owns one specification's traversal end to end; the
//! single-thread contract of the lifecycle subsystem holds for the whole
//! walk.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorKind, TrellisError};
use crate::lifecycle::{LifecycleEvent, LifecycleManager};
use crate::tree::path::{ScopePath, SegmentKind};
use crate::tree::{ActionScope, GroupScope, Pending, Scope, SourceLocation, SpecTree, TestScope};

const REASON_MARKED_PENDING: &str = "marked pending";
const REASON_ANCESTOR_PENDING: &str = "ancestor scope pending";
const REASON_BEFORE_GROUP_FAILED: &str = "before-group hook failed";

// ============================================================================
// REPORTS
// ============================================================================

/// What happened to one test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Passed,
    Failed { kind: ErrorKind, message: String },
    Skipped { reason: String },
}

impl Outcome {
    pub fn failed(error: &TrellisError) -> Self {
        Outcome::Failed {
            kind: error.kind(),
            message: error.to_string(),
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Outcome::Skipped {
            reason: reason.into(),
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, Outcome::Passed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped { .. })
    }
}

/// One entry of a run: a test (real or synthetic) and its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestReport {
    pub path: ScopePath,
    pub outcome: Outcome,
}

/// All outcomes of one specification's run, in traversal order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub entries: Vec<TestReport>,
}

impl RunReport {
    pub fn record(&mut self, path: ScopePath, outcome: Outcome) {
        self.entries.push(TestReport { path, outcome });
    }

    pub fn passed(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_failed()).count()
    }

    pub fn skipped(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_skipped()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    /// Looks up the outcome recorded for a path, if any.
    pub fn outcome_for(&self, path: &ScopePath) -> Option<&Outcome> {
        self.entries
            .iter()
            .find(|e| e.path == *path)
            .map(|e| &e.outcome)
    }
}

// ============================================================================
// RUNNER
// ============================================================================

/// Execution settings for one run.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Prune each tree to this target before walking it.
    pub filter: Option<ScopePath>,
}

/// The external execution driver: walks trees, fires lifecycle events, and
/// collects outcomes.
#[derive(Debug, Default)]
pub struct Runner {
    config: RunConfig,
}

impl Runner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RunConfig) -> Self {
        Self { config }
    }

    /// Runs one specification tree to completion.
    pub fn run(&self, tree: &SpecTree) -> RunReport {
        if let Some(target) = &self.config.filter {
            tree.filter(target);
        }
        let mut report = RunReport::default();
        let mut cx = RunContext {
            lifecycle: Rc::clone(tree.lifecycle()),
            report: &mut report,
        };
        cx.run_group(tree.root(), Pending::No);
        report
    }

    /// Runs several independent specification trees, one report each.
    pub fn run_all<'a>(&self, trees: impl IntoIterator<Item = &'a SpecTree>) -> Vec<RunReport> {
        trees.into_iter().map(|tree| self.run(tree)).collect()
    }
}

struct RunContext<'a> {
    lifecycle: Rc<LifecycleManager>,
    report: &'a mut RunReport,
}

impl RunContext<'_> {
    fn run_group(&mut self, group: &Rc<GroupScope>, inherited: Pending) {
        let effective = inherited.inherit(group.pending());
        if effective.is_pending() {
            self.skip_children(group);
            return;
        }

        let entered_clean = self.notify_group_boundary(
            group,
            LifecycleEvent::EnterGroup {
                path: group.path().clone(),
            },
            "before-group failure",
        );

        if entered_clean {
            for child in group.children_snapshot() {
                match child {
                    Scope::Group(nested) => self.run_group(&nested, Pending::No),
                    Scope::Test(test) => self.run_test(&test, Pending::No),
                    Scope::Action(action) => self.run_action(&action, Pending::No),
                }
            }
        } else {
            self.skip_all_tests_under(group, REASON_BEFORE_GROUP_FAILED);
        }

        // Exit fires even after a broken entry so teardown stays symmetric.
        self.notify_group_boundary(
            group,
            LifecycleEvent::ExitGroup {
                path: group.path().clone(),
            },
            "after-group failure",
        );
    }

    /// Notifies a group boundary; failures become a synthetic failing test
    /// entry under the group. Returns true when every listener succeeded.
    fn notify_group_boundary(
        &mut self,
        group: &Rc<GroupScope>,
        event: LifecycleEvent,
        label: &str,
    ) -> bool {
        let failures = self.lifecycle.notify(&event);
        let clean = failures.is_empty();
        for error in failures.into_iter().take(1) {
            let path = group.path().append(SegmentKind::Test, label);
            self.report.record(path, Outcome::failed(&error));
        }
        clean
    }

    fn run_test(&mut self, test: &Rc<TestScope>, inherited: Pending) {
        let effective = inherited.inherit(test.pending());
        if effective.is_pending() {
            let reason = if test.pending().is_pending() {
                REASON_MARKED_PENDING
            } else {
                REASON_ANCESTOR_PENDING
            };
            self.report
                .record(test.path().clone(), Outcome::skipped(reason));
            return;
        }

        let before = self.lifecycle.notify(&LifecycleEvent::BeforeEachTest {
            path: test.path().clone(),
        });

        let mut outcome = match before.into_iter().next() {
            // A broken setup fails the test; its body never runs.
            Some(error) => Outcome::failed(&error),
            None => match test.run_body() {
                Ok(()) => Outcome::Passed,
                Err(error) => Outcome::failed(&error),
            },
        };

        let after = self.lifecycle.notify(&LifecycleEvent::AfterEachTest {
            path: test.path().clone(),
        });
        if outcome.is_passed() {
            if let Some(error) = after.into_iter().next() {
                outcome = Outcome::failed(&error);
            }
        }

        self.report.record(test.path().clone(), outcome);
    }

    fn run_action(&mut self, action: &Rc<ActionScope>, inherited: Pending) {
        let effective = inherited.inherit(action.pending());
        if effective.is_pending() {
            let reason = if action.pending().is_pending() {
                REASON_MARKED_PENDING
            } else {
                REASON_ANCESTOR_PENDING
            };
            self.report
                .record(action.path().clone(), Outcome::skipped(reason));
            return;
        }

        let Some(body) = action.take_body() else {
            let error = TrellisError::definition(
                action.path(),
                "action body already consumed by a previous run",
            );
            self.report
                .record(action.path().clone(), Outcome::failed(&error));
            return;
        };

        let result = {
            let mut handle = ActionHandle {
                action: Rc::clone(action),
                cx: &mut *self,
            };
            body(&mut handle)
        };
        action.seal();

        if let Err(error) = result {
            let wrapped = TrellisError::definition(action.path(), error.to_string());
            let path = action.path().append(SegmentKind::Test, "action failure");
            self.report.record(path, Outcome::failed(&wrapped));
        }
    }

    /// Records a skip for every test beneath a pending group. No lifecycle
    /// events fire and no bodies run.
    fn skip_children(&mut self, group: &Rc<GroupScope>) {
        for child in group.children_snapshot() {
            match child {
                Scope::Group(nested) => self.skip_children(&nested),
                Scope::Test(test) => self.run_test(&test, Pending::Yes),
                Scope::Action(action) => self.run_action(&action, Pending::Yes),
            }
        }
    }

    /// Records skips beneath a group whose before-group hook failed.
    fn skip_all_tests_under(&mut self, group: &Rc<GroupScope>, reason: &str) {
        for child in group.children_snapshot() {
            match child {
                Scope::Group(nested) => self.skip_all_tests_under(&nested, reason),
                Scope::Test(test) => self
                    .report
                    .record(test.path().clone(), Outcome::skipped(reason)),
                Scope::Action(action) => self
                    .report
                    .record(action.path().clone(), Outcome::skipped(reason)),
            }
        }
    }
}

// ============================================================================
// DYNAMIC REGISTRATION
// ============================================================================

/// The capability an action body receives: registering a test appends it as
/// a child of the action and executes it immediately, in registration
/// order, with the full before/after-each-test lifecycle.
pub struct ActionHandle<'a, 'b> {
    action: Rc<ActionScope>,
    cx: &'a mut RunContext<'b>,
}

impl ActionHandle<'_, '_> {
    /// Registers a test under the action and runs it before returning.
    #[track_caller]
    pub fn test(
        &mut self,
        name: &str,
        pending: Pending,
        body: impl FnMut() -> Result<(), TrellisError> + 'static,
    ) -> Result<(), TrellisError> {
        let source = SourceLocation::caller();
        let path = self.action.path().append(SegmentKind::Test, name);
        let test = TestScope::new(
            path,
            pending,
            Some(source),
            Rc::clone(self.action.lifecycle()),
            Box::new(body),
        );
        self.action.append_test(Rc::clone(&test))?;
        self.cx.run_test(&test, Pending::No);
        Ok(())
    }

    /// Path of the owning action, for bodies that derive test names.
    pub fn path(&self) -> &ScopePath {
        self.action.path()
    }
}
