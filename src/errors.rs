//! Unified, `miette`-based error types for the Trellis engine.
//!
//! Every failure produced by tree construction, lifecycle notification, or
//! execution is represented by [`TrellisError`]. Nothing in this crate is
//! fatal to a whole run: the [`FailureSink`] converts errors into synthetic
//! failing tests so one broken specification, group, or hook never prevents
//! execution of unrelated tree regions.

use std::rc::Rc;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tree::path::{ScopePath, SegmentKind};
use crate::tree::{GroupScope, Pending, Scope, TestScope};

/// Type-safe classification of [`TrellisError`] variants.
///
/// Reports store this instead of the full error so they stay plain data;
/// tests match on it rather than on message substrings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// A declarative body failed while the tree was being built.
    Definition,
    /// A before/after hook failed during execution.
    Fixture,
    /// A lifecycle listener failed during notification.
    Listener,
    /// A definition could not be instantiated or had no usable body.
    Resolution,
    /// A test body signalled failure.
    Assertion,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Definition => "Definition",
            ErrorKind::Fixture => "Fixture",
            ErrorKind::Listener => "Listener",
            ErrorKind::Resolution => "Resolution",
            ErrorKind::Assertion => "Assertion",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unified error type for all Trellis failure modes.
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum TrellisError {
    #[error("definition error at '{path}': {message}")]
    #[diagnostic(
        code(trellis::collect::definition),
        help("the failing scope holds a single failing test; sibling scopes are unaffected")
    )]
    Definition { path: ScopePath, message: String },

    #[error("fixture failure at '{path}': {message}")]
    #[diagnostic(code(trellis::lifecycle::fixture))]
    Fixture { path: ScopePath, message: String },

    #[error("listener failure at '{path}': {message}")]
    #[diagnostic(code(trellis::lifecycle::listener))]
    Listener { path: ScopePath, message: String },

    #[error("resolution error for '{spec}': {message}")]
    #[diagnostic(
        code(trellis::resolve::instantiation),
        help("other specifications discovered in the same run still resolve")
    )]
    Resolution { spec: String, message: String },

    #[error("assertion failed: {message}")]
    #[diagnostic(code(trellis::exec::assertion))]
    Assertion { message: String },
}

impl TrellisError {
    pub fn definition(path: &ScopePath, message: impl Into<String>) -> Self {
        TrellisError::Definition {
            path: path.clone(),
            message: message.into(),
        }
    }

    pub fn fixture(path: &ScopePath, message: impl Into<String>) -> Self {
        TrellisError::Fixture {
            path: path.clone(),
            message: message.into(),
        }
    }

    pub fn listener(path: &ScopePath, message: impl Into<String>) -> Self {
        TrellisError::Listener {
            path: path.clone(),
            message: message.into(),
        }
    }

    pub fn resolution(spec: impl Into<String>, message: impl Into<String>) -> Self {
        TrellisError::Resolution {
            spec: spec.into(),
            message: message.into(),
        }
    }

    pub fn assertion(message: impl Into<String>) -> Self {
        TrellisError::Assertion {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TrellisError::Definition { .. } => ErrorKind::Definition,
            TrellisError::Fixture { .. } => ErrorKind::Fixture,
            TrellisError::Listener { .. } => ErrorKind::Listener,
            TrellisError::Resolution { .. } => ErrorKind::Resolution,
            TrellisError::Assertion { .. } => ErrorKind::Assertion,
        }
    }
}

/// Checks a condition inside a test body, producing the failure signal the
/// execution driver reports.
pub fn ensure(condition: bool, message: impl Into<String>) -> Result<(), TrellisError> {
    if condition {
        Ok(())
    } else {
        Err(TrellisError::assertion(message))
    }
}

// ============================================================================
// FAILURE SINK: error-to-synthetic-test conversion
// ============================================================================

/// Converts failures into tree-local reporting artifacts.
///
/// The Resolver, Collector, and execution driver all route contained errors
/// through here instead of duplicating catch-and-wrap logic at each site.
pub struct FailureSink;

impl FailureSink {
    /// Appends a synthetic failing test named `label` under `group`. The
    /// test's body re-raises the captured error every time it runs.
    ///
    /// Synthetic tests bypass the duplicate-sibling check: they are
    /// reporting artifacts, not user declarations.
    pub fn synthetic_test(group: &Rc<GroupScope>, label: &str, error: TrellisError) {
        let path = group.path().append(SegmentKind::Test, label);
        let test = TestScope::new(
            path,
            Pending::No,
            None,
            Rc::clone(group.lifecycle()),
            Box::new(move || Err(error.clone())),
        );
        group.append_unchecked(Scope::Test(test));
    }
}
