//! Turns discovered specification definitions into executable trees.
//!
//! Discovery itself (scanning, enumeration) is an external collaborator;
//! this module consumes whatever ordered sequence of definition handles it
//! supplies. Each definition is instantiated through a pluggable strategy,
//! given a fresh lifecycle manager, fixture registry, and root group, and
//! its declarative body is run against a collector bound to that root.
//!
//! Resolution never aborts the run: a definition that cannot be
//! instantiated, or whose body fails, yields a tree holding one synthetic
//! failing test, and sibling definitions resolve unaffected.

use std::rc::Rc;

use once_cell::unsync::OnceCell;

use crate::collect::Collector;
use crate::errors::{FailureSink, TrellisError};
use crate::tree::SpecTree;

/// A specification definition: a name plus a declarative body.
pub trait SpecDefinition {
    fn name(&self) -> &str;

    /// Declares the specification's scopes against the given collector.
    fn define(&self, collector: &Collector) -> Result<(), TrellisError>;
}

/// A discovered-but-not-yet-instantiated definition.
///
/// The constructor callback is supplied by the discovery collaborator; the
/// handle also owns the slot the singleton-reuse strategy caches into.
pub struct DefinitionHandle {
    name: String,
    construct: Box<dyn Fn() -> Result<Rc<dyn SpecDefinition>, TrellisError>>,
    singleton: OnceCell<Rc<dyn SpecDefinition>>,
}

impl DefinitionHandle {
    pub fn new(
        name: impl Into<String>,
        construct: impl Fn() -> Result<Rc<dyn SpecDefinition>, TrellisError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            construct: Box::new(construct),
            singleton: OnceCell::new(),
        }
    }

    /// Wraps a plain closure as a definition, for hosts without a
    /// definition type of their own.
    pub fn from_fn(
        name: impl Into<String>,
        body: impl Fn(&Collector) -> Result<(), TrellisError> + 'static,
    ) -> Self {
        let name = name.into();
        let spec_name = name.clone();
        let body: Rc<dyn Fn(&Collector) -> Result<(), TrellisError>> = Rc::new(body);
        Self::new(name, move || {
            Ok(Rc::new(FnSpec {
                name: spec_name.clone(),
                body: Rc::clone(&body),
            }) as Rc<dyn SpecDefinition>)
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

struct FnSpec {
    name: String,
    body: Rc<dyn Fn(&Collector) -> Result<(), TrellisError>>,
}

impl SpecDefinition for FnSpec {
    fn name(&self) -> &str {
        &self.name
    }

    fn define(&self, collector: &Collector) -> Result<(), TrellisError> {
        (self.body)(collector)
    }
}

/// Supplies the ordered definitions of one discovery pass.
pub trait DefinitionSource {
    fn definitions(&self) -> Vec<DefinitionHandle>;
}

// ============================================================================
// INSTANTIATION STRATEGIES
// ============================================================================

/// How a definition handle becomes a live instance.
pub trait InstantiationStrategy {
    fn create(&self, handle: &DefinitionHandle) -> Result<Rc<dyn SpecDefinition>, TrellisError>;
}

/// Constructs a fresh instance every resolution. The default.
#[derive(Debug, Default)]
pub struct ConstructFresh;

impl InstantiationStrategy for ConstructFresh {
    fn create(&self, handle: &DefinitionHandle) -> Result<Rc<dyn SpecDefinition>, TrellisError> {
        (handle.construct)()
    }
}

/// Constructs at most one instance per handle and reuses it afterwards.
#[derive(Debug, Default)]
pub struct SingletonReuse;

impl InstantiationStrategy for SingletonReuse {
    fn create(&self, handle: &DefinitionHandle) -> Result<Rc<dyn SpecDefinition>, TrellisError> {
        handle
            .singleton
            .get_or_try_init(|| (handle.construct)())
            .map(Rc::clone)
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Resolves definitions into executable [`SpecTree`]s, one per definition.
pub struct Resolver {
    strategy: Box<dyn InstantiationStrategy>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self {
            strategy: Box::new(ConstructFresh),
        }
    }
}

impl Resolver {
    pub fn new(strategy: Box<dyn InstantiationStrategy>) -> Self {
        Self { strategy }
    }

    /// Resolves one definition. Never fails: instantiation and body
    /// failures are contained inside the returned tree.
    pub fn resolve(&self, handle: &DefinitionHandle) -> SpecTree {
        match self.strategy.create(handle) {
            Ok(instance) => SpecTree::build(handle.name(), |collector| instance.define(collector)),
            Err(error) => {
                let error = match error {
                    already @ TrellisError::Resolution { .. } => already,
                    other => TrellisError::resolution(handle.name(), other.to_string()),
                };
                let tree = SpecTree::build(handle.name(), |_| Ok(()));
                FailureSink::synthetic_test(tree.root(), "resolution failure", error);
                tree
            }
        }
    }

    /// Resolves an ordered slice of definitions, preserving order.
    pub fn resolve_all(&self, handles: &[DefinitionHandle]) -> Vec<SpecTree> {
        handles.iter().map(|handle| self.resolve(handle)).collect()
    }

    /// Resolves everything a discovery source supplies.
    pub fn resolve_source(&self, source: &dyn DefinitionSource) -> Vec<SpecTree> {
        self.resolve_all(&source.definitions())
    }
}
