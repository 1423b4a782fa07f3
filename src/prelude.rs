//! Common imports for building and running specifications.

pub use crate::collect::Collector;
pub use crate::errors::{ensure, ErrorKind, TrellisError};
pub use crate::exec::{ActionHandle, Outcome, RunConfig, RunReport, Runner, TestReport};
pub use crate::lifecycle::memo::{CachingMode, Memo};
pub use crate::lifecycle::{LifecycleEvent, LifecycleListener, LifecycleManager};
pub use crate::resolve::{
    ConstructFresh, DefinitionHandle, DefinitionSource, InstantiationStrategy, Resolver,
    SingletonReuse, SpecDefinition,
};
pub use crate::tree::path::{ScopePath, Segment, SegmentKind};
pub use crate::tree::{
    ActionScope, GroupScope, Pending, Scope, SourceLocation, SpecTree, TestScope,
};
