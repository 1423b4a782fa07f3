pub use crate::errors::{ensure, ErrorKind, FailureSink, TrellisError};

pub mod collect;
pub mod errors;
pub mod exec;
pub mod lifecycle;
pub mod prelude;
pub mod resolve;
pub mod tree;
