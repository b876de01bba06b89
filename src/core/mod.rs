//! Core data structures.
//!
//! - Option descriptors and the registry that holds them
//! - Parsed comma-separated lists
//! - The resolved build plan

pub mod list;
pub mod option;
pub mod plan;
pub mod registry;

pub use list::{EmptyListError, ParsedList};
pub use option::{OptionDefault, OptionDescriptor, OptionKind, PathCheck};
pub use plan::{BuildPlan, MatrixEntry, ResolvedPath, TargetSelection};
pub use registry::{DuplicateOptionError, OptionRegistry};
