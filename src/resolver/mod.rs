//! Configuration resolution.
//!
//! The resolver is pure apart from path normalization and a few existence
//! checks; all raw input is gathered before resolution starts.

pub mod errors;
pub mod raw;
pub mod resolve;

pub use errors::{PathNotFoundError, ResolutionCause, ResolutionError};
pub use raw::{RawInput, RawValue};
pub use resolve::{ResolvedOptions, ResolvedValue, Resolver};
