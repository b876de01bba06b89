//! cs2kit-configure - configuration front end for CS2-Kit plugin builds
//!
//! This crate turns loosely specified build options (SDK selection, target
//! architectures, vendored SDK paths, debug/optimize toggles) into a
//! validated `BuildPlan` and hands it to the AMBuild build-graph engine.

pub mod core;
pub mod engine;
pub mod resolver;
pub mod util;

pub use crate::core::{
    list::ParsedList, option::OptionDescriptor, plan::BuildPlan, registry::OptionRegistry,
};

pub use engine::BuildEngine;
pub use resolver::{RawInput, ResolutionError, Resolver};
