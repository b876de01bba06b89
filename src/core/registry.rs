//! Option registry - the fixed set of recognized configuration knobs.
//!
//! The registry is built once at process start and only read afterwards. It
//! performs no I/O and never looks at option values; that is the resolver's
//! job.

use std::collections::HashMap;

use clap::{Arg, ArgAction};
use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::core::option::{OptionDefault, OptionDescriptor, PathCheck};

/// Names of the built-in options.
pub mod names {
    pub const SDK_ROOT: &str = "hl2sdk-root";
    pub const SDK_MANIFESTS: &str = "hl2sdk-manifests";
    pub const MMS_PATH: &str = "mms-path";
    pub const SDKS: &str = "sdks";
    pub const TARGETS: &str = "targets";
    pub const DEBUG: &str = "enable-debug";
    pub const OPTIMIZE: &str = "enable-optimize";
}

/// SDK built when `--sdks` is not given.
pub const DEFAULT_SDK: &str = "cs2";

/// Two descriptors were registered under the same name.
#[derive(Debug, Clone, PartialEq, Eq, Error, MietteDiagnostic)]
#[error("option `{name}` is already registered")]
#[diagnostic(code(cs2kit::registry::duplicate_option))]
pub struct DuplicateOptionError {
    pub name: String,
}

/// Ordered collection of option descriptors with unique names.
#[derive(Debug, Clone, Default)]
pub struct OptionRegistry {
    descriptors: Vec<OptionDescriptor>,
    index: HashMap<String, usize>,
}

impl OptionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the registry of built-in plugin build options.
    pub fn standard() -> Result<Self, DuplicateOptionError> {
        let mut registry = OptionRegistry::new();

        registry.register(
            OptionDescriptor::path(
                names::SDK_ROOT,
                PathCheck::Lazy,
                "Root path containing HL2SDK directories",
            )
            .with_env("HL2SDK_ROOT"),
        )?;
        registry.register(
            OptionDescriptor::path(
                names::SDK_MANIFESTS,
                PathCheck::Eager,
                "Path to hl2sdk-manifests",
            )
            .with_env("HL2SDK_MANIFESTS"),
        )?;
        registry.register(
            OptionDescriptor::path(
                names::MMS_PATH,
                PathCheck::Lazy,
                "Path to Metamod:Source 2.0",
            )
            .with_env("MMS_PATH"),
        )?;
        registry.register(
            OptionDescriptor::list(names::SDKS, "SDK(s) to build (comma-separated, e.g., 'cs2')")
                .with_default(DEFAULT_SDK)
                .with_env("CS2KIT_SDKS"),
        )?;
        registry.register(
            OptionDescriptor::list(
                names::TARGETS,
                "Target architectures (comma-separated, e.g., 'x86_64')",
            )
            .with_env("CS2KIT_TARGETS"),
        )?;
        registry.register(OptionDescriptor::flag(
            names::DEBUG,
            false,
            "Enable debugging symbols",
        ))?;
        registry.register(OptionDescriptor::flag(
            names::OPTIMIZE,
            true,
            "Enable optimization",
        ))?;

        Ok(registry)
    }

    /// Add a descriptor. Fails if its name is already taken.
    pub fn register(&mut self, descriptor: OptionDescriptor) -> Result<(), DuplicateOptionError> {
        if self.index.contains_key(&descriptor.name) {
            return Err(DuplicateOptionError {
                name: descriptor.name,
            });
        }

        self.index
            .insert(descriptor.name.clone(), self.descriptors.len());
        self.descriptors.push(descriptor);
        Ok(())
    }

    /// All descriptors in registration order.
    pub fn all(&self) -> &[OptionDescriptor] {
        &self.descriptors
    }

    /// Look up a descriptor by name.
    pub fn get(&self, name: &str) -> Option<&OptionDescriptor> {
        self.index.get(name).map(|&i| &self.descriptors[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Expose every descriptor as a long-form command-line argument.
    ///
    /// Defaults stay out of clap; an absent argument must reach the resolver
    /// as absent.
    pub fn clap_args(&self) -> Vec<Arg> {
        self.descriptors.iter().map(descriptor_arg).collect()
    }
}

fn descriptor_arg(desc: &OptionDescriptor) -> Arg {
    let mut help = desc.help.clone();
    match &desc.default {
        OptionDefault::Str(value) => help.push_str(&format!(" [default: {}]", value)),
        OptionDefault::Bool(true) => help.push_str(" [default: on]"),
        OptionDefault::Bool(false) | OptionDefault::Unset => {}
    }

    let arg = Arg::new(desc.name.clone())
        .long(desc.name.clone())
        .help(help);

    if desc.is_flag() {
        return arg.action(ArgAction::SetTrue);
    }

    let arg = arg.action(ArgAction::Set).value_name(desc.kind.as_str().to_uppercase());
    match &desc.env {
        Some(var) => arg.env(var.clone()),
        None => arg,
    }
}
