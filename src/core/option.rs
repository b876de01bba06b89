//! Option descriptors - declarative records of configuration knobs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// When the resolver verifies that a path option points at something.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathCheck {
    /// The resolver reads this path itself, so it must exist.
    Eager,
    /// Only the build engine consumes this path; existence is recorded, not required.
    Lazy,
}

/// Shape of an option's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKind {
    /// A filesystem path, normalized against the working directory.
    Path { check: PathCheck },
    /// A comma-separated list of identifiers.
    List,
    /// A switch that is either present or absent.
    Flag,
}

impl OptionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionKind::Path { .. } => "path",
            OptionKind::List => "list",
            OptionKind::Flag => "flag",
        }
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value used when an option is absent from the raw input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionDefault {
    /// No default; the option stays unset.
    Unset,
    /// A literal string, interpreted according to the option's kind.
    Str(String),
    /// Flag state when the flag is not given.
    Bool(bool),
}

/// One recognized configuration knob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionDescriptor {
    /// Unique key, also used as the long CLI switch.
    pub name: String,
    pub kind: OptionKind,
    pub default: OptionDefault,
    /// Display-only description.
    pub help: String,
    /// Environment variable that may supply the value.
    pub env: Option<String>,
}

impl OptionDescriptor {
    /// A path option with no default.
    pub fn path(name: impl Into<String>, check: PathCheck, help: impl Into<String>) -> Self {
        OptionDescriptor {
            name: name.into(),
            kind: OptionKind::Path { check },
            default: OptionDefault::Unset,
            help: help.into(),
            env: None,
        }
    }

    /// A comma-separated list option with no default.
    pub fn list(name: impl Into<String>, help: impl Into<String>) -> Self {
        OptionDescriptor {
            name: name.into(),
            kind: OptionKind::List,
            default: OptionDefault::Unset,
            help: help.into(),
            env: None,
        }
    }

    /// A boolean flag with the given state when absent.
    pub fn flag(name: impl Into<String>, default: bool, help: impl Into<String>) -> Self {
        OptionDescriptor {
            name: name.into(),
            kind: OptionKind::Flag,
            default: OptionDefault::Bool(default),
            help: help.into(),
            env: None,
        }
    }

    /// Set a string default.
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default = OptionDefault::Str(value.into());
        self
    }

    /// Bind an environment variable.
    pub fn with_env(mut self, var: impl Into<String>) -> Self {
        self.env = Some(var.into());
        self
    }

    pub fn is_flag(&self) -> bool {
        matches!(self.kind, OptionKind::Flag)
    }
}
