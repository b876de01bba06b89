//! Raw option values as supplied by the caller.
//!
//! Raw input is gathered from the command line, the environment and config
//! files. Nothing here interprets values; that happens in the resolver.

use std::collections::BTreeMap;

use clap::parser::ValueSource;
use clap::ArgMatches;

use crate::core::registry::OptionRegistry;

/// A literal value for one option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// A string value (`--sdks=cs2`).
    Str(String),
    /// A flag that was given (`--enable-debug`).
    Flag,
}

impl RawValue {
    /// Rendering used in error messages.
    pub fn display(&self) -> Option<String> {
        match self {
            RawValue::Str(s) => Some(s.clone()),
            RawValue::Flag => None,
        }
    }
}

/// Mapping from option name to raw value. Absent options are missing keys.
///
/// Ordered, so iteration never depends on hashing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawInput {
    values: BTreeMap<String, RawValue>,
}

impl RawInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a string value.
    pub fn with_str(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, RawValue::Str(value.into()));
        self
    }

    /// Mark a flag as given.
    pub fn with_flag(mut self, name: impl Into<String>) -> Self {
        self.insert(name, RawValue::Flag);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: RawValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.values.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fill options missing here from a lower-precedence source.
    pub fn fill_from(&mut self, lower: RawInput) {
        for (name, value) in lower.values {
            self.values.entry(name).or_insert(value);
        }
    }

    /// Collect the registry's options from parsed command-line matches.
    ///
    /// Values clap took from an environment variable count as supplied.
    /// Flags left at clap's implicit `false` are treated as absent.
    pub fn from_matches(registry: &OptionRegistry, matches: &ArgMatches) -> Self {
        let mut raw = RawInput::new();

        for desc in registry.all() {
            let name = desc.name.as_str();
            if desc.is_flag() {
                if matches.get_flag(name) {
                    raw.insert(name, RawValue::Flag);
                }
                continue;
            }

            let supplied = matches!(
                matches.value_source(name),
                Some(ValueSource::CommandLine) | Some(ValueSource::EnvVariable)
            );
            if !supplied {
                continue;
            }
            if let Some(value) = matches.get_one::<String>(name) {
                raw.insert(name, RawValue::Str(value.clone()));
            }
        }

        raw
    }
}
