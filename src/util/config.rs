//! Configuration file support.
//!
//! Two configuration file locations are read:
//! - Global: `~/.cs2kit/config.toml` - User-wide defaults
//! - Project: `<source-dir>/.cs2kit/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config, and anything given on
//! the command line or through the environment takes precedence over both.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::resolver::raw::{RawInput, RawValue};

/// Configuration file contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Option values keyed by option name (e.g. `sdks`, `hl2sdk-root`)
    pub options: BTreeMap<String, ConfigValue>,

    /// Build engine settings
    pub engine: EngineConfig,
}

/// An option value as written in TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// `enable-debug = true`
    Bool(bool),
    /// `sdks = "cs2,hl2"` or `hl2sdk-root = "../hl2sdk"`
    Str(String),
    /// `sdks = ["cs2", "hl2"]`
    List(Vec<String>),
}

/// Build engine settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Program that receives the build plan (default: `ambuild` on PATH)
    pub program: Option<String>,

    /// Extra arguments passed to the program
    pub args: Vec<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration, or defaults if the file doesn't exist.
    ///
    /// A file that exists but cannot be read or parsed is an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("no config file at {}", path.display());
            Ok(Self::default())
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        self.options.extend(other.options);

        if other.engine.program.is_some() {
            self.engine.program = other.engine.program;
        }
        if !other.engine.args.is_empty() {
            self.engine.args = other.engine.args;
        }
    }

    /// Convert the `[options]` table into raw input.
    ///
    /// `false` leaves a flag at its default since flags have no negation.
    /// Arrays are joined with commas and go through the normal list parsing.
    pub fn to_raw_input(&self) -> RawInput {
        let mut raw = RawInput::new();
        for (name, value) in &self.options {
            match value {
                ConfigValue::Bool(true) => raw.insert(name.clone(), RawValue::Flag),
                ConfigValue::Bool(false) => {
                    tracing::debug!("config sets `{}` to false; leaving it at its default", name);
                }
                ConfigValue::Str(s) => raw.insert(name.clone(), RawValue::Str(s.clone())),
                ConfigValue::List(items) => {
                    raw.insert(name.clone(), RawValue::Str(items.join(",")))
                }
            }
        }
        raw
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.cs2kit/config.toml)
/// 2. Global config (~/.cs2kit/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Result<Config> {
    let mut config = Config::default();

    if let Some(global) = global_path {
        config.merge(Config::load_or_default(global)?);
    }

    config.merge(Config::load_or_default(project_path)?);

    Ok(config)
}

/// Get the global config directory (~/.cs2kit).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".cs2kit"))
}

/// Get the global config path (~/.cs2kit/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (<source-dir>/.cs2kit/config.toml).
pub fn project_config_path(source_dir: &Path) -> PathBuf {
    source_dir.join(".cs2kit").join("config.toml")
}
