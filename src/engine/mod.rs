//! Build-graph engine boundary.
//!
//! The engine owns everything after configuration: source discovery,
//! compiler invocation and artifact emission. This crate only hands it a
//! resolved `BuildPlan` and reports whether it succeeded.

pub mod process;

use std::io::Write;

use thiserror::Error;

use crate::core::plan::BuildPlan;

pub use process::ProcessEngine;

/// Failure reported at the engine boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("build engine `{program}` not found")]
    NotFound { program: String },

    #[error("failed to run `{command}`: {message}")]
    Spawn { command: String, message: String },

    #[error("`{command}` exited with {}", describe_exit(.code))]
    Failed { command: String, code: Option<i32> },

    #[error("failed to serialize build plan")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write build plan")]
    Write(#[from] std::io::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {}", c),
        None => "a signal".to_string(),
    }
}

impl EngineError {
    /// Process exit code to report for this failure.
    ///
    /// The engine's own exit status is passed through unchanged.
    pub fn exit_code(&self) -> i32 {
        match self {
            EngineError::Failed { code: Some(c), .. } if *c != 0 => *c,
            _ => 1,
        }
    }
}

/// Something that accepts a build plan and turns it into a build.
pub trait BuildEngine {
    /// Hand the plan to the engine. The plan is consumed.
    fn configure(&mut self, plan: BuildPlan) -> Result<(), EngineError>;
}

/// Writes the plan as JSON instead of running a build (`--plan`).
pub struct PlanWriter<W: Write> {
    out: W,
}

impl<W: Write> PlanWriter<W> {
    pub fn new(out: W) -> Self {
        PlanWriter { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> BuildEngine for PlanWriter<W> {
    fn configure(&mut self, plan: BuildPlan) -> Result<(), EngineError> {
        let json = plan.to_json()?;
        writeln!(self.out, "{}", json)?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::OptionRegistry;
    use crate::resolver::{RawInput, Resolver};

    #[test]
    fn test_plan_writer_emits_json() {
        let tmp = tempfile::TempDir::new().unwrap();
        let registry = OptionRegistry::standard().unwrap();
        let plan = Resolver::new(&registry, tmp.path())
            .resolve(&RawInput::new().with_str("sdks", "cs2"))
            .unwrap();
        let expected: serde_json::Value = serde_json::from_str(&plan.to_json().unwrap()).unwrap();

        let mut writer = PlanWriter::new(Vec::new());
        writer.configure(plan).unwrap();

        let out = String::from_utf8(writer.into_inner()).unwrap();
        assert!(out.ends_with('\n'));
        let back: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(back, expected);
    }

    #[test]
    fn test_exit_code_passthrough() {
        let failed = EngineError::Failed {
            command: "ambuild".into(),
            code: Some(3),
        };
        assert_eq!(failed.exit_code(), 3);
        assert_eq!(failed.to_string(), "`ambuild` exited with status 3");

        let signaled = EngineError::Failed {
            command: "ambuild".into(),
            code: None,
        };
        assert_eq!(signaled.exit_code(), 1);

        let missing = EngineError::NotFound {
            program: "ambuild".into(),
        };
        assert_eq!(missing.exit_code(), 1);
    }
}
