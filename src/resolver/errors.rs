//! Resolution error types and diagnostics.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::core::list::EmptyListError;
use crate::util::diagnostic::{suggestions, Diagnostic};

/// A path the resolver must read does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Error, MietteDiagnostic)]
#[error("path does not exist: {}", path.display())]
#[diagnostic(code(cs2kit::resolve::path_not_found))]
pub struct PathNotFoundError {
    pub path: PathBuf,
}

/// The specific reason an option was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionCause {
    #[error(transparent)]
    EmptyList(#[from] EmptyListError),

    #[error(transparent)]
    PathNotFound(#[from] PathNotFoundError),

    #[error("unknown option")]
    UnknownOption,

    #[error("expected a {expected} value: {reason}")]
    KindMismatch {
        expected: &'static str,
        reason: String,
    },

    #[error("option is not registered")]
    Unregistered,
}

/// Resolution failed for one option.
#[derive(Debug, Clone, PartialEq, Eq, Error, MietteDiagnostic)]
#[error("invalid value for `--{option}`: {cause}")]
#[diagnostic(code(cs2kit::resolve::rejected))]
pub struct ResolutionError {
    /// Name of the offending option.
    pub option: String,
    /// Raw value as supplied, if any.
    pub value: Option<String>,
    #[source]
    pub cause: ResolutionCause,
}

impl ResolutionError {
    pub fn new(option: impl Into<String>, value: Option<String>, cause: impl Into<ResolutionCause>) -> Self {
        ResolutionError {
            option: option.into(),
            value,
            cause: cause.into(),
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(format!("invalid value for `--{}`", self.option));

        if let Some(ref value) = self.value {
            diag = diag.with_context(format!("supplied value: `{}`", value));
        }

        match &self.cause {
            ResolutionCause::EmptyList(_) => {
                diag = diag
                    .with_context("the list contains no identifiers after trimming")
                    .with_suggestion(format!(
                        "Pass at least one identifier, e.g. `--{}=cs2`",
                        self.option
                    ))
                    .with_suggestion(format!(
                        "Omit `--{}` to use its default",
                        self.option
                    ));
            }
            ResolutionCause::PathNotFound(err) => {
                diag = diag
                    .with_location(err.path.clone())
                    .with_context("this path is read during configuration and must exist")
                    .with_suggestion(suggestions::CHECK_PATH);
            }
            ResolutionCause::UnknownOption => {
                diag = diag
                    .with_context("the option is not recognized")
                    .with_suggestion(suggestions::LIST_OPTIONS);
            }
            ResolutionCause::KindMismatch { expected, reason } => {
                diag = diag
                    .with_context(format!("expected a {} value: {}", expected, reason))
                    .with_suggestion(suggestions::LIST_OPTIONS);
            }
            ResolutionCause::Unregistered => {
                diag = diag.with_context(
                    "the option registry does not declare this option; this is a bug",
                );
            }
        }

        diag
    }
}
