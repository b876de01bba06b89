//! Comma-separated identifier lists.

use std::fmt;

use miette::Diagnostic as MietteDiagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A comma-separated option contained no identifiers after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Error, MietteDiagnostic)]
#[error("list is empty after trimming: `{input}`")]
#[diagnostic(
    code(cs2kit::resolve::empty_list),
    help("Supply at least one comma-separated identifier, or omit the option to use its default")
)]
pub struct EmptyListError {
    pub input: String,
}

/// An ordered set of non-empty, trimmed identifiers.
///
/// Duplicates collapse onto their first occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "Vec<String>", try_from = "Vec<String>")]
pub struct ParsedList(Vec<String>);

impl ParsedList {
    /// Split `input` on `,`, trim each element, drop blanks and repeats.
    pub fn parse(input: &str) -> Result<Self, EmptyListError> {
        let mut items: Vec<String> = Vec::new();
        for item in input.split(',').map(str::trim) {
            if item.is_empty() || items.iter().any(|seen| seen == item) {
                continue;
            }
            items.push(item.to_string());
        }

        if items.is_empty() {
            return Err(EmptyListError {
                input: input.to_string(),
            });
        }

        Ok(ParsedList(items))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; a parsed list holds at least one element.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, item: &str) -> bool {
        self.0.iter().any(|i| i == item)
    }
}

impl TryFrom<Vec<String>> for ParsedList {
    type Error = EmptyListError;

    /// Elements go through the same trimming and deduplication as `parse`.
    fn try_from(items: Vec<String>) -> Result<Self, Self::Error> {
        ParsedList::parse(&items.join(","))
    }
}

impl From<ParsedList> for Vec<String> {
    fn from(list: ParsedList) -> Self {
        list.0
    }
}

impl fmt::Display for ParsedList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(","))
    }
}

impl<'a> IntoIterator for &'a ParsedList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
