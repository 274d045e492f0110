//! Errors returned when loading grammars and configuring the fuzzer.

use std::path::PathBuf;
use thiserror::Error;

/// A grammar file could not be loaded.
#[derive(Debug, Error)]
pub struct ParsingError {
    path: PathBuf,
    msg: String,
}

impl ParsingError {
    pub(crate) fn new<P: Into<PathBuf>, S: Into<String>>(path: P, msg: S) -> Self {
        Self {
            path: path.into(),
            msg: msg.into(),
        }
    }
    
    /// The file that failed to load.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
    
    /// What went wrong.
    pub fn message(&self) -> &str {
        &self.msg
    }
}

impl std::fmt::Display for ParsingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ParsingError in {}: {}", self.path.display(), self.msg)
    }
}

/// Errors surfaced when constructing grammars, analyses or fuzzers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The grammar violates a structural constraint, e.g. the start symbol is
    /// missing or has more than one alternative.
    #[error("Malformed grammar: {0}")]
    MalformedGrammar(String),
    
    /// A parameter is out of its permitted range.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
