//! Crate-wide error taxonomy (spec §7).
//!
//! In-process term/type errors stay as small plain enums local to the
//! module that raises them (`term::TermError`); anything that crosses an
//! I/O or external-process boundary is a `thiserror`-derived error here.

use thiserror::Error;

/// A parse error from any of the six surface-syntax readers.
#[derive(Debug, Error, Clone)]
#[error("{format}:{line}:{column}: {message}")]
pub struct ParseError {
    pub format: &'static str,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(format: &'static str, line: usize, column: usize, message: impl Into<String>) -> Self {
        ParseError { format, line, column, message: message.into() }
    }
}

/// Failures from external collaborators (SAT solver, first-order prover).
#[derive(Debug, Error)]
pub enum ProverError {
    #[error("processor timed out")]
    Timeout,
    #[error("subprocess I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("external tool unavailable: {0}")]
    Unavailable(String),
}

/// Top-level answer. Not a `Result` variant: giving up (`Maybe`) is a
/// successful run of the driver, not a failure (spec §7 exit-code table).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
    Maybe,
}

impl std::fmt::Display for Answer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Answer::Yes => write!(f, "YES"),
            Answer::No => write!(f, "NO"),
            Answer::Maybe => write!(f, "MAYBE"),
        }
    }
}
