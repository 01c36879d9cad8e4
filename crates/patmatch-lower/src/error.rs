//! Lowering failures.

use thiserror::Error;

use patmatch_typeck::{ErrorKind, PatternError};

#[derive(Debug, Error)]
pub enum LowerError {
    /// A fallthrough group whose labels do not share one binding
    /// environment.
    #[error(transparent)]
    Pattern(#[from] PatternError),
    /// The analysis reported errors; only clean switches are lowered.
    #[error("cannot lower a switch with {0} unresolved error(s)")]
    Unverified(usize),
}

impl LowerError {
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            LowerError::Pattern(err) => Some(err.kind()),
            LowerError::Unverified(_) => None,
        }
    }
}
