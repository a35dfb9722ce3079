use thiserror::Error;

use crate::loader::LoadError;
use crate::vm;

/// Every way a run can fail, tagged with the phase it failed in
#[derive(Error, Debug)]
pub enum Error {
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    #[error("runtime error: {0}")]
    Runtime(#[from] vm::Error),
}

/// coarse classification of faults
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// the program text isn't of the form `3.<digits>4`
    Syntax,
    /// unbalanced loops, truncated operands or stray characters in the digit body
    Structural,
    /// a cell outside of the tape, or an output value that is not a byte
    Range,
    /// division by zero
    Arithmetic,
    /// input was exhausted and the run is configured to fail on that
    EndOfInput,
    Io,
}

impl Error {
    pub fn kind(&self) -> FaultKind {
        match self {
            Error::Load(e) => e.kind(),
            Error::Runtime(e) => e.kind(),
        }
    }
}

impl LoadError {
    pub fn kind(&self) -> FaultKind {
        match self {
            LoadError::Syntax(_) => FaultKind::Syntax,
            LoadError::UnbalancedLoopEnd { .. }
            | LoadError::UnbalancedLoopStart { .. }
            | LoadError::Truncated { .. }
            | LoadError::InvalidDigit { .. } => FaultKind::Structural,
        }
    }
}
