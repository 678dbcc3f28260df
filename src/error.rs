use thiserror::Error;

use crate::layout::SUPPORTED_LENGTHS;

/// The payload length does not match any known layout.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("Invalid payload length. Expected 4, 5 or 6 bytes, got {actual}")]
pub struct LengthError {
    pub actual: usize,
}

impl LengthError {
    pub fn expected(&self) -> &'static [usize] {
        &SUPPORTED_LENGTHS
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown environment state {0:?}, expected \"static\" or \"mobile\"")]
pub struct ParseEnvironmentError(pub String);
